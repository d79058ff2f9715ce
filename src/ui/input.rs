/// Keyboard state tracker.
///
/// Everything the simulation reads is level-triggered: a direction or jump
/// counts for every tick the key is held. Only quit is edge-triggered.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const JUMP_KEYS: [KeyCode; 4] = [KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const QUIT_KEYS: [KeyCode; 3] = [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call once per tick, before the simulation step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Unconfirmed release reports are ignored; the timeout handles them
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// Held-key snapshot for this tick.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            left: self.any_held(&LEFT_KEYS),
            right: self.any_held(&RIGHT_KEYS),
            jump: self.any_held(&JUMP_KEYS),
        }
    }

    /// Esc / Q pressed this tick, or Ctrl+C.
    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(&QUIT_KEYS) || self.ctrl_c_pressed()
    }

    /// Any fresh key press at all (dismisses the summary screen).
    pub fn any_key_pressed(&self) -> bool {
        !self.fresh_presses.is_empty()
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputState, code: KeyCode) {
        input.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    #[test]
    fn held_keys_map_to_frame_input() {
        let mut input = InputState::new();
        assert_eq!(input.frame_input(), FrameInput::IDLE);

        press(&mut input, KeyCode::Char('a'));
        press(&mut input, KeyCode::Char(' '));
        assert_eq!(input.frame_input(), FrameInput { left: true, right: false, jump: true });

        press(&mut input, KeyCode::Right);
        assert!(input.frame_input().right);
    }

    #[test]
    fn release_is_honored_only_when_enabled() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Left);
        let release = KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Release);

        input.handle_key(release, Instant::now());
        assert!(input.frame_input().left, "release ignored until confirmed");

        input.honor_release = true;
        input.handle_key(release, Instant::now());
        assert!(!input.frame_input().left);
    }

    #[test]
    fn quit_keys_and_ctrl_c() {
        let mut input = InputState::new();
        assert!(!input.quit_pressed());
        press(&mut input, KeyCode::Esc);
        assert!(input.quit_pressed());

        let mut input = InputState::new();
        input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(input.quit_pressed());
    }

    #[test]
    fn repeat_is_not_a_fresh_press() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::Char('q'));
        input.fresh_presses.clear();
        press(&mut input, KeyCode::Char('q'));
        assert!(!input.quit_pressed());
    }
}
