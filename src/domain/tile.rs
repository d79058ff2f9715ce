/// Tile kinds and their authoring symbols.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tile {
    Wall,              // '#'  Solid
    PlayerSpawn,       // 'P'
    Exit,              // 'E'
    Empty,             // '.'
    FixedHazard,       // 'M'  Lethal, not solid
    MobileHazardSpawn, // 'X'  Spawns a patrolling hazard
}

impl Tile {
    /// Map an authoring character to its tile kind.
    /// Anything outside the alphabet is `None`; the parser turns that
    /// into an `InvalidCharacter` error.
    pub fn from_symbol(ch: char) -> Option<Tile> {
        match ch {
            '#' => Some(Tile::Wall),
            'P' => Some(Tile::PlayerSpawn),
            'E' => Some(Tile::Exit),
            '.' => Some(Tile::Empty),
            'M' => Some(Tile::FixedHazard),
            'X' => Some(Tile::MobileHazardSpawn),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_maps_to_kinds() {
        let kinds: Vec<_> = "#PE.MX".chars().filter_map(Tile::from_symbol).collect();
        assert_eq!(kinds, vec![
            Tile::Wall,
            Tile::PlayerSpawn,
            Tile::Exit,
            Tile::Empty,
            Tile::FixedHazard,
            Tile::MobileHazardSpawn,
        ]);
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        for ch in ['Z', ' ', '$', 'p', 'e', '\t'] {
            assert_eq!(Tile::from_symbol(ch), None, "{ch:?}");
        }
    }
}
