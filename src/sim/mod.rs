pub mod event;
pub mod level;
pub mod run;
pub mod stats;
pub mod step;
