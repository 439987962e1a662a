// The changes suggested by this lint usually make the code more cluttered and less clear:
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod fill;
pub mod generate;
pub mod multiworld;
pub mod options;
pub mod player_options;
pub mod preset;
pub mod spoiler_log;
pub mod traverse;
pub mod world;
pub mod worlds;

pub use error::GenerationError;
pub use generate::{GenerationOutput, Generator};
pub use multiworld::MultiWorld;
