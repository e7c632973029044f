//! Game recording.
//!
//! - `game_record`: per-move records of finished games and their JSON storage

pub mod game_record;

pub use game_record::{load_records, save_records, GameRecord, MoveRecord, PlayerType};
