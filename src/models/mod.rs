pub mod game;
pub mod player;
pub mod values;

use thiserror::Error;

pub use game::Game;
pub use player::Player;
pub use values::{Area, CameraMode, Direction, Position, Size};

/// Invariant violations caught while building domain snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("direction must be 0-3, got {0}")]
    InvalidDirection(u8),
    #[error("camera mode must be 0-5, got {0}")]
    InvalidCamera(u8),
    #[error("adjacent mine count must be 0-8, got {0}")]
    InvalidAdjacentCount(u8),
    #[error("boomed area must be a revealed mine")]
    InconsistentArea,
    #[error("board shape does not match declared size {width}x{height}")]
    InvalidBoardShape { width: u32, height: u32 },
}
