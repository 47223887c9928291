use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModelError;

// === Size ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    pub fn area_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.z >= 0
            && (position.x as u32) < self.width
            && (position.z as u32) < self.height
    }
}

// === Position ===

/// Grid coordinates of a cell. Players may report positions outside the
/// board, so both axes are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, z: i32) -> Self {
        Position { x, z }
    }

    /// The neighboring cell one step towards `direction`.
    pub fn step(self, direction: Direction) -> Position {
        match direction {
            Direction::Up => Position::new(self.x, self.z - 1),
            Direction::Right => Position::new(self.x + 1, self.z),
            Direction::Down => Position::new(self.x, self.z + 1),
            Direction::Left => Position::new(self.x - 1, self.z),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

// === Direction ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn to_number(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Rotation about the vertical axis for a model facing this way.
    pub fn yaw(self) -> f32 {
        PI - self.to_number() as f32 * FRAC_PI_2
    }
}

impl TryFrom<u8> for Direction {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Direction::ALL
            .get(value as usize)
            .copied()
            .ok_or(ModelError::InvalidDirection(value))
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> u8 {
        direction.to_number()
    }
}

// === Area ===

/// Player-visible state of one board cell.
///
/// `boomed` implies both `has_mine` and `revealed`; the constructor rejects
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Area {
    revealed: bool,
    flagged: bool,
    has_mine: bool,
    adjacent_mine_count: u8,
    boomed: bool,
}

impl Area {
    pub fn new(
        revealed: bool,
        flagged: bool,
        has_mine: bool,
        adjacent_mine_count: u8,
        boomed: bool,
    ) -> Result<Self, ModelError> {
        if adjacent_mine_count > 8 {
            return Err(ModelError::InvalidAdjacentCount(adjacent_mine_count));
        }
        if boomed && !(has_mine && revealed) {
            return Err(ModelError::InconsistentArea);
        }
        Ok(Area {
            revealed,
            flagged,
            has_mine,
            adjacent_mine_count,
            boomed,
        })
    }

    pub fn hidden() -> Self {
        Area::default()
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn flagged(&self) -> bool {
        self.flagged
    }

    pub fn has_mine(&self) -> bool {
        self.has_mine
    }

    pub fn adjacent_mine_count(&self) -> u8 {
        self.adjacent_mine_count
    }

    pub fn boomed(&self) -> bool {
        self.boomed
    }
}

// === Camera ===

/// Camera preset selected by the server for the whole session, 0 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CameraMode(u8);

const CAMERA_HEIGHT: f32 = 30.0;

impl CameraMode {
    pub const MAX: u8 = 5;

    pub fn to_number(self) -> u8 {
        self.0
    }

    /// Eye position for a camera looking at the board center, or `None` when
    /// the mode keeps the previous placement.
    pub fn eye(self, size: Size) -> Option<[f32; 3]> {
        let depth = size.height as f32;
        match self.0 {
            0 => Some([0.0, CAMERA_HEIGHT, depth + 10.0]),
            1 => Some([0.0, CAMERA_HEIGHT * 3.0, depth * 3.0 + 10.0]),
            2 => Some([0.0, CAMERA_HEIGHT * 6.0, depth * 6.0 + 10.0]),
            3 => Some([0.0, 3.0, depth * 1.5]),
            _ => None,
        }
    }
}

impl TryFrom<u8> for CameraMode {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > CameraMode::MAX {
            return Err(ModelError::InvalidCamera(value));
        }
        Ok(CameraMode(value))
    }
}

impl From<CameraMode> for u8 {
    fn from(mode: CameraMode) -> u8 {
        mode.0
    }
}
