use super::values::{Direction, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub direction: Direction,
    /// Set once the player has stepped on a mine, until revived.
    pub guilty: bool,
}

impl Player {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
        direction: Direction,
    ) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            position,
            direction,
            guilty: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.guilty
    }
}
