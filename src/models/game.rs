use ndarray::Array2;

use super::values::{Area, CameraMode, Position, Size};
use super::ModelError;

/// Immutable board snapshot as last reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    id: String,
    size: Size,
    mine_count: u32,
    areas: Array2<Area>,
    camera: CameraMode,
}

impl Game {
    /// Build a snapshot from a column-major grid: `columns[x][z]`.
    ///
    /// Fails unless there are exactly `width` columns of `height` areas each.
    pub fn new(
        id: String,
        size: Size,
        mine_count: u32,
        columns: Vec<Vec<Area>>,
        camera: CameraMode,
    ) -> Result<Self, ModelError> {
        let shape_error = ModelError::InvalidBoardShape {
            width: size.width,
            height: size.height,
        };
        if columns.len() != size.width as usize
            || columns.iter().any(|col| col.len() != size.height as usize)
        {
            return Err(shape_error);
        }

        let flat: Vec<Area> = columns.into_iter().flatten().collect();
        let areas = Array2::from_shape_vec((size.width as usize, size.height as usize), flat)
            .map_err(|_| shape_error)?;

        Ok(Game {
            id,
            size,
            mine_count,
            areas,
            camera,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn mine_count(&self) -> u32 {
        self.mine_count
    }

    pub fn camera(&self) -> CameraMode {
        self.camera
    }

    /// Size re-derived from the stored grid.
    pub fn grid_size(&self) -> Size {
        let (width, height) = self.areas.dim();
        Size::new(width as u32, height as u32)
    }

    /// The area at `position`, or `None` when it lies outside the board.
    pub fn area(&self, position: Position) -> Option<&Area> {
        if !self.size.contains(position) {
            return None;
        }
        self.areas.get((position.x as usize, position.z as usize))
    }

    /// Every area with its position, x-major.
    pub fn areas(&self) -> impl Iterator<Item = (Position, &Area)> + '_ {
        self.areas
            .indexed_iter()
            .map(|((x, z), area)| (Position::new(x as i32, z as i32), area))
    }

    pub fn flagged_count(&self) -> usize {
        self.areas.iter().filter(|a| a.flagged()).count()
    }

    pub fn revealed_count(&self) -> usize {
        self.areas.iter().filter(|a| a.revealed()).count()
    }

    pub fn mines_left(&self) -> i64 {
        self.mine_count as i64 - self.flagged_count() as i64
    }

    pub fn exploded(&self) -> bool {
        self.areas.iter().any(|a| a.boomed())
    }
}
