/// Grid model: an immutable matrix of cells.
///
/// Built once from raw layout codes and never mutated afterwards.
/// `cell_at()` is the only lookup the rest of the game uses; anything
/// outside the matrix reads as a wall, so traversal never indexes past
/// the edge.

use crate::error::GridError;

use super::cell::Cell;

#[derive(Clone, Debug)]
pub struct Grid {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
    goal: (usize, usize),
}

impl Grid {
    /// Build a grid from row-major layout codes (`rows[z][x]`).
    pub fn from_codes<R: AsRef<[u8]>>(rows: &[R]) -> Result<Grid, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if height == 0 || width == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut goals = Vec::new();
        for (z, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(GridError::Ragged { row: z, expected: width, found: row.len() });
            }
            for (x, &code) in row.iter().enumerate() {
                let cell = Cell::from_code(code).ok_or(GridError::UnknownCode { code, x, z })?;
                if cell.is_goal() {
                    goals.push((x, z));
                }
                cells.push(cell);
            }
        }

        if goals.len() != 1 {
            return Err(GridError::GoalCount(goals.len()));
        }

        Ok(Grid { cells, width, height, goal: goals[0] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid coordinates of the single goal cell.
    pub fn goal(&self) -> (usize, usize) {
        self.goal
    }

    /// Cell at integer grid coordinates. Out of bounds = wall.
    #[inline]
    pub fn cell_at(&self, x: i32, z: i32) -> Cell {
        if x < 0 || z < 0 {
            return Cell::Wall;
        }
        let (x, z) = (x as usize, z as usize);
        if x < self.width && z < self.height {
            self.cells[z * self.width + x]
        } else {
            Cell::Wall
        }
    }

    /// Cell containing a continuous position (floors both coordinates).
    #[inline]
    pub fn cell_at_pos(&self, x: f32, z: f32) -> Cell {
        let (gx, gz) = grid_coords(x, z);
        self.cell_at(gx, gz)
    }

    /// Row-major iteration over every cell with its coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate().map(move |(i, &c)| (i % w, i / w, c))
    }

    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.width && (z as usize) < self.height
    }
}

/// Grid cell containing a continuous position.
#[inline]
pub fn grid_coords(x: f32, z: f32) -> (i32, i32) {
    (x.floor() as i32, z.floor() as i32)
}
