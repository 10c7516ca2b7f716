use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub fn new(x: i16, y: i16) -> Self {
        Position { x, y }
    }

    /// The neighbouring cell one grid unit along `direction`.
    pub fn step(&self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan_distance(&self, other: &Position) -> u16 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(&self, other: &Direction) -> bool {
        self.opposite() == *other
    }

    /// Unit offset in grid cells. `y` grows downwards.
    pub fn delta(&self) -> (i16, i16) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// The playing field, measured in grid cells.
///
/// `cell_size` is the width of one cell in canvas pixels. The simulation never
/// looks at it; it only exists so records shared with the browser clients can
/// be expressed in the pixel coordinates they draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub width: u16,
    pub height: u16,
    pub cell_size: u16,
}

impl Arena {
    pub fn new(width: u16, height: u16, cell_size: u16) -> Self {
        Arena { width, height, cell_size }
    }

    /// Build an arena from canvas dimensions, e.g. 800x400 with 20 px cells.
    pub fn from_canvas(canvas_width: u16, canvas_height: u16, cell_size: u16) -> Self {
        let cell_size = cell_size.max(1);
        Arena {
            width: canvas_width / cell_size,
            height: canvas_height / cell_size,
            cell_size,
        }
    }

    pub fn in_bounds(&self, pos: &Position) -> bool {
        pos.x >= 0
            && (pos.x as i32) < self.width as i32
            && pos.y >= 0
            && (pos.y as i32) < self.height as i32
    }

    pub fn cell_count(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    pub fn to_pixels(&self, pos: &Position) -> (i32, i32) {
        let size = self.cell_size as i32;
        (pos.x as i32 * size, pos.y as i32 * size)
    }

    /// Inverse of [`Arena::to_pixels`]. Pixel coordinates that are not aligned
    /// to the grid are floored to the cell containing them.
    pub fn from_pixels(&self, x: i32, y: i32) -> Position {
        let size = self.cell_size.max(1) as i32;
        Position {
            x: x.div_euclid(size) as i16,
            y: y.div_euclid(size) as i16,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i16)
            .flat_map(move |y| (0..self.width as i16).map(move |x| Position { x, y }))
    }
}
