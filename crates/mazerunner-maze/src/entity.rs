//! Cell kinds, grid coordinates and movement directions.

use std::fmt;

// ---------------------------------------------------------------------------
// MapEntity
// ---------------------------------------------------------------------------

/// What occupies a single maze cell.
///
/// Each kind has a one-character form used by template files and by the
/// [`Display`](fmt::Display) impl:
///
/// | entity  | char |
/// |---------|------|
/// | Empty   | `.`  |
/// | Wall    | `#`  |
/// | Player  | `J`  |
/// | Monster | `M`  |
/// | Exit    | `E`  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEntity {
    Empty,
    Wall,
    Player,
    Monster,
    Exit,
}

impl MapEntity {
    /// Parses a template character. Returns `None` for anything else.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(MapEntity::Empty),
            '#' => Some(MapEntity::Wall),
            'J' => Some(MapEntity::Player),
            'M' => Some(MapEntity::Monster),
            'E' => Some(MapEntity::Exit),
            _ => None,
        }
    }

    /// The template character for this entity.
    pub fn as_char(self) -> char {
        match self {
            MapEntity::Empty => '.',
            MapEntity::Wall => '#',
            MapEntity::Player => 'J',
            MapEntity::Monster => 'M',
            MapEntity::Exit => 'E',
        }
    }

    /// `true` for cells the player may step into.
    pub fn is_walkable(self) -> bool {
        matches!(self, MapEntity::Empty | MapEntity::Player)
    }
}

impl fmt::Display for MapEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A `(row, col)` grid coordinate, 0-based from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// One step in `direction`, or `None` if that would leave the grid
    /// on the top or left side. The bottom and right edges are the
    /// maze's business, see [`Maze::contains`](crate::Maze::contains).
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (d_row, d_col) = direction.delta();
        Some(Position {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }

    /// Taxicab distance between two positions.
    pub fn manhattan(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the four moves a player can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, in neighbour-visiting order.
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// `(d_row, d_col)` for one step in this direction.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_entity_char_mapping() {
        for (ch, entity) in [
            ('.', MapEntity::Empty),
            ('#', MapEntity::Wall),
            ('J', MapEntity::Player),
            ('M', MapEntity::Monster),
            ('E', MapEntity::Exit),
        ] {
            assert_eq!(MapEntity::from_char(ch), Some(entity));
            assert_eq!(entity.as_char(), ch);
            assert_eq!(entity.to_string(), ch.to_string());
        }
    }

    #[test]
    fn test_map_entity_unknown_char_rejected() {
        assert_eq!(MapEntity::from_char(' '), None);
        assert_eq!(MapEntity::from_char('e'), None);
        assert_eq!(MapEntity::from_char('X'), None);
    }

    #[test]
    fn test_map_entity_walkable() {
        assert!(MapEntity::Empty.is_walkable());
        assert!(MapEntity::Player.is_walkable());
        assert!(!MapEntity::Wall.is_walkable());
        assert!(!MapEntity::Exit.is_walkable());
        assert!(!MapEntity::Monster.is_walkable());
    }

    #[test]
    fn test_position_step_deltas() {
        let p = Position::new(2, 2);
        assert_eq!(p.step(Direction::Up), Some(Position::new(1, 2)));
        assert_eq!(p.step(Direction::Down), Some(Position::new(3, 2)));
        assert_eq!(p.step(Direction::Left), Some(Position::new(2, 1)));
        assert_eq!(p.step(Direction::Right), Some(Position::new(2, 3)));
    }

    #[test]
    fn test_position_step_off_top_left_is_none() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::Up), None);
        assert_eq!(origin.step(Direction::Left), None);
    }

    #[test]
    fn test_position_manhattan() {
        let a = Position::new(3, 3);
        assert_eq!(a.manhattan(Position::new(1, 2)), 3);
        assert_eq!(a.manhattan(Position::new(6, 3)), 3);
        assert_eq!(a.manhattan(a), 0);
    }
}
