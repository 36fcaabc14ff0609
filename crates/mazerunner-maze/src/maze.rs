//! The maze grid, its reachability queries, and player movement.
//!
//! # Reachability
//!
//! Everything interesting about placement is a breadth-first search over
//! the grid, moving between 4-neighbours through any cell that is not a
//! [`MapEntity::Wall`]:
//!
//! - From **every exit at once** (multi-source), to find how far each cell
//!   is from its nearest exit. The player must start more than two moves
//!   from freedom.
//! - From **the player**, to find the cells a monster could occupy, and
//!   again with one candidate cell treated as a wall, to check that the
//!   monster never seals the player in.
//!
//! The searches never write to the grid. "Treat this cell as a wall" is a
//! parameter of the search, so the fairness check cannot leave a stray
//! wall behind.

use std::collections::VecDeque;
use std::fmt;

use crate::{Direction, MapEntity, MazeError, Position, Template, MIN_EXIT_DISTANCE};

// ---------------------------------------------------------------------------
// Distances
// ---------------------------------------------------------------------------

/// BFS hop counts for every cell of a maze. `None` means unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distances {
    width: usize,
    hops: Vec<Option<usize>>,
}

impl Distances {
    /// Hop count to `pos`, or `None` if it was never reached (or is
    /// outside the grid).
    pub fn get(&self, pos: Position) -> Option<usize> {
        if pos.col >= self.width {
            return None;
        }
        self.hops.get(pos.row * self.width + pos.col).copied().flatten()
    }

    /// Every reached cell with its hop count, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, usize)> + '_ {
        let width = self.width;
        self.hops.iter().enumerate().filter_map(move |(i, d)| {
            d.map(|d| (Position::new(i / width, i % width), d))
        })
    }
}

// ---------------------------------------------------------------------------
// MoveOutcome
// ---------------------------------------------------------------------------

/// What happened when the player tried to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The player moved to the given cell.
    Moved(Position),
    /// The destination was in bounds but not walkable. The player did not
    /// move; the entity says why (wall, exit, monster).
    Blocked(MapEntity),
    /// The destination is outside the grid. With exits and walls on every
    /// border cell this cannot happen in a generated maze.
    OutOfBounds,
}

// ---------------------------------------------------------------------------
// Maze
// ---------------------------------------------------------------------------

/// One game's grid plus the positions of the player and the monster.
///
/// A `Maze` is created from a [`Template`] with nobody placed; the
/// [`MazeFactory`](crate::MazeFactory) then places the player and the
/// monster. Each session owns its maze exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    grid: Vec<Vec<MapEntity>>,
    height: usize,
    width: usize,
    player: Option<Position>,
    monster: Option<Position>,
}

impl Maze {
    /// Builds an unplaced maze from a template.
    ///
    /// Any `J` or `M` drawn in the template is cleared to `Empty` (the
    /// factory decides where they go), then every `Empty` cell on the
    /// border becomes an `Exit`.
    pub fn from_template(template: &Template) -> Self {
        let height = template.height();
        let width = template.width();
        let grid = template
            .rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, &cell)| {
                        let cell = match cell {
                            MapEntity::Player | MapEntity::Monster => MapEntity::Empty,
                            other => other,
                        };
                        let on_border =
                            row == 0 || col == 0 || row == height - 1 || col == width - 1;
                        if cell == MapEntity::Empty && on_border {
                            MapEntity::Exit
                        } else {
                            cell
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            grid,
            height,
            width,
            player: None,
            monster: None,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Current player position, once placed.
    pub fn player_position(&self) -> Option<Position> {
        self.player
    }

    /// Current monster position, once placed.
    pub fn monster_position(&self) -> Option<Position> {
        self.monster
    }

    /// `true` if `pos` lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    /// The entity at `pos`, or `None` outside the grid.
    pub fn entity_at(&self, pos: Position) -> Option<MapEntity> {
        self.grid.get(pos.row)?.get(pos.col).copied()
    }

    /// Overwrites one cell and returns what was there, or `None` (and
    /// does nothing) outside the grid.
    ///
    /// This is a raw accessor: it does not move the recorded player or
    /// monster position. Use [`place_player`](Self::place_player) and
    /// [`place_monster`](Self::place_monster) for that.
    pub fn set_entity(&mut self, pos: Position, entity: MapEntity) -> Option<MapEntity> {
        let cell = self.grid.get_mut(pos.row)?.get_mut(pos.col)?;
        Some(std::mem::replace(cell, entity))
    }

    /// Puts the player at `pos`, clearing the previous player cell.
    ///
    /// Returns `false` and leaves the maze untouched if `pos` is outside
    /// the grid.
    pub fn place_player(&mut self, pos: Position) -> bool {
        if !self.contains(pos) {
            return false;
        }
        if let Some(old) = self.player.replace(pos) {
            self.set_entity(old, MapEntity::Empty);
        }
        self.set_entity(pos, MapEntity::Player);
        true
    }

    /// Puts the monster at `pos`, clearing the previous monster cell.
    ///
    /// Returns `false` and leaves the maze untouched if `pos` is outside
    /// the grid.
    pub fn place_monster(&mut self, pos: Position) -> bool {
        if !self.contains(pos) {
            return false;
        }
        if let Some(old) = self.monster.replace(pos) {
            self.set_entity(old, MapEntity::Empty);
        }
        self.set_entity(pos, MapEntity::Monster);
        true
    }

    /// Every position in the grid, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Position::new(row, col)))
    }

    /// The in-bounds cell one step from `pos`.
    fn neighbour(&self, pos: Position, direction: Direction) -> Option<Position> {
        pos.step(direction).filter(|&p| self.contains(p))
    }

    // -----------------------------------------------------------------------
    // Reachability
    // -----------------------------------------------------------------------

    /// Breadth-first search from `sources`, through non-wall cells.
    /// `blocked`, if given, is treated as a wall for this search only.
    fn bfs(
        &self,
        sources: impl IntoIterator<Item = Position>,
        blocked: Option<Position>,
    ) -> Distances {
        let mut hops = vec![None; self.height * self.width];
        let index = |p: Position| p.row * self.width + p.col;
        let passable = |p: Position| {
            Some(p) != blocked && self.entity_at(p).is_some_and(|e| e != MapEntity::Wall)
        };

        let mut queue = VecDeque::new();
        for source in sources {
            if self.contains(source) && hops[index(source)].is_none() {
                hops[index(source)] = Some(0);
                queue.push_back(source);
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(d) = hops[index(current)] else {
                continue;
            };
            for direction in Direction::ALL {
                let Some(next) = self.neighbour(current, direction) else {
                    continue;
                };
                if hops[index(next)].is_none() && passable(next) {
                    hops[index(next)] = Some(d + 1);
                    queue.push_back(next);
                }
            }
        }

        Distances {
            width: self.width,
            hops,
        }
    }

    /// Hop distance from every cell to its nearest exit.
    pub fn exit_distances(&self) -> Distances {
        let exits = self
            .positions()
            .filter(|&p| self.entity_at(p) == Some(MapEntity::Exit));
        self.bfs(exits, None)
    }

    /// Empty cells at least three moves from every exit. These are the
    /// legal player starts.
    pub fn reachable_from_exits(&self) -> Vec<Position> {
        self.exit_distances()
            .iter()
            .filter(|&(p, d)| d > MIN_EXIT_DISTANCE && self.entity_at(p) == Some(MapEntity::Empty))
            .map(|(p, _)| p)
            .collect()
    }

    /// Cells the player can reach in at most `k` moves that also sit at
    /// Manhattan distance exactly `k`, excluding walls, exits and the
    /// player's own cell. These are the monster's possible positions
    /// before the fairness check.
    ///
    /// Empty if no player has been placed.
    pub fn reachable_from_player_within(&self, k: usize) -> Vec<Position> {
        let Some(player) = self.player else {
            return Vec::new();
        };
        self.bfs([player], None)
            .iter()
            .filter(|&(p, d)| d <= k && player.manhattan(p) == k)
            .filter(|&(p, _)| {
                !matches!(
                    self.entity_at(p),
                    Some(MapEntity::Wall | MapEntity::Exit | MapEntity::Player) | None
                )
            })
            .map(|(p, _)| p)
            .collect()
    }

    /// `true` if the player could still reach some exit with `candidate`
    /// walled off.
    ///
    /// The grid is not modified. Returns `false` if no player is placed.
    pub fn exit_still_reachable_if_blocked(&self, candidate: Position) -> bool {
        let Some(player) = self.player else {
            return false;
        };
        let distances = self.bfs([player], Some(candidate));
        self.positions().any(|p| {
            self.entity_at(p) == Some(MapEntity::Exit) && distances.get(p).is_some()
        })
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// `true` iff the cell one step from the player is in bounds and
    /// walkable (`Empty`, or the player's own cell).
    pub fn is_move_possible(&self, direction: Direction) -> bool {
        self.player
            .and_then(|p| self.neighbour(p, direction))
            .and_then(|p| self.entity_at(p))
            .is_some_and(MapEntity::is_walkable)
    }

    /// Attempts to move the player one step.
    ///
    /// On success the old cell becomes `Empty` and the new one `Player`.
    /// Otherwise the grid is untouched.
    ///
    /// # Errors
    /// [`MazeError::PlayerNotPlaced`] if there is no player to move.
    pub fn try_move(&mut self, direction: Direction) -> Result<MoveOutcome, MazeError> {
        let player = self.player.ok_or(MazeError::PlayerNotPlaced)?;
        let Some(dest) = self.neighbour(player, direction) else {
            return Ok(MoveOutcome::OutOfBounds);
        };
        let Some(entity) = self.entity_at(dest) else {
            return Ok(MoveOutcome::OutOfBounds);
        };
        if !entity.is_walkable() {
            return Ok(MoveOutcome::Blocked(entity));
        }

        self.place_player(dest);
        Ok(MoveOutcome::Moved(dest))
    }
}

/// Renders the grid in template characters, one row per line.
impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.grid.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{cell}")?;
            }
        }
        Ok(())
    }
}
