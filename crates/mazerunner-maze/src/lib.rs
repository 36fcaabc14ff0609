//! Maze model and generation for the maze runner server.
//!
//! - **Entities** ([`MapEntity`], [`Position`], [`Direction`]): what a
//!   cell holds, where it is, and how the player moves between cells.
//! - **Templates** ([`Template`]): hand-drawn grids loaded from disk.
//! - **Maze** ([`Maze`]): one game's grid with reachability queries
//!   and movement.
//! - **Generation** ([`MazeFactory`], [`TemplateCatalog`]): fair
//!   placement of the player and the monster.
//!
//! This crate knows nothing about connections or wire formats. It is
//! plain synchronous code; the session layer calls into it.

mod entity;
mod error;
mod factory;
mod maze;
mod template;

pub use entity::{Direction, MapEntity, Position};
pub use error::MazeError;
pub use factory::{MazeFactory, TemplateCatalog, MIN_EXIT_DISTANCE, MONSTER_DISTANCE};
pub use maze::{Distances, Maze, MoveOutcome};
pub use template::Template;
