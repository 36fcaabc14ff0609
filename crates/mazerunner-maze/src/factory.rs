//! Turning templates into playable mazes.
//!
//! [`MazeFactory`] places the player and the monster on one template.
//! [`TemplateCatalog`] holds every template the server knows and picks
//! one at random per game.
//!
//! Randomness is a parameter (`R: Rng`), so production code passes
//! `rand::rng()` while tests pass a seeded `StdRng` and get the same maze
//! every run.

use std::path::Path;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::{Maze, MazeError, Position, Template};

/// How far (Manhattan, and at most that many moves) the monster starts
/// from the player.
pub const MONSTER_DISTANCE: usize = 3;

/// The player starts strictly more than this many moves from every exit.
pub const MIN_EXIT_DISTANCE: usize = 2;

// ---------------------------------------------------------------------------
// MazeFactory
// ---------------------------------------------------------------------------

/// Builds mazes with a fair player and monster placement.
///
/// 1. Every empty cell more than [`MIN_EXIT_DISTANCE`] moves from the
///    nearest exit is a player candidate. One is picked uniformly.
/// 2. Every cell within [`MONSTER_DISTANCE`] moves of the player, at
///    exactly that Manhattan distance, that does not cut the player off
///    from all exits, is a monster candidate. One is picked uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct MazeFactory;

impl MazeFactory {
    /// Loads the template at `path` and generates a maze from it.
    ///
    /// # Errors
    /// Load errors from [`Template::load`], or a generation failure from
    /// [`generate`](Self::generate).
    pub fn build<R: Rng + ?Sized>(
        path: impl AsRef<Path>,
        rng: &mut R,
    ) -> Result<Maze, MazeError> {
        let template = Template::load(path)?;
        Self::generate(&template, rng)
    }

    /// Generates a maze from an already parsed template.
    ///
    /// # Errors
    /// - [`MazeError::NoPlayerCandidates`] if no cell is far enough from
    ///   the exits
    /// - [`MazeError::NoMonsterCandidates`] if every monster spot would be
    ///   unfair (or there is none)
    pub fn generate<R: Rng + ?Sized>(
        template: &Template,
        rng: &mut R,
    ) -> Result<Maze, MazeError> {
        let mut maze = Maze::from_template(template);

        let player = *maze
            .reachable_from_exits()
            .choose(rng)
            .ok_or_else(|| MazeError::NoPlayerCandidates(template.name().to_string()))?;
        maze.place_player(player);

        let monster_candidates: Vec<Position> = maze
            .reachable_from_player_within(MONSTER_DISTANCE)
            .into_iter()
            .filter(|&p| maze.exit_still_reachable_if_blocked(p))
            .collect();
        let monster = *monster_candidates
            .choose(rng)
            .ok_or_else(|| MazeError::NoMonsterCandidates(template.name().to_string()))?;
        maze.place_monster(monster);

        tracing::debug!(
            template = template.name(),
            %player,
            %monster,
            "maze generated"
        );
        Ok(maze)
    }
}

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// Every template the server can start a game from.
///
/// Loaded once at startup and shared read-only by all sessions.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Wraps an explicit list of templates.
    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Loads every `*.txt` file in `dir`, in file-name order.
    ///
    /// # Errors
    /// Any unreadable or malformed template aborts the load.
    /// [`MazeError::EmptyCatalog`] if the directory has no templates.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, MazeError> {
        let dir = dir.as_ref();
        let io_err = |source| MazeError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(MazeError::EmptyCatalog(dir.to_path_buf()));
        }

        let templates = paths
            .iter()
            .map(Template::load)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(dir = %dir.display(), count = templates.len(), "map templates loaded");
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Generates a maze from a uniformly chosen template.
    ///
    /// If generation fails on the chosen template, the remaining ones are
    /// tried in random order. The last failure is returned if none works.
    ///
    /// # Errors
    /// The last generation failure, or [`MazeError::EmptyCatalog`] for a
    /// catalog with no templates.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Maze, MazeError> {
        let mut order: Vec<&Template> = self.templates.iter().collect();
        order.shuffle(rng);

        let mut last_err = MazeError::EmptyCatalog(Default::default());
        for template in order {
            match MazeFactory::generate(template, rng) {
                Ok(maze) => return Ok(maze),
                Err(e) => {
                    tracing::warn!(template = template.name(), error = %e, "generation failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}
