//! Maze templates: the hand-drawn grids mazes are generated from.
//!
//! A template file is a rectangular block of characters, one row per
//! line, drawn from `. # J M E`. Trailing whitespace on a line and blank
//! lines at the end of the file are ignored. Anything else that breaks
//! the rectangle is an error.

use std::path::Path;

use crate::{MapEntity, MazeError};

/// A parsed, rectangular template.
///
/// Templates are immutable once parsed and cheap to share: every `START`
/// builds a fresh [`Maze`](crate::Maze) from one, so no game ever
/// mutates a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    rows: Vec<Vec<MapEntity>>,
}

impl Template {
    /// Parses a template from text. `name` is only used in logs and
    /// error messages.
    ///
    /// # Errors
    /// - [`MazeError::InvalidChar`] for a character outside `. # J M E`
    /// - [`MazeError::RaggedRow`] if rows differ in length
    /// - [`MazeError::EmptyTemplate`] if there are no cells at all
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, MazeError> {
        let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        let mut rows = Vec::with_capacity(lines.len());
        for (row, line) in lines.iter().enumerate() {
            let cells = line
                .chars()
                .enumerate()
                .map(|(col, ch)| {
                    MapEntity::from_char(ch)
                        .ok_or(MazeError::InvalidChar { ch, row, col })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }

        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(MazeError::EmptyTemplate);
        }
        if let Some((row, cells)) =
            rows.iter().enumerate().find(|(_, r)| r.len() != width)
        {
            return Err(MazeError::RaggedRow {
                row,
                expected: width,
                found: cells.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            rows,
        })
    }

    /// Reads and parses a template file. The file stem becomes the
    /// template name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MazeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MazeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(name, &text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// The raw rows, exactly as drawn.
    pub fn rows(&self) -> &[Vec<MapEntity>] {
        &self.rows
    }
}
