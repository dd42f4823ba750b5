// Copyright (c) 2026 rezky_nightky

use std::collections::TryReserveError;
use std::fmt;
use std::num::NonZeroU32;

use crate::glyph::{GlyphSource, Palette};
use crate::runtime::Direction;
use crate::screen::Viewport;

#[derive(Debug)]
pub struct GrowError {
    pub wanted: Viewport,
    source: TryReserveError,
}

impl fmt::Display for GrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to grow rain field to {}x{}",
            self.wanted.rows, self.wanted.cols
        )
    }
}

impl std::error::Error for GrowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// The rain buffer. Rows may be wider than the current viewport and there may
/// be more rows than it has; only the viewport-sized corner is live.
#[derive(Clone, Debug)]
pub struct Field {
    rows: Vec<Vec<char>>,
    view: Viewport,
    background: char,
}

impl Field {
    pub fn new(background: char) -> Self {
        Self {
            rows: Vec::new(),
            view: Viewport::default(),
            background,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.view
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, r: usize) -> Option<&[char]> {
        self.rows.get(r).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn get(&self, r: usize, c: usize) -> Option<char> {
        self.rows.get(r)?.get(c).copied()
    }

    #[cfg(test)]
    pub fn set(&mut self, r: usize, c: usize, g: char) {
        self.rows[r][c] = g;
    }

    /// Grows the buffer to cover `viewport`, padding with the background glyph.
    /// Never shrinks. Returns whether anything was allocated.
    pub fn resize(&mut self, viewport: Viewport) -> Result<bool, GrowError> {
        let want_rows = viewport.rows as usize;
        let want_cols = viewport.cols as usize;
        let oom = |source| GrowError {
            wanted: viewport,
            source,
        };
        let mut grew = false;

        if want_rows > self.rows.len() {
            self.rows
                .try_reserve_exact(want_rows - self.rows.len())
                .map_err(oom)?;
            while self.rows.len() < want_rows {
                let mut row = Vec::new();
                row.try_reserve_exact(want_cols).map_err(oom)?;
                row.resize(want_cols, self.background);
                self.rows.push(row);
            }
            grew = true;
        }

        for row in &mut self.rows {
            if row.len() < want_cols {
                row.try_reserve_exact(want_cols - row.len()).map_err(oom)?;
                row.resize(want_cols, self.background);
                grew = true;
            }
        }

        self.view = viewport;
        Ok(grew)
    }

    /// Moves every live cell one step in `direction` and respawns the leading
    /// edge from `source`.
    pub fn advance<G: GlyphSource + ?Sized>(
        &mut self,
        direction: Direction,
        density: NonZeroU32,
        palette: &Palette,
        source: &mut G,
    ) {
        let rows = (self.view.rows as usize).min(self.rows.len());
        let cols = self.view.cols as usize;
        if rows == 0 || cols == 0 {
            return;
        }

        let (dst, src, len) = direction.shift(cols);
        for r in (1..rows).rev() {
            let (above, below) = self.rows.split_at_mut(r);
            below[0][dst..dst + len].copy_from_slice(&above[r - 1][src..src + len]);
        }

        let top = &mut self.rows[0][..cols];
        top.fill(self.background);
        for cell in top.iter_mut() {
            *cell = source.pick(direction, density, palette);
        }

        if let Some(edge) = direction.entry_column(cols) {
            for row in &mut self.rows[..rows] {
                row[edge] = source.pick(direction, density, palette);
            }
        }
    }
}
