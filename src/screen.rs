// Copyright (c) 2026 rezky_nightky

use std::io::Result;
use std::time::Duration;

use crossterm::style::Color;

/// Visible terminal dimensions, in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub rows: u16,
    pub cols: u16,
}

impl Viewport {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Quit,
    Resize,
    Other,
}

/// What the drive loop needs from a terminal.
pub trait Screen {
    /// Current size. Implementations may resync internal buffers here.
    fn viewport(&mut self) -> Result<Viewport>;

    fn draw_cell(&mut self, row: u16, col: u16, glyph: char, fg: Option<Color>);

    fn draw_row(&mut self, row: u16, glyphs: &[char], fg: Option<Color>) {
        for (col, &g) in glyphs.iter().enumerate() {
            let Ok(col) = u16::try_from(col) else {
                break;
            };
            self.draw_cell(row, col, g, fg);
        }
    }

    fn clear(&mut self);

    fn present(&mut self) -> Result<()>;

    /// Blocks for at most `timeout`; `None` if nothing arrived.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;

    use super::*;

    /// In-memory screen that records what was drawn.
    pub struct MockScreen {
        pub viewports: VecDeque<Viewport>,
        pub current: Viewport,
        pub cells: Vec<Vec<char>>,
        pub colors: Vec<Vec<Option<Color>>>,
        pub keys: VecDeque<Option<Key>>,
        pub presented: usize,
        pub clears: usize,
        pub polls: Vec<Duration>,
    }

    impl MockScreen {
        pub fn new(rows: u16, cols: u16) -> Self {
            let v = Viewport::new(rows, cols);
            Self {
                viewports: VecDeque::new(),
                current: v,
                cells: vec![vec![' '; cols as usize]; rows as usize],
                colors: vec![vec![None; cols as usize]; rows as usize],
                keys: VecDeque::new(),
                presented: 0,
                clears: 0,
                polls: Vec::new(),
            }
        }

        pub fn row_string(&self, row: usize) -> String {
            self.cells[row].iter().collect()
        }

        fn fit(&mut self) {
            let rows = self.current.rows as usize;
            let cols = self.current.cols as usize;
            self.cells.resize(rows, Vec::new());
            self.colors.resize(rows, Vec::new());
            for r in &mut self.cells {
                r.resize(cols, ' ');
            }
            for r in &mut self.colors {
                r.resize(cols, None);
            }
        }
    }

    impl Screen for MockScreen {
        fn viewport(&mut self) -> Result<Viewport> {
            Ok(self.current)
        }

        fn draw_cell(&mut self, row: u16, col: u16, glyph: char, fg: Option<Color>) {
            let (r, c) = (row as usize, col as usize);
            assert!(
                r < self.cells.len() && c < self.cells[r].len(),
                "draw outside viewport at ({row}, {col})"
            );
            self.cells[r][c] = glyph;
            self.colors[r][c] = fg;
        }

        fn clear(&mut self) {
            self.clears += 1;
            for r in &mut self.cells {
                r.fill(' ');
            }
            for r in &mut self.colors {
                r.fill(None);
            }
        }

        fn present(&mut self) -> Result<()> {
            self.presented += 1;
            Ok(())
        }

        fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
            self.polls.push(timeout);
            let key = self.keys.pop_front().unwrap_or(Some(Key::Quit));
            if let Some(v) = self.viewports.pop_front() {
                self.current = v;
                self.fit();
            }
            Ok(key)
        }
    }
}
