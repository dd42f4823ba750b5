// Copyright (c) 2026 rezky_nightky

use rand::Rng;

/// Direction the rain falls in. Fixed for the lifetime of a run.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    #[value(name = "down", alias = "1")]
    Down,
    #[value(name = "down-right", alias = "2")]
    DownRight,
    #[value(name = "down-left", alias = "3")]
    DownLeft,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Down, Direction::DownRight, Direction::DownLeft];

    /// Random direction whose streak glyph differs from `background`. The
    /// streaks are distinct, so at least two directions always qualify.
    pub fn random_unlike<R: Rng + ?Sized>(rng: &mut R, background: char) -> Self {
        let options: Vec<Direction> = Self::ALL
            .into_iter()
            .filter(|d| d.streak() != background)
            .collect();
        options[rng.random_range(0..options.len())]
    }

    /// Glyph standing in for a droplet that drew the background slot.
    /// Slants follow the path a drop traces across the screen.
    pub fn streak(self) -> char {
        match self {
            Direction::Down => '|',
            Direction::DownRight => '\\',
            Direction::DownLeft => '/',
        }
    }

    /// `(dest offset, src offset, len)` for shifting one row into the next.
    pub fn shift(self, cols: usize) -> (usize, usize, usize) {
        match self {
            Direction::Down => (0, 0, cols),
            Direction::DownRight => (1, 0, cols.saturating_sub(1)),
            Direction::DownLeft => (0, 1, cols.saturating_sub(1)),
        }
    }

    /// Side column that rain enters through, if any.
    pub fn entry_column(self, cols: usize) -> Option<usize> {
        match self {
            Direction::Down => None,
            Direction::DownRight => Some(0),
            Direction::DownLeft => cols.checked_sub(1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::DownRight => "down-right",
            Direction::DownLeft => "down-left",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Ansi(u8),
}

impl ColorMode {
    pub fn fg(self) -> Option<crossterm::style::Color> {
        match self {
            ColorMode::Mono => None,
            ColorMode::Ansi(v) => Some(crossterm::style::Color::AnsiValue(v)),
        }
    }
}
