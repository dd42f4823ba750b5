// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
}

impl Cell {
    pub const BLANK: Cell = Cell { ch: ' ', fg: None };

    pub fn new(ch: char, fg: Option<Color>) -> Self {
        Self { ch, fg }
    }
}
