// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;

/// Off-screen cell grid. Remembers which cells changed since the last
/// `clear_dirty` so presentation can skip the rest.
///
/// `clear` is deferred: it only starts a new generation. Cells drawn again
/// are compared with what they held last tick, and `settle` blanks the ones
/// nobody drew.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    gen: u32,
    cell_gen: Vec<u32>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        let gen = 1u32;
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; len],
            gen,
            cell_gen: vec![gen; len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(Cell::BLANK)
    }

    fn mark(&mut self, i: usize) {
        if !self.dirty_all && self.dirty_map.get(i).copied() == Some(false) {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    pub fn clear(&mut self) {
        self.gen = self.gen.wrapping_add(1);
        if self.gen == 0 {
            self.cell_gen.fill(0);
            self.gen = 1;
        }
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cell_gen[i] = self.gen;
            if self.cells[i] == cell {
                return;
            }
            self.cells[i] = cell;
            self.mark(i);
        }
    }

    /// Blanks cells not drawn since the last `clear`. Only cells that held
    /// something become dirty.
    pub fn settle(&mut self) {
        for i in 0..self.cells.len() {
            if self.cell_gen[i] == self.gen {
                continue;
            }
            self.cell_gen[i] = self.gen;
            if self.cells[i] != Cell::BLANK {
                self.cells[i] = Cell::BLANK;
                self.mark(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::style::Color;

    use super::*;

    #[test]
    fn new_frame_is_fully_dirty_until_cleared() {
        let mut f = Frame::new(3, 2);
        assert!(f.is_dirty_all());
        f.set(1, 1, Cell::new('x', None));
        assert!(f.dirty_indices().is_empty());
        f.clear_dirty();
        assert!(!f.is_dirty_all());
    }

    #[test]
    fn set_tracks_only_real_changes() {
        let mut f = Frame::new(3, 2);
        f.clear_dirty();
        f.set(0, 0, Cell::BLANK);
        assert!(f.dirty_indices().is_empty());
        f.set(2, 1, Cell::new('x', None));
        f.set(2, 1, Cell::new('y', None));
        assert_eq!(f.dirty_indices(), &[5]);
        assert_eq!(f.get(2, 1).unwrap().ch, 'y');
    }

    #[test]
    fn settle_blanks_undrawn_cells_and_marks_only_touched_ones() {
        let mut f = Frame::new(2, 2);
        f.set(0, 0, Cell::new('x', None));
        f.set(1, 0, Cell::new('y', None));
        f.clear_dirty();

        f.clear();
        f.set(1, 0, Cell::new('y', None));
        f.settle();
        assert_eq!(f.get(0, 0).unwrap().ch, ' ');
        assert_eq!(f.get(1, 0).unwrap().ch, 'y');
        assert_eq!(f.dirty_indices(), &[0]);
    }

    #[test]
    fn unchanged_coloured_redraw_leaves_nothing_dirty() {
        let fg = Some(Color::AnsiValue(6));
        let mut f = Frame::new(10, 4);
        let fill = |f: &mut Frame| {
            for y in 0..4 {
                for x in 0..10 {
                    f.set(x, y, Cell::new(' ', fg));
                }
            }
        };
        fill(&mut f);
        f.clear_dirty();

        f.clear();
        fill(&mut f);
        f.settle();
        assert!(f.dirty_indices().is_empty());
        assert_eq!(f.get(3, 2).unwrap().fg, fg);
    }

    #[test]
    fn generation_wrap_still_blanks_undrawn_cells() {
        let mut f = Frame::new(2, 1);
        f.set(0, 0, Cell::new('x', None));
        f.clear_dirty();
        f.gen = u32::MAX;
        f.cell_gen.fill(u32::MAX);

        f.clear();
        f.settle();
        assert_eq!(f.get(0, 0).unwrap().ch, ' ');
        assert_eq!(f.dirty_indices(), &[0]);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut f = Frame::new(2, 2);
        f.clear_dirty();
        f.set(2, 0, Cell::new('x', None));
        f.set(0, 2, Cell::new('x', None));
        assert!(f.dirty_indices().is_empty());
        assert!(f.get(2, 0).is_none());
    }
}
