// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;
use crate::screen::{Key, Screen, Viewport};

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width as usize * height as usize],
        }
    }
}

/// Raw-mode, alternate-screen crossterm terminal. Restores the shell on drop.
pub struct Terminal {
    stdout: Stdout,
    frame: Frame,
    last: Option<LastFrame>,
    run_buf: String,
    row_dirty: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        let (w, h) = terminal::size()?;
        Ok(Self {
            stdout: out,
            frame: Frame::new(w, h),
            last: None,
            run_buf: String::with_capacity(64),
            row_dirty: Vec::new(),
            touched_rows: Vec::new(),
        })
    }

    fn set_fg(&mut self, cur: &mut Option<Color>, fg: Option<Color>) -> Result<()> {
        if *cur != fg {
            self.stdout
                .queue(SetForegroundColor(fg.unwrap_or(Color::Reset)))?;
            *cur = fg;
        }
        Ok(())
    }

    fn draw_full(&mut self) -> Result<()> {
        let mut cur_fg: Option<Color> = None;
        let (width, height) = (self.frame.width, self.frame.height);

        let needs_new_last = self
            .last
            .as_ref()
            .map(|l| l.width != width || l.height != height)
            .unwrap_or(true);
        if needs_new_last {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(LastFrame::new(width, height));
        }

        for y in 0..height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            for x in 0..width {
                let idx = y as usize * width as usize + x as usize;
                let cell = self.frame.cell_at_index(idx);
                self.set_fg(&mut cur_fg, cell.fg)?;
                self.stdout.queue(Print(cell.ch))?;
                if let Some(last) = self.last.as_mut() {
                    last.cells[idx] = cell;
                }
            }
        }
        Ok(())
    }

    fn draw_dirty(&mut self) -> Result<()> {
        let mut cur_fg: Option<Color> = None;
        let mut cur_pos: Option<(u16, u16)> = None;
        let width = self.frame.width;
        let height = self.frame.height;
        let width_usize = width as usize;

        if self.row_dirty.len() != height as usize {
            self.row_dirty = vec![Vec::new(); height as usize];
        }
        for r in &mut self.row_dirty {
            r.clear();
        }
        self.touched_rows.clear();

        for &idx in self.frame.dirty_indices() {
            let y = (idx / width_usize) as u16;
            if y >= height {
                continue;
            }
            let b = &mut self.row_dirty[y as usize];
            if b.is_empty() {
                self.touched_rows.push(y);
            }
            b.push(idx);
        }
        self.touched_rows.sort_unstable();

        let touched = std::mem::take(&mut self.touched_rows);
        for &y0 in &touched {
            let mut b = std::mem::take(&mut self.row_dirty[y0 as usize]);
            b.sort_unstable();

            let mut i = 0usize;
            while i < b.len() {
                let idx0 = b[i];
                let cell0 = self.frame.cell_at_index(idx0);
                let Some(last) = self.last.as_mut() else {
                    return Ok(());
                };
                if last.cells.get(idx0).copied() == Some(cell0) {
                    i += 1;
                    continue;
                }
                last.cells[idx0] = cell0;

                self.run_buf.clear();
                self.run_buf.push(cell0.ch);
                let mut run_len: u16 = 1;
                let mut last_idx_in_run = idx0;
                let mut j = i + 1;

                while j < b.len() {
                    let idx1 = b[j];
                    if idx1 != last_idx_in_run + 1 {
                        break;
                    }
                    let cell1 = self.frame.cell_at_index(idx1);
                    if last.cells.get(idx1).copied() == Some(cell1) || cell1.fg != cell0.fg {
                        break;
                    }
                    self.run_buf.push(cell1.ch);
                    last.cells[idx1] = cell1;
                    run_len = run_len.saturating_add(1);
                    last_idx_in_run = idx1;
                    j += 1;
                }

                let x0 = (idx0 % width_usize) as u16;
                if cur_pos != Some((x0, y0)) {
                    self.stdout.queue(cursor::MoveTo(x0, y0))?;
                }
                self.set_fg(&mut cur_fg, cell0.fg)?;
                self.stdout.queue(Print(self.run_buf.as_str()))?;

                let next_x = x0.saturating_add(run_len);
                cur_pos = (next_x < width).then_some((next_x, y0));
                i = j;
            }
            b.clear();
            self.row_dirty[y0 as usize] = b;
        }
        self.touched_rows = touched;
        Ok(())
    }
}

fn key_from_event(ev: Event) -> Key {
    match ev {
        Event::Resize(..) => Key::Resize,
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Key::Quit,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Key::Quit,
            _ => Key::Other,
        },
        _ => Key::Other,
    }
}

impl Screen for Terminal {
    fn viewport(&mut self) -> Result<Viewport> {
        let (w, h) = terminal::size()?;
        if w != self.frame.width || h != self.frame.height {
            self.frame = Frame::new(w, h);
        }
        Ok(Viewport::new(h, w))
    }

    fn draw_cell(&mut self, row: u16, col: u16, glyph: char, fg: Option<Color>) {
        self.frame.set(col, row, Cell::new(glyph, fg));
    }

    fn clear(&mut self) {
        self.frame.clear();
    }

    fn present(&mut self) -> Result<()> {
        self.frame.settle();
        let total = self.frame.width as usize * self.frame.height as usize;
        let dirty_is_large = total > 0 && self.frame.dirty_indices().len() >= total / 3;
        if self.last.is_none() || self.frame.is_dirty_all() || dirty_is_large {
            self.draw_full()?;
        } else {
            self.draw_dirty()?;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        self.frame.clear_dirty();
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(Some(key_from_event(event::read()?)))
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.execute(SetAttribute(Attribute::Reset));
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
