// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::config::Settings;
use crate::field::Field;
use crate::screen::Screen;

pub const PUDDLE: char = '-';
pub const SPLASH: char = '#';

/// Projects the live part of a `Field` onto a `Screen`. The bottom row is
/// never drawn raw: it shows a puddle where nothing is falling and a splash
/// where something is.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    background: char,
    fg: Option<Color>,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            background: settings.palette.background(),
            fg: settings.color.fg(),
        }
    }

    pub fn bottom_glyph(&self, g: char) -> char {
        if g == self.background {
            PUDDLE
        } else {
            SPLASH
        }
    }

    pub fn render<S: Screen + ?Sized>(&self, field: &Field, screen: &mut S) {
        let view = field.viewport();
        if view.is_empty() {
            return;
        }
        let cols = view.cols as usize;
        let last = view.rows - 1;

        for r in 0..last {
            if let Some(row) = field.row(r as usize) {
                screen.draw_row(r, &row[..cols], self.fg);
            }
        }

        if let Some(row) = field.row(last as usize) {
            for (c, &g) in row[..cols].iter().enumerate() {
                screen.draw_cell(last, c as u16, self.bottom_glyph(g), self.fg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::config::Args;
    use crate::runtime::ColorMode;
    use crate::screen::{mock::MockScreen, Viewport};

    fn settings(argv: &[&str]) -> Settings {
        Args::try_parse_from(std::iter::once("drizzle").chain(argv.iter().copied()))
            .unwrap()
            .resolve(&mut StdRng::seed_from_u64(0), true)
            .unwrap()
    }

    fn field(rows: &[&str]) -> Field {
        let mut f = Field::new(' ');
        let cols = rows[0].chars().count() as u16;
        f.resize(Viewport::new(rows.len() as u16, cols)).unwrap();
        for (r, s) in rows.iter().enumerate() {
            for (c, g) in s.chars().enumerate() {
                f.set(r, c, g);
            }
        }
        f
    }

    #[test]
    fn rows_above_bottom_are_verbatim() {
        let f = field(&[".|: ", " '\\/", "    "]);
        let mut screen = MockScreen::new(3, 4);
        Renderer::new(&settings(&["-d", "down"])).render(&f, &mut screen);
        assert_eq!(screen.row_string(0), ".|: ");
        assert_eq!(screen.row_string(1), " '\\/");
    }

    #[test]
    fn bottom_row_is_puddle_or_splash_only() {
        let f = field(&["    ", " .|:"]);
        let mut screen = MockScreen::new(2, 4);
        Renderer::new(&settings(&[])).render(&f, &mut screen);
        assert_eq!(screen.row_string(1), "-###");
    }

    #[test]
    fn bottom_mapping_follows_palette_background() {
        let r = Renderer::new(&settings(&["-p", "x."]));
        assert_eq!(r.bottom_glyph('x'), PUDDLE);
        assert_eq!(r.bottom_glyph(' '), SPLASH);
        assert_eq!(r.bottom_glyph('.'), SPLASH);
    }

    #[test]
    fn only_viewport_columns_are_drawn_after_shrink() {
        let mut f = field(&["abcdef", "ghijkl", "mnopqr"]);
        f.resize(Viewport::new(2, 3)).unwrap();
        let mut screen = MockScreen::new(2, 3);
        Renderer::new(&settings(&[])).render(&f, &mut screen);
        assert_eq!(screen.row_string(0), "abc");
        assert_eq!(screen.row_string(1), "###");
    }

    #[test]
    fn colour_follows_settings_and_render_is_read_only() {
        let f = field(&[" .", "  "]);
        let before = f.clone();

        let mut screen = MockScreen::new(2, 2);
        Renderer::new(&settings(&["-c", "6"])).render(&f, &mut screen);
        assert_eq!(screen.colors[0][1], ColorMode::Ansi(6).fg());

        let mut screen = MockScreen::new(2, 2);
        Renderer::new(&settings(&["-m"])).render(&f, &mut screen);
        assert_eq!(screen.colors[0][1], None);

        for r in 0..2 {
            assert_eq!(f.row(r), before.row(r));
        }
    }

    #[test]
    fn empty_field_draws_nothing() {
        let f = Field::new(' ');
        let mut screen = MockScreen::new(0, 0);
        Renderer::new(&settings(&[])).render(&f, &mut screen);
        assert!(screen.cells.is_empty());
    }
}
