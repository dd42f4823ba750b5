// Copyright (c) 2026 rezky_nightky

use std::num::NonZeroU32;

use rand::Rng;

use crate::config::ConfigError;
use crate::runtime::Direction;

pub const DEFAULT_PALETTE: &str = " .':";

/// Ordered glyph set. Index 0 is the background glyph, drawn as empty space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    glyphs: Vec<char>,
}

impl Palette {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let glyphs: Vec<char> = s.chars().collect();
        if glyphs.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if let Some(&bad) = glyphs.iter().find(|c| c.is_control()) {
            return Err(ConfigError::ControlGlyph(bad));
        }
        Ok(Self { glyphs })
    }

    pub fn background(&self) -> char {
        self.glyphs[0]
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    #[cfg(test)]
    pub fn droplets(&self) -> &[char] {
        &self.glyphs[1..]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_PALETTE.chars().collect(),
        }
    }
}

/// Produces the glyph for one freshly spawned leading-edge cell.
///
/// A droplet is never the background as long as `direction`'s streak differs
/// from the palette background; `Args::resolve` enforces that.
pub trait GlyphSource {
    fn pick(&mut self, direction: Direction, density: NonZeroU32, palette: &Palette) -> char;
}

pub struct Generator<R> {
    rng: R,
}

impl<R: Rng> Generator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> GlyphSource for Generator<R> {
    fn pick(&mut self, direction: Direction, density: NonZeroU32, palette: &Palette) -> char {
        let bg = palette.background();
        if self.rng.random_range(0..density.get()) != 0 {
            return bg;
        }

        let all = palette.glyphs();
        let g = all[self.rng.random_range(0..all.len())];
        if g == bg {
            direction.streak()
        } else {
            g
        }
    }
}

/// Replays a fixed glyph sequence, cycling when exhausted.
#[cfg(test)]
pub struct Sequence {
    glyphs: Vec<char>,
    pub calls: usize,
}

#[cfg(test)]
impl Sequence {
    pub fn new(s: &str) -> Self {
        Self {
            glyphs: s.chars().collect(),
            calls: 0,
        }
    }
}

#[cfg(test)]
impl GlyphSource for Sequence {
    fn pick(&mut self, _: Direction, _: NonZeroU32, _: &Palette) -> char {
        let g = self.glyphs[self.calls % self.glyphs.len()];
        self.calls += 1;
        g
    }
}
