// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Settings;
use crate::field::Field;
use crate::glyph::GlyphSource;
use crate::render::Renderer;
use crate::screen::{Key, Screen, Viewport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub grows: u64,
    pub buffer_rows: usize,
    pub last_viewport: Viewport,
    pub elapsed: Duration,
}

/// Runs the rain until a quit key or the configured duration. The field lives
/// only for the duration of this call.
pub fn run<S, G>(screen: &mut S, settings: &Settings, source: &mut G) -> Result<RunStats>
where
    S: Screen + ?Sized,
    G: GlyphSource + ?Sized,
{
    let start = Instant::now();
    let end = settings.duration.map(|d| start + d);
    let renderer = Renderer::new(settings);
    let mut field = Field::new(settings.palette.background());
    let mut stats = RunStats::default();

    loop {
        let view = screen.viewport().context("failed to query terminal size")?;
        if field.resize(view)? {
            stats.grows += 1;
            debug!(
                rows = view.rows,
                cols = view.cols,
                buffer_rows = field.row_count(),
                "rain field grown"
            );
        }

        field.advance(
            settings.direction,
            settings.density,
            &settings.palette,
            source,
        );
        renderer.render(&field, screen);
        screen.present().context("failed to draw frame")?;
        stats.ticks += 1;

        let mut timeout = settings.tick;
        if let Some(end) = end {
            let now = Instant::now();
            if now >= end {
                info!(ticks = stats.ticks, "duration elapsed");
                break;
            }
            timeout = timeout.min(end - now);
        }

        let key = screen.poll_key(timeout).context("failed to read input")?;
        if key == Some(Key::Quit) {
            info!(ticks = stats.ticks, "quit requested");
            break;
        }
        screen.clear();
    }

    stats.buffer_rows = field.row_count();
    stats.last_viewport = field.viewport();
    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::config::Args;
    use crate::glyph::Sequence;
    use crate::screen::mock::MockScreen;

    fn settings(argv: &[&str]) -> Settings {
        Args::try_parse_from(std::iter::once("drizzle").chain(argv.iter().copied()))
            .unwrap()
            .resolve(&mut StdRng::seed_from_u64(0), true)
            .unwrap()
    }

    #[test]
    fn quit_after_first_tick_still_presents_it() {
        let mut screen = MockScreen::new(3, 5);
        screen.keys.push_back(Some(Key::Quit));
        let mut seq = Sequence::new("ABCDE");
        let stats = run(&mut screen, &settings(&["-d", "down"]), &mut seq).unwrap();

        assert_eq!(stats.ticks, 1);
        assert_eq!(screen.presented, 1);
        assert_eq!(screen.clears, 0);
        assert_eq!(screen.row_string(0), "ABCDE");
    }

    #[test]
    fn non_quit_input_keeps_raining() {
        let mut screen = MockScreen::new(2, 2);
        screen.keys.extend([None, Some(Key::Other), Some(Key::Resize)]);
        let mut seq = Sequence::new(".");
        let stats = run(&mut screen, &settings(&["-d", "down", "-t", "25"]), &mut seq).unwrap();

        assert_eq!(stats.ticks, 4);
        assert_eq!(screen.clears, 3);
        assert!(screen.polls.iter().all(|&t| t == Duration::from_millis(25)));
    }

    #[test]
    fn two_ticks_move_the_first_edge_down() {
        let mut screen = MockScreen::new(3, 5);
        screen.keys.extend([None, Some(Key::Quit)]);
        let mut seq = Sequence::new("ABCDEFGHIJ");
        run(&mut screen, &settings(&["-d", "down", "-r", "1000"]), &mut seq).unwrap();

        assert_eq!(screen.row_string(0), "FGHIJ");
        assert_eq!(screen.row_string(1), "ABCDE");
        assert_eq!(screen.row_string(2), "-----");
    }

    #[test]
    fn rain_reaching_the_bottom_splashes() {
        let mut screen = MockScreen::new(2, 3);
        screen.keys.extend([None, Some(Key::Quit)]);
        let mut seq = Sequence::new(". .   ");
        run(&mut screen, &settings(&["-d", "down"]), &mut seq).unwrap();

        assert_eq!(screen.row_string(1), "#-#");
    }

    #[test]
    fn viewport_growth_is_picked_up_next_tick() {
        let mut screen = MockScreen::new(2, 3);
        screen.keys.extend([None, Some(Key::Quit)]);
        screen.viewports.push_back(Viewport::new(4, 6));
        let mut seq = Sequence::new("*");
        let stats = run(&mut screen, &settings(&["-d", "down-right"]), &mut seq).unwrap();

        assert_eq!(stats.grows, 2);
        assert_eq!(stats.buffer_rows, 4);
        assert_eq!(stats.last_viewport, Viewport::new(4, 6));
        assert_eq!(screen.row_string(0), "******");
        assert_eq!(screen.row_string(1).chars().next(), Some('*'));
    }

    #[test]
    fn shrinking_viewport_keeps_buffer() {
        let mut screen = MockScreen::new(4, 6);
        screen.keys.extend([None, Some(Key::Quit)]);
        screen.viewports.push_back(Viewport::new(2, 3));
        let mut seq = Sequence::new(" ");
        let stats = run(&mut screen, &settings(&["-d", "down"]), &mut seq).unwrap();

        assert_eq!(stats.grows, 1);
        assert_eq!(stats.buffer_rows, 4);
        assert_eq!(stats.last_viewport, Viewport::new(2, 3));
        assert_eq!(screen.row_string(1), "---");
    }

    #[test]
    fn poll_timeout_is_capped_by_duration() {
        let mut screen = MockScreen::new(2, 2);
        screen.keys.push_back(Some(Key::Quit));
        let mut seq = Sequence::new(" ");
        let s = settings(&["-t", "60000", "--duration", "0.5"]);
        run(&mut screen, &s, &mut seq).unwrap();

        assert!(screen.polls[0] <= Duration::from_millis(500));
    }
}
