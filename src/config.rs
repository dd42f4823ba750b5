// Copyright (c) 2026 rezky_nightky

use std::fmt;
use std::io::IsTerminal;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::Rng;

use crate::glyph::{Palette, DEFAULT_PALETTE};
use crate::runtime::{ColorMode, Direction};

pub const MAX_DURATION_S: f64 = 86_400.0;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  drizzle --rain 15 --tick 60 --color 4 --palette \" .':\"";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Whether the rain itself may be coloured, independent of `--monochrome`.
pub fn terminal_allows_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    !std::env::var("TERM").is_ok_and(|t| t.eq_ignore_ascii_case("dumb"))
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str("      \x1b[32mExample:\x1b[0m");
            out.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("  drizzle") {
            out.push_str("  \x1b[1;34mdrizzle\x1b[0m");
            out.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("  -") {
            out.push_str("  \x1b[33m-");
            out.push_str(rest);
            out.push_str("\x1b[0m");
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    TickRate(i64),
    RainRate(i64),
    RainRateTooLarge(i64),
    Color(i64),
    Duration(f64),
    EmptyPalette,
    ControlGlyph(char),
    StreakIsBackground(Direction),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TickRate(v) => write!(f, "Tick rate must be positive (got {v})."),
            ConfigError::RainRate(v) => write!(f, "Rain rate must be positive (got {v})."),
            ConfigError::RainRateTooLarge(v) => {
                write!(f, "Rain rate must be at most {} (got {v}).", u32::MAX)
            }
            ConfigError::Color(v) => write!(f, "Color must be at most 255 (got {v})."),
            ConfigError::Duration(v) => write!(
                f,
                "Duration must be a finite number of seconds, at most {MAX_DURATION_S} (got {v})."
            ),
            ConfigError::EmptyPalette => write!(f, "Palette must contain at least one glyph."),
            ConfigError::ControlGlyph(c) => {
                write!(f, "Palette may not contain control characters (got {c:?}).")
            }
            ConfigError::StreakIsBackground(d) => write!(
                f,
                "Palette background {:?} is the {} streak glyph; pick another background.",
                d.streak(),
                d.label()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "drizzle",
    about = "Sparse, textured falling rain for the terminal",
    version,
    disable_version_flag = true
)]
pub struct Args {
    #[arg(
        short = 'd',
        long = "direction",
        value_enum,
        help_heading = "RAIN",
        help = "Rain direction: down (1), down-right (2), down-left (3). Default: random"
    )]
    pub direction: Option<Direction>,

    #[arg(
        short = 'r',
        long = "rain",
        default_value_t = 15,
        allow_negative_numbers = true,
        help_heading = "RAIN",
        help = "Rain rate: one in N leading-edge cells spawns a droplet (N > 0)"
    )]
    pub rain: i64,

    #[arg(
        short = 't',
        long = "tick",
        default_value_t = 60,
        allow_negative_numbers = true,
        help_heading = "RAIN",
        help = "Milliseconds between frames (> 0)"
    )]
    pub tick: i64,

    #[arg(
        short = 'p',
        long = "palette",
        default_value = DEFAULT_PALETTE,
        help_heading = "RAIN",
        help = "Glyph palette; the first glyph is the background"
    )]
    pub palette: String,

    #[arg(
        long = "seed",
        help_heading = "RAIN",
        help = "Seed the random source for a reproducible run"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'c',
        long = "color",
        default_value_t = 4,
        allow_negative_numbers = true,
        help_heading = "APPEARANCE",
        help = "Rain color as a 256-color index; negative uses the terminal default"
    )]
    pub color: i64,

    #[arg(
        short = 'm',
        long = "monochrome",
        help_heading = "APPEARANCE",
        help = "Monochrome mode (overrides --color)"
    )]
    pub monochrome: bool,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "stats",
        help_heading = "GENERAL",
        help = "Print a tick summary on exit"
    )]
    pub stats: bool,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Write logs to PATH (filter with DRIZZLE_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

/// Resolved, validated configuration. Built once before the terminal is
/// touched and shared read-only for the rest of the run.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub direction: Direction,
    pub density: NonZeroU32,
    pub tick: Duration,
    pub palette: Palette,
    pub color: ColorMode,
    pub duration: Option<Duration>,
}

impl Args {
    /// Validates the raw flags. An unset direction is drawn from `rng` here,
    /// exactly once, and never one whose streak is the palette background.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        allow_color: bool,
    ) -> Result<Settings, ConfigError> {
        let tick = u64::try_from(self.tick)
            .ok()
            .filter(|&v| v > 0)
            .ok_or(ConfigError::TickRate(self.tick))?;

        if self.rain <= 0 {
            return Err(ConfigError::RainRate(self.rain));
        }
        let density = u32::try_from(self.rain)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(ConfigError::RainRateTooLarge(self.rain))?;

        let color = if self.monochrome || !allow_color || self.color < 0 {
            ColorMode::Mono
        } else {
            let v = u8::try_from(self.color).map_err(|_| ConfigError::Color(self.color))?;
            ColorMode::Ansi(v)
        };

        let duration = match self.duration {
            Some(s) if !s.is_finite() || s > MAX_DURATION_S => {
                return Err(ConfigError::Duration(s))
            }
            Some(s) if s > 0.0 => Some(Duration::from_secs_f64(s)),
            _ => None,
        };

        let palette = Palette::parse(&self.palette)?;
        let background = palette.background();
        let direction = match self.direction {
            Some(d) if d.streak() == background => {
                return Err(ConfigError::StreakIsBackground(d))
            }
            Some(d) => d,
            None => Direction::random_unlike(rng, background),
        };

        Ok(Settings {
            direction,
            density,
            tick: Duration::from_millis(tick),
            palette,
            color,
            duration,
        })
    }
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  drizzle [OPTIONS]\n\nRAIN:\n  -d, --direction <down|down-right|down-left>\n      Direction the rain falls in; 1, 2 and 3 are accepted as shorthands.\n      Unset picks one at random at startup.\n      Example: drizzle -d down-left\n\n  -r, --rain <N>\n      One in N cells of the leading edge spawns a droplet (N > 0).\n      Example: drizzle --rain 4\n\n  -t, --tick <MS>\n      Milliseconds between frames (> 0).\n      Example: drizzle --tick 30\n\n  -p, --palette <CHARS>\n      Glyphs to draw; the first one is the background.\n      The background may not be the streak glyph of the chosen direction.\n      Example: drizzle --palette \" ,.;\"\n\n  --seed <N>\n      Seed the random source.\n      Example: drizzle --seed 42\n\nAPPEARANCE:\n  -c, --color <ID>\n      256-color index for the rain (default 4, blue).\n      Example: drizzle -c 6\n\n  -m, --monochrome\n      Disable color. NO_COLOR and TERM=dumb do the same.\n      Example: drizzle -m\n\nGENERAL:\n  --duration <seconds>\n      Stop after N seconds (max 86400; <=0 disables).\n      Example: drizzle --duration 10\n\n  --stats\n      Print a tick summary on exit.\n      Example: drizzle --duration 10 --stats\n\n  --log-file <PATH>\n      Write logs to PATH; DRIZZLE_LOG sets the filter (default info).\n      Example: DRIZZLE_LOG=debug drizzle --log-file drizzle.log\n\nKEYS:\n  q, Q, Esc, Ctrl-C\n      Quit.\n\nHELP:\n  -h, --help\n      Show short help.\n\n  --help-detail\n      Show this detailed help.\n\n  -v, --version\n      Print version and exit.\n\n  -i, --info\n      Print version info and exit.\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }
}
