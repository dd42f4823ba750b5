// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod drive;
mod field;
mod frame;
mod glyph;
mod logging;
mod render;
mod runtime;
mod screen;
mod terminal;

use std::env;
use std::process::ExitCode;

#[cfg(unix)]
use std::thread;

use anyhow::Context;
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail,
    terminal_allows_color, Args, Settings,
};
use crate::drive::RunStats;
use crate::field::GrowError;
use crate::glyph::Generator;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const EXIT_OK: u8 = 0;
const EXIT_DONE: u8 = 1;
const EXIT_RUNTIME: u8 = 2;
const EXIT_BAD_ALLOC: u8 = 253;
const EXIT_BAD_ARGS: u8 = 255;

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn install_restore_handlers() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn parse_args() -> Result<Args, u8> {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();
    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.try_get_matches_from(env::args_os()).map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_DONE,
            _ => EXIT_BAD_ARGS,
        }
    })?;
    Args::from_arg_matches(&matches).map_err(|e| {
        let _ = e.print();
        EXIT_BAD_ARGS
    })
}

fn print_stats(settings: &Settings, stats: &RunStats) {
    let elapsed_s = stats.elapsed.as_secs_f64().max(0.000_001);
    println!("RAIN STATS:");
    println!("  elapsed_s: {:.3}", elapsed_s);
    println!("  ticks: {}", stats.ticks);
    println!("  avg_tps: {:.3}", stats.ticks as f64 / elapsed_s);
    println!("  tick_ms: {}", settings.tick.as_millis());
    println!("  direction: {}", settings.direction.label());
    println!("  density: 1/{}", settings.density);
    println!(
        "  viewport: {}x{}",
        stats.last_viewport.cols, stats.last_viewport.rows
    );
    println!("  buffer_rows: {}", stats.buffer_rows);
    println!("  grows: {}", stats.grows);
}

fn rain(settings: &Settings, rng: StdRng) -> anyhow::Result<RunStats> {
    let mut term = Terminal::new().context("failed to initialise terminal")?;
    let mut generator = Generator::new(rng);
    drive::run(&mut term, settings, &mut generator)
}

/// Validates the configuration, then opens the log. A bad configuration
/// exits before any log file is created.
fn prepare(args: &Args) -> Result<(Settings, StdRng), u8> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let settings = match args.resolve(&mut rng, terminal_allows_color()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error--{}", e);
            return Err(EXIT_BAD_ARGS);
        }
    };

    if let Err(e) = logging::init(args.log_file.as_deref()) {
        eprintln!("error: {:#}", e);
        return Err(EXIT_RUNTIME);
    }
    Ok((settings, rng))
}

fn main() -> ExitCode {
    install_restore_handlers();

    let args = match parse_args() {
        Ok(a) => a,
        Err(code) => return ExitCode::from(code),
    };

    if args.help_detail {
        print_help_detail();
        return ExitCode::from(EXIT_DONE);
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return ExitCode::from(EXIT_DONE);
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", env!("DRIZZLE_BUILD"));
        let sha = env!("DRIZZLE_GIT_SHA");
        if !sha.is_empty() {
            println!("Commit: {}", sha);
        }
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return ExitCode::from(EXIT_DONE);
    }

    let (settings, rng) = match prepare(&args) {
        Ok(v) => v,
        Err(code) => return ExitCode::from(code),
    };

    info!(
        direction = settings.direction.label(),
        density = settings.density.get(),
        tick_ms = settings.tick.as_millis() as u64,
        color = ?settings.color,
        seed = ?args.seed,
        "starting"
    );

    match rain(&settings, rng) {
        Ok(stats) => {
            info!(ticks = stats.ticks, grows = stats.grows, "stopped");
            if args.stats {
                print_stats(&settings, &stats);
            }
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            if e.downcast_ref::<GrowError>().is_some() {
                ExitCode::from(EXIT_BAD_ALLOC)
            } else {
                ExitCode::from(EXIT_RUNTIME)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn bad_config_exits_before_log_file_is_created() {
        let log = env::temp_dir().join(format!("drizzle-bad-config-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&log);
        let args = Args::try_parse_from([
            "drizzle",
            "-r",
            "0",
            "--log-file",
            log.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(prepare(&args).err(), Some(EXIT_BAD_ARGS));
        assert!(!log.exists());
    }
}
