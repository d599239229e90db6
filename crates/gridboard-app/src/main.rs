//! Command-line entry point.

use clap::{Parser, Subcommand};
use gridboard_app::{App, AppConfig, CliError, Overrides, ShortcutRegistry};
use kurbo::Vec2;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gridboard", about = "Dashboard grid layout tool", version)]
struct Cli {
    /// Dashboard config file (JSON).
    #[arg(long, global = true, env = "GRIDBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Grid size override, "2x2" to "5x5".
    #[arg(long, global = true)]
    grid: Option<String>,

    /// Container width in pixels.
    #[arg(long, global = true)]
    width: Option<f64>,

    #[arg(long, global = true)]
    gap: Option<f64>,

    #[arg(long, global = true)]
    padding: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print each widget's type, grid position and pixel rect.
    Inspect { layout: PathBuf },
    /// Normalize widget types and write the canonical layout.
    Migrate {
        layout: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drag a widget by a pixel offset and report the settled result.
    Simulate {
        layout: PathBuf,
        /// Widget id, then dx and dy in pixels.
        #[arg(long = "move", num_args = 3, value_names = ["ID", "DX", "DY"], allow_hyphen_values = true)]
        moves: Vec<String>,
    },
    /// List keyboard shortcuts.
    Shortcuts,
}

fn parse_offset(value: &str) -> Result<f64, CliError> {
    value
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("`{value}` is not a pixel offset")))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let overrides = Overrides {
        grid: cli.grid,
        width: cli.width,
        gap: cli.gap,
        padding: cli.padding,
    };
    let app = App::new(AppConfig::load(cli.config.as_deref(), overrides)?);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Inspect { layout } => app.inspect(&layout, &mut out)?,
        Command::Migrate { layout, output } => {
            let count = app.migrate(&layout, output.as_ref(), &mut out)?;
            log::info!("Migrated {} widget(s)", count);
        }
        Command::Simulate { layout, moves } => {
            let [id, dx, dy] = moves.as_slice() else {
                return Err(CliError::InvalidArgument(
                    "--move takes <ID> <DX> <DY>".to_string(),
                ));
            };
            let delta = Vec2::new(parse_offset(dx)?, parse_offset(dy)?);
            app.simulate(&layout, id, delta, &mut out)?;
        }
        Command::Shortcuts => ShortcutRegistry::write_all(&mut out)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Gridboard");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
