mod headless;
mod record;
mod simulate;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use dropline_core::SessionConfig;
use sheet_schema::Sheet;
use sheet_store::DemoBank;

use crate::simulate::SimulateOptions;

#[derive(Debug, Parser)]
#[command(name = "dropline")]
#[command(about = "Headless driver for dropline play sessions", long_about = None)]
struct Cli {
    /// Session config JSON. Missing fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Autoplay a song and print per-lane results.
    Simulate {
        song: PathBuf,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,
        #[arg(long)]
        miss_every: Option<usize>,
    },
    /// Built-in sheets.
    Demo {
        #[command(subcommand)]
        command: DemoCommand,
    },
    /// Record a sheet from scripted key presses.
    Record {
        song: PathBuf,
        #[arg(long)]
        presses: String,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum DemoCommand {
    List,
    Export {
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    match cli.command {
        Command::Simulate {
            song,
            fps,
            offset,
            miss_every,
        } => {
            let loaded = sheet_store::load_song_json_from_path(&song)
                .with_context(|| format!("simulate failed: {}", song.display()))?;
            let options = SimulateOptions {
                fps,
                offset,
                miss_every,
            };
            let report = simulate::run_simulation(config, loaded, options)
                .with_context(|| format!("simulate failed: {}", song.display()))?;
            report.print();
        }
        Command::Demo { command } => match command {
            DemoCommand::List => {
                for name in DemoBank.names() {
                    println!("{}", name);
                }
            }
            DemoCommand::Export { name, output } => {
                let sheet = DemoBank.get(&name)?;
                write_sheet(&sheet, output.as_deref())?;
            }
        },
        Command::Record {
            song,
            presses,
            fps,
            output,
        } => {
            let loaded = sheet_store::load_song_json_from_path(&song)
                .with_context(|| format!("record failed: {}", song.display()))?;
            let presses = record::parse_presses(&presses).context("invalid --presses")?;
            let sheet = record::run_recording(config, loaded, presses, fps)
                .with_context(|| format!("record failed: {}", song.display()))?;
            write_sheet(&sheet, output.as_deref())?;
        }
    }

    Ok(())
}

fn write_sheet(sheet: &Sheet, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(sheet).context("failed to serialize sheet")?;
    match output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write: {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
