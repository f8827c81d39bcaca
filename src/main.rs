// ABOUTME: Main entry point for the beamer-reveal program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use beamer_reveal::{batch, html, Config, ConvertOptions, OutputFormat, WatchConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one Beamer deck
    Convert(ConvertArgs),

    /// Convert every deck matching a glob pattern
    Batch(BatchArgs),

    /// Re-convert a deck whenever it changes
    Watch(WatchArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Path to the .tex file
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output file
    #[arg(short, long)]
    output: PathBuf,

    /// JSON chart map (source path -> web path)
    #[arg(long)]
    chart_map: Option<PathBuf>,

    /// Lecture identifier for synthesized image paths (default: input's directory name)
    #[arg(long)]
    lecture: Option<String>,

    /// Output format: 'html' or 'json'
    #[arg(long, default_value = "html")]
    format: OutputFormat,
}

#[derive(Args)]
struct BatchArgs {
    /// Glob pattern selecting the .tex files
    #[arg(short, long)]
    pattern: String,

    /// Directory receiving one output per deck
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long)]
    chart_map: Option<PathBuf>,

    #[arg(long, default_value = "html")]
    format: OutputFormat,
}

#[derive(Args)]
struct WatchArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    #[arg(long)]
    chart_map: Option<PathBuf>,

    #[arg(long)]
    lecture: Option<String>,

    #[arg(long, default_value = "html")]
    format: OutputFormat,

    /// Debounce time in milliseconds
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,
}

fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Convert(args) => {
            let charts = config.load_chart_map(args.chart_map.as_deref())?;
            let lecture = args
                .lecture
                .unwrap_or_else(|| ConvertOptions::lecture_name_for(&args.input));

            let result = batch::convert_file(&args.input, config, &charts, &lecture)
                .with_context(|| format!("Failed to convert {:?}", args.input))?;
            let rendered = html::render_output(&result, args.format, &config.get_page_options())?;
            html::write_html_to_file(&rendered, &args.output)
                .with_context(|| format!("Failed to write output file {:?}", args.output))?;

            println!(
                "Converted {} frames: {:?}",
                result.sections.len(),
                args.output
            );
            Ok(())
        }
        Commands::Batch(args) => {
            let charts = config.load_chart_map(args.chart_map.as_deref())?;
            let items = batch::convert_glob(&args.pattern, config, &charts)?;
            let summary = batch::write_outputs(&items, &args.out_dir, args.format, &config.get_page_options())?;

            for (path, reason) in &summary.failed {
                eprintln!("Failed: {:?}: {}", path, reason);
            }
            println!(
                "Converted {} decks into {:?} ({} failed, {} degraded)",
                summary.written.len(),
                args.out_dir,
                summary.failed.len(),
                summary.degraded
            );
            if !summary.failed.is_empty() {
                anyhow::bail!("{} decks could not be converted", summary.failed.len());
            }
            Ok(())
        }
        Commands::Watch(args) => {
            let watch_config = WatchConfig {
                tex_path: args.input,
                output: args.output,
                chart_map: args.chart_map,
                lecture_name: args.lecture,
                format: args.format,
                debounce_ms: args.debounce_ms,
            };
            beamer_reveal::watch_deck(watch_config, config)?;
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let Some(command) = cli.command else {
        println!("No command specified. Use --help for usage information.");
        return;
    };

    let config = Config::from_env();
    info!("Using reveal.js from {}", config.reveal_url);
    if let Some(path) = &config.chart_map_path {
        if !path.exists() {
            warn!("BEAMER_CHART_MAP points to a missing file: {:?}", path);
        }
    }

    if let Err(e) = run(command, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
