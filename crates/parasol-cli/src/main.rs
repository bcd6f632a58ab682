use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use parasol::{
    analyze_checked, load_compilation, render_report, write_output, AnalysisConfig, OutputFormat,
};
use parasol_checker::check_compilation;

#[derive(Parser)]
#[command(name = "parasol")]
#[command(about = "Type check parasol shader programs and report what each shader uses", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a resolved compilation and report on its shaders
    Check {
        /// Resolved compilation (JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Qualified shader name to report on; repeat for several
        #[arg(short, long = "shader")]
        shaders: Vec<String>,

        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file path; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the external usage check
        #[arg(long)]
        no_externals: bool,

        /// Also write the dependency graphs as JSON
        #[arg(long)]
        graphs: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug) // Show target module in debug mode
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            input,
            config,
            shaders,
            format,
            output,
            no_externals,
            graphs,
        } => {
            let mut config = match config {
                Some(path) => AnalysisConfig::from_file(&path)?,
                None => AnalysisConfig::default(),
            };

            // Flags override the config file
            if !shaders.is_empty() {
                config.analysis.shaders = shaders;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if output.is_some() {
                config.output.path = output;
            }
            if no_externals {
                config.analysis.check_externals = false;
            }

            handle_check(&input, &config, graphs)
        }
    }
}

fn handle_check(input: &Path, config: &AnalysisConfig, graphs: Option<PathBuf>) -> Result<()> {
    info!("Checking compilation from {:?}", input);

    let compilation = load_compilation(input)
        .with_context(|| format!("Failed to load compilation: {:?}", input))?;
    let checked = check_compilation(&compilation)?;

    if let Some(path) = graphs {
        let json = serde_json::to_string_pretty(&checked.graphs)?;
        write_output(&path, &json)?;
        info!("Dependency graphs written to {:?}", path);
    }

    let report = analyze_checked(&checked, config)?;
    let rendered = render_report(&report, config.output.format)?;

    match &config.output.path {
        Some(path) => {
            write_output(path, &rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            info!("Report for {} shaders written to {:?}", report.shaders.len(), path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
