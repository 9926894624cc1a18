use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use litmerge_core::{ExitCode, MergeConfig, MergeError, RunReport, SourceConfig, merge_sources};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "litmerge",
    about = "Merge literature database exports with DOI/title deduplication",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: $LITMERGE_CONFIG or ./litmerge.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting LITMERGE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the configured sources (the default command).
    Merge(MergeArgs),

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Args, Default)]
struct MergeArgs {
    /// Input export, processed in the order given. Replaces configured sources.
    #[arg(long = "source", value_name = "FILE[=LABEL]", action = ArgAction::Append)]
    sources: Vec<SourceConfig>,

    /// Merged dataset path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Decision log path.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Default title column name.
    #[arg(long)]
    title_col: Option<String>,

    /// Default abstract column name.
    #[arg(long)]
    abstract_col: Option<String>,

    /// Default DOI column name.
    #[arg(long)]
    doi_col: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Write a default config file.
    Init {
        /// Target path (default: the config path).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl MergeArgs {
    fn apply(self, config: &mut MergeConfig) {
        if !self.sources.is_empty() {
            config.sources = self.sources;
        }
        if let Some(output) = self.output {
            config.output.merged = output;
        }
        if let Some(log) = self.log {
            config.output.log = log;
        }
        if let Some(title) = self.title_col {
            config.columns.title = title;
        }
        if let Some(abstract_col) = self.abstract_col {
            config.columns.abstract_text = abstract_col;
        }
        if let Some(doi) = self.doi_col {
            config.columns.doi = doi;
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        let code = err
            .downcast_ref::<MergeError>()
            .map(MergeError::exit_code)
            .unwrap_or(ExitCode::GeneralError);
        std::process::exit(code as i32);
    }
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let json_output = cli.json || std::env::var("LITMERGE_JSON").as_deref() == Ok("1");
    let timing = std::env::var("LITMERGE_TIMING").as_deref() == Ok("1");

    let config_path = cli.config.unwrap_or_else(MergeConfig::config_path);
    let mut config = MergeConfig::load_from(&config_path)?;

    match cli.command.unwrap_or(Commands::Merge(MergeArgs::default())) {
        Commands::Merge(args) => {
            args.apply(&mut config);
            config.validate()?;

            let outcome = merge_sources(&config);
            if timing {
                eprintln!("[timing] merged in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
            }
            outcome.write(&config.output)?;

            let report = RunReport::new(&outcome, &config.output);
            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Init { path, force } => {
                let path = path.unwrap_or(config_path);
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                MergeConfig::default().save_to(&path)?;
                println!("Wrote default config to {}", path.display());
            }
        },

        Commands::Version => {
            println!("litmerge v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    if timing {
        eprintln!("[timing] total {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn merge_flags_override_config() {
        let cli = Cli::try_parse_from([
            "litmerge",
            "merge",
            "--source",
            "a.csv=Alpha",
            "--source",
            "b.csv",
            "--output",
            "out/merged.csv",
            "--title-col",
            "Article Title",
        ])
        .unwrap();

        let Some(Commands::Merge(args)) = cli.command else {
            panic!("expected merge command");
        };
        let mut config = MergeConfig::default();
        args.apply(&mut config);

        let labels: Vec<&str> = config.sources.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "b"]);
        assert_eq!(config.output.merged, PathBuf::from("out/merged.csv"));
        assert_eq!(config.output.log, PathBuf::from("processing_log.csv"));
        assert_eq!(config.columns.title, "Article Title");
        assert_eq!(config.columns.doi, "DOI");
    }

    #[test]
    fn no_flags_keep_config() {
        let mut config = MergeConfig::default();
        MergeArgs::default().apply(&mut config);
        assert_eq!(config, MergeConfig::default());
    }

    #[test]
    fn sources_with_the_same_stem_are_accepted() {
        let cli = Cli::try_parse_from([
            "litmerge",
            "merge",
            "--source",
            "q1/x.csv",
            "--source",
            "q2/x.csv",
        ])
        .unwrap();

        let Some(Commands::Merge(args)) = cli.command else {
            panic!("expected merge command");
        };
        let mut config = MergeConfig::default();
        args.apply(&mut config);

        assert!(config.validate().is_ok());
        assert!(config.sources.iter().all(|s| s.label == "x"));
    }

    #[test]
    fn bad_source_is_rejected() {
        assert!(Cli::try_parse_from(["litmerge", "merge", "--source", "a.csv="]).is_err());
    }
}
