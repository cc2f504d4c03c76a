use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use locsync::Operation;
use locsync_cli::config::Config;
use locsync_cli::status::print_status;
use locsync_cli::sync::{IosArgs, RunArgs, run_android, run_ios, run_resx};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./locsync.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-string detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Options shared by the sync commands.
#[derive(Args, Debug)]
struct SyncFlags {
    /// export, import or sync (export then import)
    #[arg(long = "op", value_parser = parse_operation)]
    operation: Option<Operation>,

    /// Root directory of the CSV translation store
    #[arg(long)]
    store: Option<PathBuf>,

    /// Project name; tables live under <store>/<project>
    #[arg(long)]
    project: Option<String>,

    /// Comment placed before strings appended to a file
    #[arg(long)]
    marker: Option<String>,

    /// Plan only: write neither files nor the store
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON report of the run
    #[arg(long)]
    report_json: Option<PathBuf>,
}

impl SyncFlags {
    fn into_run_args(self, dev_language: Option<String>) -> RunArgs {
        RunArgs {
            operation: self.operation,
            store: self.store,
            project: self.project,
            dev_language,
            marker: self.marker,
            dry_run: self.dry_run,
            report_json: self.report_json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync Android strings.xml files with the translation store.
    Android {
        /// The `res` directory holding the `values*` folders
        #[arg(long)]
        res: PathBuf,

        /// Development language code (default: en)
        #[arg(long)]
        dev_language: Option<String>,

        #[command(flatten)]
        sync: SyncFlags,
    },

    /// Sync an Xcode project's XLIFF exports with the translation store.
    Ios {
        /// Path to the .xcodeproj
        #[arg(long)]
        xcodeproj: PathBuf,

        /// Languages to export and import, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        languages: Vec<String>,

        /// Where xcodebuild writes the exported documents
        #[arg(long)]
        output_dir: PathBuf,

        /// Development language code (default: en)
        #[arg(long)]
        dev_language: Option<String>,

        /// Use documents from a previous export
        #[arg(long)]
        no_export: bool,

        #[command(flatten)]
        sync: SyncFlags,
    },

    /// Sync .NET .resx files with the translation store.
    Resx {
        /// Directory searched for .resx files
        #[arg(long)]
        dir: PathBuf,

        /// Development language code (default: en)
        #[arg(long)]
        dev_language: Option<String>,

        #[command(flatten)]
        sync: SyncFlags,
    },

    /// Show the strings of one file and their translation state.
    Status {
        /// The file to inspect
        file: PathBuf,

        /// Development language file, to list the strings `file` lacks
        #[arg(long)]
        source: Option<PathBuf>,

        /// Development language code
        #[arg(long)]
        dev_language: Option<String>,

        /// Display full values without truncation
        #[arg(long)]
        full: bool,
    },
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse().map_err(|e: locsync::Error| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.commands {
        Commands::Android {
            res,
            dev_language,
            sync,
        } => run_android(&res, &config, &sync.into_run_args(dev_language)),
        Commands::Ios {
            xcodeproj,
            languages,
            output_dir,
            dev_language,
            no_export,
            sync,
        } => {
            let ios = IosArgs {
                xcodeproj,
                languages,
                output_dir,
                no_export,
            };
            run_ios(&ios, &config, &sync.into_run_args(dev_language))
        }
        Commands::Resx {
            dir,
            dev_language,
            sync,
        } => run_resx(&dir, &config, &sync.into_run_args(dev_language)),
        Commands::Status {
            file,
            source,
            dev_language,
            full,
        } => {
            let dev_language = dev_language
                .or(config.dev_language)
                .unwrap_or_else(|| "en".to_string());
            print_status(&file, source.as_deref(), &dev_language, full)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
