use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_cmft::app::App;
use kira_cmft::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use kira_cmft::error::CmftError;
use kira_cmft::geo::{GeoHttpClient, ListingClient};
use kira_cmft::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "kira-cmft")]
#[command(about = "Build a control-linked cell-mark-file table and download manifest from GEO metadata")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List remote BED files for each sample and write cmft + manifest")]
    Build(BuildArgs),
    #[command(about = "Rebuild the cmft from an extracted sample/mark/filename table")]
    Group(GroupArgs),
}

#[derive(Args, Clone)]
struct CommonArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long, conflicts_with = "no_purge")]
    purge: bool,

    #[arg(long)]
    no_purge: bool,

    #[arg(long)]
    control_mark: Option<String>,

    #[arg(long)]
    out_dir: Option<String>,
}

#[derive(Args)]
struct BuildArgs {
    metadata: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct GroupArgs {
    rows: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CmftError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CmftError) -> u8 {
    match error {
        CmftError::MetadataRead(_) | CmftError::ConfigRead(_) => 2,
        CmftError::ListingHttp(_) | CmftError::ListingStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };

    match cli.command {
        Commands::Build(args) => {
            let config = resolve_config(&args.common)?;
            let listing = GeoHttpClient::new(&config.host)?;
            let app = App::new(listing);
            let result = match output_mode {
                OutputMode::Json => app.build(&args.metadata, &config, &JsonOutput)?,
                OutputMode::Console => app.build(&args.metadata, &config, &ConsoleOutput)?,
            };
            print_result(&result, output_mode)
        }
        Commands::Group(args) => {
            let config = resolve_config(&args.common)?;
            let app = App::new(OfflineListing);
            let result = match output_mode {
                OutputMode::Json => app.group(&args.rows, &config, &JsonOutput)?,
                OutputMode::Console => app.group(&args.rows, &config, &ConsoleOutput)?,
            };
            print_result(&result, output_mode)
        }
    }
}

fn resolve_config(args: &CommonArgs) -> Result<ResolvedConfig, CmftError> {
    let overrides = ConfigOverrides {
        purge: args.purge.then_some(true).or(args.no_purge.then_some(false)),
        control_mark: args.control_mark.clone(),
        out_dir: args.out_dir.clone(),
    };
    ConfigLoader::resolve(args.config.as_deref(), &overrides)
}

fn print_result(result: &kira_cmft::app::BuildResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_build(result).into_diagnostic(),
        OutputMode::Console => ConsoleOutput::print_build(result).into_diagnostic(),
    }
}

struct OfflineListing;

impl ListingClient for OfflineListing {
    fn list(&self, _path: &str) -> Result<Vec<String>, CmftError> {
        Err(CmftError::ListingHttp(
            "listing client not configured".to_string(),
        ))
    }
}
