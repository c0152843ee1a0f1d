use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wizcoin",
    about = "WizCoin membership: evaluate transaction groups and run the membership contract",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate a transaction group against a holdings snapshot
    Evaluate(EvaluateArgs),
    /// Deploy the contract on an in-memory ledger and run the membership lifecycle
    Demo(DemoArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct EvaluateArgs {
    /// JSON transaction group
    #[arg(long)]
    pub group: PathBuf,
    /// JSON global state; omit for the creating call
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// JSON holdings snapshot; empty when omitted
    #[arg(long)]
    pub view: Option<PathBuf>,
    /// Index of the invoking application call
    #[arg(long, default_value = "0")]
    pub caller: usize,
    /// JSON signing template; evaluates with the signature validator
    #[arg(long, conflicts_with_all = ["state", "caller"])]
    pub template: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DemoArgs {
    #[arg(short = 'n', long, default_value = "3")]
    pub members: usize,
    /// Total token supply
    #[arg(long, default_value = "400")]
    pub supply: u64,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub path: Option<PathBuf>,
}
