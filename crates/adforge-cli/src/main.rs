mod decide;
mod execute;

use std::path::PathBuf;

use adforge_core::{AspectRatio, Platform, RenderingMode, RoutingContext, UserTier};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adforge")]
#[command(about = "Creative strategy selection, planning, and render execution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct RoutingArgs {
    /// User tier gating premium backends (free, pro, enterprise)
    #[arg(long, default_value = "free")]
    tier: UserTier,
    /// Prefer local backends over cloud ones and skip VPS
    #[arg(long)]
    prefer_local: bool,
    /// Rank backends by quality instead of cost
    #[arg(long)]
    premium: bool,
}

impl RoutingArgs {
    pub(crate) fn context(&self) -> RoutingContext {
        RoutingContext {
            user_tier: self.tier,
            prefer_local: self.prefer_local,
            rendering_mode: if self.premium {
                RenderingMode::Premium
            } else {
                RenderingMode::Standard
            },
        }
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct PlanArgs {
    /// Analysis report JSON
    #[arg(long)]
    report: PathBuf,
    /// Write the compiled plan JSON here
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value_t = 5)]
    variations: usize,
    #[arg(long, default_value = "tiktok")]
    platform: Platform,
    #[arg(long, default_value = "9:16")]
    aspect_ratio: AspectRatio,
    /// Aspect ratio of the source asset; resize is required when unknown
    #[arg(long)]
    source_aspect_ratio: Option<AspectRatio>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long, default_value = "general")]
    market: String,
    /// RNG seed for variation ordering; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// A VPS render fleet is reachable
    #[arg(long)]
    vps: bool,
    #[command(flatten)]
    routing: RoutingArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score strategies for an analysis report and print the decision
    Select {
        #[arg(long)]
        report: PathBuf,
    },
    /// Select a strategy and compile it into a validated plan
    Plan(PlanArgs),
    /// Lock a saved plan and render it on the configured backends
    Run {
        #[arg(long)]
        plan: PathBuf,
        #[command(flatten)]
        routing: RoutingArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = adforge_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi_logs())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Select { report } => decide::run_select(&config, &report),
        Commands::Plan(args) => decide::run_plan(&config, &args),
        Commands::Run { plan, routing } => {
            execute::run_plan_file(&config, &plan, routing.context()).await
        }
    }
}
