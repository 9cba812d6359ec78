use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cbk")]
#[command(about = "Cap ledger reconciliation and scenario projection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucket and drilldown reconciliation over an input bundle.
    /// Exits non-zero when any check fails.
    Reconcile {
        /// Input bundle JSON (snapshot + drilldowns)
        #[arg(long)]
        input: String,

        /// Worker threads; overrides `reconcile.partitions` from config
        #[arg(long)]
        partitions: Option<usize>,

        /// Optional layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Write the full JSON report here
        #[arg(long)]
        out: Option<String>,
    },

    /// Derived position for one team under a selected plan and year.
    Derive {
        /// Input bundle JSON (snapshot + plans + journal + subsystem_outputs)
        #[arg(long)]
        input: String,

        /// Layered config paths in merge order (base -> season -> overrides...)
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        team: String,

        #[arg(long)]
        year: i32,

        /// Plan id or plan name
        #[arg(long)]
        plan: String,

        /// Current roster count, used by the roster-fill policy
        #[arg(long, default_value_t = 0)]
        roster_count: u32,

        /// Fail instead of warn on unused config keys
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent otherwise.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile {
            input,
            partitions,
            config_paths,
            out,
        } => commands::reconcile::run_reconcile(&input, partitions, &config_paths, out.as_deref())?,

        Commands::Derive {
            input,
            config_paths,
            team,
            year,
            plan,
            roster_count,
            strict_config,
        } => commands::derive::run_derive(commands::derive::DeriveArgs {
            input,
            config_paths,
            team,
            year,
            plan,
            roster_count,
            strict_config,
        })?,

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cbk_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

// stdout carries results; logs go to stderr.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
