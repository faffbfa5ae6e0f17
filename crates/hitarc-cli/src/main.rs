//! hitarc CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hitarc", version, about = "Deterministic assessment generator and grader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a test plan from a seed
    Plan {
        /// Seed string; the same seed always yields the same questions
        #[arg(long)]
        seed: String,

        /// Sections to include (e.g. "A,B,math"); default: all or config
        #[arg(long)]
        sections: Option<String>,

        /// Assemble from a tiered bank instead of the section generators
        #[arg(long)]
        tiered: Option<PathBuf>,

        /// Tier policy for --tiered (e.g. "J:1,2,3;G:1,2"); default: tiers 1-3 everywhere
        #[arg(long)]
        tiers: Option<String>,

        /// Strip answer keys and rationales
        #[arg(long)]
        public: bool,

        /// Seal answer keys as digests
        #[arg(long)]
        hashed: bool,

        /// Write the plan here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a submission against a plan
    Grade {
        /// Plan JSON with answer keys
        #[arg(long)]
        plan: PathBuf,

        /// Submission JSON
        #[arg(long)]
        responses: PathBuf,

        /// Save the grade report here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Regenerate a plan from its seed and check it is unchanged
    Verify {
        /// Plan JSON to verify
        #[arg(long)]
        plan: PathBuf,

        /// Tiered bank the plan was assembled from
        #[arg(long)]
        tiered: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate content bank TOML files
    Validate {
        /// Standard content bank; default: the built-in bank
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Tiered bank file or directory
        #[arg(long)]
        tiered: Option<PathBuf>,
    },

    /// Cohort statistics over a directory of grade reports
    Stats {
        /// Directory of grade report JSON files
        #[arg(long)]
        reports: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compare two grade reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold; default: config or 0.05
        #[arg(long)]
        threshold: Option<f64>,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Generate plans for many seeds concurrently
    Batch {
        /// Comma-separated seeds
        #[arg(long, conflicts_with = "count")]
        seeds: Option<String>,

        /// Number of seeds to derive from --prefix
        #[arg(long)]
        count: Option<usize>,

        /// Prefix for derived seeds
        #[arg(long, default_value = "seed")]
        prefix: String,

        /// Max concurrent generations; default: config
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory; default: config
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example tiered bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hitarc=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan {
            seed,
            sections,
            tiered,
            tiers,
            public,
            hashed,
            output,
            config,
        } => commands::plan::execute(commands::plan::PlanArgs {
            seed,
            sections,
            tiered,
            tiers,
            public,
            hashed,
            output,
            config,
        }),
        Commands::Grade {
            plan,
            responses,
            output,
            format,
        } => commands::grade::execute(plan, responses, output, format),
        Commands::Verify {
            plan,
            tiered,
            config,
        } => commands::verify::execute(plan, tiered, config),
        Commands::Validate { bank, tiered } => commands::validate::execute(bank, tiered),
        Commands::Stats { reports, format } => commands::stats::execute(reports, format),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Batch {
            seeds,
            count,
            prefix,
            parallelism,
            output,
            config,
        } => commands::batch::execute(seeds, count, prefix, parallelism, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
