//! edugrade CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use edugrade_core::LanguageTag;

mod commands;

#[derive(Parser)]
#[command(
    name = "edugrade",
    version,
    about = "Grades learner HTML and console output against reference answers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one HTML submission
    Html {
        /// Learner markup file, or `-` for stdin
        #[arg(long)]
        user: PathBuf,

        /// Reference markup file
        #[arg(long)]
        expected: PathBuf,

        /// Message language (ru, kz, en)
        #[arg(long)]
        lang: Option<LanguageTag>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grade one console output
    Console {
        /// Learner output file, or `-` for stdin
        #[arg(long)]
        output: PathBuf,

        /// Reference output file
        #[arg(long)]
        expected: PathBuf,

        /// Message language (ru, kz, en)
        #[arg(long)]
        lang: Option<LanguageTag>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grade a directory of submissions against assignment sets
    Check {
        /// Path to .toml assignment set or directory
        #[arg(long)]
        assignments: PathBuf,

        /// Directory holding `<assignment id>.html` / `.txt` submissions
        #[arg(long)]
        submissions: PathBuf,

        /// Learner whose progress is recorded
        #[arg(long, default_value = "local")]
        learner: String,

        /// Progress file (defaults to the configured one)
        #[arg(long)]
        progress: Option<PathBuf>,

        /// Output directory for reports
        #[arg(long)]
        output: Option<PathBuf>,

        /// Filter by tags (comma-separated)
        #[arg(long)]
        filter: Option<String>,

        /// Max concurrent gradings
        #[arg(long)]
        parallelism: Option<usize>,

        /// Grade every assignment in this language
        #[arg(long)]
        lang: Option<LanguageTag>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate assignment set TOML files
    Validate {
        /// Path to assignment set file or directory
        #[arg(long)]
        assignments: PathBuf,
    },

    /// Compare two grading reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show recorded completions
    Progress {
        /// Progress file
        #[arg(long)]
        store: PathBuf,

        /// Only show this learner
        #[arg(long)]
        learner: Option<String>,
    },

    /// Create starter config and example assignment set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("edugrade=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Html {
            user,
            expected,
            lang,
            json,
        } => commands::html::execute(user, expected, lang, json),
        Commands::Console {
            output,
            expected,
            lang,
            json,
        } => commands::console::execute(output, expected, lang, json),
        Commands::Check {
            assignments,
            submissions,
            learner,
            progress,
            output,
            filter,
            parallelism,
            lang,
            config,
        } => {
            commands::check::execute(commands::check::CheckArgs {
                assignments,
                submissions,
                learner,
                progress,
                output,
                filter,
                parallelism,
                lang,
                config,
            })
            .await
        }
        Commands::Validate { assignments } => commands::validate::execute(assignments),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Progress { store, learner } => commands::progress::execute(store, learner).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
