mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mpa-kit")]
#[command(version, about = "Build planner for multi-page applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Scaffold a new multi-page project
    Init {
        /// Path to the project directory (must exist)
        path: PathBuf,
    },

    /// Check the project layout and report problems
    Validate {
        /// Path to project directory
        path: PathBuf,
    },

    /// Discover pages and write the bundle plan
    Plan {
        /// Path to project directory
        path: PathBuf,

        /// Where to write the plan (default: <path>/bundle.plan.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Serve the build output locally with live reload
    Preview {
        /// Path to project directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Plan { path, out } => commands::plan::run(path, out).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "mpa-kit", &mut io::stdout());
            Ok(())
        }
    }
}
