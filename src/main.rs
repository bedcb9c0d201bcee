use clap::{Parser, Subcommand};

use ralph_lib::commands;
use ralph_lib::ProjectContext;

#[derive(Parser)]
#[command(
    name = "ralph",
    version,
    about = "Point an AI coding agent at a story backlog and loop until it passes"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Set up the project: config, backlog, prompt, and skills
    Init,
    /// Run the loop until completion or the iteration budget runs out
    Run {
        /// Override maxIterations for this run only
        iterations: Option<u32>,
    },
    /// Alias for run
    Start {
        /// Override maxIterations for this run only
        iterations: Option<u32>,
    },
    /// Show the backlog, next story, and recent journal entries
    Status,
    /// Distill journal learnings into a skill file
    Compound,
    /// Write a launchd plist or print a crontab line for recurring runs
    Schedule,
    /// GitHub issue integration
    Gh {
        #[command(subcommand)]
        command: GhCommand,
    },
}

#[derive(Subcommand)]
enum GhCommand {
    /// Verify the gh CLI, API token, and origin remote
    Check,
    /// Import one issue into the backlog as a story
    Import {
        /// Issue number
        number: u32,
    },
    /// Mark stories whose linked issue closed as passing
    Sync,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start the async runtime: {}", e);
            std::process::exit(2);
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn dispatch(cli: Cli) -> Result<i32, String> {
    let context = ProjectContext::from_current_dir()?;

    match cli.command {
        // Bare `ralph` does the obvious thing for the project's state:
        // set up when nothing is there yet, otherwise run.
        None => {
            if context.is_initialized() {
                commands::run::execute(&context, None).await
            } else {
                commands::init::execute(&context)
            }
        }
        Some(Command::Init) => commands::init::execute(&context),
        Some(Command::Run { iterations }) | Some(Command::Start { iterations }) => {
            commands::run::execute(&context, iterations).await
        }
        Some(Command::Status) => commands::status::execute(&context),
        Some(Command::Compound) => commands::compound::execute(&context).await,
        Some(Command::Schedule) => commands::schedule::execute(&context),
        Some(Command::Gh { command }) => match command {
            GhCommand::Check => commands::gh::check(&context).await,
            GhCommand::Import { number } => commands::gh::import(&context, number).await,
            GhCommand::Sync => commands::gh::sync(&context).await,
        },
    }
}
