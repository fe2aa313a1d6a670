use clap::{ArgAction, CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// cloudbridge - upload files to CloudBridge
#[derive(Parser, Debug)]
#[command(name = "cloudbridge")]
#[command(version)]
#[command(about = "Upload files to CloudBridge from your terminal", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Upload one or more files to a folder
    Upload(handlers::UploadArgs),

    /// Manage the local profile
    Config {
        #[command(subcommand)]
        action: handlers::ConfigAction,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Usage errors exit with 1; help and version exit cleanly
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(handlers::EXIT_USAGE);
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Upload(args) => handlers::handle_upload(args).await,
        Commands::Config { action } => handlers::handle_config(action).await,
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", handlers::describe_error(&err));
            ExitCode::from(handlers::exit_code(&err))
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
