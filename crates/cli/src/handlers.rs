//! Command handlers for the cloudbridge CLI

use crate::wizard::run_init_wizard;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use cloudbridge_core::{
    get_config_path, load_config, load_config_or_default, ClientOptions, Error, UploadClient,
    UploadResult,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::warn;

/// Exit code for command-line usage errors
pub const EXIT_USAGE: u8 = 1;

/// Exit code when the API rejects the credentials
pub const EXIT_INVALID_CREDENTIALS: u8 = 2;

/// Exit code for every other error
pub const EXIT_FAILURE: u8 = 3;

/// Output format of the upload command
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Arguments of `cloudbridge upload`
#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Destination folder on CloudBridge
    pub folder: String,

    /// Local files to upload
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Access key
    #[arg(long, env = "CLOUDBRIDGE_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long, env = "CLOUDBRIDGE_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// API base URL
    #[arg(long, env = "CLOUDBRIDGE_BASE_URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CLOUDBRIDGE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl UploadArgs {
    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// Handle the upload command
pub async fn handle_upload(args: UploadArgs) -> Result<()> {
    // Flags and env vars first, then the profile file, then built-in defaults
    let mut options = args.client_options();
    if !options.is_complete() {
        options = options.or(load_profile());
    }
    let client = UploadClient::new(options)?;

    if client.credentials().is_empty() {
        warn!("no credentials configured; run 'cloudbridge config init' or set CLOUDBRIDGE_ACCESS_KEY");
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Uploading {} file(s) to {}...", args.files.len(), args.folder));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = if args.files.len() == 1 {
        client.upload_file(&args.files[0], &args.folder).await
    } else {
        client.upload_files(&args.files, &args.folder).await
    };

    pb.finish_and_clear();

    print_result(&result?, args.output)
}

/// Profile settings, or none when the file is missing or unusable.
///
/// A broken profile must not block an upload that has its settings from
/// flags or the environment.
fn load_profile() -> ClientOptions {
    match load_config_or_default() {
        Ok(profile) => profile.into(),
        Err(e) => {
            warn!(error = %e, "ignoring unusable profile");
            ClientOptions::default()
        }
    }
}

/// Print an upload result in the requested format
fn print_result(result: &UploadResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Table => {
            if result.is_success() {
                println!("✅ Upload complete");
            } else {
                println!(
                    "❌ Upload failed: {}",
                    result.message().unwrap_or("no message from server")
                );
                if let Some(raw) = result.raw() {
                    println!("  Response: {}", raw);
                }
            }

            let files = result.files();
            if !files.is_empty() {
                #[derive(Tabled)]
                struct FileRow {
                    filename: String,
                    size: String,
                    public_url: String,
                    short_url: String,
                }

                let rows: Vec<FileRow> = files
                    .into_iter()
                    .map(|f| FileRow {
                        filename: f.filename,
                        size: f.size.map(format_bytes).unwrap_or_else(|| "-".to_string()),
                        public_url: f.public_url.unwrap_or_else(|| "-".to_string()),
                        short_url: f.short_url.unwrap_or_else(|| "-".to_string()),
                    })
                    .collect();

                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}

/// Subcommands of `cloudbridge config`
#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Create or update the profile interactively
    Init,
    /// Show the current profile
    Show,
    /// Print the profile location
    Path,
}

/// Handle config commands
pub async fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => run_init_wizard().await,
        ConfigAction::Show => {
            let config = load_config()?;

            println!("Current profile:");
            println!();
            println!("Credentials:");
            println!(
                "  Access key: {}",
                config.credentials.access_key.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  Secret key: {}",
                config
                    .credentials
                    .secret_key
                    .as_deref()
                    .map(mask_secret)
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("API:");
            println!(
                "  Base URL: {}",
                config.api.base_url.as_deref().unwrap_or("(default)")
            );
            println!(
                "  Timeout: {}",
                config
                    .api
                    .timeout
                    .map(|t| format!("{}s", t))
                    .unwrap_or_else(|| "(default)".to_string())
            );

            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", get_config_path()?.display());
            Ok(())
        }
    }
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    use std::io;

    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    // Only the script goes to stdout so it can be piped or sourced
    generate(clap_shell, cmd, "cloudbridge", &mut io::stdout());

    match shell {
        "bash" => eprintln!("# Add to your ~/.bashrc: source <(cloudbridge completion bash)"),
        "zsh" => eprintln!("# Add to your ~/.zshrc: source <(cloudbridge completion zsh)"),
        "fish" => eprintln!("# cloudbridge completion fish > ~/.config/fish/completions/cloudbridge.fish"),
        "elvish" => eprintln!("# cloudbridge completion elvish > ~/.elvish/lib/cloudbridge.elv"),
        _ => eprintln!("# cloudbridge completion powershell | Out-String | Invoke-Expression"),
    }

    Ok(())
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(Error::InvalidCredentials(_)) => EXIT_INVALID_CREDENTIALS,
        _ => EXIT_FAILURE,
    }
}

/// One-line description of a failed command for stderr
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_invalid_credentials() => e.to_string(),
        _ => format!("Error: {:#}", err),
    }
}

/// Show only the first characters of a secret
fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
