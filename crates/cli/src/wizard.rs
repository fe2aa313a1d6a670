//! Interactive setup wizard for the cloudbridge profile

use anyhow::Result;
use cloudbridge_core::{
    load_config_or_default, save_config, ApiConfig, ConfigFile, CredentialsConfig,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

/// Run the interactive setup wizard
pub async fn run_init_wizard() -> Result<()> {
    println!("🚀 Welcome to cloudbridge setup!\n");

    println!("This wizard will guide you through the configuration process.");
    println!("You will need:");
    println!("  1. Your CloudBridge access key");
    println!("  2. The matching secret key\n");

    let existing = load_config_or_default()?;

    // Step 1: Credentials
    let access_key = prompt_access_key(existing.credentials.access_key.clone())?;
    let secret_key = prompt_secret_key()?;

    // Step 2: API settings
    let base_url = prompt_base_url(existing.api.base_url.clone())?;
    let timeout = prompt_timeout(existing.api.timeout)?;

    // Summary
    println!("\n📋 Configuration summary:");
    println!("  Access key: {}", access_key);
    println!("  Base URL: {}", base_url);
    println!("  Timeout: {}s", timeout);

    // Confirmation
    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(false)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    // Only keep non-default API settings so later default changes still apply
    let config = ConfigFile {
        credentials: CredentialsConfig {
            access_key: Some(access_key),
            secret_key: Some(secret_key),
        },
        api: ApiConfig {
            base_url: (base_url != DEFAULT_BASE_URL).then_some(base_url),
            timeout: (timeout != DEFAULT_TIMEOUT_SECS).then_some(timeout),
        },
    };

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Saving configuration...");

    let path = save_config(&config)?;

    pb.inc(1);
    pb.finish_with_message("✅ Configuration saved!");

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: {}", path.display());
    println!("\nYou can now use cloudbridge:");
    println!("  $ cloudbridge upload my/folder report.pdf");
    println!("  $ cloudbridge config show");

    Ok(())
}

/// Prompt for the access key
fn prompt_access_key(current: Option<String>) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::with_theme(&theme).with_prompt("Access key");
    if let Some(current) = current {
        input = input.default(current);
    }

    input
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Access key cannot be empty")
            } else if input.chars().any(char::is_control) {
                Err("Access key cannot contain control characters")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get access key: {}", e))
}

/// Prompt for the secret key
fn prompt_secret_key() -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Secret key")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("Secret key cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get secret key: {}", e))
}

/// Prompt for the API base URL
fn prompt_base_url(current: Option<String>) -> Result<String> {
    let url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("API base URL")
        .default(current.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.starts_with("https://") || input.starts_with("http://") {
                Ok(())
            } else {
                Err("Base URL must start with http:// or https://")
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get base URL: {}", e))?;

    Ok(url.trim_end_matches('/').to_string())
}

/// Prompt for the request timeout
fn prompt_timeout(current: Option<u64>) -> Result<u64> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Request timeout (seconds)")
        .default(current.unwrap_or(DEFAULT_TIMEOUT_SECS))
        .validate_with(|input: &u64| -> Result<(), &str> {
            if *input == 0 {
                Err("Timeout must be at least 1 second")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get timeout: {}", e))
}
