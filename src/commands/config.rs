use anyhow::Result;
use colored::Colorize;
use qa_gateway::config::Settings;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective settings with secrets masked
pub fn show(settings: &Settings) -> Result<()> {
    info!("Displaying configuration");

    let sanitized = sanitize_secrets(settings);

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", serde_json::to_string_pretty(&sanitized)?);
    println!();
    println!("{}", "Summary:".bold());
    println!("  OpenAI configured: {}", yes_no(settings.openai_configured()));
    println!(
        "  Langfuse configured: {}",
        yes_no(settings.langfuse_credentials().is_some())
    );

    Ok(())
}

fn yes_no(flag: bool) -> colored::ColoredString {
    if flag {
        "yes".green()
    } else {
        "no".yellow()
    }
}

/// Sanitize secrets in settings for safe display
fn sanitize_secrets(settings: &Settings) -> Settings {
    let mut sanitized = settings.clone();

    for secret in [
        &mut sanitized.openai_api_key,
        &mut sanitized.langfuse_public_key,
        &mut sanitized.langfuse_secret_key,
    ] {
        if let Some(value) = secret.as_mut() {
            *value = mask_api_key(value);
        }
    }

    sanitized
}

/// Mask an API key for safe display
///
/// Shows first 7 and last 4 characters with asterisks in between
/// Example: "sk-1234567890abcdef" -> "sk-1234...cdef"
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        // Too short to mask meaningfully
        return "***".to_string();
    }

    let prefix: String = chars[..7].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();

    format!("{}...{}", prefix, suffix)
}
