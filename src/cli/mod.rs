//! Command-line entry point and startup flow.
//!
//! Loads (or interactively creates) the configuration, drives the startup
//! menu, and hands off to the chat session. Every configuration-affecting
//! menu action rewrites the config file before the next step.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::debug;

use crate::api::models::{fetch_openrouter_models, ModelInfo};
use crate::core::config::{Config, DEFAULT_ANTHROPIC_VERSION};
use crate::core::error::Result;
use crate::core::providers::Provider;
use crate::ui::ansi::{GREEN, RESET, YELLOW};
use crate::ui::chat_loop::{run_session, SessionOutcome};
use crate::ui::menu::MenuItem;
use crate::ui::navigation::navigate;

#[derive(Parser)]
#[command(name = "trichat")]
#[command(about = "A terminal chat client for Anthropic, OpenRouter, and Gemini")]
#[command(
    long_about = "Trichat is a menu-driven terminal chat client that talks to the Anthropic, \
OpenRouter, and Gemini APIs, with streaming responses where the provider supports them.\n\n\
Navigation:\n\
  Arrow keys        Move / enter submenus (interactive terminals)\n\
  1-9               Jump-select a menu entry\n\
  Q / Esc           Quit the current menu\n\n\
Chat commands:\n\
  /menu or /back    Return to the main menu\n\
  /exit or /quit    Exit the application\n\
  /help or ?        Show chat commands\n\
  /save, /load      Persist or restore the conversation"
)]
pub struct Args {
    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StartupChoice {
    StartChat { streaming: bool },
    ConfigureNew,
    ChangeModel,
    BrowseModels,
    ToggleAutosave,
    Exit,
}

#[derive(Clone)]
enum ModelPick {
    Keep,
    Choose(String),
    Search,
}

pub async fn run(args: Args) -> Result<()> {
    let config_path = args.config.unwrap_or_else(Config::default_path);
    debug!(config_path = %config_path.display(), "starting up");

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(60))
        .timeout(Duration::from_secs(300))
        .build()?;

    loop {
        let mut config = if config_path.exists() {
            match Config::load_from_path(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    println!("❌ {e}");
                    println!("Running first-time setup instead.");
                    let config = setup_config()?;
                    config.save_to_path(&config_path)?;
                    config
                }
            }
        } else {
            println!("No configuration found. Setting up a new API...");
            let config = setup_config()?;
            config.save_to_path(&config_path)?;
            config
        };

        let Some(choice) = startup_menu(&config) else {
            return Ok(());
        };

        match choice {
            StartupChoice::Exit => return Ok(()),
            StartupChoice::ConfigureNew => {
                let config = setup_config()?;
                config.save_to_path(&config_path)?;
            }
            StartupChoice::ChangeModel => {
                change_model(&mut config)?;
                config.save_to_path(&config_path)?;
            }
            StartupChoice::BrowseModels => {
                if let Err(e) = browse_openrouter_models(&mut config, &client).await {
                    println!("❌ Could not fetch models: {e}");
                    println!("Keeping existing model: {}", config.model);
                }
                config.save_to_path(&config_path)?;
            }
            StartupChoice::ToggleAutosave => {
                config.autosave = !config.autosave;
                config.save_to_path(&config_path)?;
                println!(
                    "💾 Autosave on exit is now {}.",
                    if config.autosave { "enabled" } else { "disabled" }
                );
            }
            StartupChoice::StartChat { streaming } => {
                config.use_streaming = streaming;
                config.validate()?;
                config.save_to_path(&config_path)?;
                println!(
                    "{GREEN}✅ Configuration loaded: {} API with model {}{RESET}",
                    config.provider.as_str().to_uppercase(),
                    config.model
                );
                match run_session(&config, &client).await? {
                    SessionOutcome::BackToMenu => {}
                    SessionOutcome::ExitApp => return Ok(()),
                }
            }
        }
    }
}

fn startup_menu(config: &Config) -> Option<StartupChoice> {
    let mut items = vec![
        MenuItem::leaf(
            "chat",
            "Use existing configuration (Normal Chat)",
            StartupChoice::StartChat { streaming: false },
        ),
        MenuItem::leaf(
            "chat-streaming",
            "Use existing configuration (Streaming Chat)",
            StartupChoice::StartChat { streaming: true },
        ),
        MenuItem::leaf("configure", "Configure new API", StartupChoice::ConfigureNew),
        MenuItem::leaf(
            "change-model",
            "Change model only (keep same API key)",
            StartupChoice::ChangeModel,
        ),
    ];
    if config.provider == Provider::OpenRouter {
        items.push(MenuItem::leaf(
            "browse-models",
            "Browse all OpenRouter models (free/paid)",
            StartupChoice::BrowseModels,
        ));
    }
    items.push(MenuItem::leaf(
        "autosave",
        "Toggle autosave on exit",
        StartupChoice::ToggleAutosave,
    ));
    items.push(MenuItem::leaf("exit", "Exit", StartupChoice::Exit));

    let title = format!(
        "Main Menu - Current: {} API with model {}",
        config.provider.as_str().to_uppercase(),
        config.model
    );
    navigate(&items, &title)
}

fn setup_config() -> Result<Config> {
    let providers = vec![
        MenuItem::leaf("anthropic", Provider::Anthropic.display_name(), Provider::Anthropic),
        MenuItem::leaf(
            "openrouter",
            Provider::OpenRouter.display_name(),
            Provider::OpenRouter,
        ),
        MenuItem::leaf("gemini", Provider::Gemini.display_name(), Provider::Gemini),
    ];
    let provider =
        navigate(&providers, "API Provider Selection").unwrap_or(Provider::Anthropic);

    match provider {
        Provider::Anthropic => setup_anthropic(),
        Provider::OpenRouter => setup_openrouter(),
        Provider::Gemini => setup_gemini(),
    }
}

fn setup_anthropic() -> Result<Config> {
    let version = prompt_with_default("Enter Anthropic API version", DEFAULT_ANTHROPIC_VERSION)?;
    let api_key = prompt("Enter your Anthropic API key")?;
    let model = prompt_with_default("Enter model name", "claude-3-5-haiku-20241022")?;

    Ok(Config {
        url: Provider::Anthropic.chat_url(&model),
        provider: Provider::Anthropic,
        anthropic_version: Some(version),
        api_key,
        model,
        app_name: None,
        site_url: None,
        use_streaming: false,
        autosave: false,
    })
}

fn setup_openrouter() -> Result<Config> {
    let api_key = prompt("Enter your OpenRouter API key")?;
    println!("\nPopular OpenRouter models:");
    for model in [
        "openai/gpt-4o",
        "openai/gpt-4o-mini",
        "anthropic/claude-3.5-sonnet",
        "google/gemini-2.5-flash-lite",
        "mistralai/mistral-large",
        "qwen/qwen3-coder:free",
    ] {
        println!("- {model}");
    }
    let model = prompt_with_default("Enter model name", "openai/gpt-4o")?;
    let app_name = prompt_optional("Enter your app/site name (optional)")?;
    let site_url = prompt_optional("Enter your site URL (optional)")?;

    Ok(Config {
        url: Provider::OpenRouter.chat_url(&model),
        provider: Provider::OpenRouter,
        anthropic_version: None,
        api_key,
        model,
        app_name,
        site_url,
        use_streaming: false,
        autosave: false,
    })
}

fn setup_gemini() -> Result<Config> {
    let api_key = prompt("Enter your Google AI Studio API key")?;
    println!("\nAvailable Gemini models:");
    println!("- gemini-2.5-flash (latest multimodal model)");
    println!("- gemini-2.5-flash-lite (fastest, most cost-effective)");
    println!("- gemini-2.5-pro (most powerful reasoning model)");
    let model = prompt_with_default("Enter model name", "gemini-2.5-flash")?;

    Ok(Config {
        url: Provider::Gemini.chat_url(&model),
        provider: Provider::Gemini,
        anthropic_version: None,
        api_key,
        model,
        app_name: None,
        site_url: None,
        use_streaming: false,
        autosave: false,
    })
}

fn change_model(config: &mut Config) -> Result<()> {
    println!(
        "\nChanging {} model (keeping existing API key)",
        config.provider
    );
    let model = prompt_with_default("Enter new model name", &config.model)?;
    config.model = model;
    config.refresh_url();
    Ok(())
}

async fn browse_openrouter_models(
    config: &mut Config,
    client: &reqwest::Client,
) -> Result<()> {
    if config.provider != Provider::OpenRouter {
        println!("Model browsing is only available for OpenRouter.");
        return Ok(());
    }

    println!("\n🔍 Fetching latest OpenRouter models...");
    let models = fetch_openrouter_models(client, &config.api_key).await?;
    if models.is_empty() {
        println!("❌ No models available.");
        return Ok(());
    }

    let free: Vec<&ModelInfo> = models.iter().filter(|m| m.is_free()).collect();
    let paid: Vec<&ModelInfo> = models.iter().filter(|m| !m.is_free()).collect();

    let free_items: Vec<MenuItem<ModelPick>> = free
        .iter()
        .map(|model| {
            MenuItem::leaf(
                model.id.clone(),
                format!("{} - {}", model.id, model.name),
                ModelPick::Choose(model.id.clone()),
            )
        })
        .collect();
    // Cap the paid list so the menu stays navigable.
    let paid_items: Vec<MenuItem<ModelPick>> = paid
        .iter()
        .take(50)
        .map(|model| {
            MenuItem::leaf(
                model.id.clone(),
                format!(
                    "{} - {} (💵 ${}/1k prompt, ${}/1k completion)",
                    model.id, model.name, model.pricing.prompt, model.pricing.completion
                ),
                ModelPick::Choose(model.id.clone()),
            )
        })
        .collect();

    let items = vec![
        MenuItem::leaf(
            "keep",
            format!("Keep current model: {}", config.model),
            ModelPick::Keep,
        ),
        MenuItem::branch(
            "free",
            format!("🆓 Browse Free Models ({})", free.len()),
            free_items,
        ),
        MenuItem::branch(
            "paid",
            format!(
                "💰 Browse Paid Models (showing {}/{})",
                paid.len().min(50),
                paid.len()
            ),
            paid_items,
        ),
        MenuItem::leaf("search", "🔍 Search models (text-based)", ModelPick::Search),
    ];

    match navigate(&items, "OpenRouter Model Browser") {
        Some(ModelPick::Choose(id)) => {
            config.model = id;
            config.refresh_url();
            println!("{GREEN}✅ Selected: {}{RESET}", config.model);
        }
        Some(ModelPick::Search) => {
            if let Some(id) = search_models(&models)? {
                config.model = id;
                config.refresh_url();
                println!("{GREEN}✅ Selected: {}{RESET}", config.model);
            }
        }
        Some(ModelPick::Keep) | None => {}
    }
    Ok(())
}

fn search_models(models: &[ModelInfo]) -> Result<Option<String>> {
    let term = prompt("Enter search term")?.to_lowercase();
    if term.is_empty() {
        return Ok(None);
    }

    let matches: Vec<&ModelInfo> = models
        .iter()
        .filter(|m| m.id.to_lowercase().contains(&term) || m.name.to_lowercase().contains(&term))
        .take(10)
        .collect();

    if matches.is_empty() {
        println!("{YELLOW}❌ No models found matching '{term}'{RESET}");
        return Ok(None);
    }

    println!("\n🔍 Search results for '{term}':");
    for (index, model) in matches.iter().enumerate() {
        let tag = if model.is_free() { " [FREE]" } else { "" };
        println!("{}. {}{tag}", index + 1, model.id);
        println!("   📝 {}", model.name);
    }

    let choice = prompt(&format!("Select model (1-{})", matches.len()))?;
    match choice.parse::<usize>() {
        Ok(index) if (1..=matches.len()).contains(&index) => {
            Ok(Some(matches[index - 1].id.clone()))
        }
        _ => {
            println!("{YELLOW}❌ Invalid selection. No model selected.{RESET}");
            Ok(None)
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    let value = prompt(&format!("{label} (default: {default})"))?;
    Ok(if value.is_empty() {
        default.to_string()
    } else {
        value
    })
}

fn prompt_optional(label: &str) -> Result<Option<String>> {
    let value = prompt(label)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}
