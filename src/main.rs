use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use portfolio_core::display::{format_date, language_color};
use portfolio_core::filter::language_filter_from_option;
use portfolio_core::preferences::IntroPreferences;
use portfolio_core::{Config, ProjectsOrchestrator, RepositoryPage, SortMode};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "portfolio",
    about = "Browse a developer portfolio and its repositories",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Portfolio backend base URL
    #[arg(long, global = true, env = "PORTFOLIO_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List repositories
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Only names containing this text (case-insensitive)
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only this language ("All" for every language)
        #[arg(short, long, default_value = "")]
        language: String,

        /// Sort order (recent, oldest, alphabetical)
        #[arg(long, default_value = "recent")]
        sort: SortMode,

        /// Page to show, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// List the languages found across all repositories
    Languages,

    /// Onboarding intro preference
    Intro {
        #[command(subcommand)]
        command: IntroCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum IntroCommands {
    /// Show whether the intro is displayed on startup
    Show,

    /// Display the intro on startup
    Enable,

    /// Skip the intro on startup
    Disable,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    sort: SortMode,
    total_repositories: usize,
    #[serde(flatten)]
    page: &'a RepositoryPage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    debug!("Using backend {}", config.api.base_url);

    match cli.command {
        Commands::List {
            format,
            search,
            language,
            sort,
            page,
        } => {
            let orchestrator = load_repositories(&config).await?;
            orchestrator.set_sort_mode(sort);
            orchestrator.update_search_query(search);
            orchestrator.update_selected_language(language_filter_from_option(&language));
            let current = orchestrator.go_to_page(page);

            match format {
                OutputFormat::Json => {
                    let output = ListOutput {
                        sort,
                        total_repositories: orchestrator.total_repository_count(),
                        page: &current,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Table => print_table(&current, sort),
            }
        }
        Commands::Languages => {
            let orchestrator = load_repositories(&config).await?;
            for language in orchestrator.language_options().iter().skip(1) {
                println!("{:<16} {}", language, language_color(language));
            }
        }
        Commands::Intro { command } => {
            let prefs = IntroPreferences::new(config.preferences.resolve_path()?);
            match command {
                IntroCommands::Show => {
                    println!("show_intro_on_startup = {}", prefs.show_intro_on_startup()?);
                }
                IntroCommands::Enable => prefs.set_show_intro_on_startup(true)?,
                IntroCommands::Disable => prefs.set_show_intro_on_startup(false)?,
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { force } => {
                if config_path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    );
                }
                Config::default().save(&config_path)?;
                println!("Wrote {}", config_path.display());
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

/// Run one fetch sequence, printing progress toasts as they arrive
async fn load_repositories(config: &Config) -> Result<ProjectsOrchestrator> {
    let orchestrator = ProjectsOrchestrator::from_config(config)?;
    let mut toasts = orchestrator.subscribe_toasts();

    let mut handle = orchestrator.fetch_repositories();
    let result = loop {
        tokio::select! {
            joined = &mut handle => break joined.context("fetch task panicked")?,
            Ok(toast) = toasts.recv() => eprintln!("{}", toast),
        }
    };
    while let Ok(toast) = toasts.try_recv() {
        eprintln!("{}", toast);
    }

    result
        .map_err(portfolio_core::Error::from)
        .with_context(|| {
            orchestrator
                .error_message()
                .unwrap_or_else(|| "Failed to load repositories".to_string())
        })?;
    Ok(orchestrator)
}

fn print_table(page: &RepositoryPage, sort: SortMode) {
    if page.items.is_empty() {
        println!("No repositories found.");
        return;
    }

    println!(
        "{:<32} {:<12} {:<10} DESCRIPTION",
        "NAME", "LANGUAGE", "PUSHED"
    );
    for repo in &page.items {
        println!(
            "{:<32} {:<12} {:<10} {}",
            repo.name,
            repo.language,
            format_date(&repo.pushed_at),
            repo.display_description()
        );
    }
    println!(
        "\nPage {}/{} - {} repositories - sorted by {}",
        page.page_number,
        page.total_pages,
        page.total_items,
        sort.label()
    );
}
