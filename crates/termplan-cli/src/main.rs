mod catalog_cmd;
mod check_cmd;
mod config;
mod course_cmds;
mod resolve;
mod session;
mod show_cmd;
mod term_cmds;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use termplan_core::Plan;

use config::TermplanConfig;

#[derive(Parser)]
#[command(
    name = "termplan",
    version,
    about = "Plan courses across terms and check their requisites"
)]
struct Cli {
    /// Plan file (overrides TERMPLAN_PLAN env var)
    #[arg(long, global = true)]
    plan: Option<PathBuf>,

    /// Catalog file (overrides TERMPLAN_CATALOG env var)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a termplan config file (uses --plan and --catalog if given)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create a new plan file
    New {
        /// Plan name
        #[arg(long, default_value = "My plan")]
        name: String,
        /// Number of empty terms to start with
        #[arg(long, default_value_t = 8)]
        terms: usize,
        /// Overwrite an existing plan file
        #[arg(long)]
        force: bool,
    },
    /// Show the plan term by term
    Show,
    /// Check requirements for every placed course
    Check {
        /// Exit with an error if any course is unsatisfied
        #[arg(long)]
        strict: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Term management
    Term {
        #[command(subcommand)]
        command: TermCommands,
    },
    /// Course placement
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Catalog tools
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum TermCommands {
    /// Add an empty term
    Add {
        /// Term name (defaults to "Term N")
        #[arg(long)]
        name: Option<String>,
        /// 1-based position to insert at (defaults to the end)
        #[arg(long)]
        at: Option<usize>,
    },
    /// Rename a term (omit NAME to clear it)
    Rename {
        /// Term position, id or name
        term: String,
        /// New name
        name: Option<String>,
    },
    /// Delete a term
    Delete {
        /// Term position, id or name
        term: String,
        /// Un-place the term's courses instead of refusing
        #[arg(long)]
        cascade: bool,
    },
    /// Move a term to a new position
    Move {
        /// Term position, id or name
        term: String,
        /// 1-based target position
        position: usize,
    },
}

#[derive(Subcommand)]
pub enum CourseCommands {
    /// Add a course to a term, fetching it from the catalog if needed
    Add {
        /// Course code (e.g. "CS 135")
        code: String,
        /// Term position, id or name
        term: String,
        /// 1-based position within the term (defaults to the end)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Move a placed course to another term
    Move {
        /// Course code
        code: String,
        /// Target term position, id or name
        term: String,
        /// 1-based position within the target term (defaults to the end)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Remove a course from its term
    Remove {
        /// Course code
        code: String,
    },
    /// Mark a course as already taken
    Take {
        /// Course code
        code: String,
    },
    /// Clear the taken mark on a course
    Untake {
        /// Course code
        code: String,
    },
    /// Fetch metadata for placed courses that have none
    Refresh,
    /// Show course details and its verdict in the plan
    Info {
        /// Course code
        code: String,
    },
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Validate a catalog file
    Check {
        /// Catalog file (defaults to the configured catalog)
        path: Option<PathBuf>,
    },
}

/// Execute the `termplan init` command: write config file.
fn cmd_init(plan: Option<&Path>, catalog: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    cfg.plan.path = plan.map(absolute);
    cfg.catalog.path = catalog.map(absolute);
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match &cfg.plan.path {
        Some(p) => println!("  plan.path = {}", p.display()),
        None => println!("  plan.path = {} (default)", config::DEFAULT_PLAN_PATH),
    }
    if let Some(c) = &cfg.catalog.path {
        println!("  catalog.path = {}", c.display());
    }
    println!();
    println!("Next: run `termplan new` to create a plan.");

    Ok(())
}

/// Config paths are stored absolute so they work from any directory.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Execute the `termplan new` command: write an empty plan.
fn cmd_new(config: &TermplanConfig, name: &str, terms: usize, force: bool) -> anyhow::Result<()> {
    let plan = Plan::with_terms(name, terms);
    let path = session::create_plan(&config.plan_path, &plan, force)?;
    println!("Plan {name:?} with {terms} term(s) written to {}", path.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolve_config = || TermplanConfig::resolve(cli.plan.as_deref(), cli.catalog.as_deref());

    match cli.command {
        Commands::Init { force } => {
            cmd_init(cli.plan.as_deref(), cli.catalog.as_deref(), force)?;
        }
        Commands::New { name, terms, force } => {
            cmd_new(&resolve_config()?, &name, terms, force)?;
        }
        Commands::Show => {
            show_cmd::run_show(&resolve_config()?)?;
        }
        Commands::Check { strict, json } => {
            check_cmd::run_check(&resolve_config()?, strict, json)?;
        }
        Commands::Term { command } => {
            term_cmds::run_term_command(command, resolve_config()?)?;
        }
        Commands::Course { command } => {
            course_cmds::run_course_command(command, resolve_config()?).await?;
        }
        Commands::Catalog { command } => {
            let CatalogCommands::Check { path } = command;
            let path = match path {
                Some(path) => Some(path),
                None => resolve_config()?.catalog_path,
            };
            catalog_cmd::run_catalog_check(path.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "termplan", &mut std::io::stdout());
        }
    }

    Ok(())
}
