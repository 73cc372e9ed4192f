use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use civic::access::AccessPolicy;
use civic::commands;
use civic::commands::init::{DATA_DIR, DB_FILE};
use civic::db::SqliteStore;
use civic::models::{IssueFilter, IssueStatus, NewIssue};

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Track civic issues: report, discuss, upvote and resolve")]
#[command(version)]
struct Cli {
    /// Display name of the current user
    #[arg(long, global = true, env = "CIVIC_USER", default_value = "Current User")]
    user: String,

    /// Role token of the current user
    #[arg(long, global = true, env = "CIVIC_ROLE", default_value = "citizen")]
    role: String,

    /// Log output format
    #[arg(long, global = true, env = "CIVIC_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize civic in the current directory
    Init,

    /// Report a new issue
    Report {
        /// Issue title
        title: String,
        /// Category (Roads, Water, Sanitation, ...)
        #[arg(short, long)]
        category: String,
        /// Where the issue is
        #[arg(short, long, default_value = "")]
        location: String,
        /// Issue description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Image asset id
        #[arg(long)]
        image: Option<String>,
    },

    /// List issues, newest first
    List {
        /// Filter by status (open, in-progress, resolved)
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Only issues reported by the current user
        #[arg(long)]
        mine: bool,
    },

    /// Show issue details
    Show {
        /// Issue ID
        id: String,
    },

    /// Change an issue's status (admin only)
    Manage {
        /// Issue ID
        id: String,
        /// New status (open, in-progress, resolved)
        status: String,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue ID
        id: String,
        /// Comment text
        text: String,
    },

    /// Upvote an issue
    Upvote {
        /// Issue ID
        id: String,
    },

    /// Show status-change notifications for the current user's issues
    Notifications,

    /// Export all issues
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Export as markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },

    /// Load demo issues into an empty database
    Seed,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn find_civic_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(DATA_DIR);
        if candidate.exists() && candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a civic directory (or any parent). Run 'civic init' first.");
        }
    }
}

fn get_store() -> Result<SqliteStore> {
    let civic_dir = find_civic_dir()?;
    let db_path = civic_dir.join(DB_FILE);
    debug!(path = %db_path.display(), "opening store");
    SqliteStore::open(&db_path).context("Failed to open database")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let policy = AccessPolicy::default();

    match cli.command {
        Commands::Init => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd)
        }

        Commands::Report {
            title,
            category,
            location,
            description,
            image,
        } => {
            let mut store = get_store()?;
            commands::report::run(
                &mut store,
                NewIssue {
                    title,
                    description,
                    category,
                    location,
                    reporter: cli.user,
                    date: None,
                    image_id: image,
                },
            )
        }

        Commands::List {
            status,
            category,
            mine,
        } => {
            let store = get_store()?;
            let status = status
                .as_deref()
                .map(str::parse::<IssueStatus>)
                .transpose()?;
            let filter = IssueFilter {
                status,
                category,
                reporter: mine.then_some(cli.user),
            };
            commands::list::run(&store, &filter)
        }

        Commands::Show { id } => {
            let store = get_store()?;
            commands::show::run(&store, &policy, &cli.role, &id)
        }

        Commands::Manage { id, status } => {
            let status: IssueStatus = status.parse()?;
            let mut store = get_store()?;
            commands::manage::run(&mut store, &policy, &cli.role, &id, status)
        }

        Commands::Comment { id, text } => {
            let mut store = get_store()?;
            commands::comment::run(&mut store, &id, &cli.user, &text)
        }

        Commands::Upvote { id } => {
            let mut store = get_store()?;
            commands::upvote::run(&mut store, &id)
        }

        Commands::Notifications => {
            let store = get_store()?;
            commands::notifications::run(&store, &cli.user)
        }

        Commands::Export { output, markdown } => {
            let store = get_store()?;
            if markdown {
                commands::export::run_markdown(&store, output.as_deref())
            } else {
                commands::export::run_json(&store, output.as_deref())
            }
        }

        Commands::Seed => {
            let mut store = get_store()?;
            commands::seed::run(&mut store)
        }
    }
}
