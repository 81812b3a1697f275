//! `backoffice` command line: bootstrap the database and print the read-side
//! views as JSON.
//!
//! Usage:
//!   backoffice init
//!   backoffice bootstrap-admin --name "Root" --email root@example.com
//!   backoffice org-tree --actor 1
//!   backoffice workspace --actor 4
//!
//! Environment variables:
//!   BACKOFFICE_DB - database file (overrides `databasePath` in config.json)
//!   RUST_LOG - log filter (overrides `logLevel` in config.json)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use backoffice_lib::services::{self, graph, notifications, tasks, workspace};
use backoffice_lib::state::{self, AppState};
use backoffice_lib::{CoreError, ErrorResponse};

#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(about = "Back office core: accounts, project teams, task boards and workspaces")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(long, env = "BACKOFFICE_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and apply migrations
    Init,
    /// Create the first super-admin, or return it if the email exists
    BootstrapAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Organization-wide relationship graph (super-admins only)
    OrgTree {
        #[arg(long)]
        actor: i64,
    },
    /// One customer's projects and teams
    CustomerTree {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        customer: i64,
    },
    /// One sub-admin's projects and teams
    SubAdminTree {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        sub_admin: i64,
    },
    /// The acting developer's workspace
    Workspace {
        #[arg(long)]
        actor: i64,
    },
    /// The acting account's notification feed
    Notifications {
        #[arg(long)]
        actor: i64,
    },
    /// Mark one notification read, or all of them
    MarkRead {
        #[arg(long)]
        actor: i64,
        #[arg(long, conflicts_with = "all")]
        id: Option<i64>,
        #[arg(long)]
        all: bool,
    },
    /// A project's task board
    Board {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        project: i64,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkedRead {
    marked: usize,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CoreError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::invalid(format!("Failed to serialize output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn run(state: &AppState, command: Command) -> Result<(), CoreError> {
    let limits = state.config().workspace_limits();
    state.with_db(|db| match command {
        Command::Init => {
            log::info!("Database ready");
            Ok(())
        }
        Command::BootstrapAdmin { name, email } => {
            print_json(&services::accounts::ensure_super_admin(db, &name, &email)?)
        }
        Command::OrgTree { actor } => {
            let viewer = services::principal_for(db, actor)?;
            print_json(&graph::organization_tree_for(db, &viewer)?)
        }
        Command::CustomerTree { actor, customer } => {
            let viewer = services::principal_for(db, actor)?;
            print_json(&graph::customer_tree_for(db, &viewer, customer)?)
        }
        Command::SubAdminTree { actor, sub_admin } => {
            let viewer = services::principal_for(db, actor)?;
            print_json(&graph::sub_admin_tree_for(db, &viewer, sub_admin)?)
        }
        Command::Workspace { actor } => {
            let viewer = services::principal_for(db, actor)?;
            print_json(&workspace::developer_workspace(db, viewer.id, limits)?)
        }
        Command::Notifications { actor } => {
            let viewer = services::principal_for(db, actor)?;
            print_json(&notifications::feed(db, viewer.id)?)
        }
        Command::MarkRead { actor, id, all } => {
            let viewer = services::principal_for(db, actor)?;
            match (id, all) {
                (Some(id), _) => print_json(&notifications::mark_read(db, viewer.id, id)?),
                (None, true) => print_json(&MarkedRead {
                    marked: notifications::mark_all_read(db, viewer.id)?,
                }),
                (None, false) => Err(CoreError::invalid("Pass --id <notification> or --all.")),
            }
        }
        Command::Board { actor, project } => {
            let viewer = services::principal_for(db, actor)?;
            print_json(&tasks::project_board(db, &viewer, project)?)
        }
    })
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match state::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = args.db {
        config.database_path = Some(path);
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let state = AppState::with_config(Some(config));
    match run(&state, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let response = ErrorResponse::from(&e);
            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}", response.message),
            }
            ExitCode::FAILURE
        }
    }
}
