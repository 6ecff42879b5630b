//! # projust
//!
//! A terminal project manager for a single user. Projects hold requirements
//! and tasks; members of the organisation are assigned to tasks and can hold
//! the creator, product owner and scrum master roles of a project. Tasks and
//! requirements are linked many-to-many, and a requirement's status is the
//! share of its linked tasks that are completed.
//!
//! ## Usage
//!
//! ```bash
//! # Projects
//! projust project add "Website" --due 2030-01-01 --hours 400
//! projust project list
//! projust project show P4xQ
//! projust project role P4xQ scrum-master ann@example.com
//!
//! # Requirements and tasks
//! projust requirement add P4xQ "Login" --due 2029-12-01 --priority High
//! projust task add P4xQ "Login form" --hours 5 --due 2029-12-01
//! projust task link P4xQTk29Bc1 P4xQR0xz
//! projust task complete P4xQTk29Bc1
//! projust requirement list --status-over 0.5
//!
//! # Members
//! projust member add Ann Lee ann@example.com --birthday 1990-04-02
//! projust task assign P4xQTk29Bc1 ann@example.com
//! ```
//!
//! Removing a task, requirement, project or member that is still linked to
//! something is refused; unlink first (or pass `--unlink` to `task remove`
//! and `requirement remove`).
//!
//! ## Data Storage
//!
//! The model is saved as JSON in your local data directory:
//! *   Linux: `~/.local/share/projust/projust.json`
//! *   macOS: `~/Library/Application Support/projust/projust.json`
//! *   Windows: `%APPDATA%\projust\projust.json`
//!
//! Override it with `--db <path>` or the `PROJUST_DB` environment variable.
//! `--today YYYY-MM-DD` replaces the system date used to reject past
//! deadlines. Logging goes to stderr and is controlled by `RUST_LOG`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projust::commands::*;
use projust::date::{Clock, FixedClock, SystemClock};
use projust::storage::{db_path, load_model, save_model};

#[derive(Parser)]
#[command(name = "projust")]
#[command(about = "Single-user project manager", long_about = None)]
struct Cli {
    /// Model file (defaults to $PROJUST_DB or the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Use this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage requirements
    Requirement {
        #[command(subcommand)]
        command: RequirementCommands,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Manage members
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Add a new project
    Add {
        /// Project title (quoted if it has spaces)
        title: String,
        /// Deadline in YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Planned work hours
        #[arg(short = 'H', long, default_value_t = 0.0)]
        hours: f64,
    },
    /// List projects
    List {
        /// Only projects due before this date
        #[arg(short, long)]
        before: Option<String>,
    },
    /// Show a project with its requirements and tasks
    Show { id: String },
    /// Remove an empty project
    Remove { id: String },
    /// Set or clear a role (creator, product-owner, scrum-master)
    Role {
        id: String,
        role: String,
        /// Member email or id; omit to clear the role
        member: Option<String>,
    },
}

#[derive(Subcommand)]
enum RequirementCommands {
    /// Add a requirement to a project
    Add {
        project: String,
        title: String,
        /// Deadline in YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        /// Critical, High or Low
        #[arg(short, long)]
        priority: String,
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// List requirements
    List {
        #[arg(short = 'P', long)]
        project: Option<String>,
        /// Critical, High or Low
        #[arg(short, long)]
        priority: Option<String>,
        /// Only approved requirements
        #[arg(long, conflicts_with = "disapproved")]
        approved: bool,
        /// Only requirements not approved yet
        #[arg(long)]
        disapproved: bool,
        /// Only requirements at least this complete (0 to 1)
        #[arg(short, long)]
        status_over: Option<f64>,
    },
    /// Approve a requirement
    Approve {
        id: String,
        /// Withdraw the approval instead
        #[arg(long)]
        revoke: bool,
    },
    /// Remove a requirement
    Remove {
        id: String,
        /// Unlink it from its tasks first
        #[arg(long)]
        unlink: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task to a project
    Add {
        project: String,
        title: String,
        /// Estimated work hours (at least 1)
        #[arg(short = 'H', long)]
        hours: f64,
        /// Deadline in YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        #[arg(short = 'P', long)]
        project: Option<String>,
        /// started or completed
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Mark a task as complete
    Complete { id: String },
    /// Mark a completed task as started again
    Reopen { id: String },
    /// Log hours worked on a task
    Log {
        id: String,
        /// Hours to add
        hours: f64,
    },
    /// Re-estimate remaining hours for a task
    Estimate {
        id: String,
        /// Remaining hours needed
        remaining: f64,
    },
    /// Remove a task
    Remove {
        id: String,
        /// Unlink it from requirements and members first
        #[arg(long)]
        unlink: bool,
    },
    /// Link a task to a requirement
    Link { task: String, requirement: String },
    /// Unlink a task from a requirement
    Unlink { task: String, requirement: String },
    /// Assign a member (email or id) to a task
    Assign { task: String, member: String },
    /// Unassign a member from a task
    Unassign { task: String, member: String },
}

#[derive(Subcommand)]
enum MemberCommands {
    /// Hire a member
    Add {
        first_name: String,
        last_name: String,
        email: String,
        /// Birthday in YYYY-MM-DD
        #[arg(short, long)]
        birthday: String,
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// List members
    List {
        /// Only members working on this project
        #[arg(short = 'P', long)]
        project: Option<String>,
    },
    /// Fire a member (email or id)
    Remove { member: String },
}

/// Initialize tracing with output to stderr so tables on stdout stay clean
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "projust=warn".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => anyhow::bail!("Unsupported shell: {}", shell),
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "projust", &mut io::stdout());
        return Ok(());
    }

    let clock: Box<dyn Clock> = match &cli.today {
        Some(d) => Box::new(FixedClock(parse_date(d)?)),
        None => Box::new(SystemClock),
    };
    let path = cli.db.clone().unwrap_or_else(db_path);
    let mut model = load_model(&path, clock)?;
    let m = &mut model;

    let changed = match cli.command {
        Commands::Project { command } => match command {
            ProjectCommands::Add { title, due, description, hours } => {
                cmd_project_add(m, &title, description, &due, hours).map(|_| true)
            }
            ProjectCommands::List { before } => cmd_project_list(m, before).map(|_| false),
            ProjectCommands::Show { id } => cmd_project_show(m, &id).map(|_| false),
            ProjectCommands::Remove { id } => cmd_project_remove(m, &id).map(|_| true),
            ProjectCommands::Role { id, role, member } => {
                cmd_project_role(m, &id, &role, member).map(|_| true)
            }
        },
        Commands::Requirement { command } => match command {
            RequirementCommands::Add { project, title, due, priority, description } => {
                cmd_requirement_add(m, &project, &title, description, &due, &priority).map(|_| true)
            }
            RequirementCommands::List { project, priority, approved, disapproved, status_over } => {
                let approved = match (approved, disapproved) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                let filter = RequirementFilter { project, priority, approved, status_over };
                cmd_requirement_list(m, filter).map(|_| false)
            }
            RequirementCommands::Approve { id, revoke } => {
                cmd_requirement_approve(m, &id, !revoke).map(|_| true)
            }
            RequirementCommands::Remove { id, unlink } => {
                cmd_requirement_remove(m, &id, unlink).map(|_| true)
            }
        },
        Commands::Task { command } => match command {
            TaskCommands::Add { project, title, hours, due, description } => {
                cmd_task_add(m, &project, &title, description, hours, &due).map(|_| true)
            }
            TaskCommands::List { project, status } => cmd_task_list(m, project, status).map(|_| false),
            TaskCommands::Complete { id } => cmd_task_complete(m, &id).map(|_| true),
            TaskCommands::Reopen { id } => cmd_task_reopen(m, &id).map(|_| true),
            TaskCommands::Log { id, hours } => cmd_task_log(m, &id, hours).map(|_| true),
            TaskCommands::Estimate { id, remaining } => cmd_task_estimate(m, &id, remaining).map(|_| true),
            TaskCommands::Remove { id, unlink } => cmd_task_remove(m, &id, unlink).map(|_| true),
            TaskCommands::Link { task, requirement } => cmd_task_link(m, &task, &requirement).map(|_| true),
            TaskCommands::Unlink { task, requirement } => {
                cmd_task_unlink(m, &task, &requirement).map(|_| true)
            }
            TaskCommands::Assign { task, member } => cmd_task_assign(m, &task, &member).map(|_| true),
            TaskCommands::Unassign { task, member } => cmd_task_unassign(m, &task, &member).map(|_| true),
        },
        Commands::Member { command } => match command {
            MemberCommands::Add { first_name, last_name, email, birthday, phone } => {
                cmd_member_add(m, &first_name, &last_name, &email, &birthday, phone).map(|_| true)
            }
            MemberCommands::List { project } => cmd_member_list(m, project).map(|_| false),
            MemberCommands::Remove { member } => cmd_member_remove(m, &member).map(|_| true),
        },
        Commands::Completions { .. } => Ok(false),
    }?;

    if changed {
        save_model(&path, &model)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
