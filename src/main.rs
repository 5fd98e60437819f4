//! # Taskboard
//!
//! A terminal task board with recurring task templates.
//!
//! ## Features
//!
//! *   **Recurring templates**: daily, weekly and monthly rules that turn into
//!     tasks on schedule or on demand.
//! *   **Filter and sort**: narrow tasks by text, status, priority, assignee,
//!     tag and due date; sort by due date, creation time, priority, title or status.
//! *   **Board view**: one column per status.
//! *   **Dual Interface**: a scriptable CLI and an interactive TUI.
//!
//! ## Usage
//!
//! **Templates**
//! ```bash
//! # Every Monday at 09:00
//! taskboard template add "Weekly report" --every weekly --day mon --time 09:00
//!
//! # On the 1st of each month
//! taskboard template add "Invoices" --every monthly --day 1 --time 08:30 --priority high
//!
//! # Create a task from template 1 now, or from everything that is due
//! taskboard template run 1
//! taskboard run-due
//! ```
//!
//! **Tasks**
//! ```bash
//! taskboard task add "Fix bug" --priority high --due 2024-02-20 --tag backend
//! taskboard task list --status pending --sort due_date
//! taskboard task list --range overdue --assignee ayse
//! taskboard board
//! ```
//!
//! ## Data Storage
//!
//! Collections are saved as `tasks.json`, `templates.json` and `tags.json` in
//! `~/.local/share/taskboard` (or the platform equivalent). Override with
//! `--data-dir` or the `TASKBOARD_DATA_DIR` environment variable. Set
//! `TASKBOARD_LOG` (e.g. `info`) to see log output on stderr.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use taskboard::commands::*;
use taskboard::config::Config;
use taskboard::filter::{DateRange, FilterSortSpec, SortBy, SortOrder};
use taskboard::logging;
use taskboard::models::{Priority, TaskStatus};
use taskboard::tui::run_tui;
use taskboard::{Error, Result};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Terminal task board with recurring templates", long_about = None)]
struct Cli {
    /// Directory holding the JSON data files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show tasks as one column per status
    Board {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Manage recurring templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Create tasks for every active template that is due
    RunDue,
    /// Manage the tag vocabulary
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Show when a schedule would next fire
    NextRun {
        #[command(flatten)]
        schedule: ScheduleArgs,
        /// Time of day, HH:MM (24-hour)
        #[arg(short, long)]
        time: String,
        /// Reference time, YYYY-MM-DD HH:MM (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Reset the database (delete all tasks, templates and tags)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Assignee id
        #[arg(short, long)]
        assignee: Option<String>,
        /// Tag id (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date in YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks matching the given filters
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Change the status of a task
    Status {
        id: u64,
        #[arg(value_enum)]
        status: TaskStatus,
    },
    /// Mark a task as completed
    Complete {
        id: u64,
    },
    /// Remove a task
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add a new template
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[command(flatten)]
        schedule: ScheduleArgs,
        /// Time of day, HH:MM (24-hour)
        #[arg(short, long)]
        time: String,
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    /// List templates
    List,
    /// Edit a template
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New frequency; requires --day unless daily
        #[arg(long, value_enum)]
        every: Option<Frequency>,
        #[arg(long, requires = "every")]
        day: Option<String>,
        #[arg(short, long)]
        time: Option<String>,
        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
    },
    /// Activate or deactivate a template
    Toggle {
        id: u64,
    },
    /// Create a task from a template now
    Run {
        id: u64,
    },
    /// Remove a template
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Add a tag
    Add {
        name: String,
    },
    /// List tags
    List,
    /// Remove a tag and strip it from tasks
    Remove {
        id: String,
    },
}

#[derive(Args)]
struct ScheduleArgs {
    /// How often the template fires
    #[arg(short, long, value_enum)]
    every: Frequency,
    /// Day of week (0-6 or name) for weekly, day of month for monthly
    #[arg(long)]
    day: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RangeArg {
    All,
    Today,
    Week,
    Month,
    Overdue,
    Custom,
}

#[derive(Args)]
struct FilterArgs {
    /// Text to look for in title or description
    #[arg(short, long, default_value = "")]
    query: String,
    /// Allowed status (repeatable)
    #[arg(long, value_enum)]
    status: Vec<TaskStatus>,
    /// Allowed priority (repeatable)
    #[arg(long, value_enum)]
    priority: Vec<Priority>,
    /// Allowed assignee (repeatable)
    #[arg(long)]
    assignee: Vec<String>,
    /// Tag id; tasks with any of the given tags match (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Due date range
    #[arg(short, long, value_enum)]
    range: Option<RangeArg>,
    /// Start of a custom range, YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,
    /// End of a custom range, YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,
    #[arg(short, long, value_enum, default_value_t = SortBy::DueDate)]
    sort: SortBy,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl FilterArgs {
    fn into_spec(self) -> Result<FilterSortSpec> {
        let start = self.from.as_deref().map(|d| parse_date("from", d)).transpose()?;
        let end = self.to.as_deref().map(|d| parse_date("to", d)).transpose()?;
        let custom = start.is_some() || end.is_some();
        let date_range = match self.range {
            None if custom => DateRange::Custom { start, end },
            None | Some(RangeArg::All) => DateRange::All,
            Some(RangeArg::Today) => DateRange::Today,
            Some(RangeArg::Week) => DateRange::Week,
            Some(RangeArg::Month) => DateRange::Month,
            Some(RangeArg::Overdue) => DateRange::Overdue,
            Some(RangeArg::Custom) => DateRange::Custom { start, end },
        };
        if custom && !matches!(date_range, DateRange::Custom { .. }) {
            return Err(Error::invalid("range", "--from/--to only apply to a custom range"));
        }
        Ok(FilterSortSpec {
            query: self.query,
            status: self.status,
            priority: self.priority,
            assignee: self.assignee,
            tags: self.tags,
            date_range,
            sort_by: self.sort,
            sort_order: if self.desc { SortOrder::Desc } else { SortOrder::Asc },
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir);
    logging::init(&config.log_filter);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Option<Commands>, config: &Config) -> Result<()> {
    let dir = config.data_dir.as_path();
    match command {
        Some(Commands::Task { command }) => match command {
            TaskCommands::Add { title, description, priority, assignee, tags, due } => {
                cmd_add(dir, title, description, priority, assignee, tags, due, false).map(|_| ())
            }
            TaskCommands::List { filter } => cmd_list(dir, &filter.into_spec()?),
            TaskCommands::Status { id, status } => cmd_status(dir, id, status, false),
            TaskCommands::Complete { id } => cmd_status(dir, id, TaskStatus::Completed, false),
            TaskCommands::Remove { id } => cmd_remove(dir, id, false),
        },
        Some(Commands::Board { filter }) => cmd_board(dir, &filter.into_spec()?),
        Some(Commands::Template { command }) => match command {
            TemplateCommands::Add { title, description, schedule, time, priority } => {
                let schedule = schedule_from_args(schedule.every, schedule.day.as_deref())?;
                cmd_template_add(dir, title, description, schedule, &time, priority, false).map(|_| ())
            }
            TemplateCommands::List => cmd_template_list(dir),
            TemplateCommands::Edit { id, title, description, every, day, time, priority } => {
                let schedule = every
                    .map(|f| schedule_from_args(f, day.as_deref()))
                    .transpose()?;
                cmd_template_edit(dir, id, title, description, schedule, time, priority, false).map(|_| ())
            }
            TemplateCommands::Toggle { id } => cmd_template_toggle(dir, id, false).map(|_| ()),
            TemplateCommands::Run { id } => cmd_template_run(dir, id, false).map(|_| ()),
            TemplateCommands::Remove { id } => cmd_template_remove(dir, id, false),
        },
        Some(Commands::RunDue) => cmd_run_due(dir, false).map(|_| ()),
        Some(Commands::Tag { command }) => match command {
            TagCommands::Add { name } => cmd_tag_add(dir, &name, false),
            TagCommands::List => cmd_tag_list(dir),
            TagCommands::Remove { id } => cmd_tag_remove(dir, &id, false),
        },
        Some(Commands::NextRun { schedule, time, at }) => {
            let schedule = schedule_from_args(schedule.every, schedule.day.as_deref())?;
            cmd_next_run(schedule, &time, at).map(|_| ())
        }
        Some(Commands::Reset { force }) => cmd_reset(dir, force),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "taskboard", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => run_tui(dir),
    }
}
