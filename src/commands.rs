use std::io::{self, Write};
use std::path::Path;
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crate::error::{Error, Result};
use crate::filter::{apply, group_by_status, FilterSortSpec};
use crate::models::{
    NewTemplate, Priority, RecurringTemplate, Schedule, Task, TaskDraft, TaskStatus, TemplatePatch,
};
use crate::schedule::{compute_next_run, parse_time};
use crate::storage::{delete_database, JsonDirStore};
use crate::tasks::TaskBook;
use crate::templates::TemplateStore;

/// Recurrence frequency as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

/// Builds a [`Schedule`] from a frequency and its optional anchor.
///
/// Weekly anchors accept `0`-`6` (0 = Sunday) or an English day name such as
/// `mon` or `Monday`; monthly anchors are a day of month.
pub fn schedule_from_args(frequency: Frequency, day: Option<&str>) -> Result<Schedule> {
    let schedule = match frequency {
        Frequency::Daily => Schedule::Daily,
        Frequency::Weekly => Schedule::Weekly { day_of_week: weekday_arg(day)? },
        Frequency::Biweekly => Schedule::Biweekly { day_of_week: weekday_arg(day)? },
        Frequency::Monthly => {
            let raw = day.ok_or_else(|| Error::invalid("day", "monthly schedules need --day 1-28"))?;
            let day_of_month = raw
                .trim()
                .parse::<u8>()
                .map_err(|_| Error::invalid("day", format!("'{}' is not a day of month", raw)))?;
            Schedule::Monthly { day_of_month }
        }
    };
    schedule.validate()?;
    Ok(schedule)
}

fn weekday_arg(day: Option<&str>) -> Result<u8> {
    const NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
    let raw = day.ok_or_else(|| Error::invalid("day", "weekly schedules need --day (0-6 or a day name)"))?;
    let lower = raw.trim().to_lowercase();
    if let Ok(n) = lower.parse::<u8>() {
        return Ok(n);
    }
    NAMES
        .iter()
        .position(|name| lower.len() >= 3 && lower.starts_with(name))
        .map(|i| i as u8)
        .ok_or_else(|| Error::invalid("day", format!("'{}' is not a day of week", raw)))
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| Error::invalid(field, format!("'{}': {}. Use YYYY-MM-DD.", raw, e)))
}

/// Parses `YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM`.
pub fn parse_datetime(field: &'static str, raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| Error::invalid(field, format!("'{}': use YYYY-MM-DD HH:MM", raw)))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn open_templates(dir: &Path) -> Result<TemplateStore<JsonDirStore>> {
    Ok(TemplateStore::open(JsonDirStore::open(dir)?))
}

fn open_book(dir: &Path) -> Result<TaskBook<JsonDirStore>> {
    Ok(TaskBook::open(JsonDirStore::open(dir)?))
}

/// Adds a new task.
pub fn cmd_add(
    dir: &Path,
    title: String,
    description: Option<String>,
    priority: Priority,
    assignee: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    silent: bool,
) -> Result<Task> {
    let due_date = due.as_deref().map(|d| parse_date("due date", d)).transpose()?;
    let mut book = open_book(dir)?;
    let task = book.insert(
        TaskDraft {
            title,
            description: description.unwrap_or_default(),
            priority,
            assignee_id: assignee,
            tags,
            due_date,
            template_id: None,
        },
        now(),
    )?;
    if !silent { println!("Task added (id = {})", task.id); }
    Ok(task)
}

/// Changes the status of a task.
pub fn cmd_status(dir: &Path, id: u64, status: TaskStatus, silent: bool) -> Result<()> {
    let mut book = open_book(dir)?;
    book.set_status(id, status)?;
    if !silent { println!("Task {} is now {}.", id, status); }
    Ok(())
}

/// Removes a task by id.
pub fn cmd_remove(dir: &Path, id: u64, silent: bool) -> Result<()> {
    let mut book = open_book(dir)?;
    book.remove(id)?;
    if !silent { println!("Task {} removed.", id); }
    Ok(())
}

/// Lists the tasks selected by `spec` in a table.
pub fn cmd_list(dir: &Path, spec: &FilterSortSpec) -> Result<()> {
    let book = open_book(dir)?;
    let today = Local::now().date_naive();
    let tasks = apply(book.tasks(), spec, today);
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Assignee").add_attribute(Attribute::Bold),
            Cell::new("Tags").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Time Left").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let done = t.status == TaskStatus::Completed;
        let (time_left, overdue) = match t.due_date {
            Some(due) => {
                let days_left = (due - today).num_days();
                (time_left_label(days_left), days_left < 0)
            }
            None => ("-".to_string(), false),
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(t.status).fg(status_color(t.status)),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            Cell::new(t.assignee_id.unwrap_or_default()),
            Cell::new(t.tags.join(", ")),
            Cell::new(t.due_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(time_left).fg(if overdue && !done { Color::Red } else { Color::Reset }),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Shows the tasks selected by `spec` as one column per status.
pub fn cmd_board(dir: &Path, spec: &FilterSortSpec) -> Result<()> {
    let book = open_book(dir)?;
    let tasks = apply(book.tasks(), spec, Local::now().date_naive());
    let columns = group_by_status(&tasks);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|(status, items)| {
            Cell::new(format!("{} ({})", status, items.len()))
                .add_attribute(Attribute::Bold)
                .fg(status_color(*status))
        }));
    let cells: Vec<String> = columns
        .values()
        .map(|items| {
            items
                .iter()
                .map(|t| format!("#{} {} [{}]", t.id, t.title, t.priority))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();
    table.add_row(cells);
    println!("{table}");
    Ok(())
}

/// Adds a recurring template.
pub fn cmd_template_add(
    dir: &Path,
    title: String,
    description: Option<String>,
    schedule: Schedule,
    time: &str,
    priority: Priority,
    silent: bool,
) -> Result<RecurringTemplate> {
    let time = parse_time(time)?;
    let mut store = open_templates(dir)?;
    let template = store.create(
        NewTemplate {
            title,
            description: description.unwrap_or_default(),
            schedule,
            time,
            priority,
        },
        now(),
    )?;
    if !silent {
        println!("Template added (id = {}), next run {}", template.id, fmt_run(template.next_run));
    }
    Ok(template)
}

/// Lists all templates.
pub fn cmd_template_list(dir: &Path) -> Result<()> {
    let store = open_templates(dir)?;
    if store.list().is_empty() {
        println!("No templates found.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ID", "Title", "Schedule", "Time", "Priority", "Active", "Last Run", "Next Run",
    ]);
    for t in store.list() {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(t.schedule),
            Cell::new(t.time.format("%H:%M")),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            Cell::new(if t.is_active { "yes" } else { "no" })
                .fg(if t.is_active { Color::Green } else { Color::Grey }),
            Cell::new(t.last_run.map(fmt_run).unwrap_or_else(|| "-".into())),
            Cell::new(fmt_run(t.next_run)),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Edits a template; schedule changes move its next run.
pub fn cmd_template_edit(
    dir: &Path,
    id: u64,
    title: Option<String>,
    description: Option<String>,
    schedule: Option<Schedule>,
    time: Option<String>,
    priority: Option<Priority>,
    silent: bool,
) -> Result<RecurringTemplate> {
    let time = time.as_deref().map(parse_time).transpose()?;
    let mut store = open_templates(dir)?;
    let patch = TemplatePatch { title, description, schedule, time, priority };
    let template = store.update(id, patch, now())?;
    if !silent {
        println!("Template {} updated, next run {}", id, fmt_run(template.next_run));
    }
    Ok(template)
}

/// Activates or deactivates a template.
pub fn cmd_template_toggle(dir: &Path, id: u64, silent: bool) -> Result<bool> {
    let mut store = open_templates(dir)?;
    let active = store.toggle_active(id)?;
    if !silent {
        println!("Template {} {}.", id, if active { "activated" } else { "deactivated" });
    }
    Ok(active)
}

/// Creates a task from a template right away.
///
/// Returns `None` if the template is inactive.
pub fn cmd_template_run(dir: &Path, id: u64, silent: bool) -> Result<Option<Task>> {
    let mut store = open_templates(dir)?;
    let mut book = open_book(dir)?;
    let at = now();
    let Some(task) = store.run_now_with(id, at, |draft| book.insert(draft, at))? else {
        if !silent { eprintln!("Template {} is inactive; nothing created.", id); }
        return Ok(None);
    };
    if !silent {
        let next = store.get(id).map(|t| fmt_run(t.next_run)).unwrap_or_default();
        println!("Task {} created from template {}. Next run {}", task.id, id, next);
    }
    Ok(Some(task))
}

/// Creates tasks for every active template that is due.
pub fn cmd_run_due(dir: &Path, silent: bool) -> Result<Vec<Task>> {
    let mut store = open_templates(dir)?;
    let mut book = open_book(dir)?;
    let at = now();
    let created = store.run_due_with(at, |draft| book.insert(draft, at))?;
    if !silent {
        if created.is_empty() {
            println!("No templates due.");
        }
        for t in &created {
            println!("Task {} created: {}", t.id, t.title);
        }
    }
    Ok(created)
}

/// Removes a template. Tasks it created keep existing.
pub fn cmd_template_remove(dir: &Path, id: u64, silent: bool) -> Result<()> {
    let mut store = open_templates(dir)?;
    let removed = store.delete(id)?;
    if !silent { println!("Template {} ('{}') removed.", id, removed.title); }
    Ok(())
}

/// Adds a tag to the vocabulary.
pub fn cmd_tag_add(dir: &Path, name: &str, silent: bool) -> Result<()> {
    let mut book = open_book(dir)?;
    let tag = book.add_tag(name)?;
    if !silent { println!("Tag '{}' added (id = {}).", tag.name, tag.id); }
    Ok(())
}

pub fn cmd_tag_list(dir: &Path) -> Result<()> {
    let book = open_book(dir)?;
    if book.tags().is_empty() {
        println!("No tags found.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["ID", "Name", "Tasks"]);
    for tag in book.tags() {
        let uses = book.tasks().iter().filter(|t| t.tags.contains(&tag.id)).count();
        table.add_row(vec![Cell::new(&tag.id), Cell::new(&tag.name), Cell::new(uses)]);
    }
    println!("{table}");
    Ok(())
}

/// Removes a tag and strips it from tasks.
pub fn cmd_tag_remove(dir: &Path, id: &str, silent: bool) -> Result<()> {
    let mut book = open_book(dir)?;
    book.remove_tag(id)?;
    if !silent { println!("Tag '{}' removed.", id); }
    Ok(())
}

/// Prints when a schedule would next fire after `at` (default: now).
pub fn cmd_next_run(schedule: Schedule, time: &str, at: Option<String>) -> Result<NaiveDateTime> {
    let time = parse_time(time)?;
    let at = match at {
        Some(raw) => parse_datetime("at", &raw)?,
        None => now(),
    };
    let next = compute_next_run(&schedule, time, at)?;
    println!("{}", next.format("%Y-%m-%d %H:%M (%A)"));
    Ok(next)
}

/// Resets the database by deleting all tasks, templates and tags.
pub fn cmd_reset(dir: &Path, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks, templates and tags? This cannot be undone. [y/N] ");
        let mut input = String::new();
        let answered = io::stdout()
            .flush()
            .and_then(|_| io::stdin().read_line(&mut input));
        if answered.is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    let mut kv = JsonDirStore::open(dir)?;
    delete_database(&mut kv)?;
    println!("Database reset successfully.");
    Ok(())
}

fn fmt_run(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn time_left_label(days_left: i64) -> String {
    if days_left < 0 {
        format!("{}d overdue", days_left.abs())
    } else if days_left == 0 {
        "Today".to_string()
    } else {
        format!("{}d", days_left)
    }
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Review => Color::Magenta,
        TaskStatus::Completed => Color::Green,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Urgent => Color::Red,
        Priority::High => Color::DarkYellow,
        Priority::Medium => Color::Reset,
        Priority::Low => Color::Grey,
    }
}
