//! Declarative filtering and ordering of a task collection.
//!
//! A [`FilterSortSpec`] is plain configuration: [`apply`] never mutates its
//! inputs and always returns the same output for the same tasks, spec and day.
//!
//! Filters combine with AND across fields and OR within a field. An empty set
//! places no constraint on its field.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use chrono::{Local, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::models::{Priority, Task, TaskStatus};

/// Which due dates a task may have to pass the date filter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    All,
    Today,
    /// From today through seven days out.
    Week,
    /// From today through the same day next month.
    Month,
    /// Before today and not completed.
    Overdue,
    /// Inclusive bounds; a missing bound disables the range check.
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    #[value(name = "due_date", alias = "due")]
    DueDate,
    #[value(name = "created_at", alias = "created")]
    CreatedAt,
    Priority,
    Title,
    Status,
}

impl SortBy {
    pub fn next(self) -> SortBy {
        match self {
            SortBy::DueDate => SortBy::CreatedAt,
            SortBy::CreatedAt => SortBy::Priority,
            SortBy::Priority => SortBy::Title,
            SortBy::Title => SortBy::Status,
            SortBy::Status => SortBy::DueDate,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// How to narrow and order a task collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct FilterSortSpec {
    /// Case-insensitive substring of the title or description.
    pub query: String,
    pub status: Vec<TaskStatus>,
    pub priority: Vec<Priority>,
    pub assignee: Vec<String>,
    /// Tag ids; a task passes if it carries any of them.
    pub tags: Vec<String>,
    pub date_range: DateRange,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// Returns the tasks matching `spec`, ordered by its sort key.
///
/// `today` anchors the relative date ranges. The sort is stable, and a
/// descending order reverses the comparison rather than the result, so ties
/// keep their input order either way.
pub fn apply(tasks: &[Task], spec: &FilterSortSpec, today: NaiveDate) -> Vec<Task> {
    let query = spec.query.to_lowercase();
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| matches_query(t, &query))
        .filter(|t| spec.status.is_empty() || spec.status.contains(&t.status))
        .filter(|t| spec.priority.is_empty() || spec.priority.contains(&t.priority))
        .filter(|t| {
            spec.assignee.is_empty()
                || t.assignee_id.as_ref().is_some_and(|a| spec.assignee.contains(a))
        })
        .filter(|t| spec.tags.is_empty() || t.tags.iter().any(|tag| spec.tags.contains(tag)))
        .filter(|t| in_date_range(t, spec.date_range, today))
        .cloned()
        .collect();

    out.sort_by(|a, b| {
        let ord = compare(a, b, spec.sort_by);
        match spec.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    out
}

/// [`apply`] with today's local date.
pub fn apply_today(tasks: &[Task], spec: &FilterSortSpec) -> Vec<Task> {
    apply(tasks, spec, Local::now().date_naive())
}

/// Splits tasks into board columns, keeping input order inside each column.
/// Every status has a column, empty or not.
pub fn group_by_status(tasks: &[Task]) -> BTreeMap<TaskStatus, Vec<Task>> {
    let mut columns: BTreeMap<TaskStatus, Vec<Task>> = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Completed,
    ]
    .into_iter()
    .map(|s| (s, Vec::new()))
    .collect();
    for task in tasks {
        columns.entry(task.status).or_default().push(task.clone());
    }
    columns
}

fn matches_query(task: &Task, query: &str) -> bool {
    query.is_empty()
        || task.title.to_lowercase().contains(query)
        || task.description.to_lowercase().contains(query)
}

fn in_date_range(task: &Task, range: DateRange, today: NaiveDate) -> bool {
    if range == DateRange::All {
        return true;
    }
    let Some(due) = task.due_date else {
        return false;
    };
    match range {
        DateRange::All => true,
        DateRange::Today => due == today,
        DateRange::Week => due >= today && due <= today + chrono::Duration::days(7),
        DateRange::Month => {
            let end = today.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
            due >= today && due <= end
        }
        DateRange::Overdue => due < today && task.status != TaskStatus::Completed,
        DateRange::Custom { start: Some(start), end: Some(end) } => due >= start && due <= end,
        DateRange::Custom { .. } => true,
    }
}

fn compare(a: &Task, b: &Task, key: SortBy) -> Ordering {
    match key {
        SortBy::DueDate => missing_last(a.due_date, b.due_date),
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
        SortBy::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortBy::Status => a.status.rank().cmp(&b.status.rank()),
    }
}

/// Orders present values before missing ones.
fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
