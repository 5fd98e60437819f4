use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Urgency of a task or template.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Sort rank; lower ranks are more urgent and sort first ascending.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow state of a task. Ordering follows the board columns.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    Review,
    Completed,
}

impl TaskStatus {
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Review => 2,
            TaskStatus::Completed => 3,
        }
    }

    /// The next column on the board; completed tasks stay completed.
    pub fn advance(self) -> TaskStatus {
        match self {
            TaskStatus::Pending => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Review,
            TaskStatus::Review | TaskStatus::Completed => TaskStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a single task on the board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Employee the task is assigned to, if any.
    #[serde(default)]
    pub assignee_id: Option<String>,
    /// Ids from the tag vocabulary.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    /// Template this task was materialized from, if any.
    #[serde(default)]
    pub template_id: Option<u64>,
}

/// Fields for a task that has not been given an id yet.
///
/// Produced by template runs and the CLI; turned into a [`Task`] by
/// [`TaskBook::insert`](crate::tasks::TaskBook::insert).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee_id: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub template_id: Option<u64>,
}

/// An entry in the tag vocabulary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// When a recurring template fires.
///
/// Days of week use 0 = Sunday .. 6 = Saturday.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum Schedule {
    Daily,
    Weekly { day_of_week: u8 },
    Biweekly { day_of_week: u8 },
    Monthly { day_of_month: u8 },
}

impl Schedule {
    pub fn frequency(&self) -> &'static str {
        match self {
            Schedule::Daily => "daily",
            Schedule::Weekly { .. } => "weekly",
            Schedule::Biweekly { .. } => "biweekly",
            Schedule::Monthly { .. } => "monthly",
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        match *self {
            Schedule::Daily => f.write_str("daily"),
            Schedule::Weekly { day_of_week } | Schedule::Biweekly { day_of_week } => {
                let day = DAYS.get(day_of_week as usize).copied().unwrap_or("?");
                write!(f, "{} on {}", self.frequency(), day)
            }
            Schedule::Monthly { day_of_month } => write!(f, "monthly on day {}", day_of_month),
        }
    }
}

/// A stored recurrence rule that periodically produces a new task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecurringTemplate {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub schedule: Schedule,
    /// Wall-clock time of day, stored as "HH:MM".
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub priority: Priority,
    pub is_active: bool,
    #[serde(default)]
    pub last_run: Option<NaiveDateTime>,
    pub next_run: NaiveDateTime,
}

/// Fields supplied when creating a template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub title: String,
    pub description: String,
    pub schedule: Schedule,
    pub time: NaiveTime,
    pub priority: Priority,
}

/// Partial edit of a template; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<Schedule>,
    pub time: Option<NaiveTime>,
    pub priority: Option<Priority>,
}

impl TemplatePatch {
    /// True when applying the patch could move the next run.
    pub fn touches_schedule(&self, current: &RecurringTemplate) -> bool {
        self.schedule.is_some_and(|s| s != current.schedule)
            || self.time.is_some_and(|t| t != current.time)
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        crate::schedule::parse_time(&raw).map_err(de::Error::custom)
    }
}
