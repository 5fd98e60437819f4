//! The task collection and its tag vocabulary.

use chrono::NaiveDateTime;
use tracing::{info, warn};
use crate::error::{Error, Result};
use crate::models::{Tag, Task, TaskDraft, TaskStatus};
use crate::storage::{load_collection, save_collection, KeyValueStore, TAGS_KEY, TASKS_KEY};

pub struct TaskBook<S: KeyValueStore> {
    kv: S,
    tasks: Vec<Task>,
    tags: Vec<Tag>,
}

impl<S: KeyValueStore> TaskBook<S> {
    /// Opens the book, loading tasks and tags. Unreadable collections load
    /// as empty.
    pub fn open(kv: S) -> Self {
        let mut book = Self {
            kv,
            tasks: Vec::new(),
            tags: Vec::new(),
        };
        book.load();
        book
    }

    pub fn load(&mut self) {
        self.tasks = load_collection(&self.kv, TASKS_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable tasks");
            Vec::new()
        });
        self.tags = load_collection(&self.kv, TAGS_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable tag vocabulary");
            Vec::new()
        });
    }

    pub fn save(&mut self) -> Result<()> {
        save_collection(&mut self.kv, TASKS_KEY, &self.tasks)?;
        save_collection(&mut self.kv, TAGS_KEY, &self.tags)?;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Gives `draft` an id and adds it as a pending task.
    pub fn insert(&mut self, draft: TaskDraft, now: NaiveDateTime) -> Result<Task> {
        if draft.title.trim().is_empty() {
            return Err(Error::invalid("title", "must not be empty"));
        }
        if let Some(unknown) = draft.tags.iter().find(|id| !self.tags.iter().any(|t| &t.id == *id)) {
            return Err(Error::UnknownTag(unknown.clone()));
        }
        let id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let task = Task {
            id,
            title: draft.title,
            description: draft.description,
            status: TaskStatus::Pending,
            priority: draft.priority,
            assignee_id: draft.assignee_id,
            tags: draft.tags,
            due_date: draft.due_date,
            created_at: now,
            template_id: draft.template_id,
        };
        self.tasks.push(task.clone());
        self.save()?;
        info!(id, title = %task.title, "task added");
        Ok(task)
    }

    pub fn set_status(&mut self, id: u64, status: TaskStatus) -> Result<Task> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        task.status = status;
        let updated = task.clone();
        self.save()?;
        info!(id, %status, "task status changed");
        Ok(updated)
    }

    pub fn remove(&mut self, id: u64) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        let removed = self.tasks.remove(idx);
        self.save()?;
        info!(id, "task removed");
        Ok(removed)
    }

    /// Adds a tag to the vocabulary. Its id is the slug of `name`.
    pub fn add_tag(&mut self, name: &str) -> Result<Tag> {
        let id = slug(name);
        if id.is_empty() {
            return Err(Error::invalid("tag", "name must contain a letter or digit"));
        }
        if self.tags.iter().any(|t| t.id == id) {
            return Err(Error::TagExists(id));
        }
        let tag = Tag {
            id,
            name: name.trim().to_string(),
        };
        self.tags.push(tag.clone());
        self.save()?;
        Ok(tag)
    }

    /// Removes a tag from the vocabulary and from every task carrying it.
    pub fn remove_tag(&mut self, id: &str) -> Result<Tag> {
        let idx = self
            .tags
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::UnknownTag(id.to_string()))?;
        let removed = self.tags.remove(idx);
        for task in self.tasks.iter_mut() {
            task.tags.retain(|t| t != id);
        }
        self.save()?;
        Ok(removed)
    }
}

/// Lowercase, hyphen-separated form of `name` used as a tag id.
pub fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
