//! Recurring task templates and their run bookkeeping.
//!
//! [`TemplateStore`] is the only writer of `next_run` and `last_run`. Every
//! mutating call persists the whole collection before returning.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};
use crate::error::{Error, Result};
use crate::models::{NewTemplate, RecurringTemplate, TaskDraft, TemplatePatch};
use crate::schedule::compute_next_run;
use crate::storage::{load_collection, save_collection, KeyValueStore, TEMPLATES_KEY};

pub struct TemplateStore<S: KeyValueStore> {
    kv: S,
    templates: Vec<RecurringTemplate>,
}

impl<S: KeyValueStore> TemplateStore<S> {
    /// Creates an empty store backed by `kv`. Call [`load`](Self::load) to
    /// read what is already persisted.
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            templates: Vec::new(),
        }
    }

    /// Creates a store and loads its persisted templates.
    pub fn open(kv: S) -> Self {
        let mut store = Self::new(kv);
        store.load();
        store
    }

    /// Reloads templates from storage.
    ///
    /// Missing or unreadable data leaves the store empty instead of failing.
    pub fn load(&mut self) {
        self.templates = match load_collection(&self.kv, TEMPLATES_KEY) {
            Ok(templates) => templates,
            Err(e) => {
                warn!(error = %e, "discarding unreadable templates");
                Vec::new()
            }
        };
        debug!(count = self.templates.len(), "templates loaded");
    }

    /// Writes the whole collection back to storage.
    pub fn save(&mut self) -> Result<()> {
        save_collection(&mut self.kv, TEMPLATES_KEY, &self.templates)?;
        Ok(())
    }

    pub fn list(&self) -> &[RecurringTemplate] {
        &self.templates
    }

    pub fn get(&self, id: u64) -> Option<&RecurringTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Adds an active template and schedules its first run after `now`.
    pub fn create(&mut self, fields: NewTemplate, now: NaiveDateTime) -> Result<RecurringTemplate> {
        if fields.title.trim().is_empty() {
            return Err(Error::invalid("title", "must not be empty"));
        }
        let next_run = compute_next_run(&fields.schedule, fields.time, now)?;
        let id = self.templates.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let template = RecurringTemplate {
            id,
            title: fields.title,
            description: fields.description,
            schedule: fields.schedule,
            time: fields.time,
            priority: fields.priority,
            is_active: true,
            last_run: None,
            next_run,
        };
        self.templates.push(template.clone());
        self.save()?;
        info!(id, schedule = %template.schedule, next_run = %next_run, "template created");
        Ok(template)
    }

    /// Applies `patch`. The next run is recomputed from `now` only when the
    /// schedule or time actually changes.
    pub fn update(&mut self, id: u64, patch: TemplatePatch, now: NaiveDateTime) -> Result<RecurringTemplate> {
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TemplateNotFound(id))?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(Error::invalid("title", "must not be empty"));
            }
        }
        let reschedule = patch.touches_schedule(template);
        let schedule = patch.schedule.unwrap_or(template.schedule);
        let time = patch.time.unwrap_or(template.time);
        // Compute before mutating so a bad schedule leaves the template intact.
        let next_run = if reschedule {
            Some(compute_next_run(&schedule, time, now)?)
        } else {
            None
        };

        if let Some(title) = patch.title { template.title = title; }
        if let Some(description) = patch.description { template.description = description; }
        if let Some(priority) = patch.priority { template.priority = priority; }
        template.schedule = schedule;
        template.time = time;
        if let Some(next_run) = next_run {
            template.next_run = next_run;
        }

        let updated = template.clone();
        self.save()?;
        info!(id, rescheduled = reschedule, next_run = %updated.next_run, "template updated");
        Ok(updated)
    }

    /// Flips `is_active` and returns the new value. Run times are untouched.
    pub fn toggle_active(&mut self, id: u64) -> Result<bool> {
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TemplateNotFound(id))?;
        template.is_active = !template.is_active;
        let active = template.is_active;
        self.save()?;
        info!(id, active, "template toggled");
        Ok(active)
    }

    /// Materializes the template now.
    ///
    /// Records `last_run = now`, schedules the following run and returns the
    /// task to create. Inactive templates are not run and yield `None`.
    pub fn run_now(&mut self, id: u64, now: NaiveDateTime) -> Result<Option<TaskDraft>> {
        self.run_now_with(id, now, Ok)
    }

    /// Like [`run_now`](Self::run_now), but hands the draft to `create`
    /// first. The run is recorded only if `create` succeeds.
    pub fn run_now_with<T, F>(&mut self, id: u64, now: NaiveDateTime, create: F) -> Result<Option<T>>
    where
        F: FnOnce(TaskDraft) -> Result<T>,
    {
        let idx = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TemplateNotFound(id))?;
        let template = &self.templates[idx];
        if !template.is_active {
            debug!(id, "skipping run of inactive template");
            return Ok(None);
        }
        let next_run = compute_next_run(&template.schedule, template.time, now)?;
        let created = create(draft_for(template, now))?;
        record_run(&mut self.templates[idx], now, next_run);
        self.save()?;
        Ok(Some(created))
    }

    /// Runs every active template whose next run is at or before `now`.
    ///
    /// Each template runs at most once per call, however many occurrences
    /// were missed. Templates whose schedule cannot be computed are skipped
    /// with a warning and left untouched.
    pub fn run_due(&mut self, now: NaiveDateTime) -> Result<Vec<TaskDraft>> {
        self.run_due_with(now, Ok)
    }

    /// Like [`run_due`](Self::run_due), but hands each draft to `create`
    /// before recording its run.
    ///
    /// If `create` fails, the runs recorded so far are saved and the error
    /// is returned; the failing template and the rest stay due.
    pub fn run_due_with<T, F>(&mut self, now: NaiveDateTime, mut create: F) -> Result<Vec<T>>
    where
        F: FnMut(TaskDraft) -> Result<T>,
    {
        let mut created = Vec::new();
        let mut failure = None;
        for idx in 0..self.templates.len() {
            let template = &self.templates[idx];
            if !template.is_active || template.next_run > now {
                continue;
            }
            let next_run = match compute_next_run(&template.schedule, template.time, now) {
                Ok(next_run) => next_run,
                Err(e) => {
                    warn!(id = template.id, error = %e, "skipping template with invalid schedule");
                    continue;
                }
            };
            match create(draft_for(template, now)) {
                Ok(item) => {
                    created.push(item);
                    record_run(&mut self.templates[idx], now, next_run);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if !created.is_empty() {
            self.save()?;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(created),
        }
    }

    /// Removes the template. Tasks it already produced are not affected.
    pub fn delete(&mut self, id: u64) -> Result<RecurringTemplate> {
        let idx = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TemplateNotFound(id))?;
        let removed = self.templates.remove(idx);
        self.save()?;
        info!(id, "template deleted");
        Ok(removed)
    }
}

fn draft_for(template: &RecurringTemplate, now: NaiveDateTime) -> TaskDraft {
    TaskDraft {
        title: template.title.clone(),
        description: template.description.clone(),
        priority: template.priority,
        assignee_id: None,
        tags: Vec::new(),
        due_date: Some(now.date()),
        template_id: Some(template.id),
    }
}

fn record_run(template: &mut RecurringTemplate, now: NaiveDateTime, next_run: NaiveDateTime) {
    template.last_run = Some(now);
    template.next_run = next_run;
    info!(id = template.id, next_run = %next_run, "template run");
}
