use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use taskboard::error::{Error, ScheduleError};
use taskboard::models::{NewTemplate, Priority, Schedule, TemplatePatch};
use taskboard::storage::{JsonDirStore, KeyValueStore, MemoryStore, TEMPLATES_KEY};
use taskboard::templates::TemplateStore;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn fields(title: &str, schedule: Schedule, time: NaiveTime) -> NewTemplate {
    NewTemplate {
        title: title.into(),
        description: format!("{} description", title),
        schedule,
        time,
        priority: Priority::Medium,
    }
}

// 2024-02-14 is a Wednesday.
fn wednesday_morning() -> NaiveDateTime {
    at(2024, 2, 14, 10, 0)
}

#[test]
fn test_create_schedules_first_run() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store
        .create(fields("Standup report", Schedule::Weekly { day_of_week: 1 }, hm(9, 0)), wednesday_morning())
        .unwrap();
    assert_eq!(t.id, 1);
    assert!(t.is_active);
    assert_eq!(t.last_run, None);
    assert_eq!(t.next_run, at(2024, 2, 19, 9, 0));

    let second = store
        .create(fields("Backup", Schedule::Daily, hm(23, 0)), wednesday_morning())
        .unwrap();
    assert_eq!(second.id, 2);
    assert_eq!(store.list().len(), 2);
}

#[test]
fn test_create_rejects_biweekly_and_bad_anchor() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let err = store
        .create(fields("Sync", Schedule::Biweekly { day_of_week: 2 }, hm(9, 0)), wednesday_morning())
        .unwrap_err();
    assert!(matches!(err, Error::Schedule(ScheduleError::UnsupportedFrequency("biweekly"))));

    let err = store
        .create(fields("Rent", Schedule::Monthly { day_of_month: 40 }, hm(9, 0)), wednesday_morning())
        .unwrap_err();
    assert!(matches!(err, Error::Schedule(ScheduleError::InvalidDayOfMonth(40))));
    assert!(store.list().is_empty());
}

#[test]
fn test_update_non_schedule_fields_keeps_next_run() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    assert_eq!(t.next_run, at(2024, 2, 15, 9, 0));

    let patch = TemplatePatch {
        title: Some("Nightly backup".into()),
        priority: Some(Priority::High),
        // Same schedule as before is not a schedule change.
        schedule: Some(Schedule::Daily),
        ..Default::default()
    };
    let updated = store.update(t.id, patch, at(2024, 2, 16, 12, 0)).unwrap();
    assert_eq!(updated.title, "Nightly backup");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.next_run, at(2024, 2, 15, 9, 0));
}

#[test]
fn test_update_schedule_recomputes_from_now() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();

    let patch = TemplatePatch { time: Some(hm(8, 0)), ..Default::default() };
    let updated = store.update(t.id, patch, at(2024, 2, 16, 12, 0)).unwrap();
    assert_eq!(updated.next_run, at(2024, 2, 17, 8, 0));

    let patch = TemplatePatch {
        schedule: Some(Schedule::Monthly { day_of_month: 1 }),
        ..Default::default()
    };
    let updated = store.update(t.id, patch, at(2024, 2, 16, 12, 0)).unwrap();
    assert_eq!(updated.schedule, Schedule::Monthly { day_of_month: 1 });
    assert_eq!(updated.next_run, at(2024, 3, 1, 8, 0));
}

#[test]
fn test_failed_update_leaves_template_untouched() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let patch = TemplatePatch {
        title: Some("Changed".into()),
        schedule: Some(Schedule::Weekly { day_of_week: 9 }),
        ..Default::default()
    };
    assert!(store.update(t.id, patch, wednesday_morning()).is_err());
    assert_eq!(store.get(t.id), Some(&t));
}

#[test]
fn test_toggle_active_keeps_run_times() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    assert!(!store.toggle_active(t.id).unwrap());
    let after = store.get(t.id).unwrap();
    assert_eq!(after.next_run, t.next_run);
    assert_eq!(after.last_run, None);
    assert!(store.toggle_active(t.id).unwrap());
}

#[test]
fn test_run_now_records_run_and_returns_draft() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store
        .create(fields("Report", Schedule::Weekly { day_of_week: 1 }, hm(9, 0)), wednesday_morning())
        .unwrap();
    let now = at(2024, 2, 15, 14, 30);
    let draft = store.run_now(t.id, now).unwrap().unwrap();
    assert_eq!(draft.title, "Report");
    assert_eq!(draft.description, "Report description");
    assert_eq!(draft.priority, Priority::Medium);
    assert_eq!(draft.due_date, Some(now.date()));
    assert_eq!(draft.template_id, Some(t.id));

    let after = store.get(t.id).unwrap();
    assert_eq!(after.last_run, Some(now));
    assert_eq!(after.next_run, at(2024, 2, 19, 9, 0));
}

#[test]
fn test_run_now_on_inactive_template_does_nothing() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    store.toggle_active(t.id).unwrap();
    assert_eq!(store.run_now(t.id, at(2024, 2, 20, 9, 0)).unwrap(), None);
    assert_eq!(store.get(t.id).unwrap().last_run, None);
}

#[test]
fn test_run_due_only_runs_active_due_templates() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let daily = store.create(fields("Daily", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let monthly = store
        .create(fields("Monthly", Schedule::Monthly { day_of_month: 1 }, hm(9, 0)), wednesday_morning())
        .unwrap();
    let paused = store.create(fields("Paused", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    store.toggle_active(paused.id).unwrap();

    // Two days later: daily and paused are overdue, monthly is not.
    let now = at(2024, 2, 16, 12, 0);
    let drafts = store.run_due(now).unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].template_id, Some(daily.id));
    assert_eq!(store.get(daily.id).unwrap().next_run, at(2024, 2, 17, 9, 0));
    assert_eq!(store.get(monthly.id).unwrap().last_run, None);
    assert_eq!(store.get(paused.id).unwrap().last_run, None);

    assert!(store.run_due(now).unwrap().is_empty());
}

#[test]
fn test_run_due_skips_template_with_invalid_schedule() {
    let due = "2024-02-15T09:00:00";
    let mut kv = MemoryStore::new();
    kv.set(
        TEMPLATES_KEY,
        json!([
            {"id": 1, "title": "First", "description": "", "frequency": "daily", "time": "09:00",
             "priority": "medium", "is_active": true, "last_run": null, "next_run": due},
            {"id": 2, "title": "Sync", "description": "", "frequency": "biweekly", "day_of_week": 2,
             "time": "09:00", "priority": "medium", "is_active": true, "last_run": null, "next_run": due},
            {"id": 3, "title": "Third", "description": "", "frequency": "daily", "time": "09:00",
             "priority": "medium", "is_active": true, "last_run": null, "next_run": due},
        ]),
    )
    .unwrap();
    let mut store = TemplateStore::open(kv);
    assert_eq!(store.list().len(), 3);

    let now = at(2024, 2, 20, 12, 0);
    let drafts = store.run_due(now).unwrap();
    let ids: Vec<_> = drafts.iter().map(|d| d.template_id).collect();
    assert_eq!(ids, vec![Some(1), Some(3)]);

    let biweekly = store.get(2).unwrap();
    assert_eq!(biweekly.last_run, None);
    assert_eq!(biweekly.next_run, at(2024, 2, 15, 9, 0));

    let reopened = TemplateStore::open(store.into_inner());
    assert_eq!(reopened.get(1).unwrap().last_run, Some(now));
    assert_eq!(reopened.get(1).unwrap().next_run, at(2024, 2, 21, 9, 0));
    assert_eq!(reopened.get(2).unwrap().last_run, None);
    assert_eq!(reopened.get(3).unwrap().last_run, Some(now));
}

#[test]
fn test_run_now_with_failing_create_records_nothing() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let now = at(2024, 2, 16, 12, 0);

    let err = store
        .run_now_with(t.id, now, |_| Err::<(), _>(Error::invalid("title", "rejected")))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "title", .. }));
    assert_eq!(store.get(t.id), Some(&t));

    let reopened = TemplateStore::open(store.into_inner());
    assert_eq!(reopened.get(t.id).unwrap().last_run, None);
}

#[test]
fn test_run_due_with_failing_create_keeps_earlier_runs() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let first = store.create(fields("First", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let second = store.create(fields("Second", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let now = at(2024, 2, 16, 12, 0);

    let err = store
        .run_due_with(now, |draft| {
            if draft.template_id == Some(second.id) {
                Err(Error::invalid("title", "rejected"))
            } else {
                Ok(draft.title)
            }
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));

    let reopened = TemplateStore::open(store.into_inner());
    assert_eq!(reopened.get(first.id).unwrap().last_run, Some(now));
    assert_eq!(reopened.get(second.id).unwrap().last_run, None);
    assert_eq!(reopened.get(second.id).unwrap().next_run, second.next_run);
}

#[test]
fn test_delete_and_missing_ids() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let removed = store.delete(t.id).unwrap();
    assert_eq!(removed.title, "Backup");
    assert!(store.list().is_empty());
    assert!(matches!(store.delete(t.id), Err(Error::TemplateNotFound(1))));
    assert!(matches!(store.toggle_active(7), Err(Error::TemplateNotFound(7))));
    assert!(matches!(store.run_now(7, wednesday_morning()), Err(Error::TemplateNotFound(7))));
    assert!(matches!(
        store.update(7, TemplatePatch::default(), wednesday_morning()),
        Err(Error::TemplateNotFound(7))
    ));
}

#[test]
fn test_mutations_are_persisted() {
    let mut store = TemplateStore::new(MemoryStore::new());
    let t = store
        .create(fields("Report", Schedule::Weekly { day_of_week: 1 }, hm(9, 0)), wednesday_morning())
        .unwrap();
    store.run_now(t.id, at(2024, 2, 15, 14, 30)).unwrap();

    let reopened = TemplateStore::open(store.into_inner());
    assert_eq!(reopened.list().len(), 1);
    assert_eq!(reopened.get(t.id).unwrap().last_run, Some(at(2024, 2, 15, 14, 30)));
}

#[test]
fn test_stored_shape_is_plain_json() {
    let mut store = TemplateStore::new(MemoryStore::new());
    store
        .create(fields("Report", Schedule::Weekly { day_of_week: 1 }, hm(9, 0)), wednesday_morning())
        .unwrap();
    let kv = store.into_inner();
    let stored = kv.get(TEMPLATES_KEY).unwrap().unwrap();
    let first = &stored[0];
    assert_eq!(first["frequency"], json!("weekly"));
    assert_eq!(first["day_of_week"], json!(1));
    assert_eq!(first["time"], json!("09:00"));
    assert_eq!(first["is_active"], json!(true));
    assert_eq!(first["last_run"], json!(null));
    assert_eq!(first["next_run"], json!("2024-02-19T09:00:00"));
}

#[test]
fn test_corrupt_data_loads_as_empty() {
    let mut kv = MemoryStore::new();
    kv.set(TEMPLATES_KEY, json!({"not": "a list"})).unwrap();
    let store = TemplateStore::open(kv);
    assert!(store.list().is_empty());
}

#[test]
fn test_corrupt_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("templates.json"), "{ this is not json").unwrap();
    let mut store = TemplateStore::open(JsonDirStore::open(dir.path()).unwrap());
    assert!(store.list().is_empty());

    // The store stays usable and overwrites the bad file.
    store.create(fields("Backup", Schedule::Daily, hm(9, 0)), wednesday_morning()).unwrap();
    let reopened = TemplateStore::open(JsonDirStore::open(dir.path()).unwrap());
    assert_eq!(reopened.list().len(), 1);
}
