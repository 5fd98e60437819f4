use chrono::{Local, NaiveDate};
use taskboard::commands::*;
use taskboard::error::Error;
use taskboard::models::{NewTemplate, Priority, Schedule, TaskStatus};
use taskboard::schedule::parse_time;
use taskboard::storage::JsonDirStore;
use taskboard::tasks::TaskBook;
use taskboard::templates::TemplateStore;
use tempfile::TempDir;

fn book(dir: &TempDir) -> TaskBook<JsonDirStore> {
    TaskBook::open(JsonDirStore::open(dir.path()).unwrap())
}

fn templates(dir: &TempDir) -> TemplateStore<JsonDirStore> {
    TemplateStore::open(JsonDirStore::open(dir.path()).unwrap())
}

#[test]
fn test_add_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let task = cmd_add(
        dir.path(),
        "Test Task".into(),
        Some("details".into()),
        Priority::High,
        Some("ayse".into()),
        Vec::new(),
        Some("2025-12-01".into()),
        true,
    )
    .unwrap();
    assert_eq!(task.id, 1);
    assert_eq!(task.status, TaskStatus::Pending);

    cmd_status(dir.path(), task.id, TaskStatus::Review, true).unwrap();
    let b = book(&dir);
    assert_eq!(b.tasks().len(), 1);
    assert_eq!(b.tasks()[0].title, "Test Task");
    assert_eq!(b.tasks()[0].status, TaskStatus::Review);
    assert_eq!(b.tasks()[0].due_date, NaiveDate::from_ymd_opt(2025, 12, 1));
}

#[test]
fn test_add_rejects_bad_date_and_unknown_tag() {
    let dir = tempfile::tempdir().unwrap();
    let err = cmd_add(dir.path(), "T".into(), None, Priority::Low, None, Vec::new(), Some("12/01/2025".into()), true)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "due date", .. }));

    let err = cmd_add(dir.path(), "T".into(), None, Priority::Low, None, vec!["nope".into()], None, true)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownTag(ref t) if t == "nope"));
    assert!(book(&dir).tasks().is_empty());
}

#[test]
fn test_remove_task() {
    let dir = tempfile::tempdir().unwrap();
    let task = cmd_add(dir.path(), "Gone".into(), None, Priority::Low, None, Vec::new(), None, true).unwrap();
    cmd_remove(dir.path(), task.id, true).unwrap();
    assert!(book(&dir).tasks().is_empty());
    assert!(matches!(cmd_remove(dir.path(), task.id, true), Err(Error::TaskNotFound(1))));
}

#[test]
fn test_tags_are_stripped_when_removed() {
    let dir = tempfile::tempdir().unwrap();
    cmd_tag_add(dir.path(), "Back End", true).unwrap();
    assert_eq!(book(&dir).tags()[0].id, "back-end");
    assert!(matches!(cmd_tag_add(dir.path(), "back end", true), Err(Error::TagExists(_))));

    cmd_add(dir.path(), "Tagged".into(), None, Priority::Low, None, vec!["back-end".into()], None, true).unwrap();
    cmd_tag_remove(dir.path(), "back-end", true).unwrap();

    let b = book(&dir);
    assert!(b.tags().is_empty());
    assert!(b.tasks()[0].tags.is_empty());
}

#[test]
fn test_template_run_creates_task() {
    let dir = tempfile::tempdir().unwrap();
    let schedule = schedule_from_args(Frequency::Weekly, Some("mon")).unwrap();
    assert_eq!(schedule, Schedule::Weekly { day_of_week: 1 });
    let t = cmd_template_add(dir.path(), "Weekly report".into(), None, schedule, "09:00", Priority::High, true)
        .unwrap();
    assert!(t.next_run > Local::now().naive_local());

    let task = cmd_template_run(dir.path(), t.id, true).unwrap().unwrap();
    assert_eq!(task.title, "Weekly report");
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.template_id, Some(t.id));
    assert_eq!(task.due_date, Some(Local::now().date_naive()));
    assert!(templates(&dir).get(t.id).unwrap().last_run.is_some());
}

#[test]
fn test_inactive_template_run_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let t = cmd_template_add(dir.path(), "Backup".into(), None, Schedule::Daily, "23:00", Priority::Low, true)
        .unwrap();
    assert!(!cmd_template_toggle(dir.path(), t.id, true).unwrap());
    assert!(cmd_template_run(dir.path(), t.id, true).unwrap().is_none());
    assert!(book(&dir).tasks().is_empty());
}

#[test]
fn test_template_edit_and_remove_keep_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let t = cmd_template_add(dir.path(), "Backup".into(), None, Schedule::Daily, "23:00", Priority::Low, true)
        .unwrap();
    let edited = cmd_template_edit(dir.path(), t.id, Some("Nightly".into()), None, None, None, None, true).unwrap();
    assert_eq!(edited.title, "Nightly");
    assert_eq!(edited.next_run, t.next_run);

    cmd_template_run(dir.path(), t.id, true).unwrap();
    cmd_template_remove(dir.path(), t.id, true).unwrap();
    assert!(templates(&dir).list().is_empty());
    assert_eq!(book(&dir).tasks().len(), 1);
}

#[test]
fn test_run_due_materializes_overdue_templates() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = templates(&dir);
        let long_ago = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
        store
            .create(
                NewTemplate {
                    title: "Old daily".into(),
                    description: String::new(),
                    schedule: Schedule::Daily,
                    time: parse_time("09:00").unwrap(),
                    priority: Priority::Medium,
                },
                long_ago,
            )
            .unwrap();
    }
    let created = cmd_run_due(dir.path(), true).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Old daily");
    assert!(cmd_run_due(dir.path(), true).unwrap().is_empty());
}

#[test]
fn test_schedule_args() {
    assert_eq!(schedule_from_args(Frequency::Daily, None).unwrap(), Schedule::Daily);
    assert_eq!(
        schedule_from_args(Frequency::Weekly, Some("0")).unwrap(),
        Schedule::Weekly { day_of_week: 0 }
    );
    assert_eq!(
        schedule_from_args(Frequency::Weekly, Some("Friday")).unwrap(),
        Schedule::Weekly { day_of_week: 5 }
    );
    assert_eq!(
        schedule_from_args(Frequency::Monthly, Some("15")).unwrap(),
        Schedule::Monthly { day_of_month: 15 }
    );
    assert!(schedule_from_args(Frequency::Weekly, None).is_err());
    assert!(schedule_from_args(Frequency::Weekly, Some("8")).is_err());
    assert!(schedule_from_args(Frequency::Monthly, Some("x")).is_err());
}

#[test]
fn test_next_run_command() {
    let next = cmd_next_run(
        Schedule::Weekly { day_of_week: 1 },
        "09:00",
        Some("2024-02-14 10:00".into()),
    )
    .unwrap();
    assert_eq!(
        next,
        NaiveDate::from_ymd_opt(2024, 2, 19).unwrap().and_hms_opt(9, 0, 0).unwrap()
    );
}

#[test]
fn test_reset_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    cmd_tag_add(dir.path(), "ops", true).unwrap();
    cmd_add(dir.path(), "Task".into(), None, Priority::Low, None, Vec::new(), None, true).unwrap();
    cmd_template_add(dir.path(), "Backup".into(), None, Schedule::Daily, "23:00", Priority::Low, true).unwrap();

    cmd_reset(dir.path(), true).unwrap();
    let b = book(&dir);
    assert!(b.tasks().is_empty());
    assert!(b.tags().is_empty());
    assert!(templates(&dir).list().is_empty());
}
