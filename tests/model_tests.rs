use std::collections::HashSet;

use projust::date::{DateValue, FixedClock};
use projust::error::ModelError;
use projust::ids;
use projust::manager::ModelManager;
use projust::models::{EntityKind, PriorityGroup, TaskStatus, TITLE_MAX_LEN};
use projust::project::Project;

fn date(day: u32, month: u32, year: i32) -> DateValue {
    DateValue::new(day, month, year).unwrap()
}

fn model() -> ModelManager {
    ModelManager::with_clock(Box::new(FixedClock(date(1, 1, 2029))))
}

fn add_project(m: &mut ModelManager, title: &str) -> String {
    m.add_project(title, "", date(1, 1, 2030), 100.0)
        .unwrap()
        .id()
        .to_owned()
}

fn add_requirement(m: &mut ModelManager, pid: &str, title: &str) -> String {
    m.add_requirement(pid, title, "", date(1, 12, 2029), PriorityGroup::High)
        .unwrap()
        .id()
        .to_owned()
}

fn add_task(m: &mut ModelManager, pid: &str, title: &str) -> String {
    m.add_task(pid, title, "", 5.0, date(1, 12, 2029))
        .unwrap()
        .id()
        .to_owned()
}

#[test]
fn test_id_shapes() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let rid = add_requirement(&mut m, &pid, "Login");
    let tid = add_task(&mut m, &pid, "Login form");

    assert!(ids::is_project_id(&pid));
    assert_eq!(pid.len(), 4);
    assert_eq!(rid.len(), 8);
    assert_eq!(tid.len(), 11);
    assert!(ids::is_child_of(&rid, &pid, ids::REQUIREMENT_TAG));
    assert!(ids::is_child_of(&tid, &pid, ids::TASK_TAG));
    assert!(!ids::is_child_of(&tid, &pid, ids::REQUIREMENT_TAG));
    assert_eq!(ids::project_prefix(&tid), Some(pid.as_str()));
    assert_eq!(ids::project_prefix("nope"), None);
}

#[test]
fn test_generate_id_skips_taken() {
    let taken: HashSet<String> = ["PaaaT000000".to_string()].into_iter().collect();
    let id = ids::generate_id("PaaaT", 6, |c| taken.contains(c));
    assert!(id.starts_with("PaaaT"));
    assert_eq!(id.len(), 11);
    assert!(!taken.contains(&id));
}

#[test]
fn test_title_length_limit() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let fourteen = "a".repeat(TITLE_MAX_LEN);
    let fifteen = "b".repeat(TITLE_MAX_LEN + 1);

    assert!(m.add_task(&pid, &fourteen, "", 1.0, date(1, 6, 2029)).is_ok());
    assert!(matches!(
        m.add_task(&pid, &fifteen, "", 1.0, date(1, 6, 2029)),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(m
        .add_requirement(&pid, &fourteen, "", date(1, 6, 2029), PriorityGroup::Low)
        .is_ok());
    assert!(m
        .add_requirement(&pid, &fifteen, "", date(1, 6, 2029), PriorityGroup::Low)
        .is_err());
    assert!(m.add_task(&pid, "", "", 1.0, date(1, 6, 2029)).is_err());
}

#[test]
fn test_duplicate_titles_rejected() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    add_task(&mut m, &pid, "Login form");
    assert!(matches!(
        m.add_task(&pid, "Login form", "", 2.0, date(1, 6, 2029)),
        Err(ModelError::DuplicateEntity { kind: EntityKind::Task, .. })
    ));

    // Titles only have to be unique inside one project.
    let other = add_project(&mut m, "Mobile");
    assert!(m.add_task(&other, "Login form", "", 2.0, date(1, 6, 2029)).is_ok());
}

#[test]
fn test_task_hours_validation() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    assert!(m.add_task(&pid, "Tiny", "", 0.5, date(1, 6, 2029)).is_err());
    let tid = add_task(&mut m, &pid, "Login form");

    let task = m.task_mut(&tid).unwrap();
    assert!(task.set_estimated_work_hours(0.0).is_err());
    assert!(task.set_total_worked_hours(-1.0).is_err());
    task.add_worked_hours(3.0).unwrap();
    task.add_worked_hours(1.5).unwrap();
    assert_eq!(task.total_worked_hours(), 4.5);

    task.reestimate(2.0).unwrap();
    assert_eq!(task.estimated_work_hours(), 6.5);
    assert_eq!(task.status(), TaskStatus::Started);
}

#[test]
fn test_link_is_symmetric_and_idempotent() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let rid = add_requirement(&mut m, &pid, "Login");
    let tid = add_task(&mut m, &pid, "Login form");

    m.assign_requirement(&tid, &rid).unwrap();
    m.assign_requirement(&tid, &rid).unwrap();
    assert_eq!(m.task(&tid).unwrap().assigned_requirements(), [rid.clone()]);
    assert_eq!(m.requirement(&rid).unwrap().assigned_tasks(), [tid.clone()]);

    m.unassign_requirement(&tid, &rid).unwrap();
    m.unassign_requirement(&tid, &rid).unwrap();
    assert!(m.task(&tid).unwrap().assigned_requirements().is_empty());
    assert!(m.requirement(&rid).unwrap().assigned_tasks().is_empty());
}

#[test]
fn test_link_from_requirement_side() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let rid = add_requirement(&mut m, &pid, "Login");
    let tid = add_task(&mut m, &pid, "Login form");

    m.project_mut(&pid).unwrap().assign_task(&rid, &tid).unwrap();
    assert!(m.task(&tid).unwrap().is_linked_to_requirement(&rid));
    assert!(m.requirement(&rid).unwrap().is_linked_to_task(&tid));
    assert_eq!(m.tasks_of_requirement(&rid).unwrap().len(), 1);
    assert_eq!(m.requirements_of_task(&tid).unwrap().len(), 1);

    m.project_mut(&pid).unwrap().unassign_task(&rid, &tid).unwrap();
    assert!(!m.task(&tid).unwrap().is_linked_to_requirement(&rid));
}

#[test]
fn test_cross_project_link_rejected() {
    let mut m = model();
    let p1 = add_project(&mut m, "Website");
    let p2 = add_project(&mut m, "Mobile");
    let rid = add_requirement(&mut m, &p1, "Login");
    let tid = add_task(&mut m, &p2, "Login form");

    assert!(matches!(
        m.assign_requirement(&tid, &rid),
        Err(ModelError::CrossProjectViolation { .. })
    ));
    assert!(matches!(
        m.project_mut(&p2).unwrap().assign_requirement(&tid, &rid),
        Err(ModelError::CrossProjectViolation { .. })
    ));
    assert!(m.task(&tid).unwrap().assigned_requirements().is_empty());
    assert!(m.requirement(&rid).unwrap().assigned_tasks().is_empty());
}

#[test]
fn test_remove_linked_entities_refused() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let rid = add_requirement(&mut m, &pid, "Login");
    let tid = add_task(&mut m, &pid, "Login form");
    m.assign_requirement(&tid, &rid).unwrap();

    assert!(matches!(
        m.remove_task(&tid),
        Err(ModelError::DependencyViolation { kind: EntityKind::Task, .. })
    ));
    assert!(matches!(
        m.remove_requirement(&rid),
        Err(ModelError::DependencyViolation { kind: EntityKind::Requirement, .. })
    ));
    assert!(matches!(
        m.remove_project(&pid),
        Err(ModelError::DependencyViolation { kind: EntityKind::Project, .. })
    ));

    m.unassign_task_from_every_requirement(&tid).unwrap();
    assert!(m.requirement(&rid).unwrap().assigned_tasks().is_empty());
    m.remove_task(&tid).unwrap();
    m.remove_requirement(&rid).unwrap();
    m.remove_project(&pid).unwrap();
    assert!(m.projects().is_empty());
    assert!(matches!(
        m.project(&pid),
        Err(ModelError::NotFound { kind: EntityKind::Project, .. })
    ));
}

#[test]
fn test_requirement_status() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let rid = add_requirement(&mut m, &pid, "Login");
    assert_eq!(m.requirement_status(&rid).unwrap(), 0.0);

    let t1 = add_task(&mut m, &pid, "Form");
    let t2 = add_task(&mut m, &pid, "Backend");
    m.assign_requirement(&t1, &rid).unwrap();
    m.assign_requirement(&t2, &rid).unwrap();
    assert_eq!(m.requirement_status(&rid).unwrap(), 0.0);

    m.set_task_status(&t1, TaskStatus::Completed).unwrap();
    assert_eq!(m.requirement_status(&rid).unwrap(), 0.5);
    assert_eq!(m.requirements_with_status_over(0.5).unwrap().len(), 1);
    assert!(m.requirements_with_status_over(0.6).unwrap().is_empty());

    m.set_task_status(&t2, TaskStatus::Completed).unwrap();
    assert_eq!(m.requirement_status(&rid).unwrap(), 1.0);
    assert_eq!(m.project(&pid).unwrap().status(), 1.0);

    let requirement = m.requirement(&rid).unwrap();
    let tasks = m.project(&pid).unwrap().tasks();
    assert_eq!(requirement.estimated_work_hours(tasks), 10.0);
}

#[test]
fn test_status_threshold_bounds() {
    let mut m = model();
    assert!(m.requirements_with_status_over(1.5).is_err());
    assert!(m.requirements_with_status_over(-0.1).is_err());
    assert!(m.projects_with_status_over(2.0).is_err());

    let pid = add_project(&mut m, "Website");
    assert_eq!(m.projects_with_status_over(0.0).unwrap().len(), 1);
    assert!(m.project(&pid).unwrap().requirements_with_status_over(1.1).is_err());
}

#[test]
fn test_child_deadline_bounds() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");

    // Past the project deadline.
    assert!(m.add_task(&pid, "Late", "", 1.0, date(2, 1, 2030)).is_err());
    // Before today.
    assert!(m
        .add_requirement(&pid, "Old", "", date(31, 12, 2028), PriorityGroup::Low)
        .is_err());
    // On the project deadline and on today are both fine.
    assert!(m.add_task(&pid, "Edge", "", 1.0, date(1, 1, 2030)).is_ok());
    assert!(m.add_task(&pid, "Today", "", 1.0, date(1, 1, 2029)).is_ok());

    // The project deadline cannot move before a child.
    assert!(m.set_project_deadline(&pid, date(1, 6, 2029)).is_err());
    assert!(m.set_project_deadline(&pid, date(1, 6, 2031)).is_ok());
    assert_eq!(m.project(&pid).unwrap().deadline(), date(1, 6, 2031));
}

#[test]
fn test_project_rejects_past_deadline() {
    let mut m = model();
    assert!(m.add_project("Old", "", date(31, 12, 2028), 1.0).is_err());
    assert!(m.add_project("", "", date(1, 1, 2030), 1.0).is_err());
    assert!(m.add_project("Neg", "", date(1, 1, 2030), -1.0).is_err());
    assert!(Project::new("X12", "Bad id", "", date(1, 1, 2030), 1.0).is_err());
    assert!(Project::new("Pabc", "Good", "", date(1, 1, 2020), 1.0).is_ok());
}

#[test]
fn test_queries_by_deadline_priority_and_index() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    m.add_requirement(&pid, "Early", "", date(1, 3, 2029), PriorityGroup::Critical)
        .unwrap();
    m.add_requirement(&pid, "Late", "", date(1, 9, 2029), PriorityGroup::Low)
        .unwrap();
    m.add_task(&pid, "Early", "", 1.0, date(1, 3, 2029)).unwrap();

    assert_eq!(m.requirements_before_deadline(date(1, 6, 2029)).len(), 1);
    assert_eq!(m.requirements_with_priority(PriorityGroup::Critical).len(), 1);
    assert_eq!(m.tasks_before_deadline(date(1, 3, 2029)).len(), 0);
    assert_eq!(m.tasks_before_deadline(date(2, 3, 2029)).len(), 1);
    assert!(m.projects_before_deadline(date(1, 1, 2030)).is_empty());

    let project = m.project_by_index(0).unwrap();
    assert_eq!(project.requirement_by_index(1).unwrap().title(), "Late");
    assert!(matches!(
        project.task_by_index(5),
        Err(ModelError::IndexOutOfRange { index: 5, len: 1, .. })
    ));
    assert_eq!(project.requirements().approved().len(), 0);
    assert_eq!(project.requirements().disapproved().len(), 2);
}

#[test]
fn test_rename_keeps_titles_unique() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let t1 = add_task(&mut m, &pid, "One");
    add_task(&mut m, &pid, "Two");

    let project = m.project_mut(&pid).unwrap();
    assert!(project.rename_task(&t1, "Two").is_err());
    project.rename_task(&t1, "Uno").unwrap();
    assert_eq!(project.task(&t1).unwrap().title(), "Uno");
    assert!(project.rename_task(&t1, "Uno").is_ok());
}

#[test]
fn test_ten_thousand_unique_ids() {
    let mut m = model();
    let pid = m
        .add_project("Big", "", date(1, 1, 2100), 0.0)
        .unwrap()
        .id()
        .to_owned();

    let mut seen = HashSet::new();
    for i in 0..10_000 {
        let title = format!("R{}", i);
        let id = m
            .add_requirement(&pid, &title, "", date(1, 1, 2099), PriorityGroup::Low)
            .unwrap()
            .id()
            .to_owned();
        assert!(seen.insert(id));
    }
    for i in 0..10_000 {
        let title = format!("T{}", i);
        let id = m
            .add_task(&pid, &title, "", 1.0, date(1, 1, 2099))
            .unwrap()
            .id()
            .to_owned();
        assert!(seen.insert(id));
    }
    assert_eq!(seen.len(), 20_000);
}

#[test]
fn test_wrong_kind_of_id_in_same_project_is_not_found() {
    let mut m = model();
    let pid = add_project(&mut m, "Website");
    let r1 = add_requirement(&mut m, &pid, "Login");
    let r2 = add_requirement(&mut m, &pid, "Logout");
    let tid = add_task(&mut m, &pid, "Form");

    assert!(matches!(
        m.assign_requirement(&r1, &r2),
        Err(ModelError::NotFound { kind: EntityKind::Task, .. })
    ));
    assert!(matches!(
        m.assign_requirement(&tid, &tid),
        Err(ModelError::NotFound { kind: EntityKind::Requirement, .. })
    ));
    assert!(matches!(
        m.project_mut(&pid).unwrap().unassign_requirement(&r1, &r2),
        Err(ModelError::NotFound { kind: EntityKind::Task, .. })
    ));
    assert!(m.requirement(&r1).unwrap().assigned_tasks().is_empty());
    assert!(m.requirement(&r2).unwrap().assigned_tasks().is_empty());
}
