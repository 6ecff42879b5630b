use projust::date::{DateValue, FixedClock};
use projust::error::ModelError;
use projust::manager::ModelManager;
use projust::models::{EntityKind, Member, PriorityGroup, ProjectRole, TaskStatus};

fn date(day: u32, month: u32, year: i32) -> DateValue {
    DateValue::new(day, month, year).unwrap()
}

fn model() -> ModelManager {
    ModelManager::with_clock(Box::new(FixedClock(date(1, 1, 2029))))
}

fn hire(m: &mut ModelManager, first: &str, last: &str, email: &str) -> String {
    m.add_member(first, last, email, date(2, 4, 1990), None)
        .unwrap()
        .id()
        .to_owned()
}

#[test]
fn test_end_to_end_scenario() {
    let mut m = model();
    let pid = m
        .add_project("P", "", date(1, 1, 2030), 100.0)
        .unwrap()
        .id()
        .to_owned();
    let rid = m
        .add_requirement(&pid, "R1", "", date(1, 12, 2029), PriorityGroup::High)
        .unwrap()
        .id()
        .to_owned();
    let tid = m
        .add_task(&pid, "T1", "", 5.0, date(1, 12, 2029))
        .unwrap()
        .id()
        .to_owned();

    m.assign_requirement(&tid, &rid).unwrap();
    assert_eq!(m.requirement_status(&rid).unwrap(), 0.0);

    m.set_task_status(&tid, TaskStatus::Completed).unwrap();
    assert_eq!(m.requirement_status(&rid).unwrap(), 1.0);

    assert!(matches!(
        m.remove_task(&tid),
        Err(ModelError::DependencyViolation { .. })
    ));
    m.unassign_requirement(&tid, &rid).unwrap();
    m.remove_task(&tid).unwrap();
    assert_eq!(m.requirement_status(&rid).unwrap(), 0.0);
    assert!(m.integrity_problems().is_empty());
}

#[test]
fn test_member_id_is_derived_and_stable() {
    let mut m = model();
    let id = hire(&mut m, "Ann Marie", "Lee", "Ann@Example.com");
    assert_eq!(id, "ann-marie.lee/ann@example.com");
    assert_eq!(Member::derive_id("Ann Marie", "Lee", "Ann@Example.com"), id);

    m.rename_member(&id, "Anna", "Lee").unwrap();
    m.change_member_email(&id, "anna@example.com").unwrap();
    let member = m.member(&id).unwrap();
    assert_eq!(member.full_name(), "Anna Lee");
    assert_eq!(member.email(), "anna@example.com");
    assert_eq!(m.member_by_email("anna@example.com").unwrap().id(), id);
}

#[test]
fn test_member_validation_and_duplicates() {
    let mut m = model();
    hire(&mut m, "Ann", "Lee", "ann@example.com");

    assert!(matches!(
        m.add_member("Ann", "Lee", "other@example.com", date(1, 1, 1990), None),
        Err(ModelError::DuplicateEntity { kind: EntityKind::Member, .. })
    ));
    assert!(matches!(
        m.add_member("Bob", "Ray", "ann@example.com", date(1, 1, 1990), None),
        Err(ModelError::DuplicateEntity { kind: EntityKind::Member, .. })
    ));
    assert!(m
        .add_member("", "Ray", "bob@example.com", date(1, 1, 1990), None)
        .is_err());
    assert!(m
        .add_member("Bob", "Ray", "not-an-email", date(1, 1, 1990), None)
        .is_err());
    assert_eq!(m.members().len(), 1);
}

#[test]
fn test_member_lookups() {
    let mut m = model();
    hire(&mut m, "Ann", "Lee", "ann@example.com");
    m.add_member("Bob", "Ray", "bob@example.com", date(5, 5, 1985), Some("555-0100".into()))
        .unwrap();

    let bob = m.member_by_full_name("Bob", "Ray").unwrap();
    assert_eq!(bob.phone(), Some("555-0100"));
    assert_eq!(m.members_by_birthday(date(2, 4, 1990)).len(), 1);
    assert!(matches!(
        m.member_by_email("nobody@example.com"),
        Err(ModelError::NotFound { kind: EntityKind::Member, .. })
    ));
    assert_eq!(m.member_registry().get_by_index(1).unwrap().first_name(), "Bob");

    m.remove_member_by_name("Bob", "Ray").unwrap();
    assert_eq!(m.members().len(), 1);
}

#[test]
fn test_assign_member_is_symmetric() {
    let mut m = model();
    let pid = m.add_project("P", "", date(1, 1, 2030), 0.0).unwrap().id().to_owned();
    let tid = m
        .add_task(&pid, "T1", "", 2.0, date(1, 6, 2029))
        .unwrap()
        .id()
        .to_owned();
    let ann = hire(&mut m, "Ann", "Lee", "ann@example.com");

    m.assign_member(&tid, &ann).unwrap();
    m.assign_member(&tid, &ann).unwrap();
    assert_eq!(m.task(&tid).unwrap().assigned_members(), [ann.clone()]);
    assert_eq!(m.member(&ann).unwrap().assigned_tasks(), [tid.clone()]);
    assert_eq!(m.tasks_of_member(&ann).unwrap().len(), 1);
    assert_eq!(m.members_of_task(&tid).unwrap().len(), 1);

    assert!(matches!(
        m.remove_member(&ann),
        Err(ModelError::DependencyViolation { kind: EntityKind::Member, .. })
    ));
    assert!(matches!(
        m.remove_task(&tid),
        Err(ModelError::DependencyViolation { kind: EntityKind::Task, .. })
    ));

    m.unassign_member(&tid, &ann).unwrap();
    assert!(m.task(&tid).unwrap().assigned_members().is_empty());
    assert!(m.member(&ann).unwrap().assigned_tasks().is_empty());
}

#[test]
fn test_unassign_every_link_of_member() {
    let mut m = model();
    let pid = m.add_project("P", "", date(1, 1, 2030), 0.0).unwrap().id().to_owned();
    let t1 = m.add_task(&pid, "T1", "", 2.0, date(1, 6, 2029)).unwrap().id().to_owned();
    let t2 = m.add_task(&pid, "T2", "", 2.0, date(1, 6, 2029)).unwrap().id().to_owned();
    let ann = hire(&mut m, "Ann", "Lee", "ann@example.com");
    m.assign_member(&t1, &ann).unwrap();
    m.assign_member(&t2, &ann).unwrap();

    m.unassign_member_from_every_task(&ann).unwrap();
    assert!(m.tasks_of_member(&ann).unwrap().is_empty());
    assert!(m.members_of_task(&t1).unwrap().is_empty());
    assert!(m.members_of_task(&t2).unwrap().is_empty());

    m.assign_member(&t1, &ann).unwrap();
    m.unassign_task_from_every_member(&t1).unwrap();
    assert!(m.member(&ann).unwrap().assigned_tasks().is_empty());
    m.remove_member(&ann).unwrap();
}

#[test]
fn test_members_of_project_without_repeats() {
    let mut m = model();
    let pid = m.add_project("P", "", date(1, 1, 2030), 0.0).unwrap().id().to_owned();
    let rid = m
        .add_requirement(&pid, "R1", "", date(1, 6, 2029), PriorityGroup::Low)
        .unwrap()
        .id()
        .to_owned();
    let t1 = m.add_task(&pid, "T1", "", 2.0, date(1, 6, 2029)).unwrap().id().to_owned();
    let t2 = m.add_task(&pid, "T2", "", 2.0, date(1, 6, 2029)).unwrap().id().to_owned();
    let ann = hire(&mut m, "Ann", "Lee", "ann@example.com");
    let bob = hire(&mut m, "Bob", "Ray", "bob@example.com");
    let cy = hire(&mut m, "Cy", "Fox", "cy@example.com");

    m.assign_member(&t1, &ann).unwrap();
    m.assign_member(&t2, &ann).unwrap();
    m.assign_member(&t2, &bob).unwrap();
    m.assign_role(&pid, ProjectRole::ScrumMaster, &ann).unwrap();
    m.assign_role(&pid, ProjectRole::Creator, &cy).unwrap();
    m.assign_role(&pid, ProjectRole::ProductOwner, &cy).unwrap();

    let ids: Vec<&str> = m
        .members_of_project(&pid)
        .unwrap()
        .into_iter()
        .map(|mem| mem.id())
        .collect();
    assert_eq!(ids, [ann.as_str(), bob.as_str(), cy.as_str()]);

    m.assign_requirement(&t1, &rid).unwrap();
    m.assign_requirement(&t2, &rid).unwrap();
    assert_eq!(m.members_of_requirement(&rid).unwrap().len(), 2);
    assert_eq!(m.requirements_of_member(&ann).unwrap().len(), 1);
}

#[test]
fn test_roles() {
    let mut m = model();
    let pid = m.add_project("P", "", date(1, 1, 2030), 0.0).unwrap().id().to_owned();
    let ann = hire(&mut m, "Ann", "Lee", "ann@example.com");

    assert!(matches!(
        m.assign_role(&pid, ProjectRole::Creator, "ghost"),
        Err(ModelError::NotFound { kind: EntityKind::Member, .. })
    ));
    m.assign_role(&pid, ProjectRole::Creator, &ann).unwrap();
    m.assign_role(&pid, ProjectRole::ScrumMaster, &ann).unwrap();
    let project = m.project(&pid).unwrap();
    assert_eq!(project.creator(), Some(ann.as_str()));
    assert_eq!(project.scrum_master(), Some(ann.as_str()));
    assert_eq!(project.product_owner(), None);
    assert_eq!(project.role_holders(), [ann.as_str()]);

    m.clear_role(&pid, ProjectRole::ScrumMaster).unwrap();
    assert_eq!(m.project(&pid).unwrap().scrum_master(), None);
    assert_eq!("owner".parse::<ProjectRole>().unwrap(), ProjectRole::ProductOwner);
    assert!("boss".parse::<ProjectRole>().is_err());
}

#[test]
fn test_remove_member_clears_roles() {
    let mut m = model();
    let p1 = m.add_project("P1", "", date(1, 1, 2030), 0.0).unwrap().id().to_owned();
    let p2 = m.add_project("P2", "", date(1, 1, 2030), 0.0).unwrap().id().to_owned();
    let ann = hire(&mut m, "Ann", "Lee", "ann@example.com");
    let bob = hire(&mut m, "Bob", "Ray", "bob@example.com");
    m.assign_role(&p1, ProjectRole::Creator, &ann).unwrap();
    m.assign_role(&p2, ProjectRole::ProductOwner, &ann).unwrap();
    m.assign_role(&p2, ProjectRole::ScrumMaster, &bob).unwrap();

    m.remove_member(&ann).unwrap();
    assert_eq!(m.project(&p1).unwrap().creator(), None);
    assert_eq!(m.project(&p2).unwrap().product_owner(), None);
    assert_eq!(m.project(&p2).unwrap().scrum_master(), Some(bob.as_str()));
    assert!(m.integrity_problems().is_empty());
}

#[test]
fn test_priority_and_status_parsing() {
    assert_eq!("Critical".parse::<PriorityGroup>().unwrap(), PriorityGroup::Critical);
    assert!("critical".parse::<PriorityGroup>().is_err());
    assert!("Medium".parse::<PriorityGroup>().is_err());
    assert_eq!("Completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
    assert_eq!(TaskStatus::default(), TaskStatus::Started);
}

#[test]
fn test_unknown_ids_report_not_found() {
    let m = model();
    assert!(matches!(
        m.task("PaaaT123456"),
        Err(ModelError::NotFound { kind: EntityKind::Task, .. })
    ));
    assert!(matches!(
        m.requirement("garbage"),
        Err(ModelError::NotFound { kind: EntityKind::Requirement, .. })
    ));
    assert!(m.tasks_of_project("Paaa").is_err());
}

#[test]
fn test_rehire_after_rename_gets_fresh_id() {
    let mut m = model();
    let first = hire(&mut m, "Ann", "Lee", "ann@example.com");
    m.rename_member(&first, "Bea", "Kim").unwrap();
    m.change_member_email(&first, "bea@example.com").unwrap();

    let second = hire(&mut m, "Ann", "Lee", "ann@example.com");
    assert_ne!(first, second);
    assert!(second.starts_with(&first));
    assert_eq!(m.member_by_email("ann@example.com").unwrap().id(), second);
    assert_eq!(m.member_by_email("bea@example.com").unwrap().id(), first);

    m.rename_member(&second, "Cy", "Fox").unwrap();
    m.change_member_email(&second, "cy@example.com").unwrap();
    let third = hire(&mut m, "Ann", "Lee", "ann@example.com");
    assert!(third != first && third != second);
    assert_eq!(m.members().len(), 3);
    assert!(m.integrity_problems().is_empty());
}
