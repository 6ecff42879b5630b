use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::date::DateValue;
use crate::manager::ModelManager;
use crate::models::{Member, PriorityGroup, ProjectRole, Requirement, Task, TaskStatus};
use crate::project::Project;

/// Parses a `YYYY-MM-DD` date from the command line.
pub fn parse_date(s: &str) -> Result<DateValue> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD.", s))?;
    Ok(DateValue::try_from(date)?)
}

/// Parses `started` / `completed`, case-insensitively.
pub fn parse_status(s: &str) -> Result<TaskStatus> {
    match s.to_lowercase().as_str() {
        "started" => Ok(TaskStatus::Started),
        "completed" | "done" => Ok(TaskStatus::Completed),
        _ => anyhow::bail!("Unknown task status '{}'. Use started or completed.", s),
    }
}

/// Accepts either a member id or an email address.
fn resolve_member(model: &ModelManager, key: &str) -> Result<String> {
    if let Ok(member) = model.member_by_email(key) {
        return Ok(member.id().to_owned());
    }
    Ok(model.member(key)?.id().to_owned())
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(names: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(names));
    table
}

fn status_cell(status: f64) -> Cell {
    let color = if status >= 1.0 {
        Color::Green
    } else if status > 0.0 {
        Color::Yellow
    } else {
        Color::Reset
    };
    Cell::new(format!("{:.0}%", status * 100.0)).fg(color)
}

fn member_name(model: &ModelManager, id: Option<&str>) -> String {
    id.and_then(|id| model.member(id).ok())
        .map(Member::full_name)
        .unwrap_or_else(|| "-".into())
}

// ----------------------------------------------------------------------
// Projects
// ----------------------------------------------------------------------

pub fn cmd_project_add(
    model: &mut ModelManager,
    title: &str,
    description: Option<String>,
    due: &str,
    hours: f64,
) -> Result<String> {
    let deadline = parse_date(due)?;
    let project = model.add_project(title, description.as_deref().unwrap_or(""), deadline, hours)?;
    println!("Project added (id = {})", project.id());
    Ok(project.id().to_owned())
}

pub fn cmd_project_list(model: &ModelManager, before: Option<String>) -> Result<()> {
    let projects: Vec<&Project> = match before {
        Some(d) => model.projects_before_deadline(parse_date(&d)?),
        None => model.projects(),
    };
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Title", "Deadline", "Reqs", "Tasks", "Worked", "Status"]);
    for p in projects {
        table.add_row(vec![
            Cell::new(p.id()),
            Cell::new(p.title()),
            Cell::new(p.deadline()),
            Cell::new(p.requirements().len()),
            Cell::new(p.tasks().len()),
            Cell::new(format!("{:.1}", p.total_worked_hours())),
            status_cell(p.status()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_project_show(model: &ModelManager, id: &str) -> Result<()> {
    let p = model.project(id)?;
    println!("{} - {}", p.id(), p.title());
    if !p.description().is_empty() {
        println!("{}", p.description());
    }
    println!(
        "Deadline: {} ({}, {} {})",
        p.deadline(),
        p.deadline().day_name(),
        p.deadline().month_name(),
        p.deadline().year()
    );
    println!(
        "Hours: {:.1} worked / {:.1} estimated on tasks / {:.1} planned",
        p.total_worked_hours(),
        p.tasks_estimated_hours(),
        p.estimated_work_hours()
    );
    for role in ProjectRole::ALL {
        println!("{:>14}: {}", role.as_str(), member_name(model, p.role(role)));
    }
    let members: Vec<String> = model
        .members_of_project(id)?
        .into_iter()
        .map(Member::full_name)
        .collect();
    println!("Members: {}", if members.is_empty() { "-".into() } else { members.join(", ") });
    print_requirements(p, p.requirements().iter().collect());
    print_tasks(p.tasks().iter().collect());
    Ok(())
}

pub fn cmd_project_remove(model: &mut ModelManager, id: &str) -> Result<()> {
    model.remove_project(id)?;
    println!("Project {} removed.", id);
    Ok(())
}

/// Sets a role slot, or clears it when `member` is `None`.
pub fn cmd_project_role(
    model: &mut ModelManager,
    id: &str,
    role: &str,
    member: Option<String>,
) -> Result<()> {
    let role: ProjectRole = role.parse()?;
    match member {
        Some(key) => {
            let member_id = resolve_member(model, &key)?;
            model.assign_role(id, role, &member_id)?;
            println!("{} of {} is now {}.", role, id, member_name(model, Some(&member_id)));
        }
        None => {
            model.clear_role(id, role)?;
            println!("{} of {} cleared.", role, id);
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Requirements
// ----------------------------------------------------------------------

pub fn cmd_requirement_add(
    model: &mut ModelManager,
    project: &str,
    title: &str,
    description: Option<String>,
    due: &str,
    priority: &str,
) -> Result<String> {
    let deadline = parse_date(due)?;
    let priority: PriorityGroup = priority.parse()?;
    let requirement = model.add_requirement(
        project,
        title,
        description.as_deref().unwrap_or(""),
        deadline,
        priority,
    )?;
    println!("Requirement added (id = {})", requirement.id());
    Ok(requirement.id().to_owned())
}

/// Filters applied by `requirement list`; unset fields do not filter.
#[derive(Debug, Default, Clone)]
pub struct RequirementFilter {
    pub project: Option<String>,
    pub priority: Option<String>,
    pub approved: Option<bool>,
    pub status_over: Option<f64>,
}

pub fn cmd_requirement_list(model: &ModelManager, filter: RequirementFilter) -> Result<()> {
    let mut requirements = match (&filter.project, filter.status_over) {
        (Some(pid), Some(t)) => model.project(pid)?.requirements_with_status_over(t)?,
        (Some(pid), None) => model.requirements_of_project(pid)?,
        (None, Some(t)) => model.requirements_with_status_over(t)?,
        (None, None) => model.all_requirements(),
    };
    if let Some(p) = &filter.priority {
        let priority: PriorityGroup = p.parse()?;
        requirements.retain(|r| r.priority_group() == priority);
    }
    if let Some(approved) = filter.approved {
        requirements.retain(|r| r.is_approved() == approved);
    }
    if requirements.is_empty() {
        println!("No requirements found.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Title", "Priority", "Deadline", "Approved", "Tasks", "Status"]);
    for r in requirements {
        let status = model.requirement_status(r.id())?;
        table.add_row(requirement_row(r, status));
    }
    println!("{table}");
    Ok(())
}

fn requirement_row(r: &Requirement, status: f64) -> Vec<Cell> {
    let priority_color = match r.priority_group() {
        PriorityGroup::Critical => Color::Red,
        PriorityGroup::High => Color::Yellow,
        PriorityGroup::Low => Color::Reset,
    };
    vec![
        Cell::new(r.id()),
        Cell::new(r.title()),
        Cell::new(r.priority_group()).fg(priority_color),
        Cell::new(r.deadline()),
        Cell::new(if r.is_approved() { "yes" } else { "no" }),
        Cell::new(r.assigned_tasks().len()),
        status_cell(status),
    ]
}

fn print_requirements(project: &Project, requirements: Vec<&Requirement>) {
    if requirements.is_empty() {
        println!("No requirements.");
        return;
    }
    let mut table = new_table(&["ID", "Title", "Priority", "Deadline", "Approved", "Tasks", "Status"]);
    for r in requirements {
        table.add_row(requirement_row(r, r.status(project.tasks())));
    }
    println!("{table}");
}

pub fn cmd_requirement_approve(model: &mut ModelManager, id: &str, approved: bool) -> Result<()> {
    model.requirement_mut(id)?.set_approved(approved);
    if approved {
        println!("Requirement {} approved.", id);
    } else {
        println!("Requirement {} disapproved.", id);
    }
    Ok(())
}

pub fn cmd_requirement_remove(model: &mut ModelManager, id: &str, unlink: bool) -> Result<()> {
    if unlink {
        model.unassign_requirement_from_every_task(id)?;
    }
    model.remove_requirement(id)?;
    println!("Requirement {} removed.", id);
    Ok(())
}

// ----------------------------------------------------------------------
// Tasks
// ----------------------------------------------------------------------

pub fn cmd_task_add(
    model: &mut ModelManager,
    project: &str,
    title: &str,
    description: Option<String>,
    hours: f64,
    due: &str,
) -> Result<String> {
    let deadline = parse_date(due)?;
    let task = model.add_task(
        project,
        title,
        description.as_deref().unwrap_or(""),
        hours,
        deadline,
    )?;
    println!("Task added (id = {})", task.id());
    Ok(task.id().to_owned())
}

pub fn cmd_task_list(model: &ModelManager, project: Option<String>, status: Option<String>) -> Result<()> {
    let mut tasks = match &project {
        Some(pid) => model.tasks_of_project(pid)?,
        None => model.all_tasks(),
    };
    if let Some(s) = status {
        let status = parse_status(&s)?;
        tasks.retain(|t| t.status() == status);
    }
    print_tasks(tasks);
    Ok(())
}

fn print_tasks(tasks: Vec<&Task>) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    let mut table = new_table(&["ID", "Title", "Deadline", "Worked", "Est", "Reqs", "Members", "Status"]);
    for t in tasks {
        let status_color = if t.is_completed() { Color::Green } else { Color::Yellow };
        table.add_row(vec![
            Cell::new(t.id()),
            Cell::new(t.title()),
            Cell::new(t.deadline()),
            Cell::new(format!("{:.1}", t.total_worked_hours())),
            Cell::new(format!("{:.1}", t.estimated_work_hours())),
            Cell::new(t.assigned_requirements().len()),
            Cell::new(t.assigned_members().len()),
            Cell::new(t.status()).fg(status_color),
        ]);
    }
    println!("{table}");
}

/// Marks a task as completed.
pub fn cmd_task_complete(model: &mut ModelManager, id: &str) -> Result<()> {
    model.set_task_status(id, TaskStatus::Completed)?;
    println!("Task {} marked as complete.", id);
    Ok(())
}

pub fn cmd_task_reopen(model: &mut ModelManager, id: &str) -> Result<()> {
    model.set_task_status(id, TaskStatus::Started)?;
    println!("Task {} reopened.", id);
    Ok(())
}

/// Logs hours worked on a task.
///
/// total_worked_hours += hours
pub fn cmd_task_log(model: &mut ModelManager, id: &str, hours: f64) -> Result<()> {
    let task = model.task_mut(id)?;
    task.add_worked_hours(hours)?;
    println!("Logged {:.1}h on task {} ({:.1}h total).", hours, id, task.total_worked_hours());
    Ok(())
}

/// Updates the estimate of a task from the hours still needed.
///
/// estimated_work_hours = total_worked_hours + remaining
pub fn cmd_task_estimate(model: &mut ModelManager, id: &str, remaining: f64) -> Result<()> {
    let task = model.task_mut(id)?;
    task.reestimate(remaining)?;
    println!("Task {} re-estimated to {:.1}h.", id, task.estimated_work_hours());
    Ok(())
}

/// Removes a task. With `unlink`, its requirement and member links are
/// dropped first; otherwise a linked task is refused.
pub fn cmd_task_remove(model: &mut ModelManager, id: &str, unlink: bool) -> Result<()> {
    if unlink {
        model.unassign_task_from_every_requirement(id)?;
        model.unassign_task_from_every_member(id)?;
    }
    model.remove_task(id)?;
    println!("Task {} removed.", id);
    Ok(())
}

pub fn cmd_task_link(model: &mut ModelManager, task: &str, requirement: &str) -> Result<()> {
    model.assign_requirement(task, requirement)?;
    println!("Task {} linked to requirement {}.", task, requirement);
    Ok(())
}

pub fn cmd_task_unlink(model: &mut ModelManager, task: &str, requirement: &str) -> Result<()> {
    model.unassign_requirement(task, requirement)?;
    println!("Task {} unlinked from requirement {}.", task, requirement);
    Ok(())
}

pub fn cmd_task_assign(model: &mut ModelManager, task: &str, member: &str) -> Result<()> {
    let member_id = resolve_member(model, member)?;
    model.assign_member(task, &member_id)?;
    println!("{} assigned to task {}.", member_name(model, Some(&member_id)), task);
    Ok(())
}

pub fn cmd_task_unassign(model: &mut ModelManager, task: &str, member: &str) -> Result<()> {
    let member_id = resolve_member(model, member)?;
    model.unassign_member(task, &member_id)?;
    println!("{} unassigned from task {}.", member_name(model, Some(&member_id)), task);
    Ok(())
}

// ----------------------------------------------------------------------
// Members
// ----------------------------------------------------------------------

pub fn cmd_member_add(
    model: &mut ModelManager,
    first_name: &str,
    last_name: &str,
    email: &str,
    birthday: &str,
    phone: Option<String>,
) -> Result<String> {
    let birthday = parse_date(birthday)?;
    let member = model.add_member(first_name, last_name, email, birthday, phone)?;
    println!("Member added (id = {})", member.id());
    Ok(member.id().to_owned())
}

pub fn cmd_member_list(model: &ModelManager, project: Option<String>) -> Result<()> {
    let members = match &project {
        Some(pid) => model.members_of_project(pid)?,
        None => model.members(),
    };
    if members.is_empty() {
        println!("No members found.");
        return Ok(());
    }
    let mut table = new_table(&["ID", "Name", "Email", "Phone", "Birthday", "Tasks"]);
    for m in members {
        table.add_row(vec![
            Cell::new(m.id()),
            Cell::new(m.full_name()),
            Cell::new(m.email()),
            Cell::new(m.phone().unwrap_or("-")),
            Cell::new(m.birthday()),
            Cell::new(m.assigned_tasks().len()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_member_remove(model: &mut ModelManager, member: &str) -> Result<()> {
    let member_id = resolve_member(model, member)?;
    let removed = model.remove_member(&member_id)?;
    println!("Member {} removed.", removed.full_name());
    Ok(())
}
