use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::date::{Clock, DateValue, SystemClock};
use crate::error::{ModelError, Result};
use crate::ids::{self, REQUIREMENT_TAG, TASK_TAG};
use crate::members::MemberRegistry;
use crate::models::{EntityKind, Member, PriorityGroup, ProjectRole, Requirement, Task, TaskStatus};
use crate::project::Project;
use crate::projects::ProjectRegistry;
use crate::requirements::check_threshold;

fn default_clock() -> Box<dyn Clock> {
    Box::new(SystemClock)
}

/// The whole model: every project and the organisation's members.
///
/// This is the entry point for the CLI and for persistence. Commands that
/// touch entities living in different registries (a task and a member, a
/// member and the role slots of projects) go through here so that both sides
/// change together. Read queries hand out borrowed entities in insertion
/// order.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelManager {
    #[serde(default)]
    projects: ProjectRegistry,
    #[serde(default)]
    members: MemberRegistry,
    #[serde(skip, default = "default_clock")]
    clock: Box<dyn Clock>,
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pushes `item` unless an item with the same id is already there.
fn push_unique<'a, T>(out: &mut Vec<&'a T>, item: &'a T, id: impl Fn(&T) -> &str) {
    if !out.iter().any(|x| id(*x) == id(item)) {
        out.push(item);
    }
}

impl ModelManager {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            projects: ProjectRegistry::new(),
            members: MemberRegistry::new(),
            clock,
        }
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    pub fn today(&self) -> DateValue {
        self.clock.today()
    }

    pub fn member_registry(&self) -> &MemberRegistry {
        &self.members
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub fn add_project(
        &mut self,
        title: &str,
        description: &str,
        deadline: DateValue,
        estimated_work_hours: f64,
    ) -> Result<&Project> {
        let today = self.clock.today();
        let project = self
            .projects
            .create(title, description, deadline, estimated_work_hours, today)?;
        info!(project_id = %project.id(), title, "project created");
        Ok(project)
    }

    pub fn remove_project(&mut self, id: &str) -> Result<Project> {
        let project = self.projects.remove(id)?;
        info!(project_id = %id, "project removed");
        Ok(project)
    }

    pub fn project(&self, id: &str) -> Result<&Project> {
        self.projects.get(id)
    }

    pub fn project_mut(&mut self, id: &str) -> Result<&mut Project> {
        self.projects.get_mut(id)
    }

    pub fn project_by_index(&self, index: usize) -> Result<&Project> {
        self.projects.get_by_index(index)
    }

    pub fn projects(&self) -> Vec<&Project> {
        self.projects.iter().collect()
    }

    pub fn projects_before_deadline(&self, deadline: DateValue) -> Vec<&Project> {
        self.projects.before_deadline(deadline)
    }

    pub fn projects_with_status_over(&self, threshold: f64) -> Result<Vec<&Project>> {
        self.projects.with_status_over(threshold)
    }

    pub fn set_project_deadline(&mut self, id: &str, deadline: DateValue) -> Result<()> {
        let today = self.clock.today();
        self.projects.get_mut(id)?.set_deadline(deadline, today)
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    /// Puts a registered member in a role slot of a project. Nothing stops a
    /// member from holding several roles.
    pub fn assign_role(&mut self, project_id: &str, role: ProjectRole, member_id: &str) -> Result<()> {
        self.members.get(member_id)?;
        let project = self.projects.get_mut(project_id)?;
        project.set_role(role, Some(member_id.to_owned()));
        debug!(project_id, %role, member_id, "role assigned");
        Ok(())
    }

    pub fn clear_role(&mut self, project_id: &str, role: ProjectRole) -> Result<()> {
        self.projects.get_mut(project_id)?.set_role(role, None);
        debug!(project_id, %role, "role cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Requirements
    // ------------------------------------------------------------------

    pub fn add_requirement(
        &mut self,
        project_id: &str,
        title: &str,
        description: &str,
        deadline: DateValue,
        priority_group: PriorityGroup,
    ) -> Result<&Requirement> {
        let today = self.clock.today();
        let project = self.projects.get_mut(project_id)?;
        let requirement =
            project.add_requirement(title, description, deadline, priority_group, today)?;
        info!(requirement_id = %requirement.id(), title, "requirement created");
        Ok(requirement)
    }

    pub fn remove_requirement(&mut self, id: &str) -> Result<Requirement> {
        let requirement = self
            .projects
            .owner_of_mut(id, EntityKind::Requirement)?
            .remove_requirement(id)?;
        info!(requirement_id = %id, "requirement removed");
        Ok(requirement)
    }

    pub fn requirement(&self, id: &str) -> Result<&Requirement> {
        self.projects
            .owner_of(id, EntityKind::Requirement)?
            .requirement(id)
    }

    pub fn requirement_mut(&mut self, id: &str) -> Result<&mut Requirement> {
        self.projects
            .owner_of_mut(id, EntityKind::Requirement)?
            .requirement_mut(id)
    }

    pub fn requirement_status(&self, id: &str) -> Result<f64> {
        self.projects
            .owner_of(id, EntityKind::Requirement)?
            .requirement_status(id)
    }

    pub fn all_requirements(&self) -> Vec<&Requirement> {
        self.projects.all_requirements().collect()
    }

    pub fn requirements_with_priority(&self, priority: PriorityGroup) -> Vec<&Requirement> {
        self.projects
            .all_requirements()
            .filter(|r| r.priority_group() == priority)
            .collect()
    }

    pub fn requirements_with_status_over(&self, threshold: f64) -> Result<Vec<&Requirement>> {
        check_threshold(threshold)?;
        let mut out = Vec::new();
        for project in &self.projects {
            out.extend(project.requirements_with_status_over(threshold)?);
        }
        Ok(out)
    }

    pub fn requirements_before_deadline(&self, deadline: DateValue) -> Vec<&Requirement> {
        self.projects
            .iter()
            .flat_map(|p| p.requirements().before_deadline(deadline))
            .collect()
    }

    pub fn requirements_of_project(&self, project_id: &str) -> Result<Vec<&Requirement>> {
        Ok(self.projects.get(project_id)?.requirements().iter().collect())
    }

    pub fn requirements_of_task(&self, task_id: &str) -> Result<Vec<&Requirement>> {
        let project = self.projects.owner_of(task_id, EntityKind::Task)?;
        let task = project.task(task_id)?;
        Ok(task
            .assigned_requirements()
            .iter()
            .filter_map(|id| project.requirement(id).ok())
            .collect())
    }

    /// Requirements reached through the member's tasks, without repeats.
    pub fn requirements_of_member(&self, member_id: &str) -> Result<Vec<&Requirement>> {
        let mut out = Vec::new();
        for task in self.tasks_of_member(member_id)? {
            for requirement in self.requirements_of_task(task.id())? {
                push_unique(&mut out, requirement, |r| r.id());
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub fn add_task(
        &mut self,
        project_id: &str,
        title: &str,
        description: &str,
        estimated_work_hours: f64,
        deadline: DateValue,
    ) -> Result<&Task> {
        let today = self.clock.today();
        let project = self.projects.get_mut(project_id)?;
        let task = project.add_task(title, description, estimated_work_hours, deadline, today)?;
        info!(task_id = %task.id(), title, "task created");
        Ok(task)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task> {
        let task = self
            .projects
            .owner_of_mut(id, EntityKind::Task)?
            .remove_task(id)?;
        info!(task_id = %id, "task removed");
        Ok(task)
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        self.projects.owner_of(id, EntityKind::Task)?.task(id)
    }

    pub fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.projects.owner_of_mut(id, EntityKind::Task)?.task_mut(id)
    }

    pub fn set_task_status(&mut self, id: &str, status: TaskStatus) -> Result<()> {
        self.task_mut(id)?.set_status(status);
        debug!(task_id = %id, %status, "task status changed");
        Ok(())
    }

    pub fn all_tasks(&self) -> Vec<&Task> {
        self.projects.all_tasks().collect()
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.projects
            .all_tasks()
            .filter(|t| t.status() == status)
            .collect()
    }

    pub fn tasks_before_deadline(&self, deadline: DateValue) -> Vec<&Task> {
        self.projects
            .iter()
            .flat_map(|p| p.tasks().before_deadline(deadline))
            .collect()
    }

    pub fn tasks_of_project(&self, project_id: &str) -> Result<Vec<&Task>> {
        Ok(self.projects.get(project_id)?.tasks().iter().collect())
    }

    pub fn tasks_of_requirement(&self, requirement_id: &str) -> Result<Vec<&Task>> {
        let project = self
            .projects
            .owner_of(requirement_id, EntityKind::Requirement)?;
        let requirement = project.requirement(requirement_id)?;
        Ok(requirement
            .assigned_tasks()
            .iter()
            .filter_map(|id| project.task(id).ok())
            .collect())
    }

    pub fn tasks_of_member(&self, member_id: &str) -> Result<Vec<&Task>> {
        let member = self.members.get(member_id)?;
        Ok(member
            .assigned_tasks()
            .iter()
            .filter_map(|id| self.task(id).ok())
            .collect())
    }

    // ------------------------------------------------------------------
    // Task <-> requirement links
    // ------------------------------------------------------------------

    /// Links a task to a requirement of the same project.
    pub fn assign_requirement(&mut self, task_id: &str, requirement_id: &str) -> Result<()> {
        self.check_same_project(task_id, requirement_id)?;
        self.projects
            .owner_of_mut(task_id, EntityKind::Task)?
            .assign_requirement(task_id, requirement_id)?;
        debug!(task_id, requirement_id, "task linked to requirement");
        Ok(())
    }

    pub fn unassign_requirement(&mut self, task_id: &str, requirement_id: &str) -> Result<()> {
        self.check_same_project(task_id, requirement_id)?;
        self.projects
            .owner_of_mut(task_id, EntityKind::Task)?
            .unassign_requirement(task_id, requirement_id)?;
        debug!(task_id, requirement_id, "task unlinked from requirement");
        Ok(())
    }

    pub fn unassign_task_from_every_requirement(&mut self, task_id: &str) -> Result<()> {
        self.projects
            .owner_of_mut(task_id, EntityKind::Task)?
            .unassign_task_from_every_requirement(task_id)
    }

    pub fn unassign_requirement_from_every_task(&mut self, requirement_id: &str) -> Result<()> {
        self.projects
            .owner_of_mut(requirement_id, EntityKind::Requirement)?
            .unassign_requirement_from_every_task(requirement_id)
    }

    fn check_same_project(&self, task_id: &str, requirement_id: &str) -> Result<()> {
        let task_project = ids::project_prefix(task_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Task, task_id))?;
        let requirement_project = ids::project_prefix(requirement_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Requirement, requirement_id))?;
        if task_project != requirement_project {
            return Err(ModelError::CrossProjectViolation {
                left: task_id.to_owned(),
                right: requirement_id.to_owned(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Task <-> member links
    // ------------------------------------------------------------------

    /// Assigns a member to a task, on both sides. Repeating it is a no-op.
    pub fn assign_member(&mut self, task_id: &str, member_id: &str) -> Result<()> {
        let task = self
            .projects
            .owner_of_mut(task_id, EntityKind::Task)?
            .task_mut(task_id)?;
        let member = self.members.get_mut(member_id)?;
        task.link_member(member_id);
        member.link_task(task_id);
        debug!(task_id, member_id, "member assigned to task");
        Ok(())
    }

    pub fn unassign_member(&mut self, task_id: &str, member_id: &str) -> Result<()> {
        let task = self
            .projects
            .owner_of_mut(task_id, EntityKind::Task)?
            .task_mut(task_id)?;
        let member = self.members.get_mut(member_id)?;
        task.unlink_member(member_id);
        member.unlink_task(task_id);
        debug!(task_id, member_id, "member unassigned from task");
        Ok(())
    }

    pub fn unassign_task_from_every_member(&mut self, task_id: &str) -> Result<()> {
        let task = self
            .projects
            .owner_of_mut(task_id, EntityKind::Task)?
            .task_mut(task_id)?;
        let linked = task.assigned_members().to_vec();
        for member_id in &linked {
            task.unlink_member(member_id);
            if let Ok(member) = self.members.get_mut(member_id) {
                member.unlink_task(task_id);
            }
        }
        Ok(())
    }

    pub fn unassign_member_from_every_task(&mut self, member_id: &str) -> Result<()> {
        let member = self.members.get_mut(member_id)?;
        let linked = member.assigned_tasks().to_vec();
        for task_id in &linked {
            member.unlink_task(task_id);
            if let Ok(project) = self.projects.owner_of_mut(task_id, EntityKind::Task) {
                if let Ok(task) = project.task_mut(task_id) {
                    task.unlink_member(member_id);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    pub fn add_member(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        birthday: DateValue,
        phone: Option<String>,
    ) -> Result<&Member> {
        let member = self
            .members
            .hire(first_name, last_name, email, birthday, phone)?;
        info!(member_id = %member.id(), "member hired");
        Ok(member)
    }

    /// Fires a member that has no task left and clears the project roles it
    /// still holds.
    pub fn remove_member(&mut self, id: &str) -> Result<Member> {
        let member = self.members.fire(id)?;
        for project in self.projects.iter_mut() {
            project.clear_member_roles(id);
        }
        info!(member_id = %id, "member fired");
        Ok(member)
    }

    pub fn remove_member_by_name(&mut self, first_name: &str, last_name: &str) -> Result<Member> {
        let id = self.members.by_full_name(first_name, last_name)?.id().to_owned();
        self.remove_member(&id)
    }

    pub fn member(&self, id: &str) -> Result<&Member> {
        self.members.get(id)
    }

    pub fn member_mut(&mut self, id: &str) -> Result<&mut Member> {
        self.members.get_mut(id)
    }

    pub fn members(&self) -> Vec<&Member> {
        self.members.iter().collect()
    }

    pub fn member_by_full_name(&self, first_name: &str, last_name: &str) -> Result<&Member> {
        self.members.by_full_name(first_name, last_name)
    }

    pub fn member_by_email(&self, email: &str) -> Result<&Member> {
        self.members.by_email(email)
    }

    pub fn members_by_birthday(&self, birthday: DateValue) -> Vec<&Member> {
        self.members.by_birthday(birthday)
    }

    pub fn rename_member(&mut self, id: &str, first_name: &str, last_name: &str) -> Result<()> {
        self.members.rename(id, first_name, last_name)
    }

    pub fn change_member_email(&mut self, id: &str, email: &str) -> Result<()> {
        self.members.change_email(id, email)
    }

    /// Everyone working on a project: task assignees first, then role
    /// holders, each member once.
    pub fn members_of_project(&self, project_id: &str) -> Result<Vec<&Member>> {
        let project = self.projects.get(project_id)?;
        let mut out = Vec::new();
        let assignees = project.tasks().iter().flat_map(|t| t.assigned_members());
        for id in assignees.map(String::as_str).chain(project.role_holders()) {
            if let Ok(member) = self.members.get(id) {
                push_unique(&mut out, member, |m| m.id());
            }
        }
        Ok(out)
    }

    pub fn members_of_requirement(&self, requirement_id: &str) -> Result<Vec<&Member>> {
        let mut out = Vec::new();
        for task in self.tasks_of_requirement(requirement_id)? {
            for id in task.assigned_members() {
                if let Ok(member) = self.members.get(id) {
                    push_unique(&mut out, member, |m| m.id());
                }
            }
        }
        Ok(out)
    }

    pub fn members_of_task(&self, task_id: &str) -> Result<Vec<&Member>> {
        let task = self.task(task_id)?;
        Ok(task
            .assigned_members()
            .iter()
            .filter_map(|id| self.members.get(id).ok())
            .collect())
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Describes every broken invariant of the graph: fields that fail
    /// validation, repeated titles, names or emails, foreign or malformed
    /// ids, links missing their mirror, dangling member references. Empty
    /// for any model built through this API.
    pub fn integrity_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut project_ids: Vec<&str> = Vec::new();
        for project in &self.projects {
            let pid = project.id();
            if !ids::is_project_id(pid) {
                problems.push(format!("malformed project id {}", pid));
            }
            if project_ids.contains(&pid) {
                problems.push(format!("duplicate project id {}", pid));
            }
            project_ids.push(pid);
            if let Err(e) = project.validate() {
                problems.push(format!("project {}: {}", pid, e));
            }

            for role in ProjectRole::ALL {
                if let Some(member_id) = project.role(role) {
                    if !self.members.contains(member_id) {
                        problems.push(format!("{} of {} is unknown member {}", role, pid, member_id));
                    }
                }
            }

            let mut seen: Vec<&str> = Vec::new();
            let mut titles: Vec<&str> = Vec::new();
            for requirement in project.requirements() {
                let rid = requirement.id();
                if let Err(e) = requirement.validate() {
                    problems.push(format!("requirement {}: {}", rid, e));
                }
                if titles.contains(&requirement.title()) {
                    problems.push(format!("duplicate requirement title {:?} in {}", requirement.title(), pid));
                }
                titles.push(requirement.title());
                if project.deadline().is_before(&requirement.deadline()) {
                    problems.push(format!("requirement {} is due after its project", rid));
                }
                if !ids::is_child_of(rid, pid, REQUIREMENT_TAG) {
                    problems.push(format!("requirement {} does not belong to {}", rid, pid));
                }
                if seen.contains(&rid) {
                    problems.push(format!("duplicate requirement id {}", rid));
                }
                seen.push(rid);
                for tid in requirement.assigned_tasks() {
                    let mirrored = project
                        .task(tid)
                        .is_ok_and(|t| t.is_linked_to_requirement(rid));
                    if !mirrored {
                        problems.push(format!("requirement {} -> task {} is not mirrored", rid, tid));
                    }
                }
            }

            titles.clear();
            for task in project.tasks() {
                let tid = task.id();
                if let Err(e) = task.validate() {
                    problems.push(format!("task {}: {}", tid, e));
                }
                if titles.contains(&task.title()) {
                    problems.push(format!("duplicate task title {:?} in {}", task.title(), pid));
                }
                titles.push(task.title());
                if project.deadline().is_before(&task.deadline()) {
                    problems.push(format!("task {} is due after its project", tid));
                }
                if !ids::is_child_of(tid, pid, TASK_TAG) {
                    problems.push(format!("task {} does not belong to {}", tid, pid));
                }
                if seen.contains(&tid) {
                    problems.push(format!("duplicate task id {}", tid));
                }
                seen.push(tid);
                for rid in task.assigned_requirements() {
                    let mirrored = project
                        .requirement(rid)
                        .is_ok_and(|r| r.is_linked_to_task(tid));
                    if !mirrored {
                        problems.push(format!("task {} -> requirement {} is not mirrored", tid, rid));
                    }
                }
                for mid in task.assigned_members() {
                    let mirrored = self.members.get(mid).is_ok_and(|m| m.is_assigned_to(tid));
                    if !mirrored {
                        problems.push(format!("task {} -> member {} is not mirrored", tid, mid));
                    }
                }
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        let mut names: Vec<(&str, &str)> = Vec::new();
        let mut emails: Vec<&str> = Vec::new();
        for member in &self.members {
            let mid = member.id();
            if seen.contains(&mid) {
                problems.push(format!("duplicate member id {}", mid));
            }
            seen.push(mid);
            if let Err(e) = member.validate() {
                problems.push(format!("member {}: {}", mid, e));
            }
            let name = (member.first_name(), member.last_name());
            if names.contains(&name) {
                problems.push(format!("duplicate member name {}", member.full_name()));
            }
            names.push(name);
            if emails.contains(&member.email()) {
                problems.push(format!("duplicate member email {}", member.email()));
            }
            emails.push(member.email());
            for tid in member.assigned_tasks() {
                let mirrored = self.task(tid).is_ok_and(|t| t.is_assigned_to_member(mid));
                if !mirrored {
                    problems.push(format!("member {} -> task {} is not mirrored", mid, tid));
                }
            }
        }
        problems
    }
}
