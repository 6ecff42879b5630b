use serde::{Deserialize, Serialize};

use crate::date::DateValue;
use crate::error::{ModelError, Result};
use crate::ids::{self, REQUIREMENT_TAG, TASK_TAG};
use crate::models::{EntityKind, PriorityGroup, ProjectRole, Requirement, Task};
use crate::registry::Keyed;
use crate::requirements::RequirementRegistry;
use crate::tasks::TaskRegistry;

/// A project and everything it owns.
///
/// The project is the only place where a task and a requirement can be
/// linked, so both sides of the link are always updated together. The
/// project deadline bounds the deadlines of its requirements and tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    estimated_work_hours: f64,
    deadline: DateValue,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    product_owner: Option<String>,
    #[serde(default)]
    scrum_master: Option<String>,
    #[serde(default)]
    requirements: RequirementRegistry,
    #[serde(default)]
    tasks: TaskRegistry,
}

fn check_not_past(deadline: DateValue, today: DateValue) -> Result<()> {
    if deadline.is_before(&today) {
        return Err(ModelError::invalid(format!(
            "deadline {} is in the past (today is {})",
            deadline, today
        )));
    }
    Ok(())
}

fn check_project_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ModelError::invalid(format!(
            "estimated work hours cannot be negative, got {}",
            hours
        )));
    }
    Ok(())
}

impl Project {
    /// Builds an empty project with an explicit id.
    ///
    /// Deadline freshness is not checked here: a project may be rebuilt
    /// from data whose deadline has since passed.
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        deadline: DateValue,
        estimated_work_hours: f64,
    ) -> Result<Self> {
        if !ids::is_project_id(id) {
            return Err(ModelError::invalid(format!("{:?} is not a project id", id)));
        }
        if title.trim().is_empty() {
            return Err(ModelError::invalid("project title cannot be empty"));
        }
        check_project_hours(estimated_work_hours)?;
        Ok(Self {
            id: id.to_owned(),
            title: title.to_owned(),
            description: description.to_owned(),
            estimated_work_hours,
            deadline,
            creator: None,
            product_owner: None,
            scrum_master: None,
            requirements: RequirementRegistry::new(),
            tasks: TaskRegistry::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn estimated_work_hours(&self) -> f64 {
        self.estimated_work_hours
    }

    pub fn deadline(&self) -> DateValue {
        self.deadline
    }

    pub fn requirements(&self) -> &RequirementRegistry {
        &self.requirements
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Re-runs the field checks of [`Project::new`].
    pub(crate) fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ModelError::invalid("project title cannot be empty"));
        }
        check_project_hours(self.estimated_work_hours)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(ModelError::invalid("project title cannot be empty"));
        }
        self.title = title.to_owned();
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }

    pub fn set_estimated_work_hours(&mut self, hours: f64) -> Result<()> {
        check_project_hours(hours)?;
        self.estimated_work_hours = hours;
        Ok(())
    }

    /// Moves the project deadline. It cannot be in the past nor earlier than
    /// the deadline of anything the project owns.
    pub fn set_deadline(&mut self, deadline: DateValue, today: DateValue) -> Result<()> {
        check_not_past(deadline, today)?;
        let latest_child = self
            .requirements
            .iter()
            .map(|r| r.deadline())
            .chain(self.tasks.iter().map(|t| t.deadline()))
            .max();
        if let Some(latest) = latest_child.filter(|d| deadline.is_before(d)) {
            return Err(ModelError::invalid(format!(
                "project deadline {} would fall before a child deadline {}",
                deadline, latest
            )));
        }
        self.deadline = deadline;
        Ok(())
    }

    fn check_child_deadline(&self, deadline: DateValue, today: DateValue) -> Result<()> {
        check_not_past(deadline, today)?;
        if self.deadline.is_before(&deadline) {
            return Err(ModelError::invalid(format!(
                "deadline {} is after the project deadline {}",
                deadline, self.deadline
            )));
        }
        Ok(())
    }

    // Roles

    pub fn role(&self, role: ProjectRole) -> Option<&str> {
        match role {
            ProjectRole::Creator => self.creator.as_deref(),
            ProjectRole::ProductOwner => self.product_owner.as_deref(),
            ProjectRole::ScrumMaster => self.scrum_master.as_deref(),
        }
    }

    pub fn creator(&self) -> Option<&str> {
        self.role(ProjectRole::Creator)
    }

    pub fn product_owner(&self) -> Option<&str> {
        self.role(ProjectRole::ProductOwner)
    }

    pub fn scrum_master(&self) -> Option<&str> {
        self.role(ProjectRole::ScrumMaster)
    }

    /// Puts `member_id` in a role slot. The same member may hold several
    /// roles at once.
    pub fn set_role(&mut self, role: ProjectRole, member_id: Option<String>) {
        let slot = match role {
            ProjectRole::Creator => &mut self.creator,
            ProjectRole::ProductOwner => &mut self.product_owner,
            ProjectRole::ScrumMaster => &mut self.scrum_master,
        };
        *slot = member_id;
    }

    pub fn set_creator(&mut self, member_id: Option<String>) {
        self.set_role(ProjectRole::Creator, member_id);
    }

    pub fn set_product_owner(&mut self, member_id: Option<String>) {
        self.set_role(ProjectRole::ProductOwner, member_id);
    }

    pub fn set_scrum_master(&mut self, member_id: Option<String>) {
        self.set_role(ProjectRole::ScrumMaster, member_id);
    }

    /// Empties every role slot naming `member_id`.
    pub(crate) fn clear_member_roles(&mut self, member_id: &str) {
        for slot in [
            &mut self.creator,
            &mut self.product_owner,
            &mut self.scrum_master,
        ] {
            if slot.as_deref() == Some(member_id) {
                *slot = None;
            }
        }
    }

    /// Role holders in role order, without repeats.
    pub fn role_holders(&self) -> Vec<&str> {
        let mut holders: Vec<&str> = Vec::new();
        for role in ProjectRole::ALL {
            if let Some(id) = self.role(role) {
                if !holders.contains(&id) {
                    holders.push(id);
                }
            }
        }
        holders
    }

    // Requirements

    pub fn add_requirement(
        &mut self,
        title: &str,
        description: &str,
        deadline: DateValue,
        priority_group: PriorityGroup,
        today: DateValue,
    ) -> Result<&Requirement> {
        self.check_child_deadline(deadline, today)?;
        self.requirements
            .create(&self.id, title, description, deadline, priority_group)
    }

    pub fn remove_requirement(&mut self, id: &str) -> Result<Requirement> {
        self.requirements.remove(id)
    }

    pub fn requirement(&self, id: &str) -> Result<&Requirement> {
        self.requirements.get(id)
    }

    pub fn requirement_mut(&mut self, id: &str) -> Result<&mut Requirement> {
        self.requirements.get_mut(id)
    }

    pub fn requirement_by_index(&self, index: usize) -> Result<&Requirement> {
        self.requirements.get_by_index(index)
    }

    pub fn rename_requirement(&mut self, id: &str, title: &str) -> Result<()> {
        self.requirements.rename(id, title)
    }

    pub fn set_requirement_deadline(
        &mut self,
        id: &str,
        deadline: DateValue,
        today: DateValue,
    ) -> Result<()> {
        self.check_child_deadline(deadline, today)?;
        self.requirements.get_mut(id)?.set_deadline(deadline);
        Ok(())
    }

    pub fn requirement_status(&self, id: &str) -> Result<f64> {
        Ok(self.requirements.get(id)?.status(&self.tasks))
    }

    pub fn requirements_with_status_over(&self, threshold: f64) -> Result<Vec<&Requirement>> {
        self.requirements.with_status_over(threshold, &self.tasks)
    }

    // Tasks

    pub fn add_task(
        &mut self,
        title: &str,
        description: &str,
        estimated_work_hours: f64,
        deadline: DateValue,
        today: DateValue,
    ) -> Result<&Task> {
        self.check_child_deadline(deadline, today)?;
        self.tasks
            .create(&self.id, title, description, estimated_work_hours, deadline)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task> {
        self.tasks.remove(id)
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        self.tasks.get(id)
    }

    pub fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn task_by_index(&self, index: usize) -> Result<&Task> {
        self.tasks.get_by_index(index)
    }

    pub fn rename_task(&mut self, id: &str, title: &str) -> Result<()> {
        self.tasks.rename(id, title)
    }

    pub fn set_task_deadline(&mut self, id: &str, deadline: DateValue, today: DateValue) -> Result<()> {
        self.check_child_deadline(deadline, today)?;
        self.tasks.get_mut(id)?.set_deadline(deadline);
        Ok(())
    }

    pub fn total_worked_hours(&self) -> f64 {
        self.tasks.total_worked_hours()
    }

    pub fn tasks_estimated_hours(&self) -> f64 {
        self.tasks.total_estimated_hours()
    }

    /// Fraction of the project's tasks that are completed, 0 with no tasks.
    pub fn status(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let completed = self.tasks.iter().filter(|t| t.is_completed()).count();
        completed as f64 / self.tasks.len() as f64
    }

    // Task <-> requirement links

    fn ensure_owns(&self, id: &str, tag: char, kind: EntityKind) -> Result<()> {
        if ids::is_child_of(id, &self.id, tag) {
            return Ok(());
        }
        match ids::project_prefix(id) {
            Some(pid) if pid != self.id => Err(ModelError::CrossProjectViolation {
                left: self.id.clone(),
                right: id.to_owned(),
            }),
            _ => Err(ModelError::not_found(kind, id)),
        }
    }

    /// Links a task and a requirement of this project, on both sides.
    /// Linking an already linked pair changes nothing.
    pub fn assign_requirement(&mut self, task_id: &str, requirement_id: &str) -> Result<()> {
        self.ensure_owns(task_id, TASK_TAG, EntityKind::Task)?;
        self.ensure_owns(requirement_id, REQUIREMENT_TAG, EntityKind::Requirement)?;
        let task = self.tasks.get_mut(task_id)?;
        let requirement = self.requirements.get_mut(requirement_id)?;
        task.link_requirement(requirement_id);
        requirement.link_task(task_id);
        Ok(())
    }

    /// Same as [`Project::assign_requirement`], seen from the requirement.
    pub fn assign_task(&mut self, requirement_id: &str, task_id: &str) -> Result<()> {
        self.assign_requirement(task_id, requirement_id)
    }

    pub fn unassign_requirement(&mut self, task_id: &str, requirement_id: &str) -> Result<()> {
        self.ensure_owns(task_id, TASK_TAG, EntityKind::Task)?;
        self.ensure_owns(requirement_id, REQUIREMENT_TAG, EntityKind::Requirement)?;
        let task = self.tasks.get_mut(task_id)?;
        let requirement = self.requirements.get_mut(requirement_id)?;
        task.unlink_requirement(requirement_id);
        requirement.unlink_task(task_id);
        Ok(())
    }

    pub fn unassign_task(&mut self, requirement_id: &str, task_id: &str) -> Result<()> {
        self.unassign_requirement(task_id, requirement_id)
    }

    /// Unlinks a task from all of its requirements.
    pub fn unassign_task_from_every_requirement(&mut self, task_id: &str) -> Result<()> {
        let task = self.tasks.get_mut(task_id)?;
        let linked = task.assigned_requirements().to_vec();
        for requirement_id in &linked {
            task.unlink_requirement(requirement_id);
            if let Ok(requirement) = self.requirements.get_mut(requirement_id) {
                requirement.unlink_task(task_id);
            }
        }
        Ok(())
    }

    /// Unlinks a requirement from all of its tasks.
    pub fn unassign_requirement_from_every_task(&mut self, requirement_id: &str) -> Result<()> {
        let requirement = self.requirements.get_mut(requirement_id)?;
        let linked = requirement.assigned_tasks().to_vec();
        for task_id in &linked {
            requirement.unlink_task(task_id);
            if let Ok(task) = self.tasks.get_mut(task_id) {
                task.unlink_requirement(requirement_id);
            }
        }
        Ok(())
    }
}

impl Keyed for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> &str {
        &self.id
    }
}
