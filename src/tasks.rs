use serde::{Deserialize, Serialize};

use crate::date::DateValue;
use crate::error::{ModelError, Result};
use crate::ids::{self, TASK_BODY_LEN, TASK_TAG};
use crate::models::{EntityKind, Task, TaskStatus};
use crate::registry::Registry;

/// The tasks of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRegistry {
    tasks: Registry<Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains(id)
    }

    pub fn get(&self, id: &str) -> Result<&Task> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn get_by_index(&self, index: usize) -> Result<&Task> {
        self.tasks.get_by_index(index)
    }

    pub fn by_title(&self, title: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.title() == title)
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.filter(|t| t.status() == status)
    }

    /// Tasks whose deadline is strictly before `deadline`.
    pub fn before_deadline(&self, deadline: DateValue) -> Vec<&Task> {
        self.tasks.filter(|t| t.deadline().is_before(&deadline))
    }

    pub fn total_worked_hours(&self) -> f64 {
        self.tasks.iter().map(|t| t.total_worked_hours()).sum()
    }

    pub fn total_estimated_hours(&self) -> f64 {
        self.tasks.iter().map(|t| t.estimated_work_hours()).sum()
    }

    /// Creates a task for `project_id`. Deadline bounds are the caller's
    /// business; this checks the fields and title uniqueness.
    pub(crate) fn create(
        &mut self,
        project_id: &str,
        title: &str,
        description: &str,
        estimated_work_hours: f64,
        deadline: DateValue,
    ) -> Result<&Task> {
        if self.by_title(title).is_some() {
            return Err(ModelError::duplicate(EntityKind::Task, title));
        }
        let prefix = format!("{}{}", project_id, TASK_TAG);
        let id = ids::generate_id(&prefix, TASK_BODY_LEN, |candidate| {
            self.tasks.contains(candidate)
        });
        let task = Task::new(id, title, description, estimated_work_hours, deadline)?;
        self.tasks.insert(task)
    }

    pub(crate) fn rename(&mut self, id: &str, title: &str) -> Result<()> {
        if self.by_title(title).is_some_and(|t| t.id() != id) {
            return Err(ModelError::duplicate(EntityKind::Task, title));
        }
        self.tasks.get_mut(id)?.set_title(title)
    }

    /// Removes a task that is no longer linked to any requirement or member.
    pub(crate) fn remove(&mut self, id: &str) -> Result<Task> {
        let task = self.tasks.get(id)?;
        if !task.assigned_requirements().is_empty() {
            return Err(ModelError::dependency(
                EntityKind::Task,
                id,
                format!(
                    "still assigned to {} requirement(s)",
                    task.assigned_requirements().len()
                ),
            ));
        }
        if !task.assigned_members().is_empty() {
            return Err(ModelError::dependency(
                EntityKind::Task,
                id,
                format!(
                    "still assigned to {} member(s)",
                    task.assigned_members().len()
                ),
            ));
        }
        self.tasks.remove(id)
    }
}

impl<'a> IntoIterator for &'a TaskRegistry {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
