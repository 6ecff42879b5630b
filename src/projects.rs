use serde::{Deserialize, Serialize};

use crate::date::DateValue;
use crate::error::{ModelError, Result};
use crate::ids::{self, PROJECT_BODY_LEN, PROJECT_TAG};
use crate::models::{EntityKind, Requirement, Task};
use crate::project::Project;
use crate::registry::Registry;
use crate::requirements::check_threshold;

/// All projects of the organisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRegistry {
    projects: Registry<Project>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.projects.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Project> {
        self.projects.iter_mut()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.projects.contains(id)
    }

    pub fn get(&self, id: &str) -> Result<&Project> {
        self.projects.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Project> {
        self.projects.get_mut(id)
    }

    pub fn get_by_index(&self, index: usize) -> Result<&Project> {
        self.projects.get_by_index(index)
    }

    /// The project whose id prefixes `child_id`.
    pub fn owner_of(&self, child_id: &str, kind: EntityKind) -> Result<&Project> {
        ids::project_prefix(child_id)
            .and_then(|pid| self.projects.get(pid).ok())
            .ok_or_else(|| ModelError::not_found(kind, child_id))
    }

    pub fn owner_of_mut(&mut self, child_id: &str, kind: EntityKind) -> Result<&mut Project> {
        let pid = ids::project_prefix(child_id)
            .filter(|pid| self.projects.contains(pid))
            .ok_or_else(|| ModelError::not_found(kind, child_id))?;
        self.projects.get_mut(pid)
    }

    /// Projects whose deadline is strictly before `deadline`.
    pub fn before_deadline(&self, deadline: DateValue) -> Vec<&Project> {
        self.projects.filter(|p| p.deadline().is_before(&deadline))
    }

    pub fn with_status_over(&self, threshold: f64) -> Result<Vec<&Project>> {
        check_threshold(threshold)?;
        Ok(self.projects.filter(|p| p.status() >= threshold))
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.projects.iter().flat_map(|p| p.tasks().iter())
    }

    pub fn all_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.projects.iter().flat_map(|p| p.requirements().iter())
    }

    /// Creates a project with a fresh id. The deadline may not be in the past.
    pub fn create(
        &mut self,
        title: &str,
        description: &str,
        deadline: DateValue,
        estimated_work_hours: f64,
        today: DateValue,
    ) -> Result<&Project> {
        if deadline.is_before(&today) {
            return Err(ModelError::invalid(format!(
                "deadline {} is in the past (today is {})",
                deadline, today
            )));
        }
        let id = ids::generate_id(&PROJECT_TAG.to_string(), PROJECT_BODY_LEN, |candidate| {
            self.projects.contains(candidate)
        });
        let project = Project::new(&id, title, description, deadline, estimated_work_hours)?;
        self.projects.insert(project)
    }

    /// Adds a project built elsewhere, keyed by its own id.
    pub fn insert(&mut self, project: Project) -> Result<&Project> {
        self.projects.insert(project)
    }

    /// Removes a project that owns no requirement and no task.
    pub fn remove(&mut self, id: &str) -> Result<Project> {
        let project = self.projects.get(id)?;
        if !project.requirements().is_empty() || !project.tasks().is_empty() {
            return Err(ModelError::dependency(
                EntityKind::Project,
                id,
                format!(
                    "still owns {} requirement(s) and {} task(s)",
                    project.requirements().len(),
                    project.tasks().len()
                ),
            ));
        }
        self.projects.remove(id)
    }
}

impl<'a> IntoIterator for &'a ProjectRegistry {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}
