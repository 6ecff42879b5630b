use serde::{Deserialize, Serialize};

use crate::date::DateValue;
use crate::error::{ModelError, Result};
use crate::ids::{self, REQUIREMENT_BODY_LEN, REQUIREMENT_TAG};
use crate::models::{EntityKind, PriorityGroup, Requirement};
use crate::registry::Registry;
use crate::tasks::TaskRegistry;

/// The requirements of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementRegistry {
    requirements: Registry<Requirement>,
}

/// Rejects status thresholds outside `[0, 1]`.
pub(crate) fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ModelError::invalid(format!(
            "status threshold must be between 0 and 1, got {}",
            threshold
        )));
    }
    Ok(())
}

impl RequirementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.requirements.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.requirements.contains(id)
    }

    pub fn get(&self, id: &str) -> Result<&Requirement> {
        self.requirements.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Requirement> {
        self.requirements.get_mut(id)
    }

    pub fn get_by_index(&self, index: usize) -> Result<&Requirement> {
        self.requirements.get_by_index(index)
    }

    pub fn by_title(&self, title: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.title() == title)
    }

    /// Requirements whose deadline is strictly before `deadline`.
    pub fn before_deadline(&self, deadline: DateValue) -> Vec<&Requirement> {
        self.requirements
            .filter(|r| r.deadline().is_before(&deadline))
    }

    pub fn with_priority(&self, priority: PriorityGroup) -> Vec<&Requirement> {
        self.requirements.filter(|r| r.priority_group() == priority)
    }

    /// Requirements whose status is at least `threshold`.
    pub fn with_status_over(
        &self,
        threshold: f64,
        tasks: &TaskRegistry,
    ) -> Result<Vec<&Requirement>> {
        check_threshold(threshold)?;
        Ok(self.requirements.filter(|r| r.status(tasks) >= threshold))
    }

    pub fn approved(&self) -> Vec<&Requirement> {
        self.requirements.filter(|r| r.is_approved())
    }

    pub fn disapproved(&self) -> Vec<&Requirement> {
        self.requirements.filter(|r| !r.is_approved())
    }

    pub(crate) fn create(
        &mut self,
        project_id: &str,
        title: &str,
        description: &str,
        deadline: DateValue,
        priority_group: PriorityGroup,
    ) -> Result<&Requirement> {
        if self.by_title(title).is_some() {
            return Err(ModelError::duplicate(EntityKind::Requirement, title));
        }
        let prefix = format!("{}{}", project_id, REQUIREMENT_TAG);
        let id = ids::generate_id(&prefix, REQUIREMENT_BODY_LEN, |candidate| {
            self.requirements.contains(candidate)
        });
        let requirement = Requirement::new(id, title, description, deadline, priority_group)?;
        self.requirements.insert(requirement)
    }

    pub(crate) fn rename(&mut self, id: &str, title: &str) -> Result<()> {
        if self.by_title(title).is_some_and(|r| r.id() != id) {
            return Err(ModelError::duplicate(EntityKind::Requirement, title));
        }
        self.requirements.get_mut(id)?.set_title(title)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Result<Requirement> {
        let requirement = self.requirements.get(id)?;
        if !requirement.assigned_tasks().is_empty() {
            return Err(ModelError::dependency(
                EntityKind::Requirement,
                id,
                format!(
                    "still assigned to {} task(s)",
                    requirement.assigned_tasks().len()
                ),
            ));
        }
        self.requirements.remove(id)
    }
}

impl<'a> IntoIterator for &'a RequirementRegistry {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.iter()
    }
}
