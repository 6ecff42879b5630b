use serde::{Deserialize, Serialize};

use crate::date::DateValue;
use crate::error::{ModelError, Result};
use crate::models::{EntityKind, Member};
use crate::registry::Registry;

/// Everyone in the organisation, independent of projects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberRegistry {
    members: Registry<Member>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn get(&self, id: &str) -> Result<&Member> {
        self.members.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Member> {
        self.members.get_mut(id)
    }

    pub fn get_by_index(&self, index: usize) -> Result<&Member> {
        self.members.get_by_index(index)
    }

    pub fn by_full_name(&self, first_name: &str, last_name: &str) -> Result<&Member> {
        self.find_by_name(first_name, last_name).ok_or_else(|| {
            ModelError::not_found(EntityKind::Member, format!("{} {}", first_name, last_name))
        })
    }

    pub fn by_email(&self, email: &str) -> Result<&Member> {
        self.find_by_email(email)
            .ok_or_else(|| ModelError::not_found(EntityKind::Member, email))
    }

    pub fn by_birthday(&self, birthday: DateValue) -> Vec<&Member> {
        self.members.filter(|m| m.birthday() == birthday)
    }

    fn find_by_name(&self, first_name: &str, last_name: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.first_name() == first_name && m.last_name() == last_name)
    }

    fn find_by_email(&self, email: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.email() == email)
    }

    /// Adds a member. The full name and the email must both be unused.
    pub fn hire(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        birthday: DateValue,
        phone: Option<String>,
    ) -> Result<&Member> {
        if self.find_by_name(first_name, last_name).is_some() {
            return Err(ModelError::duplicate(
                EntityKind::Member,
                format!("{} {}", first_name, last_name),
            ));
        }
        if self.find_by_email(email).is_some() {
            return Err(ModelError::duplicate(EntityKind::Member, email));
        }
        let mut member = Member::new(first_name, last_name, email, birthday, phone)?;
        // A renamed member keeps the id derived at hire, so the plain form
        // may already be taken by someone else.
        let base = member.id().to_owned();
        let mut n = 2;
        while self.members.contains(member.id()) {
            member.set_id(format!("{}~{}", base, n));
            n += 1;
        }
        self.members.insert(member)
    }

    /// Changes a member's name. The id stays the same.
    pub fn rename(&mut self, id: &str, first_name: &str, last_name: &str) -> Result<()> {
        if self
            .find_by_name(first_name, last_name)
            .is_some_and(|m| m.id() != id)
        {
            return Err(ModelError::duplicate(
                EntityKind::Member,
                format!("{} {}", first_name, last_name),
            ));
        }
        self.members.get_mut(id)?.set_name(first_name, last_name)
    }

    pub fn change_email(&mut self, id: &str, email: &str) -> Result<()> {
        if self.find_by_email(email).is_some_and(|m| m.id() != id) {
            return Err(ModelError::duplicate(EntityKind::Member, email));
        }
        self.members.get_mut(id)?.set_email(email)
    }

    /// Removes a member that has no task left.
    pub fn fire(&mut self, id: &str) -> Result<Member> {
        let member = self.members.get(id)?;
        if !member.assigned_tasks().is_empty() {
            return Err(ModelError::dependency(
                EntityKind::Member,
                id,
                format!(
                    "still assigned to {} task(s)",
                    member.assigned_tasks().len()
                ),
            ));
        }
        self.members.remove(id)
    }
}

impl<'a> IntoIterator for &'a MemberRegistry {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
