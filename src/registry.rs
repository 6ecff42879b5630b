use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::models::EntityKind;

/// An entity that can live in a [`Registry`].
pub trait Keyed {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

/// Id-keyed collection that keeps insertion order.
///
/// Lookups are linear scans; the registries of a single-user tool stay small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry<T> {
    items: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> Registry<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Result<&T> {
        self.items
            .iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Result<&mut T> {
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))
    }

    pub fn get_by_index(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(ModelError::IndexOutOfRange {
            kind: T::KIND,
            index,
            len: self.items.len(),
        })
    }

    /// Every item matching `pred`, in insertion order.
    pub fn filter<P>(&self, mut pred: P) -> Vec<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().filter(|item| pred(item)).collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Appends `item`, rejecting an id that is already present.
    pub(crate) fn insert(&mut self, item: T) -> Result<&T> {
        if self.contains(item.id()) {
            return Err(ModelError::duplicate(T::KIND, item.id()));
        }
        self.items.push(item);
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    pub(crate) fn remove(&mut self, id: &str) -> Result<T> {
        let idx = self
            .position(id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))?;
        Ok(self.items.remove(idx))
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
