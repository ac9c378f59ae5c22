//! Slot arena with stable handles and an ID index

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::domain::errors::DomainError;

/// An element stored in an [`Arena`], keyed by its typed ID
pub trait Element {
    type Id: Copy + Eq + Hash + Ord + fmt::Display;

    fn id(&self) -> Self::Id;

    /// Element kind name used in log and error messages
    fn kind() -> &'static str;
}

/// Stable handle to an element slot.
///
/// Handles stay valid across removals of other elements; a handle to a
/// removed element simply resolves to `None`.
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Handle for a raw slot index; resolves to `None` in arenas without that slot
    pub fn from_index(index: usize) -> Self {
        Self::new(index)
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Elements of one kind addressed by stable handles
pub struct Arena<T: Element> {
    slots: Vec<Option<T>>,
    index: HashMap<T::Id, Handle<T>>,
}

impl<T: Element> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Element + Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            index: self.index.clone(),
        }
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, el)| el)).finish()
    }
}

impl<T: Element> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element; fails if its ID is already present
    pub fn insert(&mut self, element: T) -> Result<Handle<T>, DomainError> {
        let id = element.id();
        if self.index.contains_key(&id) {
            return Err(DomainError::IdCollision(format!(
                "{} {} already exists",
                T::kind(),
                id
            )));
        }
        let handle = Handle::new(self.slots.len());
        self.slots.push(Some(element));
        self.index.insert(id, handle);
        Ok(handle)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots.get(handle.index).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots.get_mut(handle.index).and_then(|slot| slot.as_mut())
    }

    /// Look up a live element by ID
    pub fn lookup(&self, id: &T::Id) -> Option<Handle<T>> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let removed = self.slots.get_mut(handle.index).and_then(|slot| slot.take())?;
        self.index.remove(&removed.id());
        Some(removed)
    }

    /// Live elements in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|el| (Handle::new(i), el)))
    }

    /// Snapshot of live handles, safe to hold while mutating the arena
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Live elements sorted by ID
    pub fn sorted(&self) -> Vec<&T> {
        let mut elements: Vec<&T> = self.iter().map(|(_, el)| el).collect();
        elements.sort_by_key(|el| el.id());
        elements
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// ID of a live element
    pub fn id_of(&self, handle: Handle<T>) -> Option<T::Id> {
        self.get(handle).map(|el| el.id())
    }

    /// Retain handles whose element is still alive
    pub fn live(&self, handles: &[Handle<T>]) -> Vec<Handle<T>> {
        handles.iter().copied().filter(|h| self.contains(*h)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Node {
        id: u32,
    }

    impl Element for Node {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn kind() -> &'static str {
            "node"
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut arena = Arena::new();
        let a = arena.insert(Node { id: 7 }).unwrap();
        assert_eq!(arena.lookup(&7), Some(a));
        assert_eq!(arena.get(a).unwrap().id, 7);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_duplicate_id_is_collision() {
        let mut arena = Arena::new();
        arena.insert(Node { id: 1 }).unwrap();
        let err = arena.insert(Node { id: 1 }).unwrap_err();
        assert!(matches!(err, DomainError::IdCollision(_)));
    }

    #[test]
    fn test_handles_stable_after_removal() {
        let mut arena = Arena::new();
        let a = arena.insert(Node { id: 1 }).unwrap();
        let b = arena.insert(Node { id: 2 }).unwrap();
        arena.remove(a);
        assert!(!arena.contains(a));
        assert_eq!(arena.get(b).unwrap().id, 2);
        assert_eq!(arena.lookup(&1), None);
        // The ID is free again
        let c = arena.insert(Node { id: 1 }).unwrap();
        assert_ne!(a, c);
    }
}
