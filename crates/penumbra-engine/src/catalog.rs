//! Observable membership collections for lights and hulls.
//!
//! Render order does not matter (light contributions add up and occlusion is
//! evaluated per light), so a catalog only guarantees stable ids, not order
//! semantics. Mutations are recorded as [`CatalogEvent`]s, at most one per id:
//! repeated edits to the same item merge, so the pending set stays bounded by
//! the number of items touched even if nothing drains it for a long time. The
//! render pipeline drains them once per frame to invalidate cached shadow
//! geometry.

use std::marker::PhantomData;

use crate::geometry::Hull;
use crate::light::Light;

/// Stable handle to an item in a [`Catalog`].
pub struct Id<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    #[inline]
    const fn from_raw(raw: u64) -> Self {
        Self { raw, _marker: PhantomData }
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.raw
    }
}

// Manual impls: derives would put bounds on `T`, and lights are neither `Eq` nor `Copy`.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}

pub type LightId = Id<Light>;
pub type HullId = Id<Hull>;

/// Membership change notification.
pub enum CatalogEvent<T> {
    Added(Id<T>),
    Removed(Id<T>),
    Modified(Id<T>),
}

impl<T> CatalogEvent<T> {
    #[inline]
    pub fn id(&self) -> Id<T> {
        match self {
            CatalogEvent::Added(id) | CatalogEvent::Removed(id) | CatalogEvent::Modified(id) => *id,
        }
    }
}

impl<T> Clone for CatalogEvent<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CatalogEvent<T> {}

impl<T> PartialEq for CatalogEvent<T> {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other) && self.id() == other.id()
    }
}

impl<T> Eq for CatalogEvent<T> {}

impl<T> std::fmt::Debug for CatalogEvent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogEvent::Added(id) => write!(f, "Added({id:?})"),
            CatalogEvent::Removed(id) => write!(f, "Removed({id:?})"),
            CatalogEvent::Modified(id) => write!(f, "Modified({id:?})"),
        }
    }
}

/// Owned collection with change notifications.
#[derive(Debug)]
pub struct Catalog<T> {
    items: Vec<(Id<T>, T)>,
    next_id: u64,
    events: Vec<CatalogEvent<T>>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            events: Vec::new(),
        }
    }
}

impl<T> Catalog<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: T) -> Id<T> {
        let id = Id::from_raw(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push((id, item));
        self.record(CatalogEvent::Added(id));
        id
    }

    /// Removes and returns the item. Order of the remaining items may change.
    pub fn remove(&mut self, id: Id<T>) -> Option<T> {
        let index = self.index_of(id)?;
        let (_, item) = self.items.swap_remove(index);
        self.record(CatalogEvent::Removed(id));
        Some(item)
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.index_of(id).map(|i| &self.items[i].1)
    }

    /// Mutable access. Always records a modification, whether or not the
    /// caller actually changes anything.
    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        let index = self.index_of(id)?;
        self.record(CatalogEvent::Modified(id));
        Some(&mut self.items[index].1)
    }

    #[inline]
    pub fn contains(&self, id: Id<T>) -> bool {
        self.index_of(id).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    /// Iterates items without ids.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, item)| item)
    }

    /// Removes every item, recording a removal for each.
    pub fn clear(&mut self) {
        let ids: Vec<_> = self.items.drain(..).map(|(id, _)| id).collect();
        for id in ids {
            self.record(CatalogEvent::Removed(id));
        }
    }

    /// Whether changes happened since the last drain.
    #[inline]
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Takes the changes recorded since the last drain, one per id, in the
    /// order each id was first touched.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, CatalogEvent<T>> {
        self.events.drain(..)
    }

    /// Folds `event` into the pending entry for its id.
    fn record(&mut self, event: CatalogEvent<T>) {
        let id = event.id();
        let Some(index) = self.events.iter().position(|e| e.id() == id) else {
            self.events.push(event);
            return;
        };
        match (self.events[index], event) {
            // Never observed by a drain: nothing to invalidate.
            (CatalogEvent::Added(_), CatalogEvent::Removed(_)) => {
                self.events.remove(index);
            }
            (CatalogEvent::Added(_), _) => {}
            (_, merged) => self.events[index] = merged,
        }
    }

    fn index_of(&self, id: Id<T>) -> Option<usize> {
        self.items.iter().position(|(item_id, _)| *item_id == id)
    }
}
