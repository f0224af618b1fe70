use thiserror::Error;

use super::handle::{Handle, ResourceKind};

/// Failure to resolve or fill a handle.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StoreError {
    #[error("{kind} handle {index} is out of range (table holds {len})")]
    NotFound {
        kind: ResourceKind,
        index: u32,
        len: usize,
    },
    #[error("{kind} handle {index} was declared but never materialized")]
    Pending { kind: ResourceKind, index: u32 },
    #[error("{kind} handle {index} is already materialized")]
    AlreadyMaterialized { kind: ResourceKind, index: u32 },
}

#[derive(Debug)]
enum Slot<T> {
    Pending,
    Ready(T),
}

/// Append-only table of objects of one kind.
#[derive(Debug)]
pub struct Table<T> {
    kind: ResourceKind,
    slots: Vec<Slot<T>>,
}

impl<T> Table<T> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Number of slots, pending ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends `obj` and returns its handle.
    pub fn register(&mut self, obj: T) -> Handle<T> {
        self.push(Slot::Ready(obj))
    }

    /// Reserves a slot to be filled later with [`Table::materialize`].
    pub fn declare(&mut self) -> Handle<T> {
        self.push(Slot::Pending)
    }

    /// Fills a slot reserved by [`Table::declare`].
    pub fn materialize(&mut self, handle: Handle<T>, obj: T) -> Result<(), StoreError> {
        let kind = self.kind;
        let slot = self.slot_mut(handle)?;
        if matches!(slot, Slot::Ready(_)) {
            return Err(StoreError::AlreadyMaterialized {
                kind,
                index: handle.index(),
            });
        }
        *slot = Slot::Ready(obj);
        Ok(())
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T, StoreError> {
        let slot = self
            .slots
            .get(handle.index() as usize)
            .ok_or_else(|| self.not_found(handle))?;
        match slot {
            Slot::Ready(obj) => Ok(obj),
            Slot::Pending => Err(StoreError::Pending {
                kind: self.kind,
                index: handle.index(),
            }),
        }
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, StoreError> {
        let kind = self.kind;
        match self.slot_mut(handle)? {
            Slot::Ready(obj) => Ok(obj),
            Slot::Pending => Err(StoreError::Pending {
                kind,
                index: handle.index(),
            }),
        }
    }

    /// Replaces the object at `handle`. A pending slot becomes ready.
    pub fn update(&mut self, handle: Handle<T>, obj: T) -> Result<(), StoreError> {
        let slot = self.slot_mut(handle)?;
        *slot = Slot::Ready(obj);
        Ok(())
    }

    /// Iterates over materialized objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Ready(obj) => Some((Handle::new(i as u32), obj)),
                Slot::Pending => None,
            })
    }

    fn push(&mut self, slot: Slot<T>) -> Handle<T> {
        let handle = Handle::new(self.slots.len() as u32);
        self.slots.push(slot);
        handle
    }

    fn slot_mut(&mut self, handle: Handle<T>) -> Result<&mut Slot<T>, StoreError> {
        let err = self.not_found(handle);
        self.slots.get_mut(handle.index() as usize).ok_or(err)
    }

    fn not_found(&self, handle: Handle<T>) -> StoreError {
        StoreError::NotFound {
            kind: self.kind,
            index: handle.index(),
            len: self.slots.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table<&'static str> {
        Table::new(ResourceKind::Buffer)
    }

    // ── register / get ────────────────────────────────────────────────────

    #[test]
    fn handles_are_dense_and_stable() {
        let mut t = table();
        let a = t.register("a");
        let b = t.register("b");
        let c = t.register("c");

        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        assert_eq!(t.get(a), Ok(&"a"));
        assert_eq!(t.get(b), Ok(&"b"));
        assert_eq!(t.get(c), Ok(&"c"));
    }

    #[test]
    fn registering_more_never_moves_earlier_handles() {
        let mut t = table();
        let first = t.register("first");
        for _ in 0..64 {
            t.register("filler");
        }
        assert_eq!(t.get(first), Ok(&"first"));
        assert_eq!(t.len(), 65);
    }

    #[test]
    fn out_of_range_is_not_found() {
        let t = table();
        let err = t.get(Handle::new(7)).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                kind: ResourceKind::Buffer,
                index: 7,
                len: 0
            }
        );
    }

    // ── update ────────────────────────────────────────────────────────────

    #[test]
    fn update_replaces_in_place() {
        let mut t = table();
        let a = t.register("old");
        let b = t.register("other");
        t.update(a, "new").unwrap();
        assert_eq!(t.get(a), Ok(&"new"));
        assert_eq!(t.get(b), Ok(&"other"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn update_unknown_handle_fails() {
        let mut t = table();
        assert!(matches!(
            t.update(Handle::new(0), "x"),
            Err(StoreError::NotFound { .. })
        ));
    }

    // ── declare / materialize ─────────────────────────────────────────────

    #[test]
    fn pending_slot_reports_pending() {
        let mut t = table();
        let h = t.declare();
        assert_eq!(
            t.get(h),
            Err(StoreError::Pending {
                kind: ResourceKind::Buffer,
                index: 0
            })
        );
        assert_eq!(t.iter().count(), 0);
    }

    #[test]
    fn materialize_fills_once() {
        let mut t = table();
        let h = t.declare();
        let after = t.register("after");
        t.materialize(h, "late").unwrap();

        assert_eq!(t.get(h), Ok(&"late"));
        assert_eq!(t.get(after), Ok(&"after"));
        assert!(matches!(
            t.materialize(h, "again"),
            Err(StoreError::AlreadyMaterialized { index: 0, .. })
        ));
    }

    #[test]
    fn iter_follows_registration_order() {
        let mut t = table();
        t.register("a");
        t.declare();
        t.register("c");
        let seen: Vec<_> = t.iter().map(|(h, v)| (h.index(), *v)).collect();
        assert_eq!(seen, vec![(0, "a"), (2, "c")]);
    }
}
