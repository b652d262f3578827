/// Objects that can be recycled by an [`ObjectPool`].
pub trait Poolable {
    /// Return to the inactive state. Called on release.
    fn reset(&mut self) {}
}

/// Handle to an active pool slot. Stale once the slot is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    active: bool,
}

/// Preallocated, fixed-capacity pool. Acquiring from an exhausted pool fails
/// instead of allocating.
#[derive(Debug)]
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(capacity: usize, mut make: impl FnMut() -> T) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                value: make(),
                generation: 0,
                active: false,
            })
            .collect();
        // Reversed so the lowest index is handed out first.
        let free = (0..capacity as u32).rev().collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Activate a free slot and initialize it. `None` when exhausted.
    pub fn acquire(&mut self, init: impl FnOnce(&mut T)) -> Option<PoolHandle> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.active = true;
        init(&mut slot.value);
        Some(PoolHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Release an active slot. Stale or already released handles are ignored.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.active && slot.generation == handle.generation => {
                Self::deactivate(slot);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.active {
                Self::deactivate(slot);
                self.free.push(index as u32);
                released += 1;
            }
        }
        released
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.value)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.active).map(|(i, s)| {
            (
                PoolHandle {
                    index: i as u32,
                    generation: s.generation,
                },
                &s.value,
            )
        })
    }

    /// Run `keep` on every active object; release those for which it returns
    /// false. Returns the number released.
    pub fn retain_active(&mut self, mut keep: impl FnMut(&mut T) -> bool) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.active && !keep(&mut slot.value) {
                Self::deactivate(slot);
                self.free.push(index as u32);
                released += 1;
            }
        }
        released
    }

    fn deactivate(slot: &mut Slot<T>) {
        slot.value.reset();
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        value: u32,
        resets: u32,
    }

    impl Poolable for Counter {
        fn reset(&mut self) {
            self.value = 0;
            self.resets += 1;
        }
    }

    fn pool(capacity: usize) -> ObjectPool<Counter> {
        ObjectPool::new(capacity, Counter::default)
    }

    #[test]
    fn acquire_until_exhausted() {
        let mut p = pool(2);
        let a = p.acquire(|c| c.value = 1).unwrap();
        let b = p.acquire(|c| c.value = 2).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert!(p.acquire(|_| {}).is_none());
        assert_eq!(p.active_count(), 2);
        assert_eq!(p.available(), 0);
    }

    #[test]
    fn release_resets_and_invalidates_handle() {
        let mut p = pool(1);
        let a = p.acquire(|c| c.value = 7).unwrap();
        assert_eq!(p.get(a).map(|c| c.value), Some(7));
        assert!(p.release(a));
        assert!(!p.release(a));
        assert!(p.get(a).is_none());

        let b = p.acquire(|_| {}).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        let slot = p.get(b).unwrap();
        assert_eq!(slot.value, 0);
        assert_eq!(slot.resets, 1);
    }

    #[test]
    fn retain_releases_rejected() {
        let mut p = pool(4);
        for v in 0..4 {
            p.acquire(|c| c.value = v);
        }
        let released = p.retain_active(|c| c.value % 2 == 0);
        assert_eq!(released, 2);
        let values: Vec<u32> = p.iter_active().map(|(_, c)| c.value).collect();
        assert_eq!(values, vec![0, 2]);
    }

    #[test]
    fn release_all_frees_everything() {
        let mut p = pool(3);
        p.acquire(|_| {});
        p.acquire(|_| {});
        assert_eq!(p.release_all(), 2);
        assert_eq!(p.available(), 3);
        assert_eq!(p.iter_active().count(), 0);
    }
}
