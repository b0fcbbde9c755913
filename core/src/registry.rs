use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to an open transaction.
///
/// A token is only meaningful to the adapter that minted it and stops resolving once the transaction has been
/// committed or rolled back, even if its slot is later reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionToken {
    registry: u64,
    index: u32,
    generation: u32,
}

impl fmt::Display for TransactionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "tx{}:{}.{}", self.registry, self.index, self.generation) }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

/// Generation-checked arena mapping [`TransactionToken`]s to per-transaction state.
pub struct Registry<T> {
    id: u64,
    inner: Mutex<Slots<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self { id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed), inner: Mutex::new(Slots { slots: Vec::new(), free: Vec::new() }) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots<T>> { self.inner.lock().unwrap_or_else(PoisonError::into_inner) }

    pub fn insert(&self, value: T) -> TransactionToken {
        let mut inner = self.lock();
        let index = match inner.free.pop() {
            Some(index) => {
                inner.slots[index as usize].value = Some(value);
                index
            }
            None => {
                inner.slots.push(Slot { generation: 0, value: Some(value) });
                (inner.slots.len() - 1) as u32
            }
        };
        TransactionToken { registry: self.id, index, generation: inner.slots[index as usize].generation }
    }

    fn slot_mut<'a>(&self, inner: &'a mut Slots<T>, token: TransactionToken) -> Option<&'a mut Slot<T>> {
        if token.registry != self.id {
            return None;
        }
        inner.slots.get_mut(token.index as usize).filter(|slot| slot.generation == token.generation && slot.value.is_some())
    }

    pub fn contains(&self, token: TransactionToken) -> bool { self.slot_mut(&mut self.lock(), token).is_some() }

    pub fn get(&self, token: TransactionToken) -> Option<T>
    where T: Clone {
        self.slot_mut(&mut self.lock(), token).and_then(|slot| slot.value.clone())
    }

    /// Run `f` against the live entry. The registry lock is held for the duration of `f`.
    pub fn with_mut<R>(&self, token: TransactionToken, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut inner = self.lock();
        let slot = self.slot_mut(&mut inner, token)?;
        slot.value.as_mut().map(f)
    }

    /// Remove the entry and retire the token. Later lookups with the same token fail.
    pub fn remove(&self, token: TransactionToken) -> Option<T> {
        let mut inner = self.lock();
        let slot = self.slot_mut(&mut inner, token)?;
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(token.index);
        value
    }

    pub fn len(&self) -> usize { self.lock().slots.iter().filter(|slot| slot.value.is_some()).count() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
