use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use gagyebu_core::ReceiptId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters, including waiters whose future has not been
    /// polled since the lock was released.
    users: usize,
}

/// Per-receipt async locks. Two OCR runs for the same receipt queue up behind
/// each other; runs for different receipts never contend.
#[derive(Default)]
pub struct ReceiptLocks {
    inner: Mutex<HashMap<ReceiptId, Slot>>,
}

/// Counts one user of a slot. Dropped on release and also when a pending
/// `acquire` future is cancelled; the last one out removes the entry.
struct Registration<'a> {
    locks: &'a ReceiptLocks,
    id: ReceiptId,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut map = self.locks.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = map.get_mut(&self.id) {
            slot.users -= 1;
            if slot.users == 0 {
                map.remove(&self.id);
            }
        }
    }
}

/// Held for the duration of one run. Fields drop in order: the lock is
/// released before the registration is counted out.
pub struct ReceiptLease<'a> {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a>,
}

impl ReceiptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: &ReceiptId) -> ReceiptLease<'_> {
        let (mutex, registration) = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = map
                .entry(id.clone())
                .or_insert_with(|| Slot { mutex: Arc::default(), users: 0 });
            slot.users += 1;
            (Arc::clone(&slot.mutex), Registration { locks: self, id: id.clone() })
        };
        let guard = mutex.lock_owned().await;
        ReceiptLease { _guard: guard, _registration: registration }
    }

    /// Number of receipts with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
