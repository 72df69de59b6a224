use crate::domain::user::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user serialization for order state.
///
/// The loan-cap check plus insert, the return settlement, and the sweep's
/// per-order recompute are all read-modify-write sequences on one user's
/// orders; holding that user's lock for the duration keeps them atomic.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one user. Guards for different users do not
    /// contend. Entries are never removed; users are never deleted either.
    pub async fn acquire(&self, user: UserId) -> OwnedMutexGuard<()> {
        let cell = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(user).or_default())
        };
        cell.lock_owned().await
    }
}
