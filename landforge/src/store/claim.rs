//! Per-identity claims on tile directories.
//!
//! The directory existence check alone leaves a window where two requests
//! for the same tile both see "absent" and both start work. A job takes a
//! claim on its [`TileId`] before checking; a second request for the same
//! identity waits for the first to finish, then sees the directory (or its
//! absence after a failure) and proceeds accordingly.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::coord::TileId;

type ClaimMap = DashMap<TileId, Arc<Mutex<()>>>;

/// Registry of claimed tile identities.
#[derive(Debug, Default, Clone)]
pub struct ClaimRegistry {
    claims: Arc<ClaimMap>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id`, waiting while another holder has it.
    pub async fn claim(&self, id: &TileId) -> TileClaim {
        let lock = self
            .claims
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        trace!(tile_id = %id, "Tile claimed");
        TileClaim {
            id: id.clone(),
            claims: Arc::clone(&self.claims),
            _guard: guard,
        }
    }

    /// Number of identities currently tracked.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Held while a job works on a tile directory; released on drop.
#[derive(Debug)]
pub struct TileClaim {
    id: TileId,
    claims: Arc<ClaimMap>,
    _guard: OwnedMutexGuard<()>,
}

impl TileClaim {
    pub fn id(&self) -> &TileId {
        &self.id
    }
}

impl Drop for TileClaim {
    fn drop(&mut self) {
        // Map entry plus our guard: nobody else is waiting.
        self.claims
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) <= 2);
        trace!(tile_id = %self.id, "Tile claim released");
    }
}
