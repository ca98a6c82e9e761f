//! Snapshot import and export for a Dialectic store.
//!
//! [`MergeEngine::import`] folds a snapshot into a store record by record.
//! Records are matched by id first (the newer `updatedAt` wins), then by
//! content fingerprint; records that merely resemble existing ones are held
//! back as [`NearDuplicate`] candidates for a person to review. One bad record
//! never fails the batch: it is counted and described in the [`MergeReport`].
//!
//! Both directions run in a spawned task, so dropping the returned future
//! does not stop a merge halfway through.

mod export;
mod import;
mod report;

pub mod error;

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use dialectic_core::{
  similarity::{RECOMMENDED_THRESHOLD, validate_threshold},
  store::DebateStore,
};
use dialectic_snapshot::Snapshot;
pub use error::{Error, Result};
pub use report::{ItemError, MergeReport, NearDuplicate};

// ─── Single-flight guard ─────────────────────────────────────────────────────

/// Holds one of the store's busy flags; clears it on drop.
struct Flight(Arc<AtomicBool>);

impl Flight {
  fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self(Arc::clone(flag)))
  }
}

impl Drop for Flight {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Imports into and exports from one store. At most one import and one
/// export run at a time per store, across every engine built on a handle to
/// it.
pub struct MergeEngine<S> {
  store: Arc<S>,
}

impl<S> Clone for MergeEngine<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: DebateStore + 'static> MergeEngine<S> {
  pub fn new(store: S) -> Self { Self::from_shared(Arc::new(store)) }

  pub fn from_shared(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  pub fn is_importing(&self) -> bool {
    self.store.merge_locks().importing.load(Ordering::Acquire)
  }

  pub fn is_exporting(&self) -> bool {
    self.store.merge_locks().exporting.load(Ordering::Acquire)
  }

  /// Merge the snapshot in `bytes` into the store.
  ///
  /// Fails as a whole only when the threshold is invalid, another import is
  /// running, the document is not a supported snapshot, or the store cannot
  /// be read. The snapshot is checked before the store is touched.
  pub async fn import(&self, bytes: Vec<u8>, threshold: f64) -> Result<MergeReport> {
    let threshold = validate_threshold(threshold).map_err(|_| Error::InvalidThreshold(threshold))?;
    if !RECOMMENDED_THRESHOLD.contains(&threshold) {
      tracing::warn!(
        threshold,
        "similarity threshold is outside the recommended range {:?}",
        RECOMMENDED_THRESHOLD
      );
    }

    let flight =
      Flight::acquire(&self.store.merge_locks().importing).ok_or(Error::ImportInProgress)?;
    let snapshot = dialectic_snapshot::decode(&bytes)?;

    let store = Arc::clone(&self.store);
    tokio::spawn(async move {
      let _flight = flight;
      import::run(&*store, snapshot, threshold).await
    })
    .await?
  }

  /// Every record of the store except catalog fallacies.
  pub async fn export(&self) -> Result<Snapshot> {
    let flight =
      Flight::acquire(&self.store.merge_locks().exporting).ok_or(Error::ExportInProgress)?;
    let store = Arc::clone(&self.store);
    tokio::spawn(async move {
      let _flight = flight;
      export::collect(&*store).await
    })
    .await?
  }

  /// [`Self::export`], encoded.
  pub async fn export_bytes(&self) -> Result<Vec<u8>> {
    let snapshot = self.export().await?;
    Ok(dialectic_snapshot::encode(&snapshot)?)
  }
}

#[cfg(test)]
mod tests;
