//! Snapshot serialisation.

use crate::{Result, Snapshot};

pub(crate) fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
  let mut bytes = serde_json::to_vec_pretty(snapshot)?;
  bytes.push(b'\n');
  Ok(bytes)
}
