//! Snapshot parsing with an up-front format-version gate.

use crate::{Error, FORMAT_VERSION, RawSnapshot, Result};

pub(crate) fn decode(bytes: &[u8]) -> Result<RawSnapshot> {
  let document: serde_json::Value = serde_json::from_slice(bytes)?;

  // Check the version before interpreting anything else: a future format may
  // change the meaning of every other field.
  let version = document.get("formatVersion").ok_or(Error::MissingVersion)?;
  match version.as_str() {
    Some(FORMAT_VERSION) => {}
    Some(other) => {
      return Err(Error::UnsupportedVersion {
        found:     other.to_owned(),
        supported: FORMAT_VERSION,
      });
    }
    None => {
      return Err(Error::UnsupportedVersion {
        found:     version.to_string(),
        supported: FORMAT_VERSION,
      });
    }
  }

  Ok(serde_json::from_value(document)?)
}
