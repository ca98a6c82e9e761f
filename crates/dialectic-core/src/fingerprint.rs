//! Content fingerprints: short deterministic duplicate-detection keys.
//!
//! A fingerprint is the first 16 hex characters (64 bits) of the SHA-256
//! digest of normalised text. The hash is used for compactness, not
//! adversarial resistance: 64 bits is plenty for a personal store of tens of
//! thousands of records.

use sha2::{Digest, Sha256};

use crate::text::normalize;

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

/// Separator between fields of a composite fingerprint. It is a control
/// character, which normalisation strips, so it cannot occur inside a field.
const FIELD_SEPARATOR: &str = "\u{1f}";

/// Fingerprint of a single piece of text.
pub fn fingerprint(text: &str) -> String { digest(&normalize(text)) }

/// Fingerprint over several fields.
///
/// Each field is normalised independently and the results are joined with
/// [`FIELD_SEPARATOR`]. Callers decide which optional fields take part; a field's presence is
/// part of the identity, so `["a"]` and `["a", "b"]` never collide.
pub fn composite<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
  let joined = fields
    .into_iter()
    .map(normalize)
    .collect::<Vec<_>>()
    .join(FIELD_SEPARATOR);
  digest(&joined)
}

fn digest(canonical: &str) -> String {
  let hash = Sha256::digest(canonical.as_bytes());
  hex::encode(&hash[..FINGERPRINT_LEN / 2])
}
