//! ETag computation for citizen records.
//!
//! An ETag is the SHA-256 of the record's JSON encoding, so any change to
//! any field, including status, produces a new tag.

use lezo_core::citizen::Citizen;
use sha2::{Digest, Sha256};

/// Compute the quoted ETag for `citizen`.
pub fn compute_etag(citizen: &Citizen) -> serde_json::Result<String> {
  let mut hasher = Sha256::new();
  hasher.update(serde_json::to_vec(citizen)?);
  Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// Does an `If-Match` header value accept `current`?
///
/// Accepts `*`, a comma-separated list, weak tags and tags sent without the
/// surrounding quotes.
pub fn if_match_accepts(header: &str, current: &str) -> bool {
  header.split(',').map(str::trim).any(|candidate| {
    candidate == "*" || strip_etag_quotes(candidate) == strip_etag_quotes(current)
  })
}

fn strip_etag_quotes(s: &str) -> &str { s.trim_start_matches("W/").trim_matches('"') }
