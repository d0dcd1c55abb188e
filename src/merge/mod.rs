//! Snapshot merging
//!
//! Reconciles the base market feed and the wallet position feed into one
//! record per pair. Decoding lives here too, so malformed feeds are rejected
//! at the merger boundary before any merge runs.

pub mod decode;
pub mod merger;

pub use decode::{decode_base, decode_records, decode_wallet};
pub use merger::{apply_wallet, merge_base};
