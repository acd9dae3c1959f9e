//! Pure configuration logic: merging and validation.
//!
//! Nothing in here touches the filesystem; the two-stage loader in
//! [`crate::io::config`] feeds parsed mappings through these functions.

pub mod merge;
pub mod resolved;
