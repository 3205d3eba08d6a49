//! JSON merge-patch (RFC 7396) for Keel.
//!
//! Two halves of the same contract:
//!
//! - [`apply_patch`] applies a merge-patch to a target document
//! - [`diff_values`] generates the merge-patch that turns one document into
//!   another
//!
//! Both operate on `serde_json::Value` and are total functions; callers deal
//! with byte-level (de)serialization. The usual RFC 7396 caveats apply:
//! `null` means *remove*, so a patch cannot set a member to `null`, and
//! arrays are replaced wholesale, never merged element-wise.

pub mod apply;
pub mod diff;

pub use apply::apply_patch;
pub use diff::diff_values;
