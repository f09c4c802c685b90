//! Shared DTOs for the friends workspace.
//!
//! # Design constraints
//! - Reports are serialized to disk and consumed by other tools.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod diagnostic;
pub mod report;
pub mod rule;

/// Schema identifiers.
pub mod schema {
    pub const FRIENDS_REPORT_V1: &str = "friends.report.v1";
    pub const FRIENDS_SNAPSHOT_V1: &str = "friends.snapshot.v1";
}
