//! Edit engine for friend grants.
//!
//! Responsibilities:
//! - Synthesize the attribute edit that adds a caller to a method's friend list.
//! - Batch those edits over one snapshot ("fix all").
//! - Generate a unified diff preview and write changed documents back to disk, guarded by
//!   sha256 preconditions.

mod error;
mod patch;
mod ports;
mod syntax;
mod synthesize;
mod write;

pub use error::{EditError, EditResult, PolicyBlockError, SynthesisError};
pub use patch::render_patch;
pub use ports::SyntaxHost;
pub use syntax::{AttributeListSyntax, AttributeSyntax, Layout, render_attribute_lists};
pub use synthesize::{BatchEdit, SourceEdit, WithheldFix, synthesize, synthesize_all};
pub use write::{FileChange, WriteOptions, sha256_hex, write_changes};
