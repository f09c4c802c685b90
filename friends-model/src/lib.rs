//! Reference host for the friend analyzer.
//!
//! A [`Solution`] is an immutable snapshot of documents and resolved symbols, loaded from a
//! `friends.snapshot.v1` JSON file. It implements both [`friends_domain::SymbolTable`] and
//! [`friends_edit::SyntaxHost`], so the same value can be analyzed, fixed, and re-analyzed.

mod bind;
mod load;
mod snapshot;
mod solution;
mod text;

pub use load::{SnapshotLoadError, load_snapshot, parse_snapshot};
pub use snapshot::{
    Anchor, CallSiteEntry, DeclarationEntry, DocumentEntry, MethodEntry, SnapshotFile, TypeEntry,
};
pub use solution::{DeclarationHandle, MethodHandle, Solution, TypeHandle};
