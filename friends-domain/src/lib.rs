//! Domain logic: decide whether a call site may reach a friend-restricted method.
//!
//! This crate owns *who* may call *what*. It does not parse source and does not own *how*
//! remediation edits are produced; that's the `friends-edit` crate. Everything it needs from
//! the outside world comes through the [`SymbolTable`] port.

mod analyzer;
mod decision;
mod ports;
mod registry;

#[cfg(test)]
mod testing;

pub use analyzer::{Analysis, Analyzer, AnalyzerConfig, AnalyzerError, Cancelled};
pub use decision::{Abstain, AccessDecision, CallSite, Denial, Verdict, diagnostic_fingerprint};
pub use ports::{Attribute, AttributeArgument, CancellationSignal, NeverCancelled, SymbolTable};
pub use registry::{FriendDeclaration, FriendRegistry, FriendSet, RegistryError};
