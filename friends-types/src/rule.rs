use crate::diagnostic::Severity;
use serde::Serialize;

/// Static description of a rule this workspace can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    /// Message template; `{0}`, `{1}`, ... are replaced by diagnostic arguments.
    pub message_format: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
    pub description: &'static str,
}

impl RuleDescriptor {
    pub fn format_message(&self, arguments: &[String]) -> String {
        let mut out = self.message_format.to_string();
        for (i, arg) in arguments.iter().enumerate() {
            out = out.replace(&format!("{{{i}}}"), arg);
        }
        out
    }
}

/// The one rule owned by the friend-access analyzer.
pub const FRIEND_ACCESS: RuleDescriptor = RuleDescriptor {
    id: "FRIEND001",
    title: "Call to a friend-restricted method",
    message_format: "`{0}` is restricted to its declaring type and declared friends",
    category: "Access",
    default_severity: Severity::Warn,
    enabled_by_default: true,
    description: "A method that carries at least one friend declaration may only be called \
from its declaring type or from a type named in one of those declarations.",
};

/// Code-fix metadata paired with [`FRIEND_ACCESS`].
pub mod fix {
    pub const TITLE: &str = "Add caller as a friend";
    pub const EQUIVALENCE_KEY: &str = "friends.add_friend_declaration";
}
