//! Rule explanations for the `friends explain` command.

use friends_types::rule::{FRIEND_ACCESS, RuleDescriptor, fix};

/// Long-form documentation for one rule.
#[derive(Debug, Clone)]
pub struct RuleExplanation {
    /// Short user-facing key (e.g., "friend-access").
    pub key: &'static str,
    pub rule: &'static RuleDescriptor,
    pub rationale: &'static str,
    pub remediation: &'static str,
    /// Title of the automatic fix, when there is one.
    pub fix_title: Option<&'static str>,
}

pub static RULE_REGISTRY: &[RuleExplanation] = &[RuleExplanation {
    key: "friend-access",
    rule: &FRIEND_ACCESS,
    rationale: r#"Ordinary visibility is all or nothing: a method is either callable from the
whole assembly or from its declaring type alone. A friend declaration narrows
a visible method to an explicit list of collaborating types:

    [Friends(typeof(Friend))]
    public static void WriteLine() { }

Once a method carries at least one friend declaration, only its declaring type
and the named types may call it. Methods without friend declarations are not
affected. Declarations whose type argument does not resolve are ignored, and
call sites whose caller or target cannot be resolved are never reported."#,
    remediation: r#"Either call the method from its declaring type or a declared friend, or grant
access to the calling type by adding another friend declaration:

    [Friends(typeof(Friend))]
    [Friends(typeof(ConsoleApplication1.Stranger))]
    public static void WriteLine() { }

`friends fix` adds these declarations for every reported call site. It prints
a diff by default; `friends fix --apply` writes the documents."#,
    fix_title: Some(fix::TITLE),
}];

/// Find a rule by key or rule id, ignoring case and `_`/`-` differences.
pub fn lookup_rule(query: &str) -> Option<&'static RuleExplanation> {
    let query_normalized = query.to_lowercase().replace('_', "-");

    RULE_REGISTRY.iter().find(|r| {
        r.key == query_normalized || r.rule.id.to_lowercase() == query_normalized
    })
}

pub fn list_rule_keys() -> Vec<&'static str> {
    RULE_REGISTRY.iter().map(|r| r.key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_key() {
        let rule = lookup_rule("friend-access").expect("should find friend-access");
        assert_eq!(rule.rule.id, "FRIEND001");
    }

    #[test]
    fn test_lookup_by_rule_id_case_insensitive() {
        assert!(lookup_rule("FRIEND001").is_some());
        assert!(lookup_rule("friend001").is_some());
    }

    #[test]
    fn test_lookup_underscores() {
        assert!(lookup_rule("friend_access").is_some());
    }

    #[test]
    fn test_unknown_rule() {
        assert!(lookup_rule("FRIEND999").is_none());
        assert_eq!(list_rule_keys(), vec!["friend-access"]);
    }
}
