use crate::ports::SymbolTable;
use crate::registry::FriendRegistry;
use friends_types::diagnostic::{Diagnostic, Location};
use friends_types::rule::FRIEND_ACCESS;
use tracing::{debug, trace};
use uuid::Uuid;

/// One call expression as reported by the host's tree walker.
///
/// `caller` and `callee` are `None` when the host could not resolve them.
#[derive(Debug, Clone)]
pub struct CallSite<T, M> {
    pub caller: Option<T>,
    pub callee: Option<M>,
    pub location: Location,
    /// Human-readable rendering of the call expression.
    pub expression: String,
}

/// Why a call site was not judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abstain {
    UnresolvedCallee,
    UnresolvedDeclaringType,
    UnresolvedCaller,
}

/// A denied call, with the handles needed to remediate it.
#[derive(Debug, Clone, PartialEq)]
pub struct Denial<T, M> {
    pub caller: T,
    pub callee: M,
    pub diagnostic: Diagnostic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<T, M> {
    Allow,
    Deny(Denial<T, M>),
    Inconclusive(Abstain),
}

impl<T, M> Verdict<T, M> {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Verdict::Deny(_))
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Verdict::Inconclusive(_))
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Verdict::Deny(denial) => Some(&denial.diagnostic),
            _ => None,
        }
    }
}

/// Judges call sites against the friend declarations of their targets.
///
/// Holds no mutable state: one instance may evaluate many call sites from many threads.
pub struct AccessDecision<'h, H: ?Sized> {
    registry: FriendRegistry<'h, H>,
}

impl<H: ?Sized> Clone for AccessDecision<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: ?Sized> Copy for AccessDecision<'_, H> {}

impl<'h, H: SymbolTable + ?Sized> AccessDecision<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self {
            registry: FriendRegistry::new(host),
        }
    }

    pub fn registry(&self) -> FriendRegistry<'h, H> {
        self.registry
    }

    pub fn evaluate(&self, site: &CallSite<H::Type, H::Method>) -> Verdict<H::Type, H::Method> {
        let Some(callee) = &site.callee else {
            trace!(location = %site.location, "callee unresolved; abstaining");
            return Verdict::Inconclusive(Abstain::UnresolvedCallee);
        };

        let set = match self.registry.resolve(callee) {
            Ok(set) => set,
            Err(err) => {
                debug!(location = %site.location, error = %err, "abstaining");
                return Verdict::Inconclusive(Abstain::UnresolvedDeclaringType);
            }
        };

        // Undeclared methods are left to ordinary visibility.
        if !set.is_restricted() {
            return Verdict::Allow;
        }

        let Some(caller) = &site.caller else {
            trace!(location = %site.location, "caller unresolved; abstaining");
            return Verdict::Inconclusive(Abstain::UnresolvedCaller);
        };

        if self.registry.authorizes(&set, caller) {
            return Verdict::Allow;
        }

        Verdict::Deny(Denial {
            caller: caller.clone(),
            callee: callee.clone(),
            diagnostic: friend_access_diagnostic(site),
        })
    }
}

fn friend_access_diagnostic<T, M>(site: &CallSite<T, M>) -> Diagnostic {
    let arguments = vec![site.expression.clone()];
    Diagnostic {
        rule_id: FRIEND_ACCESS.id.to_string(),
        severity: FRIEND_ACCESS.default_severity,
        message: FRIEND_ACCESS.format_message(&arguments),
        arguments,
        location: site.location.clone(),
        fingerprint: Some(
            diagnostic_fingerprint(FRIEND_ACCESS.id, &site.location, &site.expression).to_string(),
        ),
    }
}

/// Deterministic id: v5(namespace, rule|path|span|expression).
pub fn diagnostic_fingerprint(rule_id: &str, location: &Location, expression: &str) -> Uuid {
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x2f, 0x6c, 0x91, 0x0e, 0x4a, 0x1d, 0x4e, 0x8b, 0x9c, 0x53, 0x7a, 0x21, 0xd0, 0x8e, 0x36,
        0x5b,
    ]);

    let stable_key = format!(
        "{}|{}|{}..{}|{}",
        rule_id, location.path, location.span.start, location.span.end, expression
    );
    Uuid::new_v5(&NAMESPACE, stable_key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::testing::{FakeTable, MethodKey, TypeKey, friend, site};
    use friends_types::diagnostic::Severity;
    use proptest::prelude::*;

    struct ScenarioA {
        table: FakeTable,
        type_name: TypeKey,
        friend: TypeKey,
        stranger: TypeKey,
        write_line: MethodKey,
        bing: MethodKey,
    }

    fn scenario_a() -> ScenarioA {
        let mut table = FakeTable::new();
        let type_name = table.ty("TypeName");
        let friend = table.ty("Friend");
        let stranger = table.ty("Stranger");
        let write_line = table.method(
            "TypeName.WriteLine",
            Some(type_name),
            vec![table.friend_attr(friend)],
        );
        let bing = table.method("TypeName.Bing", Some(type_name), vec![]);
        ScenarioA {
            table,
            type_name,
            friend,
            stranger,
            write_line,
            bing,
        }
    }

    #[test]
    fn declared_friend_is_allowed() {
        let s = scenario_a();
        let decision = AccessDecision::new(&s.table);
        let verdict = decision.evaluate(&site(
            Some(s.friend),
            Some(s.write_line),
            "TypeName.WriteLine()",
        ));
        assert!(verdict.is_allow());
    }

    #[test]
    fn stranger_is_denied_with_warning() {
        let s = scenario_a();
        let decision = AccessDecision::new(&s.table);
        let verdict = decision.evaluate(&site(
            Some(s.stranger),
            Some(s.write_line),
            "TypeName.WriteLine()",
        ));

        let Verdict::Deny(denial) = verdict else {
            panic!("expected deny");
        };
        assert_eq!(denial.caller, s.stranger);
        assert_eq!(denial.callee, s.write_line);
        assert_eq!(denial.diagnostic.rule_id, FRIEND_ACCESS.id);
        assert_eq!(denial.diagnostic.severity, Severity::Warn);
        assert_eq!(denial.diagnostic.arguments, vec!["TypeName.WriteLine()"]);
        assert!(denial.diagnostic.message.contains("TypeName.WriteLine()"));
        assert!(denial.diagnostic.fingerprint.is_some());
    }

    #[test]
    fn self_call_is_allowed() {
        let s = scenario_a();
        let decision = AccessDecision::new(&s.table);
        let verdict = decision.evaluate(&site(Some(s.type_name), Some(s.write_line), "WriteLine()"));
        assert!(verdict.is_allow());
    }

    #[test]
    fn undeclared_method_is_open_to_anyone() {
        let s = scenario_a();
        let decision = AccessDecision::new(&s.table);
        for caller in [Some(s.stranger), Some(s.friend), None] {
            let verdict = decision.evaluate(&site(caller, Some(s.bing), "TypeName.Bing()"));
            assert!(verdict.is_allow());
            assert!(verdict.diagnostic().is_none());
        }
    }

    #[test]
    fn unresolved_callee_is_inconclusive() {
        let s = scenario_a();
        let decision = AccessDecision::new(&s.table);
        let verdict = decision.evaluate(&site(Some(s.stranger), None, "Missing()"));
        assert_eq!(verdict, Verdict::Inconclusive(Abstain::UnresolvedCallee));
        assert!(verdict.diagnostic().is_none());
    }

    #[test]
    fn callee_without_declaring_type_is_inconclusive() {
        let mut table = FakeTable::new();
        let stranger = table.ty("Stranger");
        let ghost = table.method("Ghost", None, vec![]);
        let verdict = AccessDecision::new(&table).evaluate(&site(Some(stranger), Some(ghost), "Ghost()"));
        assert_eq!(
            verdict,
            Verdict::Inconclusive(Abstain::UnresolvedDeclaringType)
        );
    }

    #[test]
    fn unresolved_caller_of_restricted_method_is_inconclusive() {
        let s = scenario_a();
        let verdict =
            AccessDecision::new(&s.table).evaluate(&site(None, Some(s.write_line), "WriteLine()"));
        assert_eq!(verdict, Verdict::Inconclusive(Abstain::UnresolvedCaller));
    }

    #[test]
    fn only_null_declarations_leave_method_open() {
        let mut table = FakeTable::new();
        let owner = table.ty("TypeName");
        let stranger = table.ty("Stranger");
        let kind = table.friend_kind();
        let m = table.method("WriteLine", Some(owner), vec![friend(kind, None)]);
        let verdict = AccessDecision::new(&table).evaluate(&site(Some(stranger), Some(m), "WriteLine()"));
        assert!(verdict.is_allow());
    }

    #[test]
    fn fingerprint_is_stable_and_location_sensitive() {
        let loc = Location::new("a.cs", friends_types::diagnostic::TextSpan::new(1, 5));
        let other = Location::new("a.cs", friends_types::diagnostic::TextSpan::new(2, 6));
        assert_eq!(
            diagnostic_fingerprint("FRIEND001", &loc, "f()"),
            diagnostic_fingerprint("FRIEND001", &loc, "f()")
        );
        assert_ne!(
            diagnostic_fingerprint("FRIEND001", &loc, "f()"),
            diagnostic_fingerprint("FRIEND001", &other, "f()")
        );
    }

    /// Builds a table with `n` candidate types; `grants` indexes into them.
    fn table_with(n: usize, grants: &[usize]) -> (FakeTable, TypeKey, Vec<TypeKey>, MethodKey) {
        let mut table = FakeTable::new();
        let owner = table.ty("Owner");
        let types: Vec<TypeKey> = (0..n).map(|i| table.ty(&format!("T{i}"))).collect();
        let attrs = grants.iter().map(|&g| table.friend_attr(types[g])).collect();
        let m = table.method("Owner.M", Some(owner), attrs);
        (table, owner, types, m)
    }

    proptest! {
        #[test]
        fn no_declarations_always_allows(n in 1usize..8, caller in 0usize..8) {
            let (table, _, types, m) = table_with(n, &[]);
            let caller = types[caller % n];
            let verdict = AccessDecision::new(&table).evaluate(&site(Some(caller), Some(m), "Owner.M()"));
            prop_assert!(verdict.is_allow());
        }

        #[test]
        fn declaring_type_always_allowed(n in 1usize..8, grants in prop::collection::vec(0usize..8, 1..6)) {
            let grants: Vec<usize> = grants.into_iter().map(|g| g % n).collect();
            let (table, owner, _, m) = table_with(n, &grants);
            let verdict = AccessDecision::new(&table).evaluate(&site(Some(owner), Some(m), "M()"));
            prop_assert!(verdict.is_allow());
        }

        #[test]
        fn membership_decides_restricted_calls(
            n in 1usize..8,
            grants in prop::collection::vec(0usize..8, 1..6),
            caller in 0usize..8,
        ) {
            let grants: Vec<usize> = grants.into_iter().map(|g| g % n).collect();
            let caller = caller % n;
            let (table, _, types, m) = table_with(n, &grants);
            let verdict = AccessDecision::new(&table).evaluate(&site(Some(types[caller]), Some(m), "Owner.M()"));
            if grants.contains(&caller) {
                prop_assert!(verdict.is_allow());
            } else {
                prop_assert!(verdict.is_deny());
            }
        }
    }
}
