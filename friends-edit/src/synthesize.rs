//! Friend-grant synthesis: the code fix offered for a denied call.

use crate::error::SynthesisError;
use crate::ports::SyntaxHost;
use crate::syntax::{AttributeListSyntax, AttributeSyntax};
use friends_domain::{CancellationSignal, Cancelled, FriendRegistry};
use friends_types::rule::fix;
use tracing::{debug, info, warn};

/// A new snapshot derived from an old one by adding a friend grant.
#[derive(Debug, Clone)]
pub struct SourceEdit<D> {
    pub title: &'static str,
    pub equivalence_key: &'static str,
    pub before: D,
    pub after: D,
    /// False when the friend was already authorized and `after` is `before`.
    pub changed: bool,
    /// The attribute list that was added, in source form.
    pub added: Option<String>,
}

/// Add `new_friend` to the friend list of `method`'s first source declaration.
///
/// The declaration's existing attribute lists are kept in order and a new single-attribute
/// list is appended after them. The declaration is then formatted by the host. `doc` itself
/// is never modified.
pub fn synthesize<D: SyntaxHost>(
    doc: &D,
    method: &D::Method,
    new_friend: &D::Type,
) -> Result<SourceEdit<D>, SynthesisError> {
    let registry = FriendRegistry::new(doc);
    let set = registry
        .resolve(method)
        .map_err(|_| SynthesisError::Unresolvable {
            method: doc.display_method(method),
        })?;

    if registry.authorizes(&set, new_friend) {
        debug!(
            method = %doc.display_method(method),
            friend = %doc.display_type(new_friend),
            "already authorized; nothing to add"
        );
        return Ok(SourceEdit {
            title: fix::TITLE,
            equivalence_key: fix::EQUIVALENCE_KEY,
            before: doc.clone(),
            after: doc.clone(),
            changed: false,
            added: None,
        });
    }

    let friend_kind = doc
        .friend_attribute_type()
        .ok_or(SynthesisError::FriendAttributeUnavailable)?;

    let declaration = doc
        .declarations(method)
        .into_iter()
        .next()
        .ok_or_else(|| SynthesisError::NoDeclaration {
            method: doc.display_method(method),
        })?;

    let added = AttributeListSyntax::single(AttributeSyntax::new(
        doc.attribute_name(&friend_kind),
        vec![doc.type_argument(new_friend)],
    ));
    let rendered = added.to_string();

    let mut lists = doc.attribute_lists(&declaration);
    lists.push(added);

    let edited = doc.with_attribute_lists(&declaration, lists)?;
    let after = edited.format_declaration(&declaration)?;

    info!(
        method = %doc.display_method(method),
        friend = %doc.display_type(new_friend),
        attribute = %rendered,
        "synthesized friend grant"
    );

    Ok(SourceEdit {
        title: fix::TITLE,
        equivalence_key: fix::EQUIVALENCE_KEY,
        before: doc.clone(),
        after,
        changed: true,
        added: Some(rendered),
    })
}

/// A fix that could not be synthesized in a batch.
#[derive(Debug)]
pub struct WithheldFix {
    pub method: String,
    pub friend: String,
    pub error: SynthesisError,
}

/// Result of applying many friend grants to one snapshot.
#[derive(Debug)]
pub struct BatchEdit<D> {
    pub after: D,
    pub applied: usize,
    /// Requests whose friend was already authorized, possibly by an earlier request.
    pub unchanged: usize,
    pub withheld: Vec<WithheldFix>,
}

/// Apply `requests` one after another, each against the snapshot produced by the previous.
///
/// A request that cannot be synthesized is withheld and the batch continues.
pub fn synthesize_all<'r, D, C>(
    doc: &D,
    requests: impl IntoIterator<Item = (&'r D::Method, &'r D::Type)>,
    cancel: &C,
) -> Result<BatchEdit<D>, Cancelled>
where
    D: SyntaxHost,
    D::Method: 'r,
    D::Type: 'r,
    C: CancellationSignal + ?Sized,
{
    let mut batch = BatchEdit {
        after: doc.clone(),
        applied: 0,
        unchanged: 0,
        withheld: Vec::new(),
    };
    let mut completed = 0u64;

    for (method, friend) in requests {
        if cancel.is_cancelled() {
            return Err(Cancelled { completed });
        }
        completed += 1;

        match synthesize(&batch.after, method, friend) {
            Ok(edit) if edit.changed => {
                batch.applied += 1;
                batch.after = edit.after;
            }
            Ok(_) => batch.unchanged += 1,
            Err(error) => {
                warn!(
                    method = %batch.after.display_method(method),
                    error = %error,
                    "fix withheld"
                );
                batch.withheld.push(WithheldFix {
                    method: batch.after.display_method(method),
                    friend: batch.after.display_type(friend),
                    error,
                });
            }
        }
    }

    Ok(batch)
}
