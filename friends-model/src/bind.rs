//! Name binding: from source spellings to type handles.

use crate::solution::TypeHandle;
use friends_domain::{Attribute, AttributeArgument};
use friends_edit::AttributeSyntax;
use std::collections::BTreeMap;

const ATTRIBUTE_SUFFIX: &str = "Attribute";

#[derive(Debug)]
pub(crate) struct Binder {
    qualified: BTreeMap<String, TypeHandle>,
    /// Simple name -> every type with that simple name.
    simple: BTreeMap<String, Vec<TypeHandle>>,
}

impl Binder {
    pub(crate) fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut qualified = BTreeMap::new();
        let mut simple: BTreeMap<String, Vec<TypeHandle>> = BTreeMap::new();
        for (i, name) in names.into_iter().enumerate() {
            let handle = TypeHandle(i);
            qualified.insert(name.to_string(), handle);
            simple.entry(simple_name(name).to_string()).or_default().push(handle);
        }
        Self { qualified, simple }
    }

    /// Qualified name first, then an unambiguous simple name.
    pub(crate) fn bind_type(&self, name: &str) -> Option<TypeHandle> {
        let name = name.trim().trim_start_matches("global::");
        if let Some(handle) = self.qualified.get(name) {
            return Some(*handle);
        }
        match self.simple.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    /// Attribute names may omit the `Attribute` suffix.
    pub(crate) fn bind_attribute_class(&self, name: &str) -> Option<TypeHandle> {
        self.bind_type(name)
            .or_else(|| self.bind_type(&format!("{name}{ATTRIBUTE_SUFFIX}")))
    }

    pub(crate) fn bind_attribute(&self, syntax: &AttributeSyntax) -> Attribute<TypeHandle> {
        Attribute {
            class: self.bind_attribute_class(&syntax.name),
            arguments: syntax.arguments.iter().map(|a| self.bind_argument(a)).collect(),
        }
    }

    fn bind_argument(&self, argument: &str) -> AttributeArgument<TypeHandle> {
        let trimmed = argument.trim();
        match trimmed
            .strip_prefix("typeof(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => AttributeArgument::Type(self.bind_type(inner)),
            None => AttributeArgument::Value(trimmed.to_string()),
        }
    }
}

pub(crate) fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// How an attribute type is spelled at a use site: simple name without the suffix.
pub(crate) fn attribute_spelling(qualified: &str) -> &str {
    let simple = simple_name(qualified);
    match simple.strip_suffix(ATTRIBUTE_SUFFIX) {
        Some(short) if !short.is_empty() => short,
        _ => simple,
    }
}
