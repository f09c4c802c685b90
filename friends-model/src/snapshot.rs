//! Wire format of `friends.snapshot.v1`.

use camino::Utf8PathBuf;
use friends_edit::{AttributeListSyntax, AttributeSyntax};
use friends_types::schema::FRIENDS_SNAPSHOT_V1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub schema: String,

    /// Qualified name of the well-known friend attribute type, if the compilation has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_attribute: Option<String>,

    #[serde(default)]
    pub types: Vec<TypeEntry>,

    #[serde(default)]
    pub documents: Vec<DocumentEntry>,

    #[serde(default)]
    pub methods: Vec<MethodEntry>,

    #[serde(default)]
    pub call_sites: Vec<CallSiteEntry>,
}

impl Default for SnapshotFile {
    fn default() -> Self {
        Self {
            schema: FRIENDS_SNAPSHOT_V1.to_string(),
            friend_attribute: None,
            types: Vec::new(),
            documents: Vec::new(),
            methods: Vec::new(),
            call_sites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub name: String,

    /// Another entry this one is the same type as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub path: Utf8PathBuf,

    /// Inline contents. When absent the document is read from `<root>/<path>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub key: String,

    /// Omitted when the declaring type did not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_type: Option<String>,

    /// Attributes known only from metadata.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSyntax>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<DeclarationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationEntry {
    pub document: Utf8PathBuf,

    /// Where the signature (modifiers onward) starts; attribute lists sit right before it.
    pub at: Anchor,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_lists: Vec<AttributeListSyntax>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSiteEntry {
    pub document: Utf8PathBuf,
    pub at: Anchor,

    /// Defaults to the anchored text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Enclosing type; omitted when unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,

    /// Target method key; omitted when unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee: Option<String>,
}

/// A region of a document: byte offsets, or the n-th occurrence of some text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    Span {
        start: usize,
        end: usize,
    },
    Text {
        text: String,
        #[serde(default = "first_occurrence")]
        occurrence: usize,
    },
}

fn first_occurrence() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchors_accept_both_forms() {
        let span: Anchor = serde_json::from_str(r#"{"start":3,"end":9}"#).unwrap();
        assert_eq!(span, Anchor::Span { start: 3, end: 9 });

        let text: Anchor = serde_json::from_str(r#"{"text":"WriteLine()"}"#).unwrap();
        assert_eq!(
            text,
            Anchor::Text {
                text: "WriteLine()".to_string(),
                occurrence: 1
            }
        );
    }

    #[test]
    fn minimal_snapshot_uses_defaults() {
        let file: SnapshotFile = serde_json::from_str(r#"{"schema":"friends.snapshot.v1"}"#).unwrap();
        assert_eq!(file, SnapshotFile::default());
    }

    #[test]
    fn empty_collections_are_not_serialized() {
        let method = MethodEntry {
            key: "A.M".to_string(),
            declaring_type: Some("A".to_string()),
            attributes: vec![],
            declarations: vec![],
        };
        assert_eq!(
            serde_json::to_string(&method).unwrap(),
            r#"{"key":"A.M","declaring_type":"A"}"#
        );
    }
}
