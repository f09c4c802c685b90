use serde::{Deserialize, Serialize};
use std::fmt;

/// One attribute as written in source: `Name` or `Name(arg, ...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSyntax {
    pub name: String,

    /// Arguments in source form, e.g. `typeof(Friend)`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

impl AttributeSyntax {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

impl fmt::Display for AttributeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.arguments.join(", "))
        }
    }
}

/// One bracketed attribute list: `[A, B(x)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeListSyntax {
    pub attributes: Vec<AttributeSyntax>,
}

impl AttributeListSyntax {
    pub fn single(attribute: AttributeSyntax) -> Self {
        Self {
            attributes: vec![attribute],
        }
    }
}

impl fmt::Display for AttributeListSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, attribute) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{attribute}")?;
        }
        f.write_str("]")
    }
}

/// How a declaration's attribute lists are laid out in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Every list followed by a single space, on the declaration's line.
    Inline,
    /// One list per line, each followed by a newline and the declaration's indentation.
    OnePerLine,
}

/// Text of the attribute region that precedes a declaration's modifiers.
pub fn render_attribute_lists(lists: &[AttributeListSyntax], layout: Layout, indent: &str) -> String {
    let mut out = String::new();
    for list in lists {
        out.push_str(&list.to_string());
        match layout {
            Layout::Inline => out.push(' '),
            Layout::OnePerLine => {
                out.push('\n');
                out.push_str(indent);
            }
        }
    }
    out
}
