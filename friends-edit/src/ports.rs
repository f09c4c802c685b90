use crate::syntax::AttributeListSyntax;
use friends_domain::SymbolTable;
use std::fmt::Debug;

/// Syntax-level access to an immutable source snapshot.
///
/// The implementing value *is* the snapshot: edits never mutate it, they return a new one.
/// Method and declaration handles obtained from a snapshot stay valid in snapshots derived
/// from it by these edits.
pub trait SyntaxHost: SymbolTable + Clone {
    type Declaration: Clone + Debug;

    /// Source declarations of `method`, in host order. Empty for metadata-only methods.
    fn declarations(&self, method: &Self::Method) -> Vec<Self::Declaration>;

    fn attribute_lists(&self, declaration: &Self::Declaration) -> Vec<AttributeListSyntax>;

    /// How to spell an attribute of type `attribute_type` at a use site.
    fn attribute_name(&self, attribute_type: &Self::Type) -> String;

    /// A type-valued attribute argument naming `ty`, fully qualified.
    fn type_argument(&self, ty: &Self::Type) -> String;

    /// Replace the declaration's attribute lists, returning a new snapshot.
    fn with_attribute_lists(
        &self,
        declaration: &Self::Declaration,
        lists: Vec<AttributeListSyntax>,
    ) -> anyhow::Result<Self>;

    /// Run the host's formatter over one declaration, returning a new snapshot.
    fn format_declaration(&self, declaration: &Self::Declaration) -> anyhow::Result<Self>;
}
