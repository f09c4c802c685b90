use crate::bind::{Binder, attribute_spelling, simple_name};
use crate::load::SnapshotLoadError;
use crate::snapshot::{
    Anchor, CallSiteEntry, DeclarationEntry, DocumentEntry, MethodEntry, SnapshotFile, TypeEntry,
};
use crate::text::{line_column, line_indent, resolve_anchor, shift};
use anyhow::anyhow;
use camino::{Utf8Path, Utf8PathBuf};
use friends_domain::{Attribute, CallSite, SymbolTable};
use friends_edit::{AttributeListSyntax, AttributeSyntax, Layout, SyntaxHost, render_attribute_lists};
use friends_types::diagnostic::{Location, TextSpan};
use friends_types::schema::FRIENDS_SNAPSHOT_V1;
use fs_err as fs;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodHandle(pub(crate) usize);

/// One source declaration of a method. Stays valid across edits of the same solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationHandle {
    method: usize,
    index: usize,
}

/// Immutable snapshot of documents and resolved symbols.
///
/// Cheap to clone. Edits produce a new `Solution`; documents they do not touch are shared.
#[derive(Debug, Clone)]
pub struct Solution {
    data: Arc<SolutionData>,
}

#[derive(Debug, Clone)]
struct SolutionData {
    binder: Arc<Binder>,
    types: Vec<TypeData>,
    friend_attribute: Option<TypeHandle>,
    documents: Vec<Arc<Document>>,
    methods: Vec<MethodData>,
    call_sites: Vec<CallSiteData>,
}

#[derive(Debug, Clone)]
struct TypeData {
    name: String,
    alias_of: Option<TypeHandle>,
    canonical: TypeHandle,
}

#[derive(Debug, Clone)]
struct Document {
    path: Utf8PathBuf,
    text: String,
    inline: bool,
}

#[derive(Debug, Clone)]
struct MethodData {
    key: String,
    declaring_type: Option<TypeHandle>,
    metadata: Vec<AttributeSyntax>,
    declarations: Vec<DeclarationData>,
}

#[derive(Debug, Clone)]
struct DeclarationData {
    document: usize,
    /// The attribute lists, up to the signature.
    region: TextSpan,
    signature: TextSpan,
    lists: Vec<AttributeListSyntax>,
    indent: String,
}

#[derive(Debug, Clone)]
struct CallSiteData {
    document: usize,
    span: TextSpan,
    expression: String,
    caller: Option<TypeHandle>,
    callee: Option<MethodHandle>,
}

fn invalid(message: impl Into<String>) -> SnapshotLoadError {
    SnapshotLoadError::Invalid {
        message: message.into(),
    }
}

impl Solution {
    /// Bind a parsed snapshot. Documents without inline text are read from `root`.
    pub fn from_snapshot(file: SnapshotFile, root: &Utf8Path) -> Result<Self, SnapshotLoadError> {
        if file.schema != FRIENDS_SNAPSHOT_V1 {
            return Err(SnapshotLoadError::Schema {
                found: file.schema,
                expected: FRIENDS_SNAPSHOT_V1,
            });
        }

        let types = bind_types(&file.types)?;
        let binder = Binder::new(file.types.iter().map(|t| t.name.as_str()));
        let exact: BTreeMap<&str, TypeHandle> = file
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), TypeHandle(i)))
            .collect();
        let named_type = |name: &str, what: &str| {
            binder
                .bind_type(name)
                .ok_or_else(|| invalid(format!("{what} refers to unknown type `{name}`")))
        };

        let friend_attribute = match &file.friend_attribute {
            Some(name) => Some(
                exact
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| invalid(format!("friend attribute `{name}` is not a declared type")))?,
            ),
            None => None,
        };

        let mut documents = Vec::with_capacity(file.documents.len());
        let mut document_index = BTreeMap::new();
        for entry in &file.documents {
            if document_index.insert(entry.path.clone(), documents.len()).is_some() {
                return Err(invalid(format!("duplicate document `{}`", entry.path)));
            }
            let text = match &entry.text {
                Some(text) => text.clone(),
                None => fs::read_to_string(root.join(&entry.path))?,
            };
            documents.push(Arc::new(Document {
                path: entry.path.clone(),
                text,
                inline: entry.text.is_some(),
            }));
        }
        let document_of = |path: &Utf8Path| {
            document_index
                .get(path)
                .copied()
                .ok_or_else(|| invalid(format!("unknown document `{path}`")))
        };

        let mut methods = Vec::with_capacity(file.methods.len());
        let mut method_index = BTreeMap::new();
        for entry in &file.methods {
            if method_index
                .insert(entry.key.clone(), MethodHandle(methods.len()))
                .is_some()
            {
                return Err(invalid(format!("duplicate method `{}`", entry.key)));
            }
            let declaring_type = match &entry.declaring_type {
                Some(name) => Some(named_type(name, &format!("method `{}`", entry.key))?),
                None => None,
            };
            let declarations = entry
                .declarations
                .iter()
                .map(|d| {
                    let doc = document_of(&d.document)?;
                    bind_declaration(&entry.key, doc, &documents[doc], d)
                })
                .collect::<Result<Vec<_>, _>>()?;

            methods.push(MethodData {
                key: entry.key.clone(),
                declaring_type,
                metadata: entry.attributes.clone(),
                declarations,
            });
        }

        let mut call_sites = Vec::with_capacity(file.call_sites.len());
        for entry in &file.call_sites {
            let doc = document_of(&entry.document)?;
            let text = &documents[doc].text;
            let span = resolve_anchor(text, &entry.at).ok_or_else(|| {
                invalid(format!("call site anchor {:?} not found in `{}`", entry.at, entry.document))
            })?;
            let caller = match &entry.caller {
                Some(name) => Some(named_type(name, "call site caller")?),
                None => None,
            };
            let callee = match &entry.callee {
                Some(key) => Some(
                    method_index
                        .get(key)
                        .copied()
                        .ok_or_else(|| invalid(format!("call site refers to unknown method `{key}`")))?,
                ),
                None => None,
            };
            call_sites.push(CallSiteData {
                document: doc,
                span,
                expression: entry
                    .expression
                    .clone()
                    .unwrap_or_else(|| text[span.start..span.end].to_string()),
                caller,
                callee,
            });
        }

        debug!(
            types = types.len(),
            documents = documents.len(),
            methods = methods.len(),
            call_sites = call_sites.len(),
            "solution loaded"
        );

        Ok(Self {
            data: Arc::new(SolutionData {
                binder: Arc::new(binder),
                types,
                friend_attribute,
                documents,
                methods,
                call_sites,
            }),
        })
    }

    pub fn type_by_name(&self, name: &str) -> Option<TypeHandle> {
        self.data.binder.bind_type(name)
    }

    pub fn method_by_key(&self, key: &str) -> Option<MethodHandle> {
        self.data
            .methods
            .iter()
            .position(|m| m.key == key)
            .map(MethodHandle)
    }

    /// Every call site, with line and column filled in.
    pub fn call_sites(&self) -> Vec<CallSite<TypeHandle, MethodHandle>> {
        self.data
            .call_sites
            .iter()
            .map(|site| {
                let doc = &self.data.documents[site.document];
                let (line, column) = line_column(&doc.text, site.span.start);
                CallSite {
                    caller: site.caller,
                    callee: site.callee,
                    location: Location::new(doc.path.clone(), site.span).with_line_column(line, column),
                    expression: site.expression.clone(),
                }
            })
            .collect()
    }

    pub fn document_text(&self, path: &str) -> Option<&str> {
        self.data
            .documents
            .iter()
            .find(|d| d.path.as_str() == path)
            .map(|d| d.text.as_str())
    }

    pub fn texts(&self) -> BTreeMap<Utf8PathBuf, String> {
        self.data
            .documents
            .iter()
            .map(|d| (d.path.clone(), d.text.clone()))
            .collect()
    }

    /// Documents that were read from disk rather than inlined in the snapshot.
    pub fn on_disk_texts(&self) -> BTreeMap<Utf8PathBuf, String> {
        self.data
            .documents
            .iter()
            .filter(|d| !d.inline)
            .map(|d| (d.path.clone(), d.text.clone()))
            .collect()
    }

    /// Source text of a declaration from its first attribute list through its signature.
    pub fn declaration_text(&self, handle: &DeclarationHandle) -> Option<&str> {
        let decl = self.declaration(handle)?;
        let text = &self.data.documents.get(decl.document)?.text;
        text.get(decl.region.start..decl.signature.end)
    }

    /// Re-export the current state with byte-span anchors.
    pub fn to_snapshot(&self) -> SnapshotFile {
        let data = &self.data;
        let type_name = |t: TypeHandle| data.types[t.0].name.clone();

        SnapshotFile {
            schema: FRIENDS_SNAPSHOT_V1.to_string(),
            friend_attribute: data.friend_attribute.map(type_name),
            types: data
                .types
                .iter()
                .map(|t| TypeEntry {
                    name: t.name.clone(),
                    alias_of: t.alias_of.map(type_name),
                })
                .collect(),
            documents: data
                .documents
                .iter()
                .map(|d| DocumentEntry {
                    path: d.path.clone(),
                    text: d.inline.then(|| d.text.clone()),
                })
                .collect(),
            methods: data
                .methods
                .iter()
                .map(|m| MethodEntry {
                    key: m.key.clone(),
                    declaring_type: m.declaring_type.map(type_name),
                    attributes: m.metadata.clone(),
                    declarations: m
                        .declarations
                        .iter()
                        .map(|d| DeclarationEntry {
                            document: data.documents[d.document].path.clone(),
                            at: Anchor::Span {
                                start: d.signature.start,
                                end: d.signature.end,
                            },
                            attribute_lists: d.lists.clone(),
                        })
                        .collect(),
                })
                .collect(),
            call_sites: data
                .call_sites
                .iter()
                .map(|s| CallSiteEntry {
                    document: data.documents[s.document].path.clone(),
                    at: Anchor::Span {
                        start: s.span.start,
                        end: s.span.end,
                    },
                    expression: Some(s.expression.clone()),
                    caller: s.caller.map(type_name),
                    callee: s.callee.map(|m| data.methods[m.0].key.clone()),
                })
                .collect(),
        }
    }

    fn type_data(&self, ty: &TypeHandle) -> Option<&TypeData> {
        self.data.types.get(ty.0)
    }

    fn method(&self, method: &MethodHandle) -> Option<&MethodData> {
        self.data.methods.get(method.0)
    }

    fn declaration(&self, handle: &DeclarationHandle) -> Option<&DeclarationData> {
        self.data
            .methods
            .get(handle.method)?
            .declarations
            .get(handle.index)
    }

    /// Replace a declaration's attribute region and shift every later span in its document.
    fn rewrite(
        &self,
        handle: &DeclarationHandle,
        lists: Vec<AttributeListSyntax>,
        layout: Layout,
    ) -> anyhow::Result<Self> {
        let decl = self
            .declaration(handle)
            .ok_or_else(|| anyhow!("unknown declaration {handle:?}"))?;
        let (doc, region) = (decl.document, decl.region);
        let replacement = render_attribute_lists(&lists, layout, &decl.indent);

        let mut data = (*self.data).clone();
        let document = data
            .documents
            .get_mut(doc)
            .ok_or_else(|| anyhow!("declaration {handle:?} points at a missing document"))?;
        Arc::make_mut(document)
            .text
            .replace_range(region.start..region.end, &replacement);

        let delta = replacement.len() as isize - region.len() as isize;
        for method in &mut data.methods {
            for d in method.declarations.iter_mut().filter(|d| d.document == doc) {
                shift(&mut d.region, region.end, delta);
                shift(&mut d.signature, region.end, delta);
            }
        }
        for site in data.call_sites.iter_mut().filter(|s| s.document == doc) {
            shift(&mut site.span, region.end, delta);
        }

        let decl = &mut data.methods[handle.method].declarations[handle.index];
        decl.region = TextSpan::new(region.start, region.start + replacement.len());
        decl.lists = lists;

        Ok(Self {
            data: Arc::new(data),
        })
    }
}

fn bind_types(entries: &[TypeEntry]) -> Result<Vec<TypeData>, SnapshotLoadError> {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.name.as_str()) {
            return Err(invalid(format!("duplicate type `{}`", entry.name)));
        }
    }

    let position = |name: &str| entries.iter().position(|t| t.name == name).map(TypeHandle);
    let alias_of = entries
        .iter()
        .map(|entry| match &entry.alias_of {
            Some(target) => position(target).map(Some).ok_or_else(|| {
                invalid(format!("type `{}` aliases unknown type `{target}`", entry.name))
            }),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut canonical = TypeHandle(i);
            let mut steps = 0;
            while let Some(next) = alias_of[canonical.0] {
                steps += 1;
                if steps > entries.len() {
                    return Err(invalid(format!("alias cycle through type `{}`", entry.name)));
                }
                canonical = next;
            }
            Ok(TypeData {
                name: entry.name.clone(),
                alias_of: alias_of[i],
                canonical,
            })
        })
        .collect()
}

/// Locate a declaration's signature and verify its attribute lists precede it in the text.
fn bind_declaration(
    key: &str,
    doc: usize,
    document: &Document,
    entry: &DeclarationEntry,
) -> Result<DeclarationData, SnapshotLoadError> {
    let text = &document.text;
    let signature = resolve_anchor(text, &entry.at).ok_or_else(|| {
        invalid(format!(
            "declaration anchor {:?} of `{key}` not found in `{}`",
            entry.at, document.path
        ))
    })?;
    let indent = line_indent(text, signature.start);
    let before = &text[..signature.start];

    let region = [Layout::OnePerLine, Layout::Inline]
        .into_iter()
        .map(|layout| render_attribute_lists(&entry.attribute_lists, layout, &indent))
        .find(|rendered| before.ends_with(rendered.as_str()))
        .map(|rendered| TextSpan::new(signature.start - rendered.len(), signature.start))
        .ok_or_else(|| {
            invalid(format!(
                "attribute lists of `{key}` do not match the text before its signature in `{}`",
                document.path
            ))
        })?;

    Ok(DeclarationData {
        document: doc,
        region,
        signature,
        lists: entry.attribute_lists.clone(),
        indent,
    })
}

impl SymbolTable for Solution {
    type Type = TypeHandle;
    type Method = MethodHandle;

    fn declaring_type(&self, method: &MethodHandle) -> Option<TypeHandle> {
        self.method(method)?.declaring_type
    }

    fn attributes(&self, method: &MethodHandle) -> Vec<Attribute<TypeHandle>> {
        let Some(data) = self.method(method) else {
            return Vec::new();
        };
        let binder = &self.data.binder;
        data.declarations
            .iter()
            .flat_map(|d| &d.lists)
            .flat_map(|list| &list.attributes)
            .chain(&data.metadata)
            .map(|syntax| binder.bind_attribute(syntax))
            .collect()
    }

    fn friend_attribute_type(&self) -> Option<TypeHandle> {
        self.data.friend_attribute
    }

    fn same_type(&self, a: &TypeHandle, b: &TypeHandle) -> bool {
        match (self.type_data(a), self.type_data(b)) {
            (Some(a), Some(b)) => a.canonical == b.canonical,
            _ => false,
        }
    }

    fn display_type(&self, ty: &TypeHandle) -> String {
        self.type_data(ty)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("<unknown type #{}>", ty.0))
    }

    fn display_method(&self, method: &MethodHandle) -> String {
        self.method(method)
            .map(|m| m.key.clone())
            .unwrap_or_else(|| format!("<unknown method #{}>", method.0))
    }
}

impl SyntaxHost for Solution {
    type Declaration = DeclarationHandle;

    fn declarations(&self, method: &MethodHandle) -> Vec<DeclarationHandle> {
        let count = self.method(method).map_or(0, |m| m.declarations.len());
        (0..count)
            .map(|index| DeclarationHandle {
                method: method.0,
                index,
            })
            .collect()
    }

    fn attribute_lists(&self, declaration: &DeclarationHandle) -> Vec<AttributeListSyntax> {
        self.declaration(declaration)
            .map(|d| d.lists.clone())
            .unwrap_or_default()
    }

    /// Shortest spelling that binds back to `attribute_type`; the qualified name otherwise.
    fn attribute_name(&self, attribute_type: &TypeHandle) -> String {
        let Some(data) = self.type_data(attribute_type) else {
            return String::new();
        };
        let binds_back = |spelling: &str| {
            self.data
                .binder
                .bind_attribute_class(spelling)
                .is_some_and(|bound| self.same_type(&bound, attribute_type))
        };
        [attribute_spelling(&data.name), simple_name(&data.name)]
            .into_iter()
            .find(|spelling| binds_back(spelling))
            .unwrap_or(data.name.as_str())
            .to_string()
    }

    fn type_argument(&self, ty: &TypeHandle) -> String {
        format!("typeof({})", self.display_type(ty))
    }

    fn with_attribute_lists(
        &self,
        declaration: &DeclarationHandle,
        lists: Vec<AttributeListSyntax>,
    ) -> anyhow::Result<Self> {
        self.rewrite(declaration, lists, Layout::Inline)
    }

    fn format_declaration(&self, declaration: &DeclarationHandle) -> anyhow::Result<Self> {
        let lists = self.attribute_lists(declaration);
        self.rewrite(declaration, lists, Layout::OnePerLine)
    }
}
