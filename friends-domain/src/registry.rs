use crate::ports::{Attribute, AttributeArgument, SymbolTable};
use thiserror::Error;
use tracing::{debug, trace};

/// One explicit grant attached to a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendDeclaration<T> {
    pub granted_type: T,
}

/// The types authorized to call one method.
///
/// The declaring type is always authorized; it is a baseline member, not a declaration.
/// `declarations` holds only explicit grants, in attribute order, duplicates included.
#[derive(Debug, Clone)]
pub struct FriendSet<T> {
    declaring_type: T,
    declarations: Vec<FriendDeclaration<T>>,
    dropped: usize,
}

impl<T> FriendSet<T> {
    pub fn declaring_type(&self) -> &T {
        &self.declaring_type
    }

    pub fn declarations(&self) -> &[FriendDeclaration<T>] {
        &self.declarations
    }

    /// Friend-shaped attributes whose type argument did not resolve.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Only methods with at least one explicit declaration are restricted.
    pub fn is_restricted(&self) -> bool {
        !self.declarations.is_empty()
    }

    /// Declaring type first, then every granted type.
    pub fn authorized(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.declaring_type)
            .chain(self.declarations.iter().map(|d| &d.granted_type))
    }

    pub fn contains_by(&self, ty: &T, same: impl Fn(&T, &T) -> bool) -> bool {
        self.authorized().any(|t| same(t, ty))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("method `{method}` has no resolvable declaring type")]
    Unresolvable { method: String },
}

enum Shape<T> {
    NotFriend,
    Friend(T),
    NullArgument,
}

/// Extracts friend declarations from resolved method symbols.
///
/// Stateless apart from the borrowed host; safe to share across threads when the host is.
pub struct FriendRegistry<'h, H: ?Sized> {
    host: &'h H,
}

impl<H: ?Sized> Clone for FriendRegistry<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: ?Sized> Copy for FriendRegistry<'_, H> {}

impl<'h, H: SymbolTable + ?Sized> FriendRegistry<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &'h H {
        self.host
    }

    pub fn resolve(&self, method: &H::Method) -> Result<FriendSet<H::Type>, RegistryError> {
        let declaring_type =
            self.host
                .declaring_type(method)
                .ok_or_else(|| RegistryError::Unresolvable {
                    method: self.host.display_method(method),
                })?;

        let mut declarations = Vec::new();
        let mut dropped = 0usize;

        if let Some(friend_kind) = self.host.friend_attribute_type() {
            for attribute in self.host.attributes(method) {
                match self.classify(&attribute, &friend_kind) {
                    Shape::Friend(granted_type) => {
                        declarations.push(FriendDeclaration { granted_type })
                    }
                    Shape::NullArgument => {
                        dropped += 1;
                        debug!(
                            method = %self.host.display_method(method),
                            "dropping friend declaration with unresolved type argument"
                        );
                    }
                    Shape::NotFriend => {}
                }
            }
        }

        Ok(FriendSet {
            declaring_type,
            declarations,
            dropped,
        })
    }

    pub fn authorizes(&self, set: &FriendSet<H::Type>, caller: &H::Type) -> bool {
        set.contains_by(caller, |a, b| self.host.same_type(a, b))
    }

    fn classify(&self, attribute: &Attribute<H::Type>, friend_kind: &H::Type) -> Shape<H::Type> {
        let Some(class) = &attribute.class else {
            return Shape::NotFriend;
        };
        if !self.host.same_type(class, friend_kind) {
            return Shape::NotFriend;
        }

        match attribute.arguments.as_slice() {
            [AttributeArgument::Type(Some(ty))] => Shape::Friend(ty.clone()),
            [AttributeArgument::Type(None)] => Shape::NullArgument,
            other => {
                trace!(arguments = other.len(), "friend attribute with unexpected arguments ignored");
                Shape::NotFriend
            }
        }
    }
}
