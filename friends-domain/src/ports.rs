use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only view of the host's resolved symbols.
///
/// `Type` and `Method` are opaque host handles. They are never compared structurally or by
/// display string; type identity always goes through [`SymbolTable::same_type`].
pub trait SymbolTable {
    type Type: Clone + Debug;
    type Method: Clone + Debug;

    /// The type that declares `method`, or `None` when the host cannot tell.
    fn declaring_type(&self, method: &Self::Method) -> Option<Self::Type>;

    /// Every attribute attached to `method`, in declaration order.
    fn attributes(&self, method: &Self::Method) -> Vec<Attribute<Self::Type>>;

    /// The well-known friend attribute type, if the compilation references it at all.
    fn friend_attribute_type(&self) -> Option<Self::Type>;

    /// Host identity equality.
    fn same_type(&self, a: &Self::Type, b: &Self::Type) -> bool;

    fn display_type(&self, ty: &Self::Type) -> String;

    fn display_method(&self, method: &Self::Method) -> String;
}

/// A bound attribute as the host's resolver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<T> {
    /// Attribute class; `None` when the name did not bind.
    pub class: Option<T>,
    pub arguments: Vec<AttributeArgument<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeArgument<T> {
    /// A type-valued argument. `None` is a type argument that failed to resolve.
    Type(Option<T>),
    /// Any other constant, kept in source form.
    Value(String),
}

/// Cooperative cancellation, polled between call sites.
pub trait CancellationSignal {
    fn is_cancelled(&self) -> bool;
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationSignal for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<C: CancellationSignal + ?Sized> CancellationSignal for &C {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}
