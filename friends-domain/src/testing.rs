//! In-crate fake host used by unit tests.

use crate::decision::CallSite;
use crate::ports::{Attribute, AttributeArgument, SymbolTable};
use friends_types::diagnostic::{Location, TextSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey(pub usize);

struct FakeType {
    name: String,
    alias_of: Option<TypeKey>,
}

struct FakeMethod {
    name: String,
    declaring_type: Option<TypeKey>,
    attributes: Vec<Attribute<TypeKey>>,
}

pub struct FakeTable {
    types: Vec<FakeType>,
    methods: Vec<FakeMethod>,
    friend_kind: Option<TypeKey>,
}

impl FakeTable {
    pub fn new() -> Self {
        let mut table = Self::without_friend_kind();
        let kind = table.ty("FriendsAttribute");
        table.friend_kind = Some(kind);
        table
    }

    pub fn without_friend_kind() -> Self {
        Self {
            types: Vec::new(),
            methods: Vec::new(),
            friend_kind: None,
        }
    }

    pub fn ty(&mut self, name: &str) -> TypeKey {
        self.types.push(FakeType {
            name: name.to_string(),
            alias_of: None,
        });
        TypeKey(self.types.len() - 1)
    }

    pub fn alias(&mut self, name: &str, of: TypeKey) -> TypeKey {
        self.types.push(FakeType {
            name: name.to_string(),
            alias_of: Some(of),
        });
        TypeKey(self.types.len() - 1)
    }

    pub fn method(
        &mut self,
        name: &str,
        declaring_type: Option<TypeKey>,
        attributes: Vec<Attribute<TypeKey>>,
    ) -> MethodKey {
        self.methods.push(FakeMethod {
            name: name.to_string(),
            declaring_type,
            attributes,
        });
        MethodKey(self.methods.len() - 1)
    }

    pub fn friend_kind(&self) -> TypeKey {
        self.friend_kind.expect("fake table has a friend attribute type")
    }

    pub fn friend_attr(&self, granted: TypeKey) -> Attribute<TypeKey> {
        friend(self.friend_kind(), Some(granted))
    }

    fn canonical(&self, mut ty: TypeKey) -> TypeKey {
        while let Some(next) = self.types[ty.0].alias_of {
            ty = next;
        }
        ty
    }
}

impl SymbolTable for FakeTable {
    type Type = TypeKey;
    type Method = MethodKey;

    fn declaring_type(&self, method: &MethodKey) -> Option<TypeKey> {
        self.methods.get(method.0).and_then(|m| m.declaring_type)
    }

    fn attributes(&self, method: &MethodKey) -> Vec<Attribute<TypeKey>> {
        self.methods
            .get(method.0)
            .map(|m| m.attributes.clone())
            .unwrap_or_default()
    }

    fn friend_attribute_type(&self) -> Option<TypeKey> {
        self.friend_kind
    }

    fn same_type(&self, a: &TypeKey, b: &TypeKey) -> bool {
        self.canonical(*a) == self.canonical(*b)
    }

    fn display_type(&self, ty: &TypeKey) -> String {
        self.types[ty.0].name.clone()
    }

    fn display_method(&self, method: &MethodKey) -> String {
        self.methods[method.0].name.clone()
    }
}

pub fn friend(kind: TypeKey, granted: Option<TypeKey>) -> Attribute<TypeKey> {
    named(kind, vec![AttributeArgument::Type(granted)])
}

pub fn named(kind: TypeKey, arguments: Vec<AttributeArgument<TypeKey>>) -> Attribute<TypeKey> {
    Attribute {
        class: Some(kind),
        arguments,
    }
}

pub fn value(text: &str) -> AttributeArgument<TypeKey> {
    AttributeArgument::Value(text.to_string())
}

pub fn site(
    caller: Option<TypeKey>,
    callee: Option<MethodKey>,
    expression: &str,
) -> CallSite<TypeKey, MethodKey> {
    CallSite {
        caller,
        callee,
        location: Location::new("Program.cs", TextSpan::new(0, expression.len())),
        expression: expression.to_string(),
    }
}
