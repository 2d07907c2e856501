//! Declaration builder
//!
//! A [`Definition`] collects the members of one class, trait or interface
//! declaration. Members are given either as keyword keys
//! (`"protected virtual render"`) or as ready-made [`MemberDescriptor`]s; keys
//! are classified once, when the definition is declared.

use crate::context::Context;
use crate::error::{DeclarationError, EngineError};
use crate::interface::InterfaceRef;
use crate::member::{classify, Accessor, MemberDescriptor, Method, RawValue};
use crate::value::Value;

/// Name of the constructor member
pub const CONSTRUCTOR: &str = "__construct";

/// Name of the trait initializer member
pub const MIXIN: &str = "__mixin";

/// What a definition declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefinitionKind {
    /// Concrete (or implicitly abstract) class
    #[default]
    Class,
    /// Explicitly abstract class
    Abstract,
    /// Class that cannot be extended
    Final,
    /// Trait
    Trait,
    /// Interface
    Interface,
}

impl DefinitionKind {
    /// Human-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Class => "class",
            DefinitionKind::Abstract => "abstract class",
            DefinitionKind::Final => "final class",
            DefinitionKind::Trait => "trait",
            DefinitionKind::Interface => "interface",
        }
    }

    /// Class, abstract class or final class
    pub fn is_class(self) -> bool {
        matches!(self, DefinitionKind::Class | DefinitionKind::Abstract | DefinitionKind::Final)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Keyed { key: String, value: RawValue },
    Descriptor(MemberDescriptor),
}

/// Member list of one declaration
#[derive(Debug, Clone, Default)]
pub struct Definition {
    name: Option<String>,
    kind: DefinitionKind,
    entries: Vec<Entry>,
    implements: Vec<InterfaceRef>,
    /// Generated by the engine; may use `#` names
    pub(crate) synthesized: bool,
}

impl Definition {
    /// Named class
    pub fn class(name: impl Into<String>) -> Self {
        Definition { name: Some(name.into()), ..Self::default() }
    }

    /// Anonymous class
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Named abstract class
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::class(name).with_kind(DefinitionKind::Abstract)
    }

    /// Named final class
    pub fn final_class(name: impl Into<String>) -> Self {
        Self::class(name).with_kind(DefinitionKind::Final)
    }

    /// Named trait
    pub fn new_trait(name: impl Into<String>) -> Self {
        Self::class(name).with_kind(DefinitionKind::Trait)
    }

    /// Named interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::class(name).with_kind(DefinitionKind::Interface)
    }

    pub(crate) fn synthesized(name: Option<String>) -> Self {
        Definition { name, synthesized: true, ..Self::default() }
    }

    /// Change what the definition declares
    pub fn with_kind(mut self, kind: DefinitionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Declaration name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// What the definition declares
    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    /// Number of member entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the definition has no member entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a member by keyword key, e.g. `"protected static count"`
    pub fn member(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.entries.push(Entry::Keyed { key: key.into(), value: value.into() });
        self
    }

    /// Add a property
    pub fn property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.member(key, RawValue::Value(value.into()))
    }

    /// Add a method taking `arity` declared parameters
    pub fn method<F>(self, key: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(&Context<'_>, &[Value]) -> Result<Value, EngineError> + 'static,
    {
        self.member(key, Method::new(arity, body))
    }

    /// Add an abstract method signature
    pub fn signature(self, key: impl Into<String>, params: &[&str]) -> Self {
        self.member(key, RawValue::params(params))
    }

    /// Add a getter
    pub fn getter<F>(self, key: impl Into<String>, get: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Value, EngineError> + 'static,
    {
        self.member(key, Accessor::new().getter(get))
    }

    /// Add a setter
    pub fn setter<F>(self, key: impl Into<String>, set: F) -> Self
    where
        F: Fn(&Context<'_>, Value) -> Result<(), EngineError> + 'static,
    {
        self.member(key, Accessor::new().setter(set))
    }

    /// Add a getter/setter pair
    pub fn accessor(self, key: impl Into<String>, accessor: Accessor) -> Self {
        self.member(key, accessor)
    }

    /// Add the constructor
    pub fn constructor<F>(self, arity: usize, body: F) -> Self
    where
        F: Fn(&Context<'_>, &[Value]) -> Result<Value, EngineError> + 'static,
    {
        self.member(CONSTRUCTOR, Method::new(arity, body))
    }

    /// Add the trait initializer
    pub fn mixin<F>(self, arity: usize, body: F) -> Self
    where
        F: Fn(&Context<'_>, &[Value]) -> Result<Value, EngineError> + 'static,
    {
        self.member(MIXIN, Method::new(arity, body))
    }

    /// Add a ready-made descriptor
    pub fn descriptor(mut self, desc: MemberDescriptor) -> Self {
        self.entries.push(Entry::Descriptor(desc));
        self
    }

    /// Declare conformance to an interface
    pub fn implements(mut self, interface: &InterfaceRef) -> Self {
        self.implements.push(interface.clone());
        self
    }

    /// Interfaces this definition implements
    pub fn interfaces(&self) -> &[InterfaceRef] {
        &self.implements
    }

    pub(crate) fn take_interfaces(&mut self) -> Vec<InterfaceRef> {
        std::mem::take(&mut self.implements)
    }

    /// Classify every entry, in declaration order
    pub(crate) fn classify(self) -> Result<Classified, DeclarationError> {
        let members = self
            .entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Keyed { key, value } => classify(&key, value),
                Entry::Descriptor(desc) => Ok(desc),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Classified {
            name: self.name,
            kind: self.kind,
            synthesized: self.synthesized,
            members,
        })
    }
}

/// A definition after key classification
pub(crate) struct Classified {
    pub(crate) name: Option<String>,
    pub(crate) kind: DefinitionKind,
    pub(crate) synthesized: bool,
    pub(crate) members: Vec<MemberDescriptor>,
}
