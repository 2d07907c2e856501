//! Member descriptors
//!
//! A [`MemberDescriptor`] is one classified declaration entry: its name, kind,
//! visibility, modifier set and value. Descriptors are created once while a
//! declaration is assembled and are immutable afterwards; member tables hand
//! them out behind `Rc` so subtypes can refer to the exact descriptor their
//! supertype declared.

pub mod keyword;
pub mod table;

use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::EngineError;
use crate::value::Value;

pub use keyword::{classify, Keyword};
pub use table::MemberTable;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Reachable from anywhere
    #[default]
    Public,
    /// Reachable from the declaring class and its subtypes
    Protected,
    /// Reachable from the declaring class only
    Private,
}

impl Visibility {
    /// Rank used for escalation checks; wider visibility has a lower rank
    pub fn rank(self) -> u8 {
        match self {
            Visibility::Public => 0,
            Visibility::Protected => 1,
            Visibility::Private => 2,
        }
    }

    /// Keyword spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Data property
    Property,
    /// Callable method
    Method,
    /// Accessor with a getter (and possibly a setter)
    Getter,
    /// Accessor with only a setter
    Setter,
}

impl MemberKind {
    /// Getters and setters form one family for override purposes
    pub fn is_accessor(self) -> bool {
        matches!(self, MemberKind::Getter | MemberKind::Setter)
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Property => f.write_str("property"),
            MemberKind::Method => f.write_str("method"),
            MemberKind::Getter | MemberKind::Setter => f.write_str("getter/setter"),
        }
    }
}

/// Modifier flags attached to a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Belongs to the class rather than to instances
    pub is_static: bool,
    /// Immutable class-level constant
    pub is_const: bool,
    /// Declared without an implementation
    pub is_abstract: bool,
    /// May be overridden by subtypes
    pub is_virtual: bool,
    /// Overrides a supertype member
    pub is_override: bool,
    /// Forwards calls to a destination object
    pub is_proxy: bool,
    /// May duplicate another declaration without conflict
    pub is_weak: bool,
}

impl Modifiers {
    /// Keywords that are set, in canonical order
    pub fn keywords(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        let flags = [
            (self.is_weak, "weak"),
            (self.is_static, "static"),
            (self.is_const, "const"),
            (self.is_abstract, "abstract"),
            (self.is_virtual, "virtual"),
            (self.is_override, "override"),
            (self.is_proxy, "proxy"),
        ];
        for (set, name) in flags {
            if set {
                out.push(name);
            }
        }
        out
    }
}

/// Signature of a method body
pub type MethodFn = dyn Fn(&Context<'_>, &[Value]) -> Result<Value, EngineError>;

/// Signature of a getter body
pub type GetterFn = dyn Fn(&Context<'_>) -> Result<Value, EngineError>;

/// Signature of a setter body
pub type SetterFn = dyn Fn(&Context<'_>, Value) -> Result<(), EngineError>;

/// A concrete method body with its declared parameter count
#[derive(Clone)]
pub struct Method {
    pub(crate) body: Rc<MethodFn>,
    pub(crate) arity: usize,
}

impl Method {
    /// Create a method from a closure taking `arity` declared parameters
    pub fn new<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&Context<'_>, &[Value]) -> Result<Value, EngineError> + 'static,
    {
        Method { body: Rc::new(body), arity }
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method(arity={})", self.arity)
    }
}

/// Getter/setter pair
#[derive(Clone, Default)]
pub struct Accessor {
    pub(crate) get: Option<Rc<GetterFn>>,
    pub(crate) set: Option<Rc<SetterFn>>,
}

impl Accessor {
    /// Create an empty accessor
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a getter
    pub fn getter<F>(mut self, get: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Value, EngineError> + 'static,
    {
        self.get = Some(Rc::new(get));
        self
    }

    /// Attach a setter
    pub fn setter<F>(mut self, set: F) -> Self
    where
        F: Fn(&Context<'_>, Value) -> Result<(), EngineError> + 'static,
    {
        self.set = Some(Rc::new(set));
        self
    }

    /// Whether a getter is present
    pub fn has_getter(&self) -> bool {
        self.get.is_some()
    }

    /// Whether a setter is present
    pub fn has_setter(&self) -> bool {
        self.set.is_some()
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

/// Where a proxy method forwards its calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Property holding the destination object
    pub property: String,
    /// Method invoked on the destination
    pub method: String,
    /// Destination is a concrete trait object owned by the receiver
    pub(crate) via_trait: bool,
}

/// Raw value half of a declaration entry, before classification
#[derive(Debug, Clone)]
pub enum RawValue {
    /// Plain value (property default, or proxy destination name)
    Value(Value),
    /// Method body
    Method(Method),
    /// Parameter list of an abstract method
    Params(Vec<String>),
    /// Getter and/or setter
    Accessor(Accessor),
}

impl RawValue {
    /// Parameter list for an abstract method signature
    pub fn params<S: AsRef<str>>(names: &[S]) -> Self {
        RawValue::Params(names.iter().map(|n| n.as_ref().to_string()).collect())
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::Value(value)
    }
}

impl From<Method> for RawValue {
    fn from(method: Method) -> Self {
        RawValue::Method(method)
    }
}

impl From<Accessor> for RawValue {
    fn from(accessor: Accessor) -> Self {
        RawValue::Accessor(accessor)
    }
}

/// Classified member value
#[derive(Debug, Clone)]
pub enum MemberValue {
    /// Property default
    Property(Value),
    /// Concrete method body
    Method(Method),
    /// Abstract method; parameter names only
    Abstract(Vec<String>),
    /// Proxy method
    Proxy(ProxyTarget),
    /// Getter/setter
    Accessor(Accessor),
}

/// One declared member
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Visibility (public unless declared otherwise)
    pub visibility: Visibility,
    /// Modifier set
    pub modifiers: Modifiers,
    /// Value or callable
    pub value: MemberValue,
    /// Declared parameter count; `None` for non-methods and external proxies
    pub arity: Option<usize>,
}

impl MemberDescriptor {
    /// Public property
    pub fn property(name: impl Into<String>, default: Value) -> Self {
        MemberDescriptor {
            name: name.into(),
            kind: MemberKind::Property,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            value: MemberValue::Property(default),
            arity: None,
        }
    }

    /// Public concrete method
    pub fn method(name: impl Into<String>, method: Method) -> Self {
        let arity = Some(method.arity);
        MemberDescriptor {
            name: name.into(),
            kind: MemberKind::Method,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            value: MemberValue::Method(method),
            arity,
        }
    }

    /// Public abstract method
    pub fn abstract_method(name: impl Into<String>, params: Vec<String>) -> Self {
        let arity = Some(params.len());
        MemberDescriptor {
            name: name.into(),
            kind: MemberKind::Method,
            visibility: Visibility::Public,
            modifiers: Modifiers { is_abstract: true, ..Modifiers::default() },
            value: MemberValue::Abstract(params),
            arity,
        }
    }

    /// Public proxy method forwarding to `property.name(...)`
    pub fn proxy(name: impl Into<String>, property: impl Into<String>) -> Self {
        let name = name.into();
        MemberDescriptor {
            value: MemberValue::Proxy(ProxyTarget {
                property: property.into(),
                method: name.clone(),
                via_trait: false,
            }),
            name,
            kind: MemberKind::Method,
            visibility: Visibility::Public,
            modifiers: Modifiers { is_proxy: true, ..Modifiers::default() },
            arity: None,
        }
    }

    /// Public getter/setter
    pub fn accessor(name: impl Into<String>, accessor: Accessor) -> Self {
        let kind = if accessor.has_getter() { MemberKind::Getter } else { MemberKind::Setter };
        MemberDescriptor {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            value: MemberValue::Accessor(accessor),
            arity: None,
        }
    }

    /// Replace the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Replace the modifier set
    ///
    /// The `abstract` and `proxy` flags follow the value and are kept.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        let is_abstract = self.modifiers.is_abstract;
        let is_proxy = self.modifiers.is_proxy;
        self.modifiers = Modifiers {
            is_abstract: modifiers.is_abstract || is_abstract,
            is_proxy: modifiers.is_proxy || is_proxy,
            ..modifiers
        };
        self
    }

    /// Is this an abstract method
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract
    }

    /// Is this an instance-level member
    pub fn is_instance(&self) -> bool {
        !self.modifiers.is_static && !self.modifiers.is_const
    }

    /// Abstract override with a body: a stackable trait override that needs a
    /// super implementation at mix time
    pub fn is_abstract_override(&self) -> bool {
        self.modifiers.is_abstract
            && self.modifiers.is_override
            && matches!(self.value, MemberValue::Method(_))
    }

    /// Abstract with no implementation at all
    pub fn is_unimplemented(&self) -> bool {
        matches!(self.value, MemberValue::Abstract(_))
    }
}
