//! Engine facade and type registry
//!
//! The [`Engine`] owns configuration, the warning handler and the registry of
//! every class, trait and interface it declared. Declarations refer to their
//! supertypes by [`TypeId`]; the registry resolves ids back to descriptors.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::class::{ClassRef, Definition, DefinitionKind};
use crate::config::EngineConfig;
use crate::error::{DeclarationError, EngineError};
use crate::instance::Instance;
use crate::interface::{conformance_layer, declare_interface, InterfaceRef};
use crate::mixin::{declare_trait, PartialClass, TraitRef, TraitUse};
use crate::value::Value;
use crate::warning::WarningHandler;

/// Identifier of a declared class, trait or interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// Raw id
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a declaration
#[derive(Debug, Clone)]
pub enum Declared {
    /// A class (possibly abstract)
    Class(ClassRef),
    /// A trait
    Trait(TraitRef),
    /// An interface
    Interface(InterfaceRef),
}

impl Declared {
    /// Type id
    pub fn id(&self) -> TypeId {
        match self {
            Declared::Class(class) => class.id(),
            Declared::Trait(tr) => tr.id(),
            Declared::Interface(interface) => interface.id(),
        }
    }

    /// Declared name
    pub fn name(&self) -> Option<&str> {
        match self {
            Declared::Class(class) => class.name(),
            Declared::Trait(tr) => tr.name(),
            Declared::Interface(interface) => interface.name(),
        }
    }

    /// "class", "trait" or "interface"
    pub fn sort(&self) -> &'static str {
        match self {
            Declared::Class(_) => "class",
            Declared::Trait(_) => "trait",
            Declared::Interface(_) => "interface",
        }
    }

    /// The class, if this is one
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Declared::Class(class) => Some(class),
            _ => None,
        }
    }

    /// The trait, if this is one
    pub fn as_trait(&self) -> Option<&TraitRef> {
        match self {
            Declared::Trait(tr) => Some(tr),
            _ => None,
        }
    }

    /// The interface, if this is one
    pub fn as_interface(&self) -> Option<&InterfaceRef> {
        match self {
            Declared::Interface(interface) => Some(interface),
            _ => None,
        }
    }
}

/// Registry of declared types, indexed by id
#[derive(Debug, Default)]
pub struct TypeRegistry {
    next_id: u32,
    types: FxHashMap<TypeId, Declared>,
}

impl TypeRegistry {
    fn allocate(&mut self) -> TypeId {
        let id = TypeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn register(&mut self, declared: Declared) {
        self.types.insert(declared.id(), declared);
    }

    /// Look up a declared type
    pub fn get(&self, id: TypeId) -> Option<&Declared> {
        self.types.get(&id)
    }

    /// Number of registered types, synthesized layers included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Declares classes, traits and interfaces and creates instances
pub struct Engine {
    config: EngineConfig,
    warnings: Box<dyn WarningHandler>,
    registry: RefCell<TypeRegistry>,
}

impl Engine {
    /// Engine with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with the given configuration; warnings go to the handler
    /// selected by `config.warnings`
    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            warnings: config.warnings.handler(),
            config,
            registry: RefCell::new(TypeRegistry::default()),
        }
    }

    /// Replace the warning handler
    pub fn with_warning_handler(mut self, handler: impl WarningHandler + 'static) -> Self {
        self.warnings = Box::new(handler);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn warnings(&self) -> &dyn WarningHandler {
        self.warnings.as_ref()
    }

    pub(crate) fn allocate_id(&self) -> TypeId {
        self.registry.borrow_mut().allocate()
    }

    pub(crate) fn register(&self, declared: Declared) {
        self.registry.borrow_mut().register(declared);
    }

    /// Declare whatever `def` describes, extending `supertype` if given
    pub fn declare(&self, def: Definition, supertype: Option<&Declared>) -> Result<Declared, EngineError> {
        let kind = def.kind();
        match (kind, supertype) {
            (DefinitionKind::Trait, None) => self.declare_trait(def).map(Declared::Trait),
            (DefinitionKind::Interface, None) => self.declare_interface(def, None).map(Declared::Interface),
            (DefinitionKind::Interface, Some(Declared::Interface(parent))) => {
                self.declare_interface(def, Some(parent)).map(Declared::Interface)
            }
            (_, None) => self.declare_class(def, None).map(Declared::Class),
            (_, Some(Declared::Class(parent))) if kind.is_class() => {
                self.declare_class(def, Some(parent)).map(Declared::Class)
            }
            (_, Some(other)) => Err(EngineError::declaration(
                def.name(),
                DeclarationError::InvalidSupertype { declared: kind.as_str(), supertype: other.sort() },
            )),
        }
    }

    /// Declare a class, extending `parent` if given
    pub fn declare_class(&self, mut def: Definition, parent: Option<&ClassRef>) -> Result<ClassRef, EngineError> {
        if !def.kind().is_class() {
            return Err(EngineError::declaration(
                def.name(),
                DeclarationError::InvalidSupertype { declared: def.kind().as_str(), supertype: "class" },
            ));
        }

        let interfaces = def.take_interfaces();
        if interfaces.is_empty() {
            return crate::class::assemble(self, def, parent, Default::default());
        }

        let layer = conformance_layer(self, parent, def.name(), &interfaces)?;
        crate::class::assemble(self, def, Some(&layer), Default::default())
    }

    /// Declare a trait
    pub fn declare_trait(&self, def: Definition) -> Result<TraitRef, EngineError> {
        declare_trait(self, def)
    }

    /// Declare an interface, extending `parent` if given
    pub fn declare_interface(&self, def: Definition, parent: Option<&InterfaceRef>) -> Result<InterfaceRef, EngineError> {
        declare_interface(self, def, parent)
    }

    /// Create an instance of `class`
    pub fn instantiate(&self, class: &ClassRef, args: &[Value]) -> Result<Instance, EngineError> {
        class.instantiate(args)
    }

    /// Whether `declared` cannot be instantiated
    pub fn is_abstract(&self, declared: &Declared) -> bool {
        match declared {
            Declared::Class(class) => class.is_abstract(),
            Declared::Trait(_) | Declared::Interface(_) => true,
        }
    }

    /// Mix traits into a subtype of `class`; finish with
    /// [`PartialClass::extend`]
    pub fn use_traits<I>(&self, class: &ClassRef, uses: I) -> PartialClass<'_>
    where
        I: IntoIterator,
        I::Item: Into<TraitUse>,
    {
        PartialClass::new(self, Some(class.clone()), uses.into_iter().map(Into::into).collect())
    }

    /// Mix traits into a class that is not declared yet; finish with
    /// [`PartialClass::extend`] or [`PartialClass::extend_from`]
    pub fn mix<I>(&self, uses: I) -> PartialClass<'_>
    where
        I: IntoIterator,
        I::Item: Into<TraitUse>,
    {
        PartialClass::new(self, None, uses.into_iter().map(Into::into).collect())
    }

    /// Look up a declared type
    pub fn lookup(&self, id: TypeId) -> Option<Declared> {
        self.registry.borrow().get(id).cloned()
    }

    /// Look up a declared class
    pub fn class(&self, id: TypeId) -> Option<ClassRef> {
        match self.lookup(id) {
            Some(Declared::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// Resolve the supertype of `class`
    pub fn supertype(&self, class: &ClassRef) -> Option<ClassRef> {
        class.supertype().and_then(|id| self.class(id))
    }

    /// Whether `instance` is, extends, implements or uses `declared`
    pub fn is_a(&self, instance: &Instance, declared: &Declared) -> bool {
        instance.is_a(declared.id())
    }

    /// Number of registered types, synthesized layers included
    pub fn type_count(&self) -> usize {
        self.registry.borrow().len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
