//! Traits and trait linearization
//!
//! A trait is declared once into a concrete trait class whose abstract methods
//! forward to the instance the trait is mixed into. Using traits on a class
//! builds one intermediate class per trait, stacked on top of the base in
//! declaration order:
//!
//! ```text
//! Base <- [T1 layer] <- [T2 layer] <- Own
//! ```
//!
//! Each layer owns a private slot holding the per-instance trait object and
//! exposes the trait's public and protected methods as proxies into it. A trait
//! method marked `abstract override` sees, as its super method, the method the
//! layer below provides, so stacked traits compose in declaration order.

use std::fmt;
use std::rc::Rc;

use crate::class::{assemble, Assembly, ClassRef, Definition, DefinitionKind};
use crate::engine::{Declared, Engine, TypeId};
use crate::error::{DeclarationError, EngineError, ValidationError, ANONYMOUS};
use crate::member::{MemberDescriptor, MemberKind, MemberTable, MemberValue, Modifiers, ProxyTarget, Visibility};
use crate::value::Value;

/// Shared handle to a declared trait
pub type TraitRef = Rc<TraitDescriptor>;

/// A declared trait
///
/// Traits are never instantiated directly; each instance of a class using the
/// trait owns one object of the trait's concrete class.
pub struct TraitDescriptor {
    id: TypeId,
    name: Option<String>,
    concrete: ClassRef,
}

impl TraitDescriptor {
    /// Type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Member table of the trait body
    pub fn table(&self) -> &Rc<MemberTable> {
        self.concrete.table()
    }

    /// Whether the trait declares a `__mixin` initializer
    pub fn has_mixin(&self) -> bool {
        self.concrete.constructor().is_some()
    }

    /// Abstract methods the consuming class must provide
    pub fn requirements(&self) -> impl Iterator<Item = &Rc<MemberDescriptor>> {
        self.table().members().filter(|m| m.is_unimplemented())
    }

    pub(crate) fn concrete(&self) -> &ClassRef {
        &self.concrete
    }
}

impl fmt::Debug for TraitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitDescriptor")
            .field("id", &self.id)
            .field("name", &self.display_name())
            .finish()
    }
}

/// When a trait's `__mixin` runs relative to the class constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixinTiming {
    /// Trait state exists before the class constructor runs
    BeforeConstructor,
    /// The class constructor runs first
    AfterConstructor,
}

/// One trait in a `use` list, with optional `__mixin` arguments
#[derive(Debug, Clone)]
pub struct TraitUse {
    pub(crate) trait_ref: TraitRef,
    pub(crate) args: Vec<Value>,
}

impl TraitUse {
    /// Use a trait without arguments
    pub fn new(trait_ref: &TraitRef) -> Self {
        TraitUse { trait_ref: Rc::clone(trait_ref), args: Vec::new() }
    }

    /// Pass arguments to the trait's `__mixin`
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }
}

impl From<&TraitRef> for TraitUse {
    fn from(trait_ref: &TraitRef) -> Self {
        TraitUse::new(trait_ref)
    }
}

/// Private slot of a class layer holding one trait object per instance
#[derive(Debug, Clone)]
pub(crate) struct TraitSlot {
    pub(crate) field: String,
    pub(crate) depth: usize,
    pub(crate) trait_ref: TraitRef,
    pub(crate) args: Vec<Value>,
    pub(crate) timing: MixinTiming,
}

/// Traits waiting for the class definition they are mixed into
///
/// Created by [`Engine::use_traits`] (bound to a base class) or
/// [`Engine::mix`] (unbound).
pub struct PartialClass<'e> {
    engine: &'e Engine,
    base: Option<ClassRef>,
    uses: Vec<TraitUse>,
}

impl<'e> PartialClass<'e> {
    pub(crate) fn new(engine: &'e Engine, base: Option<ClassRef>, uses: Vec<TraitUse>) -> Self {
        PartialClass { engine, base, uses }
    }

    /// Traits to be mixed in, in linearization order
    pub fn uses(&self) -> &[TraitUse] {
        &self.uses
    }

    /// Declare `def` on top of the bound base (if any) with the traits mixed in
    ///
    /// Every trait's `__mixin` runs before the class constructor.
    pub fn extend(self, def: Definition) -> Result<ClassRef, EngineError> {
        let base = self.base.clone();
        self.apply(base.as_ref(), def, MixinTiming::BeforeConstructor)
    }

    /// Declare `def` as a subtype of `base` with the traits mixed in between
    ///
    /// The class constructor runs before every trait's `__mixin`, so the
    /// subtype can prepare state the traits read. A base bound through
    /// [`Engine::use_traits`] is replaced by `base`.
    pub fn extend_from(self, base: &ClassRef, def: Definition) -> Result<ClassRef, EngineError> {
        self.apply(Some(base), def, MixinTiming::AfterConstructor)
    }

    fn apply(self, base: Option<&ClassRef>, def: Definition, timing: MixinTiming) -> Result<ClassRef, EngineError> {
        let mut current = base.cloned();
        for trait_use in &self.uses {
            current = Some(mix_layer(self.engine, current.as_ref(), trait_use, timing)?);
        }
        self.engine.declare_class(def, current.as_ref())
    }
}

/// Declare a trait
pub(crate) fn declare_trait(engine: &Engine, mut def: Definition) -> Result<TraitRef, EngineError> {
    if !def.take_interfaces().is_empty() {
        return Err(EngineError::declaration(
            def.name(),
            DeclarationError::InvalidSupertype { declared: "trait", supertype: "interface" },
        ));
    }

    let name = def.name().map(str::to_string);
    let def = def.with_kind(DefinitionKind::Trait);
    let concrete = assemble(engine, def, None, Assembly { trait_body: true, ..Assembly::default() })?;

    let descriptor = Rc::new(TraitDescriptor { id: engine.allocate_id(), name, concrete });
    tracing::debug!(
        name = descriptor.display_name(),
        id = descriptor.id.as_u32(),
        requirements = descriptor.requirements().count(),
        "declared trait"
    );
    engine.register(Declared::Trait(Rc::clone(&descriptor)));
    Ok(descriptor)
}

/// Build the intermediate class that mixes one trait onto `parent`
fn mix_layer(
    engine: &Engine,
    parent: Option<&ClassRef>,
    trait_use: &TraitUse,
    timing: MixinTiming,
) -> Result<ClassRef, EngineError> {
    let tr = &trait_use.trait_ref;
    if !trait_use.args.is_empty() && !tr.has_mixin() {
        return Err(EngineError::declaration(
            tr.name(),
            DeclarationError::MixinArguments { name: tr.display_name().to_string() },
        ));
    }

    let depth = parent.map_or(0, |p| p.depth() + 1);
    let field = format!("#trait{}", depth);

    let mut def = Definition::synthesized(tr.name().map(str::to_string))
        .descriptor(MemberDescriptor::property(field.clone(), Value::Null).with_visibility(Visibility::Private));

    for member in tr.table().members() {
        if member.kind != MemberKind::Method || member.visibility == Visibility::Private {
            continue;
        }

        if member.is_unimplemented() {
            let params = match &member.value {
                MemberValue::Abstract(params) => params.clone(),
                _ => Vec::new(),
            };
            def = def.descriptor(
                MemberDescriptor::abstract_method(member.name.clone(), params)
                    .with_visibility(member.visibility)
                    .with_modifiers(Modifiers { is_weak: true, ..Modifiers::default() }),
            );
            continue;
        }

        let stacked = member.is_abstract_override();
        // the layer below must supply an implementation, not another signature
        let has_super = parent
            .and_then(|p| p.template().method(&member.name))
            .map_or(false, |m| !m.is_abstract());
        if stacked && !has_super {
            return Err(EngineError::validation(
                tr.name(),
                ValidationError::AbstractOverrideWithoutSuper { member: member.name.clone() },
            ));
        }

        def = def.descriptor(MemberDescriptor {
            name: member.name.clone(),
            kind: MemberKind::Method,
            visibility: member.visibility,
            modifiers: Modifiers {
                is_proxy: true,
                is_override: member.modifiers.is_override,
                is_virtual: member.modifiers.is_virtual || stacked,
                ..Modifiers::default()
            },
            value: MemberValue::Proxy(ProxyTarget {
                property: field.clone(),
                method: member.name.clone(),
                via_trait: true,
            }),
            arity: member.arity,
        });
    }

    let slot = TraitSlot {
        field,
        depth,
        trait_ref: Rc::clone(tr),
        args: trait_use.args.clone(),
        timing,
    };
    assemble(engine, def, parent, Assembly { slot: Some(slot), conforms: vec![tr.id()], ..Assembly::default() })
}
