//! Class descriptors
//!
//! A [`ClassDescriptor`] is the sealed result of assembling one declaration:
//! its member table, compiled visibility template, static members, constructor
//! and the trait slots to fill at instantiation. Descriptors never change after
//! assembly and are shared behind [`ClassRef`].

mod assemble;
mod definition;
mod statics;

use std::fmt;
use std::rc::Rc;

pub(crate) use assemble::{assemble, is_reserved, Assembly};
pub use definition::{Definition, DefinitionKind, CONSTRUCTOR, MIXIN};
pub use statics::{StaticKind, StaticMember, StaticTable};

use crate::context::Receiver;
use crate::engine::TypeId;
use crate::error::{EngineError, ANONYMOUS};
use crate::instance::Instance;
use crate::member::MemberTable;
use crate::mixin::{MixinTiming, TraitRef, TraitSlot};
use crate::value::Value;
use crate::visibility::{Scope, VisibilityTemplate};
use crate::wrap::WrappedMethod;

/// Shared handle to a sealed class
pub type ClassRef = Rc<ClassDescriptor>;

/// A sealed class
pub struct ClassDescriptor {
    pub(crate) id: TypeId,
    pub(crate) name: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) is_final: bool,
    /// Non-owning reference, resolved through the engine
    pub(crate) supertype: Option<TypeId>,
    pub(crate) table: Rc<MemberTable>,
    pub(crate) template: VisibilityTemplate,
    pub(crate) statics: StaticTable,
    pub(crate) constructor: Option<Rc<WrappedMethod>>,
    pub(crate) trait_slots: Vec<TraitSlot>,
    /// Interfaces and traits this class conforms to
    pub(crate) conforms: Vec<TypeId>,
    /// Class ids from the root down to this class
    pub(crate) ancestry: Vec<TypeId>,
    pub(crate) abstract_members: Vec<String>,
}

impl ClassDescriptor {
    /// Type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages: the declared name or "(anonymous)"
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Whether the class cannot be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether the class cannot be extended
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Supertype id
    pub fn supertype(&self) -> Option<TypeId> {
        self.supertype
    }

    /// Depth in the inheritance chain (root = 0)
    pub fn depth(&self) -> usize {
        self.table.depth()
    }

    /// Member table of this declaration (linked to its supertype's)
    pub fn table(&self) -> &Rc<MemberTable> {
        &self.table
    }

    /// Compiled instance layout
    pub fn template(&self) -> &VisibilityTemplate {
        &self.template
    }

    /// Static members
    pub fn statics(&self) -> &StaticTable {
        &self.statics
    }

    /// Effective constructor (own or inherited)
    pub fn constructor(&self) -> Option<&Rc<WrappedMethod>> {
        self.constructor.as_ref()
    }

    /// Unresolved abstract methods, sorted by name
    pub fn abstract_members(&self) -> &[String] {
        &self.abstract_members
    }

    /// Number of unresolved abstract methods
    pub fn abstract_count(&self) -> usize {
        self.abstract_members.len()
    }

    /// Traits mixed into this class and its supertypes, in linearization order
    pub fn traits(&self) -> impl Iterator<Item = &TraitRef> {
        self.trait_slots.iter().map(|slot| &slot.trait_ref)
    }

    pub(crate) fn trait_slots(&self) -> &[TraitSlot] {
        &self.trait_slots
    }

    /// Class ids from the root down to this class
    pub fn ancestry(&self) -> &[TypeId] {
        &self.ancestry
    }

    /// Whether this class is `id` or a subtype of it
    pub fn inherits(&self, id: TypeId) -> bool {
        self.ancestry.contains(&id)
    }

    /// Whether this class is, extends, implements or uses `id`
    pub fn is_a(&self, id: TypeId) -> bool {
        self.inherits(id) || self.conforms.contains(&id)
    }

    /// Create an instance
    ///
    /// State is laid out from the template, trait objects are created and
    /// attached, and then the trait initializers and the constructor run in
    /// the order each trait use asked for.
    pub fn instantiate(self: &Rc<Self>, args: &[Value]) -> Result<Instance, EngineError> {
        if self.is_abstract {
            return Err(EngineError::AbstractInstantiation { class: self.display_name().to_string() });
        }

        let instance = Instance::allocate(self, None);
        for slot in &self.trait_slots {
            let object = Instance::allocate(slot.trait_ref.concrete(), Some(&instance));
            instance.write(&slot.field, Value::Object(object), Scope::Member(slot.depth))?;
        }

        self.run_mixins(&instance, MixinTiming::BeforeConstructor)?;
        if let Some(constructor) = &self.constructor {
            constructor.invoke(&Receiver::Instance(instance.clone()), args, None)?;
        }
        self.run_mixins(&instance, MixinTiming::AfterConstructor)?;

        tracing::debug!(class = self.display_name(), instance = instance.id(), "instantiated");
        Ok(instance)
    }

    fn run_mixins(&self, instance: &Instance, timing: MixinTiming) -> Result<(), EngineError> {
        for slot in self.trait_slots.iter().filter(|slot| slot.timing == timing) {
            let Some(initializer) = slot.trait_ref.concrete().constructor() else {
                continue;
            };
            if let Value::Object(object) = instance.read(&slot.field, Scope::Member(slot.depth))? {
                initializer.invoke(&Receiver::Instance(object), &slot.args, None)?;
            }
        }
        Ok(())
    }

    /// Read a public static property
    pub fn get_static(&self, name: &str) -> Result<Value, EngineError> {
        self.read_static(name, Scope::External)
    }

    /// Write a public static property
    pub fn set_static(&self, name: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        self.write_static(name, value.into(), Scope::External)
    }

    /// Call a public static method
    pub fn call_static(self: &Rc<Self>, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        self.dispatch_static(name, args, Scope::External)
    }

    pub(crate) fn read_static(&self, name: &str, scope: Scope) -> Result<Value, EngineError> {
        match self.statics.get(name) {
            Some(member) if self.template.permits(scope, member.visibility, member.owner_depth) => {
                match &member.kind {
                    StaticKind::Field { cell, .. } => Ok(cell.borrow().clone()),
                    StaticKind::Method(_) => Ok(Value::Undefined),
                }
            }
            _ => Ok(Value::Undefined),
        }
    }

    pub(crate) fn write_static(&self, name: &str, value: Value, scope: Scope) -> Result<(), EngineError> {
        let member = self
            .statics
            .get(name)
            .filter(|m| self.template.permits(scope, m.visibility, m.owner_depth));

        match member.map(|m| &m.kind) {
            Some(StaticKind::Field { is_const: true, .. }) => {
                Err(EngineError::ConstantAssignment { member: name.to_string() })
            }
            Some(StaticKind::Field { cell, .. }) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
            _ => Err(EngineError::UnknownProperty {
                class: self.display_name().to_string(),
                member: name.to_string(),
            }),
        }
    }

    pub(crate) fn dispatch_static(self: &Rc<Self>, name: &str, args: &[Value], scope: Scope) -> Result<Value, EngineError> {
        let member = self
            .statics
            .get(name)
            .filter(|m| self.template.permits(scope, m.visibility, m.owner_depth));

        match member.map(|m| &m.kind) {
            Some(StaticKind::Method(method)) => method.invoke(&Receiver::Class(Rc::clone(self)), args, None),
            Some(StaticKind::Field { .. }) => Err(EngineError::NotCallable {
                class: self.display_name().to_string(),
                member: name.to_string(),
            }),
            None => Err(EngineError::UndefinedMethod {
                class: self.display_name().to_string(),
                member: name.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("name", &self.display_name())
            .field("is_abstract", &self.is_abstract)
            .field("is_final", &self.is_final)
            .field("supertype", &self.supertype)
            .field("depth", &self.depth())
            .finish()
    }
}
