//! Object instances
//!
//! An [`Instance`] is a shared handle to one object: its class, its layered
//! state, and (for concrete trait objects) a weak link back to the instance the
//! trait is mixed into. The handle itself is the public view; protected and
//! private layers are only reachable through a [`Context`](crate::Context).

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::class::ClassRef;
use crate::context::{Context, Receiver};
use crate::engine::TypeId;
use crate::error::EngineError;
use crate::value::Value;
use crate::visibility::{InstanceState, Scope, SlotAccess};
use crate::wrap::SuperLink;

/// Global counter for generating unique instance IDs
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

fn generate_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) struct InstanceInner {
    id: u64,
    class: ClassRef,
    state: InstanceState,
    /// Set on concrete trait objects only
    mixer: Option<Weak<InstanceInner>>,
}

/// Handle to an object instance
#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

impl Instance {
    /// Allocate an instance of `class` with default state; no constructor runs
    pub(crate) fn allocate(class: &ClassRef, mixer: Option<&Instance>) -> Self {
        Instance(Rc::new(InstanceInner {
            id: generate_instance_id(),
            class: Rc::clone(class),
            state: class.template().instantiate(),
            mixer: mixer.map(|m| Rc::downgrade(&m.0)),
        }))
    }

    /// Unique instance ID
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Class of the instance
    pub fn class(&self) -> &ClassRef {
        &self.0.class
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether the instance's class is `class` or one of its subtypes
    pub fn is_instance_of(&self, class: &ClassRef) -> bool {
        self.0.class.inherits(class.id())
    }

    /// Whether the instance is of the given class, interface or trait
    pub fn is_a(&self, id: TypeId) -> bool {
        self.0.class.is_a(id)
    }

    /// Read a public property; unknown and non-public properties read as undefined
    pub fn get(&self, name: &str) -> Result<Value, EngineError> {
        self.read(name, Scope::External)
    }

    /// Write a public property
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        self.write(name, value.into(), Scope::External)
    }

    /// Call a public method
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        self.dispatch(name, args, Scope::External)
    }

    /// Whether a public method of this name exists
    pub fn has_method(&self, name: &str) -> bool {
        self.responds_to(name, Scope::External)
    }

    pub(crate) fn mixer(&self) -> Option<Instance> {
        self.0.mixer.as_ref().and_then(Weak::upgrade).map(Instance)
    }

    pub(crate) fn responds_to(&self, name: &str, scope: Scope) -> bool {
        let template = self.0.class.template();
        template
            .method(name)
            .map_or(false, |m| template.permits(scope, m.visibility(), m.owner_depth()))
    }

    pub(crate) fn read(&self, name: &str, scope: Scope) -> Result<Value, EngineError> {
        let template = self.0.class.template();
        let Some(slot) = template.property(name) else {
            return Ok(Value::Undefined);
        };
        if !template.permits(scope, slot.visibility, slot.owner_depth) {
            return Ok(Value::Undefined);
        }

        match &slot.access {
            SlotAccess::Field { layer, index } => Ok(self.0.state.read(*layer, *index)),
            SlotAccess::Accessor(accessor) => match &accessor.accessor.get {
                Some(get) => {
                    let receiver = Receiver::Instance(self.clone());
                    get(&Context::new(&receiver, accessor.owner_depth, None, None))
                }
                None => Ok(Value::Undefined),
            },
        }
    }

    pub(crate) fn write(&self, name: &str, value: Value, scope: Scope) -> Result<(), EngineError> {
        let template = self.0.class.template();
        let slot = template
            .property(name)
            .filter(|slot| template.permits(scope, slot.visibility, slot.owner_depth))
            .ok_or_else(|| EngineError::UnknownProperty {
                class: self.0.class.display_name().to_string(),
                member: name.to_string(),
            })?;

        match &slot.access {
            SlotAccess::Field { layer, index } => {
                self.0.state.write(*layer, *index, value);
                Ok(())
            }
            SlotAccess::Accessor(accessor) => match &accessor.accessor.set {
                Some(set) => {
                    let receiver = Receiver::Instance(self.clone());
                    set(&Context::new(&receiver, accessor.owner_depth, None, None), value)
                }
                None => Err(EngineError::ReadOnlyProperty { member: name.to_string() }),
            },
        }
    }

    pub(crate) fn dispatch(&self, name: &str, args: &[Value], scope: Scope) -> Result<Value, EngineError> {
        self.dispatch_linked(name, args, scope, None)
    }

    pub(crate) fn dispatch_linked(
        &self,
        name: &str,
        args: &[Value],
        scope: Scope,
        link: Option<&SuperLink>,
    ) -> Result<Value, EngineError> {
        let template = self.0.class.template();
        match template.method(name) {
            Some(method) if template.permits(scope, method.visibility(), method.owner_depth()) => {
                method.invoke(&Receiver::Instance(self.clone()), args, link)
            }
            _ => {
                let class = self.0.class.display_name().to_string();
                let visible_property = template
                    .property(name)
                    .map_or(false, |slot| template.permits(scope, slot.visibility, slot.owner_depth));
                if visible_property {
                    Err(EngineError::NotCallable { class, member: name.to_string() })
                } else {
                    Err(EngineError::UndefinedMethod { class, member: name.to_string() })
                }
            }
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.class.display_name(), self.0.id)
    }
}
