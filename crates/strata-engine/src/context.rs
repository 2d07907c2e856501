//! Execution context handed to method bodies, getters and setters
//!
//! A [`Context`] is the `this` of a running member. It carries the receiver and
//! the depth of the class that declared the running member, so every access made
//! through it sees exactly the layers that class may see. The super method is
//! reachable only through the context, and the context only lives for the
//! duration of one call.

use std::rc::Rc;

use crate::class::ClassRef;
use crate::error::EngineError;
use crate::instance::Instance;
use crate::value::Value;
use crate::visibility::Scope;
use crate::wrap::{SuperLink, WrappedMethod};

/// Receiver of a call: an instance, or a class for static members
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Instance member call
    Instance(Instance),
    /// Static member call; the class the call was made through
    Class(ClassRef),
}

impl Receiver {
    /// Instance receiver, if any
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Receiver::Instance(instance) => Some(instance),
            Receiver::Class(_) => None,
        }
    }

    /// Class of the receiver
    pub fn class(&self) -> &ClassRef {
        match self {
            Receiver::Instance(instance) => instance.class(),
            Receiver::Class(class) => class,
        }
    }
}

/// `this` of a running method, getter or setter
pub struct Context<'a> {
    receiver: &'a Receiver,
    depth: usize,
    method: Option<&'a WrappedMethod>,
    link: Option<&'a SuperLink>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        receiver: &'a Receiver,
        depth: usize,
        method: Option<&'a WrappedMethod>,
        link: Option<&'a SuperLink>,
    ) -> Self {
        Context { receiver, depth, method, link }
    }

    /// Receiver of the call
    pub fn receiver(&self) -> &Receiver {
        self.receiver
    }

    /// Receiving instance (none inside static methods)
    pub fn instance(&self) -> Option<&Instance> {
        self.receiver.instance()
    }

    /// Receiver as a value, for returning `this` from fluent methods
    pub fn this_value(&self) -> Value {
        match self.receiver {
            Receiver::Instance(instance) => Value::Object(instance.clone()),
            Receiver::Class(_) => Value::Undefined,
        }
    }

    /// Class of the receiver
    pub fn class(&self) -> &ClassRef {
        self.receiver.class()
    }

    /// Running method, if the context belongs to a method
    pub fn method(&self) -> Option<&WrappedMethod> {
        self.method
    }

    /// Access scope of the running member
    pub fn scope(&self) -> Scope {
        Scope::Member(self.depth)
    }

    /// Read a property; hidden and unknown properties read as undefined.
    /// Inside static methods this reads static properties.
    pub fn get(&self, name: &str) -> Result<Value, EngineError> {
        match self.receiver {
            Receiver::Instance(instance) => instance.read(name, self.scope()),
            Receiver::Class(class) => class.read_static(name, self.scope()),
        }
    }

    /// Write a property
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        match self.receiver {
            Receiver::Instance(instance) => instance.write(name, value.into(), self.scope()),
            Receiver::Class(class) => class.write_static(name, value.into(), self.scope()),
        }
    }

    /// Call a method on the receiver
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        match self.receiver {
            Receiver::Instance(instance) => instance.dispatch(name, args, self.scope()),
            Receiver::Class(class) => class.dispatch_static(name, args, self.scope()),
        }
    }

    /// Whether `__super` is available to the running method
    pub fn has_super(&self) -> bool {
        self.method.map_or(false, |m| m.super_method().is_some())
            || self.link.map_or(false, |l| l.method.is_some())
    }

    /// Call `__super`: the implementation the running method overrides
    ///
    /// For a trait method that overrides a method of the class it is mixed
    /// into, this is the next method in the linearized chain of that class.
    pub fn call_super(&self, args: &[Value]) -> Result<Value, EngineError> {
        let method = self.method.ok_or_else(|| EngineError::NoSuperMethod {
            member: "(accessor)".to_string(),
        })?;

        if let Some(super_method) = method.super_method() {
            return super_method.invoke(self.receiver, args, None);
        }
        if let Some(SuperLink { method: Some(super_method), receiver }) = self.link {
            return super_method.invoke(&Receiver::Instance(receiver.clone()), args, None);
        }
        Err(EngineError::NoSuperMethod { member: method.name().to_string() })
    }

    /// Call a wrapped method held by reference (e.g. `method().super_method()`)
    /// on the current receiver
    ///
    /// Fails unless the method was declared somewhere in the receiver's chain.
    pub fn invoke(&self, method: &Rc<WrappedMethod>, args: &[Value]) -> Result<Value, EngineError> {
        let class = self.receiver.class();
        if !class.inherits(method.owner()) {
            return Err(EngineError::ForeignMethod {
                class: class.display_name().to_string(),
                member: method.name().to_string(),
            });
        }
        method.invoke(self.receiver, args, None)
    }

    /// Read a static property through the receiver's class
    pub fn get_static(&self, name: &str) -> Result<Value, EngineError> {
        self.receiver.class().read_static(name, self.scope())
    }

    /// Write a static property through the receiver's class
    pub fn set_static(&self, name: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        self.receiver.class().write_static(name, value.into(), self.scope())
    }

    /// Call a static method through the receiver's class
    pub fn call_static(&self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        self.receiver.class().dispatch_static(name, args, self.scope())
    }
}
