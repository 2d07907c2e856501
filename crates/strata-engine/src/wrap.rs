//! Method wrapper strategies
//!
//! Every callable member is stored as a [`WrappedMethod`]. The wrapper records
//! where the method was declared (owner class and chain depth), which decides
//! the private layer its body can see, and how a call is carried out:
//!
//! - `New`: run the body against the receiver
//! - `Override`: as `New`, with the supertype method reachable via `__super`
//! - `Proxy`: forward to a method of an object held in a property
//! - `MixerForward`: inside a trait, forward an abstract requirement to the
//!   instance the trait is mixed into
//! - `Abstract`: no body; calling it is an error

use std::fmt;
use std::rc::Rc;

use crate::context::{Context, Receiver};
use crate::engine::TypeId;
use crate::error::{EngineError, ProxyFault, ProxyResolutionError};
use crate::instance::Instance;
use crate::member::{MemberDescriptor, Method, ProxyTarget, Visibility};
use crate::value::Value;
use crate::visibility::Scope;

/// Declaration site of a method
#[derive(Debug, Clone)]
pub struct MethodSite {
    /// Method name
    pub name: String,
    /// Declared parameter count, when known
    pub arity: Option<usize>,
    /// Visibility
    pub visibility: Visibility,
    /// Class-level method
    pub is_static: bool,
    /// May be overridden
    pub is_virtual: bool,
    /// Declaring class
    pub owner: TypeId,
    /// Depth of the declaring class in its chain
    pub owner_depth: usize,
}

impl MethodSite {
    /// Site of a classified member declared by `owner` at `owner_depth`
    pub fn of(desc: &MemberDescriptor, owner: TypeId, owner_depth: usize) -> Self {
        MethodSite {
            name: desc.name.clone(),
            arity: desc.arity,
            visibility: desc.visibility,
            is_static: desc.modifiers.is_static,
            is_virtual: desc.modifiers.is_virtual,
            owner,
            owner_depth,
        }
    }
}

pub(crate) enum WrapKind {
    New(Method),
    Override(Method),
    Proxy(ProxyTarget),
    MixerForward,
    Abstract,
}

/// Super method of a trait method, bound to the instance the trait is mixed into
pub(crate) struct SuperLink {
    pub(crate) method: Option<Rc<WrappedMethod>>,
    pub(crate) receiver: Instance,
}

/// A callable member ready for dispatch
pub struct WrappedMethod {
    site: MethodSite,
    kind: WrapKind,
    super_method: Option<Rc<WrappedMethod>>,
}

/// Wrap a method that has no supertype implementation
pub fn wrap_new(site: MethodSite, body: Method) -> WrappedMethod {
    WrappedMethod { site, kind: WrapKind::New(body), super_method: None }
}

/// Wrap a method overriding `super_method`
pub fn wrap_override(site: MethodSite, body: Method, super_method: Rc<WrappedMethod>) -> WrappedMethod {
    WrappedMethod { site, kind: WrapKind::Override(body), super_method: Some(super_method) }
}

/// Wrap a proxy method
///
/// `super_method` is only used by proxies into trait objects, where it becomes
/// the super method seen by the trait's implementation.
pub fn wrap_proxy(
    site: MethodSite,
    target: ProxyTarget,
    super_method: Option<Rc<WrappedMethod>>,
) -> WrappedMethod {
    WrappedMethod { site, kind: WrapKind::Proxy(target), super_method }
}

/// Placeholder for an abstract method
pub fn wrap_abstract(site: MethodSite) -> WrappedMethod {
    WrappedMethod { site, kind: WrapKind::Abstract, super_method: None }
}

pub(crate) fn wrap_mixer_forward(site: MethodSite) -> WrappedMethod {
    WrappedMethod { site, kind: WrapKind::MixerForward, super_method: None }
}

impl WrappedMethod {
    /// Method name
    pub fn name(&self) -> &str {
        &self.site.name
    }

    /// Declared parameter count
    pub fn arity(&self) -> Option<usize> {
        self.site.arity
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.site.visibility
    }

    /// Class-level method
    pub fn is_static(&self) -> bool {
        self.site.is_static
    }

    /// May be overridden
    pub fn is_virtual(&self) -> bool {
        self.site.is_virtual
    }

    /// Has no implementation
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, WrapKind::Abstract)
    }

    /// Forwards to a destination object
    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, WrapKind::Proxy(_))
    }

    /// Declaring class
    pub fn owner(&self) -> TypeId {
        self.site.owner
    }

    /// Depth of the declaring class
    pub fn owner_depth(&self) -> usize {
        self.site.owner_depth
    }

    /// Supertype implementation, if this method overrides one
    pub fn super_method(&self) -> Option<&Rc<WrappedMethod>> {
        self.super_method.as_ref()
    }

    pub(crate) fn invoke(
        &self,
        receiver: &Receiver,
        args: &[Value],
        link: Option<&SuperLink>,
    ) -> Result<Value, EngineError> {
        match &self.kind {
            WrapKind::New(method) | WrapKind::Override(method) => {
                let ctx = Context::new(receiver, self.site.owner_depth, Some(self), link);
                (method.body)(&ctx, args)
            }
            WrapKind::Proxy(target) => self.forward(receiver, target, args),
            WrapKind::MixerForward => {
                let mixer = receiver
                    .instance()
                    .and_then(Instance::mixer)
                    .ok_or_else(|| EngineError::DetachedMixin { member: self.site.name.clone() })?;
                mixer.dispatch(&self.site.name, args, Scope::Mixin)
            }
            WrapKind::Abstract => Err(EngineError::AbstractCall { member: self.site.name.clone() }),
        }
    }

    fn forward(&self, receiver: &Receiver, target: &ProxyTarget, args: &[Value]) -> Result<Value, EngineError> {
        let scope = Scope::Member(self.site.owner_depth);
        let destination = match receiver {
            Receiver::Instance(instance) if !self.site.is_static => instance.read(&target.property, scope)?,
            _ => receiver.class().read_static(&target.property, scope)?,
        };

        let object = match destination {
            Value::Object(object) => object,
            Value::Undefined => return Err(unresolved(target, ProxyFault::MissingDestination)),
            other => return Err(unresolved(target, ProxyFault::NotAnObject { found: other.type_name() })),
        };

        let result = match (target.via_trait, receiver.instance()) {
            (true, Some(mixer)) => {
                if !object.responds_to(&target.method, Scope::Mixin) {
                    return Err(unresolved(target, ProxyFault::NotCallable));
                }
                let link = SuperLink { method: self.super_method.clone(), receiver: mixer.clone() };
                object.dispatch_linked(&target.method, args, Scope::Mixin, Some(&link))?
            }
            _ => {
                if !object.responds_to(&target.method, Scope::External) {
                    return Err(unresolved(target, ProxyFault::NotCallable));
                }
                object.dispatch(&target.method, args, Scope::External)?
            }
        };

        // never hand the destination object itself back to the caller
        match (&result, receiver) {
            (Value::Object(returned), Receiver::Instance(me)) if returned.ptr_eq(&object) => {
                Ok(Value::Object(me.clone()))
            }
            _ => Ok(result),
        }
    }
}

fn unresolved(target: &ProxyTarget, fault: ProxyFault) -> EngineError {
    EngineError::ProxyResolution(ProxyResolutionError {
        property: target.property.clone(),
        method: target.method.clone(),
        fault,
    })
}

impl fmt::Debug for WrappedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            WrapKind::New(_) => "new",
            WrapKind::Override(_) => "override",
            WrapKind::Proxy(_) => "proxy",
            WrapKind::MixerForward => "mixer",
            WrapKind::Abstract => "abstract",
        };
        f.debug_struct("WrappedMethod")
            .field("name", &self.site.name)
            .field("kind", &kind)
            .field("visibility", &self.site.visibility)
            .field("owner", &self.site.owner)
            .field("owner_depth", &self.site.owner_depth)
            .finish()
    }
}
