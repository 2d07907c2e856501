//! Strata Member Composition Engine
//!
//! Declares classes, abstract classes, interfaces and traits at runtime and
//! composes their members:
//! - **Members**: keyword keys (`"protected virtual render"`) classified into
//!   descriptors and collected into per-declaration member tables (`member`)
//! - **Validation**: override, visibility and arity rules checked against the
//!   supertype chain (`validate`)
//! - **Visibility**: layered instance state with one public, one protected and
//!   one private layer per class in the chain (`visibility`)
//! - **Wrapping**: methods wrapped as new, override, proxy or abstract, with
//!   `__super` reachable only through the call [`Context`] (`wrap`)
//! - **Traits**: stackable traits linearized into intermediate classes
//!   (`mixin`)
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_engine::{Definition, Engine, Value};
//!
//! let engine = Engine::new();
//! let cow = engine.declare_class(
//!     Definition::class("Cow")
//!         .property("protected _name", "Bessie")
//!         .method("public virtual speak", 0, |ctx, _| Ok(ctx.get("_name")?)),
//!     None,
//! )?;
//!
//! let bessie = engine.instantiate(&cow, &[])?;
//! assert_eq!(bessie.call("speak", &[])?, Value::from("Bessie"));
//! assert!(bessie.get("_name")?.is_undefined());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Declaration
// ============================================================================

/// Class descriptors, definitions and the assembler
pub mod class;

/// Interfaces and conformance layers
pub mod interface;

/// Member descriptors, key classification and member tables
pub mod member;

/// Traits and trait linearization
pub mod mixin;

/// Override and visibility validation
pub mod validate;

// ============================================================================
// Runtime
// ============================================================================

/// Execution context of method bodies
pub mod context;

/// Object instances
pub mod instance;

/// Dynamic values
pub mod value;

/// Layered instance state
pub mod visibility;

/// Method wrappers
pub mod wrap;

// ============================================================================
// Engine
// ============================================================================

/// Engine configuration
pub mod config;

/// Engine facade and type registry
pub mod engine;

/// Error types
pub mod error;

/// Validation warnings and handlers
pub mod warning;

// Re-export commonly used types
pub use class::{ClassDescriptor, ClassRef, Definition, DefinitionKind, CONSTRUCTOR, MIXIN};
pub use config::{ConfigError, EngineConfig, WarningPolicy};
pub use context::{Context, Receiver};
pub use engine::{Declared, Engine, TypeId};
pub use error::{DeclarationError, EngineError, ProxyFault, ProxyResolutionError, ValidationError};
pub use instance::Instance;
pub use interface::{InterfaceDescriptor, InterfaceRef};
pub use member::{Accessor, MemberDescriptor, MemberKind, MemberTable, Method, Modifiers, Visibility};
pub use mixin::{MixinTiming, PartialClass, TraitDescriptor, TraitRef, TraitUse};
pub use value::Value;
pub use visibility::Scope;
pub use warning::{CollectWarnings, DenyWarnings, DismissWarnings, LogWarnings, Warning, WarningHandler};
pub use wrap::WrappedMethod;
