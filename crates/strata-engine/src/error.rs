//! Error types for declaration, validation and instantiation
//!
//! Declaration and validation errors are raised while a class, trait or
//! interface is assembled and are always fatal for that declaration. The
//! remaining [`EngineError`] variants are raised at instantiation or call time.

use thiserror::Error;

use crate::member::{MemberKind, Visibility};
use crate::warning::Warning;

/// Name used in messages for declarations without a name
pub const ANONYMOUS: &str = "(anonymous)";

/// Malformed declarations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeclarationError {
    /// Key contains characters that are neither keywords nor identifiers
    #[error("Malformed member declaration '{key}'")]
    MalformedKey {
        /// Raw key
        key: String,
    },

    /// Key has keywords but no member name
    #[error("Member declaration '{key}' is missing a name")]
    MissingName {
        /// Raw key
        key: String,
    },

    /// Unrecognized keyword
    #[error("Unexpected keyword '{keyword}' for member '{member}'")]
    UnknownKeyword {
        /// Offending keyword
        keyword: String,
        /// Member name
        member: String,
    },

    /// Keyword repeated in one key
    #[error("Keyword '{keyword}' repeated for member '{member}'")]
    DuplicateKeyword {
        /// Repeated keyword
        keyword: String,
        /// Member name
        member: String,
    },

    /// More than one of public/protected/private
    #[error("Only one access modifier may be used for definition of '{member}'")]
    MultipleAccessModifiers {
        /// Member name
        member: String,
    },

    /// Value does not fit the declared member shape
    #[error("Invalid value for member '{member}': {reason}")]
    InvalidValue {
        /// Member name
        member: String,
        /// What was expected
        reason: String,
    },

    /// Name declared twice in one declaration
    #[error("Member '{member}' conflicts with another member of the same declaration")]
    Conflict {
        /// Member name
        member: String,
    },

    /// Name reserved by the engine
    #[error("Cannot declare reserved member '{member}'")]
    ReservedName {
        /// Member name
        member: String,
    },

    /// Reserved method declared with the wrong shape
    #[error("Reserved method '{member}' {requirement}")]
    ReservedShape {
        /// Member name
        member: String,
        /// Requirement that was violated
        requirement: &'static str,
    },

    /// Static getters and setters are not supported
    #[error("Static getter/setter '{member}' is not supported")]
    StaticAccessor {
        /// Member name
        member: String,
    },

    /// Traits initialize through `__mixin`
    #[error("Traits may not define __construct; use __mixin instead")]
    TraitConstructor,

    /// Traits only hold private state
    #[error("Traits may not declare {visibility} property '{member}'; only private state is permitted")]
    TraitProperty {
        /// Member name
        member: String,
        /// Declared visibility
        visibility: Visibility,
    },

    /// Traits do not carry static members
    #[error("Traits may not declare static member '{member}'")]
    TraitStatic {
        /// Member name
        member: String,
    },

    /// Interface members must be public abstract method signatures
    #[error("Interface member '{member}' {reason}")]
    InterfaceMember {
        /// Member name
        member: String,
        /// What was wrong
        reason: &'static str,
    },

    /// Supertype of the wrong sort (e.g. a class extending an interface)
    #[error("A {declared} cannot extend a {supertype}")]
    InvalidSupertype {
        /// Sort of the declaration
        declared: &'static str,
        /// Sort of the supertype
        supertype: &'static str,
    },

    /// Supertype is final
    #[error("Cannot extend final class {supertype}")]
    FinalSupertype {
        /// Name of the final supertype
        supertype: String,
    },

    /// Abstract declaration without anything abstract in it
    #[error("Class was declared as abstract, but contains no abstract members")]
    AbstractWithoutAbstractMembers,

    /// Concrete declaration that leaves abstract members unresolved
    #[error("Class contains {count} abstract member(s) and must therefore be declared abstract")]
    UnresolvedAbstractMembers {
        /// Number of unresolved abstract members
        count: usize,
    },

    /// A final class with abstract members can never be made concrete
    #[error("Final class cannot contain abstract member '{member}'")]
    FinalAbstract {
        /// First abstract member found
        member: String,
    },

    /// Arguments given to a trait that has no `__mixin`
    #[error("Trait {name} does not accept mixin arguments")]
    MixinArguments {
        /// Trait name
        name: String,
    },
}

impl DeclarationError {
    /// Offending member name, when the error is about one member
    pub fn member(&self) -> Option<&str> {
        match self {
            DeclarationError::UnknownKeyword { member, .. }
            | DeclarationError::DuplicateKeyword { member, .. }
            | DeclarationError::MultipleAccessModifiers { member }
            | DeclarationError::InvalidValue { member, .. }
            | DeclarationError::Conflict { member }
            | DeclarationError::ReservedName { member }
            | DeclarationError::ReservedShape { member, .. }
            | DeclarationError::StaticAccessor { member }
            | DeclarationError::TraitProperty { member, .. }
            | DeclarationError::TraitStatic { member }
            | DeclarationError::InterfaceMember { member, .. }
            | DeclarationError::FinalAbstract { member } => Some(member),
            DeclarationError::MalformedKey { .. }
            | DeclarationError::MissingName { .. }
            | DeclarationError::TraitConstructor
            | DeclarationError::InvalidSupertype { .. }
            | DeclarationError::FinalSupertype { .. }
            | DeclarationError::AbstractWithoutAbstractMembers
            | DeclarationError::UnresolvedAbstractMembers { .. }
            | DeclarationError::MixinArguments { .. } => None,
        }
    }
}

/// Override, visibility and arity violations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Member replaces a member of a different kind
    #[error("Cannot override {previous} '{member}' with {found}")]
    KindMismatch {
        /// Member name
        member: String,
        /// Kind of the supertype member
        previous: MemberKind,
        /// Kind of the new member
        found: MemberKind,
    },

    /// Static member replaces an instance member or the reverse
    #[error("Cannot override {previous} member '{member}' with {found} member")]
    StaticMismatch {
        /// Member name
        member: String,
        /// "static" or "instance"
        previous: &'static str,
        /// "static" or "instance"
        found: &'static str,
    },

    /// Modifier not allowed on this kind of member
    #[error("Cannot declare {kind} '{member}' as {modifier}")]
    ForbiddenModifier {
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
        /// Offending modifier
        modifier: &'static str,
    },

    /// Two modifiers that exclude each other
    #[error("Cannot combine '{first}' with '{second}' for {kind} '{member}'")]
    ModifierCombination {
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
        /// First modifier
        first: &'static str,
        /// Second modifier
        second: &'static str,
    },

    /// Supertype declared the name private
    #[error("Private member name '{member}' conflicts with supertype")]
    PrivateConflict {
        /// Member name
        member: String,
    },

    /// Visibility narrowed on override
    #[error("Cannot de-escalate visibility of {kind} '{member}' from {previous} to {found}")]
    Deescalation {
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
        /// Supertype visibility
        previous: Visibility,
        /// New visibility
        found: Visibility,
    },

    /// Supertype member is not virtual
    #[error("Cannot override non-virtual {kind} '{member}'")]
    NonVirtual {
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
    },

    /// Override without the `override` keyword
    #[error("Attempting to override {kind} '{member}' without 'override' keyword")]
    MissingOverride {
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
    },

    /// `abstract override` of something that is neither abstract nor virtual
    #[error("Cannot perform abstract override on non-abstract method '{member}'")]
    AbstractOverrideOfConcrete {
        /// Member name
        member: String,
    },

    /// `abstract override` mixed in where no super method exists
    #[error("Cannot mix in abstract override '{member}'; no super method exists")]
    AbstractOverrideWithoutSuper {
        /// Member name
        member: String,
    },

    /// Concrete method replaced by an abstract one
    #[error("Cannot override concrete method '{member}' with abstract method")]
    AbstractOverConcrete {
        /// Member name
        member: String,
    },

    /// Parameter list shorter than the supertype's
    #[error(
        "Declaration of method '{member}' must be compatible with that of its supertype: \
         expected at least {expected} parameter(s), found {found}"
    )]
    IncompatibleArity {
        /// Member name
        member: String,
        /// Supertype arity
        expected: usize,
        /// New arity
        found: usize,
    },

    /// Constants cannot be redeclared
    #[error("Cannot override constant '{member}'")]
    ConstantOverride {
        /// Member name
        member: String,
    },

    /// A warning the installed handler escalated to an error
    #[error("{warning}")]
    DeniedWarning {
        /// The escalated warning
        warning: Warning,
    },
}

impl ValidationError {
    /// Offending member name
    pub fn member(&self) -> &str {
        match self {
            ValidationError::KindMismatch { member, .. }
            | ValidationError::StaticMismatch { member, .. }
            | ValidationError::ForbiddenModifier { member, .. }
            | ValidationError::ModifierCombination { member, .. }
            | ValidationError::PrivateConflict { member }
            | ValidationError::Deescalation { member, .. }
            | ValidationError::NonVirtual { member, .. }
            | ValidationError::MissingOverride { member, .. }
            | ValidationError::AbstractOverrideOfConcrete { member }
            | ValidationError::AbstractOverrideWithoutSuper { member }
            | ValidationError::AbstractOverConcrete { member }
            | ValidationError::IncompatibleArity { member, .. }
            | ValidationError::ConstantOverride { member } => member,
            ValidationError::DeniedWarning { warning } => warning.member(),
        }
    }
}

/// Why a proxy could not reach its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyFault {
    /// Destination property is undefined or not visible
    MissingDestination,
    /// Destination property does not hold an object
    NotAnObject {
        /// Type of the value found instead
        found: &'static str,
    },
    /// Destination object has no such callable method
    NotCallable,
}

impl std::fmt::Display for ProxyFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyFault::MissingDestination => f.write_str("destination is undefined"),
            ProxyFault::NotAnObject { found } => write!(f, "destination is a {}, not an object", found),
            ProxyFault::NotCallable => f.write_str("destination method is not callable"),
        }
    }
}

/// Proxy destination could not be resolved at call time
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Unable to proxy {method}() call to '{property}': {fault}")]
pub struct ProxyResolutionError {
    /// Destination property
    pub property: String,
    /// Destination method
    pub method: String,
    /// Failure detail
    pub fault: ProxyFault,
}

/// Errors surfaced by the engine's public API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed declaration
    #[error("{error} (in {class})")]
    Declaration {
        /// Class, trait or interface name
        class: String,
        /// Underlying error
        error: DeclarationError,
    },

    /// Override/visibility/arity violation
    #[error("{error} (in {class})")]
    Validation {
        /// Class, trait or interface name
        class: String,
        /// Underlying error
        error: ValidationError,
    },

    /// Class still has abstract members
    #[error("Abstract class {class} cannot be instantiated")]
    AbstractInstantiation {
        /// Class name or "(anonymous)"
        class: String,
    },

    /// Proxy destination missing at call time
    #[error(transparent)]
    ProxyResolution(#[from] ProxyResolutionError),

    /// No visible method with this name
    #[error("Method '{member}' is not defined on {class}")]
    UndefinedMethod {
        /// Receiver class
        class: String,
        /// Method name
        member: String,
    },

    /// Name resolves to something that cannot be called
    #[error("'{member}' is not a function on {class}")]
    NotCallable {
        /// Receiver class
        class: String,
        /// Member name
        member: String,
    },

    /// Write to an undeclared or hidden property
    #[error("Property '{member}' is not defined on {class}")]
    UnknownProperty {
        /// Receiver class
        class: String,
        /// Property name
        member: String,
    },

    /// Write to a constant
    #[error("Cannot modify constant '{member}'")]
    ConstantAssignment {
        /// Constant name
        member: String,
    },

    /// Write to a getter-only accessor
    #[error("Cannot assign to getter-only property '{member}'")]
    ReadOnlyProperty {
        /// Property name
        member: String,
    },

    /// Super call with no super method
    #[error("Method '{member}' has no super method")]
    NoSuperMethod {
        /// Method name
        member: String,
    },

    /// Abstract method reached at call time
    #[error("Cannot call abstract method '{member}'")]
    AbstractCall {
        /// Method name
        member: String,
    },

    /// Wrapped method invoked on a receiver outside its class chain
    #[error("Method '{member}' does not belong to {class}")]
    ForeignMethod {
        /// Receiver class
        class: String,
        /// Method name
        member: String,
    },

    /// Trait object outlived the instance it was mixed into
    #[error("Trait object for '{member}' is detached from its mixer")]
    DetachedMixin {
        /// Method name
        member: String,
    },

    /// Error raised by a method body
    #[error("{message}")]
    Thrown {
        /// Message
        message: String,
    },
}

impl EngineError {
    /// Error raised from user code inside a method body
    pub fn thrown(message: impl Into<String>) -> Self {
        EngineError::Thrown { message: message.into() }
    }

    pub(crate) fn declaration(class: Option<&str>, error: DeclarationError) -> Self {
        EngineError::Declaration { class: class.unwrap_or(ANONYMOUS).to_string(), error }
    }

    pub(crate) fn validation(class: Option<&str>, error: ValidationError) -> Self {
        EngineError::Validation { class: class.unwrap_or(ANONYMOUS).to_string(), error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_error_names_class() {
        let err = EngineError::declaration(Some("Cow"), DeclarationError::Conflict { member: "moo".into() });
        let text = err.to_string();
        assert!(text.contains("moo"));
        assert!(text.contains("conflicts"));
        assert!(text.contains("Cow"));
    }

    #[test]
    fn test_anonymous_class_name() {
        let err = EngineError::validation(None, ValidationError::PrivateConflict { member: "_x".into() });
        assert!(err.to_string().contains(ANONYMOUS));
    }

    #[test]
    fn test_deescalation_message() {
        let err = ValidationError::Deescalation {
            member: "tip".into(),
            kind: MemberKind::Method,
            previous: Visibility::Public,
            found: Visibility::Protected,
        };
        let text = err.to_string();
        assert!(text.contains("de-escalate"));
        assert!(text.contains("tip"));
        assert_eq!(err.member(), "tip");
    }

    #[test]
    fn test_proxy_error_names_both_sides() {
        let err = ProxyResolutionError {
            property: "view".into(),
            method: "render".into(),
            fault: ProxyFault::NotCallable,
        };
        let text = err.to_string();
        assert!(text.contains("view"));
        assert!(text.contains("render"));
    }
}
