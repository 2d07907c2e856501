//! Override, visibility and arity validation
//!
//! Every member of a declaration is checked against the member of the same name
//! found in the supertype chain (if any) before it is inserted into the
//! declaration's member table. All violations are hard errors except `override`
//! with nothing to override, which goes to the warning handler.

use crate::error::ValidationError;
use crate::member::{MemberDescriptor, MemberKind, Visibility};
use crate::warning::{Warning, WarningHandler};

/// Validates members of one declaration against its supertype chain
pub struct Validator<'a> {
    handler: &'a dyn WarningHandler,
    class: Option<&'a str>,
    warn_orphan_override: bool,
    public_contract: bool,
}

impl<'a> Validator<'a> {
    /// Create a validator for the declaration named `class`
    pub fn new(handler: &'a dyn WarningHandler, class: Option<&'a str>) -> Self {
        Validator { handler, class, warn_orphan_override: true, public_contract: false }
    }

    /// Do not report `override` without a supertype member.
    ///
    /// Trait bodies declare `abstract override` members whose super method is
    /// only known once the trait is mixed in.
    pub fn without_orphan_warnings(mut self) -> Self {
        self.warn_orphan_override = false;
        self
    }

    /// Require `weak` signatures satisfied by an inherited implementation to
    /// be at least as visible there as they are declared.
    ///
    /// Interface signatures are a public contract; trait requirements are
    /// reached through the mixer and stay lenient.
    pub fn with_public_contract(mut self) -> Self {
        self.public_contract = true;
        self
    }

    /// Validate `new` against the supertype member `prev`
    pub fn validate(
        &self,
        new: &MemberDescriptor,
        prev: Option<&MemberDescriptor>,
    ) -> Result<(), ValidationError> {
        match new.kind {
            MemberKind::Method => self.validate_method(new, prev),
            MemberKind::Property => self.validate_property(new, prev),
            MemberKind::Getter | MemberKind::Setter => self.validate_accessor(new, prev),
        }
    }

    fn validate_method(
        &self,
        new: &MemberDescriptor,
        prev: Option<&MemberDescriptor>,
    ) -> Result<(), ValidationError> {
        let m = &new.modifiers;

        if m.is_abstract && new.visibility == Visibility::Private {
            return Err(combination(new, "abstract", "private"));
        }
        if m.is_abstract && m.is_static {
            return Err(combination(new, "abstract", "static"));
        }
        if m.is_const {
            return Err(forbidden(new, "const"));
        }
        if m.is_virtual && m.is_static {
            return Err(combination(new, "static", "virtual"));
        }
        if m.is_proxy && m.is_abstract {
            return Err(combination(new, "proxy", "abstract"));
        }

        let Some(prev) = prev else {
            return self.check_orphan_override(new);
        };
        check_shared_rules(new, prev)?;

        let pm = &prev.modifiers;
        if m.is_override && !pm.is_virtual {
            return Err(if m.is_abstract {
                ValidationError::AbstractOverrideOfConcrete { member: new.name.clone() }
            } else {
                ValidationError::NonVirtual { member: new.name.clone(), kind: new.kind }
            });
        }

        if m.is_abstract && !m.is_weak && !pm.is_abstract {
            return Err(ValidationError::AbstractOverConcrete { member: new.name.clone() });
        }

        if let (Some(now), Some(before)) = (new.arity, prev.arity) {
            // weak stubs are checked the other way round: the existing
            // implementation must accept at least as many parameters
            let (now, before) = if m.is_weak && !pm.is_abstract {
                (before, now)
            } else {
                (now, before)
            };
            if now < before {
                return Err(ValidationError::IncompatibleArity {
                    member: new.name.clone(),
                    expected: before,
                    found: now,
                });
            }
        }

        // a satisfied weak signature never replaces the implementation
        if !m.is_weak || pm.is_abstract {
            check_escalation(new, prev)?;
        } else if self.public_contract {
            check_escalation(prev, new)?;
        }

        if !m.is_weak {
            if !pm.is_virtual {
                return Err(ValidationError::NonVirtual { member: new.name.clone(), kind: new.kind });
            }
            if !m.is_override && !pm.is_abstract {
                return Err(ValidationError::MissingOverride { member: new.name.clone(), kind: new.kind });
            }
        }

        Ok(())
    }

    fn validate_property(
        &self,
        new: &MemberDescriptor,
        prev: Option<&MemberDescriptor>,
    ) -> Result<(), ValidationError> {
        let m = &new.modifiers;

        if m.is_abstract {
            return Err(forbidden(new, "abstract"));
        }
        // properties are always overridable
        if m.is_virtual {
            return Err(forbidden(new, "virtual"));
        }
        if m.is_static && m.is_const {
            return Err(combination(new, "const", "static"));
        }

        let Some(prev) = prev else {
            return self.check_orphan_override(new);
        };
        check_shared_rules(new, prev)?;

        if prev.modifiers.is_const {
            return Err(ValidationError::ConstantOverride { member: new.name.clone() });
        }

        check_escalation(new, prev)
    }

    fn validate_accessor(
        &self,
        new: &MemberDescriptor,
        prev: Option<&MemberDescriptor>,
    ) -> Result<(), ValidationError> {
        let m = &new.modifiers;

        if m.is_abstract {
            return Err(forbidden(new, "abstract"));
        }
        if m.is_const {
            return Err(forbidden(new, "const"));
        }
        if m.is_virtual {
            return Err(if m.is_static {
                combination(new, "static", "virtual")
            } else {
                forbidden(new, "virtual")
            });
        }

        let Some(prev) = prev else {
            return self.check_orphan_override(new);
        };
        check_shared_rules(new, prev)?;
        check_escalation(new, prev)?;

        if !prev.modifiers.is_virtual {
            return Err(ValidationError::NonVirtual { member: new.name.clone(), kind: new.kind });
        }
        if !m.is_override {
            return Err(ValidationError::MissingOverride { member: new.name.clone(), kind: new.kind });
        }
        Ok(())
    }

    fn check_orphan_override(&self, new: &MemberDescriptor) -> Result<(), ValidationError> {
        if !new.modifiers.is_override || !self.warn_orphan_override {
            return Ok(());
        }

        let warning = Warning::OverrideWithoutSuper {
            member: new.name.clone(),
            kind: new.kind,
            class: self.class.unwrap_or(crate::error::ANONYMOUS).to_string(),
        };
        self.handler
            .handle(&warning)
            .map_err(|warning| ValidationError::DeniedWarning { warning })
    }
}

/// Modifiers a member actually carries once it is part of a chain
///
/// Abstract methods are implicitly virtual, and overriding a virtual method
/// yields a virtual method.
pub fn effective(mut new: MemberDescriptor, prev: Option<&MemberDescriptor>) -> MemberDescriptor {
    if new.kind == MemberKind::Method {
        let inherits_virtual = prev.map_or(false, |p| p.kind == MemberKind::Method && p.modifiers.is_virtual);
        if new.modifiers.is_abstract || inherits_virtual {
            new.modifiers.is_virtual = true;
        }
    }
    new
}

fn check_shared_rules(new: &MemberDescriptor, prev: &MemberDescriptor) -> Result<(), ValidationError> {
    if prev.visibility == Visibility::Private {
        return Err(ValidationError::PrivateConflict { member: new.name.clone() });
    }

    let same_family = new.kind == prev.kind || (new.kind.is_accessor() && prev.kind.is_accessor());
    if !same_family {
        return Err(ValidationError::KindMismatch {
            member: new.name.clone(),
            previous: prev.kind,
            found: new.kind,
        });
    }

    if new.is_instance() != prev.is_instance() {
        return Err(ValidationError::StaticMismatch {
            member: new.name.clone(),
            previous: if prev.is_instance() { "instance" } else { "static" },
            found: if new.is_instance() { "instance" } else { "static" },
        });
    }

    Ok(())
}

fn check_escalation(new: &MemberDescriptor, prev: &MemberDescriptor) -> Result<(), ValidationError> {
    if new.visibility.rank() > prev.visibility.rank() {
        return Err(ValidationError::Deescalation {
            member: new.name.clone(),
            kind: new.kind,
            previous: prev.visibility,
            found: new.visibility,
        });
    }
    Ok(())
}

fn forbidden(new: &MemberDescriptor, modifier: &'static str) -> ValidationError {
    ValidationError::ForbiddenModifier { member: new.name.clone(), kind: new.kind, modifier }
}

fn combination(new: &MemberDescriptor, first: &'static str, second: &'static str) -> ValidationError {
    ValidationError::ModifierCombination { member: new.name.clone(), kind: new.kind, first, second }
}
