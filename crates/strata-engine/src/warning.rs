//! Non-fatal diagnostics raised while declarations are validated
//!
//! The engine never decides what a warning means. It hands every [`Warning`] to
//! the installed [`WarningHandler`], which may log it, drop it, or hand it back
//! to be raised as an error.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::member::MemberKind;

/// Validation warnings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Warning {
    /// `override` used where the supertype chain has no such member
    #[error("{kind} '{member}' of {class} is marked 'override' but no supertype member exists to override")]
    OverrideWithoutSuper {
        /// Member name
        member: String,
        /// Member kind
        kind: MemberKind,
        /// Declaring class
        class: String,
    },
}

impl Warning {
    /// Member the warning is about
    pub fn member(&self) -> &str {
        match self {
            Warning::OverrideWithoutSuper { member, .. } => member,
        }
    }
}

/// Sink for validation warnings
///
/// Returning `Err` escalates the warning; the declaration then fails with
/// [`ValidationError::DeniedWarning`](crate::error::ValidationError::DeniedWarning).
pub trait WarningHandler {
    /// Handle one warning
    fn handle(&self, warning: &Warning) -> Result<(), Warning>;
}

impl<T: WarningHandler + ?Sized> WarningHandler for Rc<T> {
    fn handle(&self, warning: &Warning) -> Result<(), Warning> {
        (**self).handle(warning)
    }
}

/// Default handler: logs through `tracing` and continues
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWarnings;

impl WarningHandler for LogWarnings {
    fn handle(&self, warning: &Warning) -> Result<(), Warning> {
        tracing::warn!(member = warning.member(), "{}", warning);
        Ok(())
    }
}

/// Drops every warning
#[derive(Debug, Default, Clone, Copy)]
pub struct DismissWarnings;

impl WarningHandler for DismissWarnings {
    fn handle(&self, _warning: &Warning) -> Result<(), Warning> {
        Ok(())
    }
}

/// Escalates every warning to an error
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyWarnings;

impl WarningHandler for DenyWarnings {
    fn handle(&self, warning: &Warning) -> Result<(), Warning> {
        Err(warning.clone())
    }
}

/// Records warnings for later inspection
#[derive(Debug, Default)]
pub struct CollectWarnings {
    warnings: RefCell<Vec<Warning>>,
}

impl CollectWarnings {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of warnings recorded so far
    pub fn len(&self) -> usize {
        self.warnings.borrow().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.warnings.borrow().is_empty()
    }

    /// Drain recorded warnings
    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.warnings.borrow_mut())
    }
}

impl WarningHandler for CollectWarnings {
    fn handle(&self, warning: &Warning) -> Result<(), Warning> {
        self.warnings.borrow_mut().push(warning.clone());
        Ok(())
    }
}
