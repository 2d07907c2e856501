//! Class-level members
//!
//! Static properties are cells shared with subtypes until a subtype redeclares
//! the name. Constants are static and read-only.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::member::Visibility;
use crate::value::Value;
use crate::wrap::WrappedMethod;

/// Storage of one static member
#[derive(Debug, Clone)]
pub enum StaticKind {
    /// Static property or constant
    Field {
        /// Shared value cell
        cell: Rc<RefCell<Value>>,
        /// Read-only constant
        is_const: bool,
    },
    /// Static method
    Method(Rc<WrappedMethod>),
}

/// One static member
#[derive(Debug, Clone)]
pub struct StaticMember {
    /// Visibility
    pub visibility: Visibility,
    /// Depth of the declaring class
    pub owner_depth: usize,
    /// Storage
    pub kind: StaticKind,
}

/// Static members of a class, inherited ones included
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    members: FxHashMap<String, StaticMember>,
}

impl StaticTable {
    /// Declare (or redeclare) a static property
    pub fn define_field(
        &mut self,
        name: &str,
        visibility: Visibility,
        owner_depth: usize,
        value: Value,
        is_const: bool,
    ) {
        let kind = StaticKind::Field { cell: Rc::new(RefCell::new(value)), is_const };
        self.members
            .insert(name.to_string(), StaticMember { visibility, owner_depth, kind });
    }

    /// Declare (or redeclare) a static method
    pub fn define_method(&mut self, method: Rc<WrappedMethod>) {
        let member = StaticMember {
            visibility: method.visibility(),
            owner_depth: method.owner_depth(),
            kind: StaticKind::Method(Rc::clone(&method)),
        };
        self.members.insert(method.name().to_string(), member);
    }

    /// Look up a static member
    pub fn get(&self, name: &str) -> Option<&StaticMember> {
        self.members.get(name)
    }

    /// Look up a static method
    pub fn method(&self, name: &str) -> Option<&Rc<WrappedMethod>> {
        match self.members.get(name).map(|m| &m.kind) {
            Some(StaticKind::Method(method)) => Some(method),
            _ => None,
        }
    }

    /// Number of static members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no static members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
