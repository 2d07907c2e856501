//! Member table: the per-declaration aggregate of member descriptors
//!
//! A table owns three namespaces (public, protected, private) for the members
//! of one declaration and keeps a non-mutating link to the table of its
//! supertype. Subtype tables are new tables; the parent is never touched.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{MemberDescriptor, Visibility};
use crate::error::DeclarationError;

/// Member table for one class, trait or interface declaration
#[derive(Debug, Default)]
pub struct MemberTable {
    /// Position of the owning declaration in its inheritance chain (root = 0)
    depth: usize,
    /// Public namespace
    public: FxHashMap<String, Rc<MemberDescriptor>>,
    /// Protected namespace
    protected: FxHashMap<String, Rc<MemberDescriptor>>,
    /// Private namespace
    private: FxHashMap<String, Rc<MemberDescriptor>>,
    /// Own members in declaration order
    order: Vec<Rc<MemberDescriptor>>,
    /// Supertype table
    parent: Option<Rc<MemberTable>>,
}

impl MemberTable {
    /// Create a table for a root declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table for a subtype of the declaration owning `parent`
    pub fn derived(parent: Rc<MemberTable>) -> Self {
        MemberTable {
            depth: parent.depth + 1,
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Depth of the owning declaration
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Supertype table
    pub fn parent(&self) -> Option<&Rc<MemberTable>> {
        self.parent.as_ref()
    }

    fn namespace(&self, visibility: Visibility) -> &FxHashMap<String, Rc<MemberDescriptor>> {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Protected => &self.protected,
            Visibility::Private => &self.private,
        }
    }

    fn namespace_mut(&mut self, visibility: Visibility) -> &mut FxHashMap<String, Rc<MemberDescriptor>> {
        match visibility {
            Visibility::Public => &mut self.public,
            Visibility::Protected => &mut self.protected,
            Visibility::Private => &mut self.private,
        }
    }

    /// Insert a member declared by this table's own declaration
    ///
    /// Fails if the name is already taken in any namespace of this declaration,
    /// unless both declarations are `weak`; of two weak declarations the one
    /// with the larger arity is kept.
    pub fn insert(&mut self, desc: MemberDescriptor) -> Result<Rc<MemberDescriptor>, DeclarationError> {
        if let Some(existing) = self.lookup_own(&desc.name).cloned() {
            if !(existing.modifiers.is_weak && desc.modifiers.is_weak) {
                return Err(DeclarationError::Conflict { member: desc.name });
            }
            if desc.arity.unwrap_or(0) <= existing.arity.unwrap_or(0) {
                return Ok(existing);
            }
            self.namespace_mut(existing.visibility).remove(&existing.name);
            self.order.retain(|m| !Rc::ptr_eq(m, &existing));
        }

        let desc = Rc::new(desc);
        self.namespace_mut(desc.visibility)
            .insert(desc.name.clone(), Rc::clone(&desc));
        self.order.push(Rc::clone(&desc));
        Ok(desc)
    }

    /// Look up a member of this declaration only
    ///
    /// Public is scanned first, then protected, then private.
    pub fn lookup_own(&self, name: &str) -> Option<&Rc<MemberDescriptor>> {
        self.public
            .get(name)
            .or_else(|| self.protected.get(name))
            .or_else(|| self.private.get(name))
    }

    /// Look up a member in this declaration, then up the supertype chain
    ///
    /// The public namespace is consulted before protected, so a public
    /// override always masks an inherited protected member of the same name.
    pub fn lookup(&self, name: &str) -> Option<&Rc<MemberDescriptor>> {
        self.lookup_own(name)
            .or_else(|| self.parent.as_deref().and_then(|p| p.lookup(name)))
    }

    /// Look up a member in the supertype chain only
    pub fn lookup_inherited(&self, name: &str) -> Option<&Rc<MemberDescriptor>> {
        self.parent.as_deref().and_then(|p| p.lookup(name))
    }

    /// Does this declaration declare `name` in the given namespace
    pub fn declares(&self, visibility: Visibility, name: &str) -> bool {
        self.namespace(visibility).contains_key(name)
    }

    /// Own members in declaration order
    pub fn members(&self) -> impl Iterator<Item = &Rc<MemberDescriptor>> {
        self.order.iter()
    }

    /// Number of own members
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether this declaration declares no members
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tables of the whole chain, root first
    pub fn lineage(&self) -> Vec<&MemberTable> {
        let mut chain = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(table) = current {
            chain.push(table);
            current = table.parent.as_deref();
        }
        chain.reverse();
        chain
    }
}
