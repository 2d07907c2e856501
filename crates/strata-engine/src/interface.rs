//! Interfaces
//!
//! An interface is a list of public abstract method signatures. Classes that
//! implement interfaces get one synthesized layer of `weak abstract` members
//! between their supertype and their own declaration: inherited concrete
//! methods satisfy the requirement, anything left over keeps the class abstract.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::class::{assemble, is_reserved, Assembly, ClassRef, Definition, DefinitionKind, CONSTRUCTOR, MIXIN};
use crate::engine::{Declared, Engine, TypeId};
use crate::error::{DeclarationError, EngineError, ANONYMOUS};
use crate::member::{MemberDescriptor, MemberKind, MemberTable, Modifiers, Visibility};
use crate::validate::{effective, Validator};

/// Shared handle to a declared interface
pub type InterfaceRef = Rc<InterfaceDescriptor>;

/// A declared interface
pub struct InterfaceDescriptor {
    id: TypeId,
    name: Option<String>,
    table: Rc<MemberTable>,
    /// This interface and every interface it extends
    ancestry: Vec<TypeId>,
}

impl InterfaceDescriptor {
    /// Type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Member table (linked to the parent interface's)
    pub fn table(&self) -> &Rc<MemberTable> {
        &self.table
    }

    /// Ids of this interface and its ancestors
    pub fn ancestry(&self) -> &[TypeId] {
        &self.ancestry
    }

    /// Every required signature, inherited ones included; the most derived
    /// declaration of each name wins
    pub fn signatures(&self) -> Vec<Rc<MemberDescriptor>> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for table in self.table.lineage() {
            for member in table.members() {
                if seen.insert(member.name.clone()) {
                    if let Some(resolved) = self.table.lookup(&member.name) {
                        out.push(Rc::clone(resolved));
                    }
                }
            }
        }
        out
    }
}

impl fmt::Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceDescriptor")
            .field("id", &self.id)
            .field("name", &self.display_name())
            .field("signatures", &self.signatures().len())
            .finish()
    }
}

/// Declare an interface
pub(crate) fn declare_interface(
    engine: &Engine,
    def: Definition,
    parent: Option<&InterfaceRef>,
) -> Result<InterfaceRef, EngineError> {
    let class_name = def.name().map(str::to_string);
    let class_name = class_name.as_deref();
    let declaration_error = |error| EngineError::declaration(class_name, error);

    if def.kind() != DefinitionKind::Interface {
        return Err(declaration_error(DeclarationError::InvalidSupertype {
            declared: def.kind().as_str(),
            supertype: "interface",
        }));
    }

    let classified = def.classify().map_err(declaration_error)?;
    let validator = Validator::new(engine.warnings(), class_name);

    let mut table = match parent {
        Some(parent) => MemberTable::derived(Rc::clone(parent.table())),
        None => MemberTable::new(),
    };
    for desc in classified.members {
        check_signature(&desc).map_err(declaration_error)?;
        let prev = table.lookup_inherited(&desc.name).cloned();
        validator
            .validate(&desc, prev.as_deref())
            .map_err(|error| EngineError::validation(class_name, error))?;
        table.insert(effective(desc, prev.as_deref())).map_err(declaration_error)?;
    }

    let id = engine.allocate_id();
    let mut ancestry = parent.map(|p| p.ancestry.clone()).unwrap_or_default();
    ancestry.push(id);

    let interface = Rc::new(InterfaceDescriptor {
        id,
        name: classified.name,
        table: Rc::new(table),
        ancestry,
    });
    tracing::debug!(
        name = interface.display_name(),
        id = id.as_u32(),
        signatures = interface.signatures().len(),
        "declared interface"
    );
    engine.register(Declared::Interface(Rc::clone(&interface)));
    Ok(interface)
}

fn check_signature(desc: &MemberDescriptor) -> Result<(), DeclarationError> {
    if is_reserved(&desc.name) || desc.name == CONSTRUCTOR || desc.name == MIXIN {
        return Err(DeclarationError::ReservedName { member: desc.name.clone() });
    }

    let reason = if desc.kind != MemberKind::Method {
        Some("must be a method; interfaces may not declare properties")
    } else if !desc.is_unimplemented() {
        Some("must be an abstract signature without a body")
    } else if desc.visibility != Visibility::Public {
        Some("must be public")
    } else if !desc.is_instance() {
        Some("may not be static")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DeclarationError::InterfaceMember { member: desc.name.clone(), reason }),
        None => Ok(()),
    }
}

/// Build the layer of `weak abstract` members a class implementing
/// `interfaces` extends
pub(crate) fn conformance_layer(
    engine: &Engine,
    parent: Option<&ClassRef>,
    class_name: Option<&str>,
    interfaces: &[InterfaceRef],
) -> Result<ClassRef, EngineError> {
    let mut def = Definition::synthesized(class_name.map(str::to_string));
    let mut conforms = Vec::new();

    for interface in interfaces {
        conforms.extend_from_slice(interface.ancestry());
        for signature in interface.signatures() {
            let stub = MemberDescriptor::clone(&signature)
                .with_modifiers(Modifiers { is_weak: true, ..Modifiers::default() });
            def = def.descriptor(stub);
        }
    }

    assemble(engine, def, parent, Assembly { conforms, conformance: true, ..Assembly::default() })
}
