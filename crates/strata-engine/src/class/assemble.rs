//! Class assembler
//!
//! Drives one declaration through the pipeline: classify members, check
//! reserved names, validate each member against the supertype chain, build
//! the member table, wrap callables, lay out the visibility template and
//! statics, and seal the result into a [`ClassDescriptor`].

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::definition::{Classified, Definition, DefinitionKind, CONSTRUCTOR, MIXIN};
use super::statics::StaticTable;
use super::{ClassDescriptor, ClassRef};
use crate::engine::{Declared, Engine, TypeId};
use crate::error::{DeclarationError, EngineError};
use crate::member::{MemberDescriptor, MemberKind, MemberTable, MemberValue, Method, Visibility};
use crate::mixin::TraitSlot;
use crate::validate::{effective, Validator};
use crate::visibility::VisibilityTemplate;
use crate::wrap::{wrap_abstract, wrap_mixer_forward, wrap_new, wrap_override, wrap_proxy, MethodSite, WrappedMethod};

/// Names no declaration may use
const RESERVED: &[&str] = &["__super", "__self", "__inst", "constructor", "__initProps"];

/// Whether user declarations may not use `name`
pub(crate) fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name) || name.starts_with('#')
}

/// Extra inputs for one assembly
#[derive(Debug, Default)]
pub(crate) struct Assembly {
    /// Assembling the concrete class of a trait
    pub(crate) trait_body: bool,
    /// Trait slot introduced by this class
    pub(crate) slot: Option<TraitSlot>,
    /// Interfaces and traits this class adds to its conformance list
    pub(crate) conforms: Vec<TypeId>,
    /// Weak members are interface signatures
    pub(crate) conformance: bool,
}

/// Assemble and register a class
pub(crate) fn assemble(
    engine: &Engine,
    def: Definition,
    parent: Option<&ClassRef>,
    assembly: Assembly,
) -> Result<ClassRef, EngineError> {
    let class_name = def.name().map(str::to_string);
    let class_name = class_name.as_deref();
    let declaration_error = |error| EngineError::declaration(class_name, error);
    let validation_error = |error| EngineError::validation(class_name, error);

    if let Some(parent) = parent {
        if parent.is_final() {
            return Err(declaration_error(DeclarationError::FinalSupertype {
                supertype: parent.display_name().to_string(),
            }));
        }
    }

    let Classified { name, kind, synthesized, members } = def.classify().map_err(declaration_error)?;
    let (members, own_constructor) =
        sort_members(members, synthesized, assembly.trait_body).map_err(declaration_error)?;

    let validator = Validator::new(engine.warnings(), class_name);
    let validator = if assembly.trait_body { validator.without_orphan_warnings() } else { validator };
    let validator = if assembly.conformance { validator.with_public_contract() } else { validator };

    let mut table = match parent {
        Some(parent) => MemberTable::derived(Rc::clone(parent.table())),
        None => MemberTable::new(),
    };
    for desc in members {
        let prev = table.lookup_inherited(&desc.name).cloned();
        validator.validate(&desc, prev.as_deref()).map_err(validation_error)?;
        if is_satisfied(&desc, prev.as_deref()) {
            continue;
        }
        table.insert(effective(desc, prev.as_deref())).map_err(declaration_error)?;
    }
    let table = Rc::new(table);

    let id = engine.allocate_id();
    let depth = table.depth();

    let mut methods: FxHashMap<String, Rc<WrappedMethod>> = parent
        .map(|p| p.template().methods().map(|(n, m)| (n.to_string(), Rc::clone(m))).collect())
        .unwrap_or_default();
    let mut statics: StaticTable = parent.map(|p| p.statics().clone()).unwrap_or_default();

    for desc in table.members() {
        match (&desc.value, desc.is_instance()) {
            (MemberValue::Property(default), false) => {
                statics.define_field(&desc.name, desc.visibility, depth, default.fresh_copy(), desc.modifiers.is_const);
            }
            (MemberValue::Property(_) | MemberValue::Accessor(_), _) => {}
            (_, true) => {
                let prev = methods.get(&desc.name).cloned();
                if let Some(method) = wrap_member(desc, id, depth, prev, assembly.trait_body) {
                    methods.insert(desc.name.clone(), Rc::new(method));
                }
            }
            (_, false) => {
                let prev = statics.method(&desc.name).cloned();
                if let Some(method) = wrap_member(desc, id, depth, prev, assembly.trait_body) {
                    statics.define_method(Rc::new(method));
                }
            }
        }
    }

    let template = VisibilityTemplate::build(&table, methods, engine.config().layered_visibility);

    let mut abstract_members: Vec<String> = template
        .methods()
        .filter(|(_, m)| m.is_abstract())
        .map(|(name, _)| name.to_string())
        .collect();
    abstract_members.sort();

    if !synthesized {
        match kind {
            DefinitionKind::Abstract if abstract_members.is_empty() => {
                return Err(declaration_error(DeclarationError::AbstractWithoutAbstractMembers));
            }
            DefinitionKind::Final if !abstract_members.is_empty() => {
                return Err(declaration_error(DeclarationError::FinalAbstract {
                    member: abstract_members[0].clone(),
                }));
            }
            DefinitionKind::Class if !abstract_members.is_empty() && engine.config().strict_abstract => {
                return Err(declaration_error(DeclarationError::UnresolvedAbstractMembers {
                    count: abstract_members.len(),
                }));
            }
            _ => {}
        }
    }
    let is_abstract = kind == DefinitionKind::Abstract || !abstract_members.is_empty();

    let inherited_constructor = parent.and_then(|p| p.constructor()).cloned();
    let constructor = match own_constructor {
        Some(body) => {
            let site = MethodSite {
                name: if assembly.trait_body { MIXIN } else { CONSTRUCTOR }.to_string(),
                arity: Some(body.arity()),
                visibility: Visibility::Public,
                is_static: false,
                is_virtual: true,
                owner: id,
                owner_depth: depth,
            };
            Some(Rc::new(match inherited_constructor {
                Some(super_constructor) => wrap_override(site, body, super_constructor),
                None => wrap_new(site, body),
            }))
        }
        None => inherited_constructor,
    };

    let mut trait_slots = parent.map(|p| p.trait_slots().to_vec()).unwrap_or_default();
    trait_slots.extend(assembly.slot);

    let mut conforms = parent.map(|p| p.conforms.clone()).unwrap_or_default();
    for conformed in assembly.conforms {
        if !conforms.contains(&conformed) {
            conforms.push(conformed);
        }
    }

    let mut ancestry = parent.map(|p| p.ancestry().to_vec()).unwrap_or_default();
    ancestry.push(id);

    let class = Rc::new(ClassDescriptor {
        id,
        name,
        is_abstract,
        is_final: kind == DefinitionKind::Final,
        supertype: parent.map(|p| p.id()),
        table,
        template,
        statics,
        constructor,
        trait_slots,
        conforms,
        ancestry,
        abstract_members,
    });

    tracing::debug!(
        class = class.display_name(),
        id = id.as_u32(),
        depth,
        is_abstract,
        synthesized,
        "assembled class"
    );
    engine.register(Declared::Class(Rc::clone(&class)));
    Ok(class)
}

/// Split off the constructor (or trait initializer) and enforce the rules that
/// depend only on the declaration itself
fn sort_members(
    members: Vec<MemberDescriptor>,
    synthesized: bool,
    trait_body: bool,
) -> Result<(Vec<MemberDescriptor>, Option<Method>), DeclarationError> {
    let mut kept = Vec::with_capacity(members.len());
    let mut initializer: Option<Method> = None;

    for desc in members {
        if is_reserved(&desc.name) && !(synthesized && desc.name.starts_with('#')) {
            return Err(DeclarationError::ReservedName { member: desc.name });
        }

        let is_constructor = desc.name == CONSTRUCTOR;
        let is_mixin = desc.name == MIXIN;
        if is_constructor && trait_body {
            return Err(DeclarationError::TraitConstructor);
        }
        if is_mixin && !trait_body {
            return Err(DeclarationError::ReservedName { member: desc.name });
        }
        if is_constructor || is_mixin {
            if initializer.is_some() {
                return Err(DeclarationError::Conflict { member: desc.name });
            }
            initializer = Some(initializer_body(desc)?);
            continue;
        }

        if desc.kind.is_accessor() && desc.modifiers.is_static {
            return Err(DeclarationError::StaticAccessor { member: desc.name });
        }
        if desc.is_abstract_override() && !trait_body {
            return Err(DeclarationError::InvalidValue {
                member: desc.name,
                reason: "abstract override with a body is only permitted in traits".to_string(),
            });
        }
        if trait_body {
            if !desc.is_instance() {
                return Err(DeclarationError::TraitStatic { member: desc.name });
            }
            if desc.kind != MemberKind::Method && desc.visibility != Visibility::Private {
                return Err(DeclarationError::TraitProperty { visibility: desc.visibility, member: desc.name });
            }
        }

        kept.push(desc);
    }

    Ok((kept, initializer))
}

fn initializer_body(desc: MemberDescriptor) -> Result<Method, DeclarationError> {
    let m = &desc.modifiers;
    let well_formed = desc.visibility == Visibility::Public
        && !m.is_static
        && !m.is_const
        && !m.is_abstract
        && !m.is_proxy;

    match desc.value {
        MemberValue::Method(body) if well_formed => Ok(body),
        _ => Err(DeclarationError::ReservedShape {
            member: desc.name,
            requirement: "must be a public, non-static, concrete method",
        }),
    }
}

/// A `weak` signature already implemented by the supertype chain adds nothing
fn is_satisfied(desc: &MemberDescriptor, prev: Option<&MemberDescriptor>) -> bool {
    desc.modifiers.is_weak && desc.is_unimplemented() && prev.map_or(false, |p| !p.is_abstract())
}

/// Wrap one callable member; `None` for members that are not callable
fn wrap_member(
    desc: &MemberDescriptor,
    owner: TypeId,
    depth: usize,
    prev: Option<Rc<WrappedMethod>>,
    trait_body: bool,
) -> Option<WrappedMethod> {
    let site = MethodSite::of(desc, owner, depth);
    let concrete_prev = prev.filter(|p| !p.is_abstract());

    match &desc.value {
        MemberValue::Abstract(_) => Some(if trait_body { wrap_mixer_forward(site) } else { wrap_abstract(site) }),
        MemberValue::Method(body) => Some(match concrete_prev {
            Some(super_method) if !trait_body => wrap_override(site, body.clone(), super_method),
            _ => wrap_new(site, body.clone()),
        }),
        MemberValue::Proxy(target) => Some(wrap_proxy(site, target.clone(), concrete_prev)),
        MemberValue::Property(_) | MemberValue::Accessor(_) => None,
    }
}
