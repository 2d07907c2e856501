//! Class declaration and instantiation tests

use std::cell::RefCell;
use std::rc::Rc;

use strata_engine::{
    ClassRef, DeclarationError, Declared, Definition, Engine, EngineConfig, EngineError, Value,
};

fn cow(engine: &Engine) -> ClassRef {
    engine
        .declare_class(
            Definition::class("Cow").method("virtual public tip", 0, |_, _| Ok(Value::from("Omph."))),
            None,
        )
        .unwrap()
}

// ============================================================================
// Override Tests
// ============================================================================

#[test]
fn test_cow_and_sturdy_cow() {
    let engine = Engine::new();
    let cow = cow(&engine);
    let sturdy = engine
        .declare_class(
            Definition::class("SturdyCow").method("override public tip", 0, |_, _| Ok(Value::from("Moo."))),
            Some(&cow),
        )
        .unwrap();

    let bessie = engine.instantiate(&sturdy, &[]).unwrap();
    assert_eq!(bessie.call("tip", &[]).unwrap(), Value::from("Moo."));

    let daisy = engine.instantiate(&cow, &[]).unwrap();
    assert_eq!(daisy.call("tip", &[]).unwrap(), Value::from("Omph."));
}

#[test]
fn test_super_call_reaches_supertype() {
    let engine = Engine::new();
    let cow = cow(&engine);
    let loud = engine
        .declare_class(
            Definition::class("LoudCow").method("override public tip", 0, |ctx, _| {
                let base = ctx.call_super(&[])?;
                Ok(Value::from(format!("{} {}!", base, base)))
            }),
            Some(&cow),
        )
        .unwrap();

    let inst = engine.instantiate(&loud, &[]).unwrap();
    assert_eq!(inst.call("tip", &[]).unwrap(), Value::from("Omph. Omph.!"));
}

#[test]
fn test_override_is_virtual_for_further_subtypes() {
    let engine = Engine::new();
    let cow = cow(&engine);
    let sturdy = engine
        .declare_class(
            Definition::class("SturdyCow").method("override public tip", 0, |_, _| Ok(Value::from("Moo."))),
            Some(&cow),
        )
        .unwrap();
    let sturdier = engine
        .declare_class(
            Definition::class("SturdierCow").method("override public tip", 0, |_, _| Ok(Value::from("MOO."))),
            Some(&sturdy),
        )
        .unwrap();

    let inst = engine.instantiate(&sturdier, &[]).unwrap();
    assert_eq!(inst.call("tip", &[]).unwrap(), Value::from("MOO."));
    assert!(inst.is_instance_of(&cow));
    assert!(inst.is_instance_of(&sturdy));
}

#[test]
fn test_super_method_reference_outlives_call_sugar() {
    let engine = Engine::new();
    let cow = cow(&engine);
    let sub = engine
        .declare_class(
            Definition::class("Sub")
                .method("override public tip", 0, |_, _| Ok(Value::from("Moo.")))
                .method("public original", 0, |ctx, _| {
                    let tip = ctx.class().template().method("tip").cloned();
                    match tip.as_ref().and_then(|m| m.super_method()) {
                        Some(super_method) => ctx.invoke(super_method, &[]),
                        None => Err(EngineError::thrown("no super")),
                    }
                }),
            Some(&cow),
        )
        .unwrap();

    let inst = engine.instantiate(&sub, &[]).unwrap();
    assert_eq!(inst.call("original", &[]).unwrap(), Value::from("Omph."));
}

#[test]
fn test_no_super_outside_override() {
    let engine = Engine::new();
    let class = engine
        .declare_class(
            Definition::class("Lonely").method("public run", 0, |ctx, _| {
                assert!(!ctx.has_super());
                ctx.call_super(&[])
            }),
            None,
        )
        .unwrap();
    let inst = engine.instantiate(&class, &[]).unwrap();
    assert!(matches!(inst.call("run", &[]), Err(EngineError::NoSuperMethod { .. })));
}

// ============================================================================
// Abstract Class Tests
// ============================================================================

#[test]
fn test_abstract_instantiation_names_class() {
    let engine = Engine::new();
    let shape = engine
        .declare_class(Definition::abstract_class("Shape").signature("abstract public area", &[]), None)
        .unwrap();

    assert!(shape.is_abstract());
    assert!(engine.is_abstract(&Declared::Class(shape.clone())));

    let err = engine.instantiate(&shape, &[]).unwrap_err();
    assert!(matches!(err, EngineError::AbstractInstantiation { .. }));
    assert!(err.to_string().contains("Shape"));
}

#[test]
fn test_abstract_instantiation_anonymous() {
    let engine = Engine::new();
    let class = engine
        .declare_class(Definition::anonymous().signature("abstract public area", &[]), None)
        .unwrap();

    let err = engine.instantiate(&class, &[]).unwrap_err();
    assert!(err.to_string().contains("(anonymous)"));
}

#[test]
fn test_concrete_subclass_of_abstract() {
    let engine = Engine::new();
    let shape = engine
        .declare_class(
            Definition::abstract_class("Shape")
                .signature("abstract public area", &[])
                .method("public describe", 0, |ctx, _| {
                    Ok(Value::from(format!("area {}", ctx.call("area", &[])?)))
                }),
            None,
        )
        .unwrap();
    let square = engine
        .declare_class(
            Definition::class("Square")
                .property("protected side", 3)
                .method("public area", 0, |ctx, _| {
                    let side = ctx.get("side")?.as_number().unwrap_or(0.0);
                    Ok(Value::from(side * side))
                }),
            Some(&shape),
        )
        .unwrap();

    assert!(!square.is_abstract());
    assert_eq!(square.abstract_count(), 0);
    let inst = engine.instantiate(&square, &[]).unwrap();
    assert_eq!(inst.call("describe", &[]).unwrap(), Value::from("area 9"));
}

#[test]
fn test_unresolved_subclass_stays_abstract() {
    let engine = Engine::new();
    let shape = engine
        .declare_class(
            Definition::abstract_class("Shape")
                .signature("abstract public area", &[])
                .signature("abstract public perimeter", &[]),
            None,
        )
        .unwrap();
    let partial = engine
        .declare_class(
            Definition::class("Partial").method("public area", 0, |_, _| Ok(Value::from(1))),
            Some(&shape),
        )
        .unwrap();

    assert!(partial.is_abstract());
    assert_eq!(partial.abstract_members(), ["perimeter".to_string()]);
    assert!(engine.instantiate(&partial, &[]).is_err());
}

#[test]
fn test_abstract_without_abstract_members() {
    let engine = Engine::new();
    let err = engine
        .declare_class(Definition::abstract_class("Empty").property("x", 1), None)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Declaration { error: DeclarationError::AbstractWithoutAbstractMembers, .. }
    ));
}

#[test]
fn test_strict_abstract_rejects_unresolved_class() {
    let config = EngineConfig { strict_abstract: true, ..EngineConfig::default() };
    let engine = Engine::with_config(config);
    let err = engine
        .declare_class(Definition::class("Loose").signature("abstract public run", &[]), None)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Declaration { error: DeclarationError::UnresolvedAbstractMembers { count: 1 }, .. }
    ));
}

// ============================================================================
// Final Class Tests
// ============================================================================

#[test]
fn test_final_class_cannot_be_extended() {
    let engine = Engine::new();
    let sealed = engine.declare_class(Definition::final_class("Sealed").property("x", 1), None).unwrap();
    assert!(sealed.is_final());
    assert!(engine.instantiate(&sealed, &[]).is_ok());

    let err = engine.declare_class(Definition::class("Sub"), Some(&sealed)).unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::FinalSupertype { .. }, .. }));
}

#[test]
fn test_final_class_cannot_be_abstract() {
    let engine = Engine::new();
    let err = engine
        .declare_class(Definition::final_class("Sealed").signature("abstract public run", &[]), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::FinalAbstract { .. }, .. }));
}

// ============================================================================
// Constructor Tests
// ============================================================================

#[test]
fn test_constructor_receives_arguments() {
    let engine = Engine::new();
    let point = engine
        .declare_class(
            Definition::class("Point")
                .property("public x", 0)
                .property("public y", 0)
                .constructor(2, |ctx, args| {
                    ctx.set("x", args.first().cloned().unwrap_or_default())?;
                    ctx.set("y", args.get(1).cloned().unwrap_or_default())?;
                    Ok(Value::Undefined)
                }),
            None,
        )
        .unwrap();

    let p = engine.instantiate(&point, &[Value::from(3), Value::from(4)]).unwrap();
    assert_eq!(p.get("x").unwrap(), Value::from(3));
    assert_eq!(p.get("y").unwrap(), Value::from(4));
}

#[test]
fn test_inherited_constructor_runs_without_own() {
    let engine = Engine::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let base_log = Rc::clone(&log);
    let base = engine
        .declare_class(
            Definition::class("Base").constructor(0, move |_, _| {
                base_log.borrow_mut().push("base");
                Ok(Value::Undefined)
            }),
            None,
        )
        .unwrap();
    let sub = engine.declare_class(Definition::class("Sub"), Some(&base)).unwrap();

    engine.instantiate(&sub, &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["base"]);
}

#[test]
fn test_own_constructor_chains_through_super() {
    let engine = Engine::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let base_log = Rc::clone(&log);
    let sub_log = Rc::clone(&log);
    let base = engine
        .declare_class(
            Definition::class("Base").constructor(0, move |_, _| {
                base_log.borrow_mut().push("base");
                Ok(Value::Undefined)
            }),
            None,
        )
        .unwrap();
    let sub = engine
        .declare_class(
            Definition::class("Sub").constructor(0, move |ctx, args| {
                sub_log.borrow_mut().push("sub");
                ctx.call_super(args)
            }),
            Some(&base),
        )
        .unwrap();

    engine.instantiate(&sub, &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["sub", "base"]);
}

#[test]
fn test_constructor_error_propagates() {
    let engine = Engine::new();
    let class = engine
        .declare_class(
            Definition::class("Picky").constructor(1, |_, args| {
                if args.is_empty() {
                    return Err(EngineError::thrown("need an argument"));
                }
                Ok(Value::Undefined)
            }),
            None,
        )
        .unwrap();

    assert_eq!(engine.instantiate(&class, &[]).unwrap_err(), EngineError::thrown("need an argument"));
    assert!(engine.instantiate(&class, &[Value::Null]).is_ok());
}

#[test]
fn test_private_constructor_rejected() {
    let engine = Engine::new();
    let err = engine
        .declare_class(
            Definition::class("Hidden").method("private __construct", 0, |_, _| Ok(Value::Undefined)),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::ReservedShape { .. }, .. }));
}

#[test]
fn test_reserved_names_rejected() {
    let engine = Engine::new();
    for name in ["__super", "__self", "#slot"] {
        let def = Definition::class("Bad").descriptor(strata_engine::MemberDescriptor::property(name, Value::Null));
        let err = engine.declare_class(def, None).unwrap_err();
        assert!(
            matches!(err, EngineError::Declaration { error: DeclarationError::ReservedName { .. }, .. }),
            "{} should be reserved",
            name
        );
    }
}

#[test]
fn test_mixin_outside_trait_rejected() {
    let engine = Engine::new();
    let err = engine
        .declare_class(Definition::class("NotATrait").mixin(0, |_, _| Ok(Value::Undefined)), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::ReservedName { .. }, .. }));
}

// ============================================================================
// Registry Tests
// ============================================================================

#[test]
fn test_registry_resolves_supertype() {
    let engine = Engine::new();
    let cow = cow(&engine);
    let calf = engine.declare_class(Definition::class("Calf"), Some(&cow)).unwrap();

    assert_eq!(calf.supertype(), Some(cow.id()));
    let resolved = engine.supertype(&calf).unwrap();
    assert!(Rc::ptr_eq(&resolved, &cow));
    assert!(engine.supertype(&cow).is_none());

    let found = engine.class(calf.id()).unwrap();
    assert_eq!(found.name(), Some("Calf"));
    assert_eq!(calf.depth(), 1);
}

#[test]
fn test_declare_dispatches_on_kind() {
    let engine = Engine::new();
    let class = engine.declare(Definition::class("A"), None).unwrap();
    assert_eq!(class.sort(), "class");

    let tr = engine.declare(Definition::new_trait("T"), None).unwrap();
    assert!(tr.as_trait().is_some());
    assert!(engine.is_abstract(&tr));

    let iface = engine.declare(Definition::interface("I").signature("run", &[]), None).unwrap();
    assert!(iface.as_interface().is_some());

    let sub = engine.declare(Definition::class("B"), Some(&class)).unwrap();
    assert_eq!(engine.supertype(sub.as_class().unwrap()).unwrap().id(), class.id());
}

#[test]
fn test_declare_rejects_mismatched_supertype() {
    let engine = Engine::new();
    let iface = engine.declare(Definition::interface("I").signature("run", &[]), None).unwrap();

    let err = engine.declare(Definition::class("A"), Some(&iface)).unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::InvalidSupertype { .. }, .. }));

    let class = engine.declare(Definition::class("B"), None).unwrap();
    let err = engine.declare(Definition::interface("J"), Some(&class)).unwrap_err();
    assert!(err.to_string().contains("cannot extend"));
}

#[test]
fn test_instances_have_unique_ids() {
    let engine = Engine::new();
    let cow = cow(&engine);
    let a = engine.instantiate(&cow, &[]).unwrap();
    let b = engine.instantiate(&cow, &[]).unwrap();
    assert_ne!(a.id(), b.id());
    assert!(!a.ptr_eq(&b));
    assert!(a.ptr_eq(&a.clone()));
    assert_eq!(format!("{:?}", a), format!("Cow#{}", a.id()));
}
