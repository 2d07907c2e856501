//! Trait mixing, linearization and isolation tests

use std::cell::Cell;
use std::rc::Rc;

use strata_engine::{
    ClassRef, DeclarationError, Declared, Definition, Engine, EngineError, TraitRef, TraitUse, ValidationError, Value,
};

fn base(engine: &Engine) -> ClassRef {
    engine.declare_class(Definition::class("Base"), None).unwrap()
}

fn logger(engine: &Engine) -> ClassRef {
    engine
        .declare_class(Definition::class("Logger").method("virtual public log", 0, |_, _| Ok(Value::from("base"))), None)
        .unwrap()
}

fn stacking_trait(engine: &Engine, name: &'static str, tag: &'static str) -> TraitRef {
    engine
        .declare_trait(Definition::new_trait(name).method("abstract override public log", 0, move |ctx, _| {
            Ok(Value::from(format!("{}>{}", tag, ctx.call_super(&[])?)))
        }))
        .unwrap()
}

// ============================================================================
// Basic Mixing Tests
// ============================================================================

#[test]
fn test_trait_methods_are_exposed() {
    let engine = Engine::new();
    let greeter = engine
        .declare_trait(
            Definition::new_trait("Greeter")
                .signature("abstract public name", &[])
                .method("public greet", 0, |ctx, _| Ok(Value::from(format!("hello, {}", ctx.call("name", &[])?)))),
        )
        .unwrap();
    assert!(!greeter.has_mixin());
    assert_eq!(greeter.requirements().count(), 1);

    let base = base(&engine);
    let person = engine
        .use_traits(&base, [&greeter])
        .extend(Definition::class("Person").method("public name", 0, |_, _| Ok(Value::from("Ada"))))
        .unwrap();

    let ada = engine.instantiate(&person, &[]).unwrap();
    assert_eq!(ada.call("greet", &[]).unwrap(), Value::from("hello, Ada"));
    assert!(ada.is_instance_of(&base));
    assert!(engine.is_a(&ada, &Declared::Trait(greeter.clone())));
    assert_eq!(person.traits().count(), 1);
}

#[test]
fn test_requirement_satisfied_by_base() {
    let engine = Engine::new();
    let greeter = engine
        .declare_trait(
            Definition::new_trait("Greeter")
                .signature("abstract public name", &[])
                .method("public greet", 0, |ctx, _| Ok(Value::from(format!("hi {}", ctx.call("name", &[])?)))),
        )
        .unwrap();
    let named = engine
        .declare_class(Definition::class("Named").method("public name", 0, |_, _| Ok(Value::from("Bo"))), None)
        .unwrap();

    let class = engine.use_traits(&named, [&greeter]).extend(Definition::class("Friendly")).unwrap();
    assert!(!class.is_abstract());
    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("greet", &[]).unwrap(), Value::from("hi Bo"));
}

#[test]
fn test_unmet_requirement_leaves_class_abstract() {
    let engine = Engine::new();
    let needy = engine
        .declare_trait(Definition::new_trait("Needy").signature("abstract public supply", &[]))
        .unwrap();
    let class = engine.mix([&needy]).extend(Definition::class("Empty")).unwrap();

    assert!(class.is_abstract());
    let err = engine.instantiate(&class, &[]).unwrap_err();
    assert!(err.to_string().contains("Empty"));
}

#[test]
fn test_trait_can_call_protected_requirement() {
    let engine = Engine::new();
    let reporter = engine
        .declare_trait(
            Definition::new_trait("Reporter")
                .signature("abstract protected data", &[])
                .method("public report", 0, |ctx, _| Ok(Value::from(format!("[{}]", ctx.call("data", &[])?)))),
        )
        .unwrap();
    let class = engine
        .mix([&reporter])
        .extend(Definition::class("Source").method("protected data", 0, |_, _| Ok(Value::from(42))))
        .unwrap();

    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("report", &[]).unwrap(), Value::from("[42]"));
    assert!(!inst.has_method("data"));
}

#[test]
fn test_protected_trait_method_stays_protected() {
    let engine = Engine::new();
    let helper = engine
        .declare_trait(Definition::new_trait("Helper").method("protected assist", 0, |_, _| Ok(Value::from("assist"))))
        .unwrap();
    let class = engine
        .mix([&helper])
        .extend(Definition::class("User").method("public work", 0, |ctx, _| ctx.call("assist", &[])))
        .unwrap();

    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("work", &[]).unwrap(), Value::from("assist"));
    assert!(matches!(inst.call("assist", &[]), Err(EngineError::UndefinedMethod { .. })));
}

// ============================================================================
// Isolation Tests
// ============================================================================

fn secretive(engine: &Engine) -> TraitRef {
    engine
        .declare_trait(
            Definition::new_trait("Secretive")
                .property("private _p", "trait secret")
                .method("private _q", 0, |_, _| Ok(Value::from("trait helper")))
                .method("public reveal", 0, |ctx, _| ctx.get("_p"))
                .method("public help", 0, |ctx, _| ctx.call("_q", &[])),
        )
        .unwrap()
}

#[test]
fn test_trait_private_state_is_invisible_to_class() {
    let engine = Engine::new();
    let tr = secretive(&engine);
    let class = engine
        .mix([&tr])
        .extend(
            Definition::class("Consumer")
                .method("public peek", 0, |ctx, _| ctx.get("_p"))
                .method("public probe", 0, |ctx, _| ctx.call("_p", &[]))
                .method("public borrow", 0, |ctx, _| ctx.call("_q", &[])),
        )
        .unwrap();

    let inst = engine.instantiate(&class, &[]).unwrap();
    assert!(inst.get("_p").unwrap().is_undefined());
    assert!(inst.call("peek", &[]).unwrap().is_undefined());
    assert!(matches!(inst.call("probe", &[]), Err(EngineError::UndefinedMethod { .. })));
    assert!(matches!(inst.call("borrow", &[]), Err(EngineError::UndefinedMethod { .. })));

    assert_eq!(inst.call("reveal", &[]).unwrap(), Value::from("trait secret"));
    assert_eq!(inst.call("help", &[]).unwrap(), Value::from("trait helper"));
}

#[test]
fn test_class_and_trait_private_names_are_disjoint() {
    let engine = Engine::new();
    let tr = secretive(&engine);
    let class = engine
        .mix([&tr])
        .extend(
            Definition::class("Consumer")
                .property("private _p", "class secret")
                .method("public mine", 0, |ctx, _| ctx.get("_p")),
        )
        .unwrap();

    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("mine", &[]).unwrap(), Value::from("class secret"));
    assert_eq!(inst.call("reveal", &[]).unwrap(), Value::from("trait secret"));
}

#[test]
fn test_trait_state_is_per_instance() {
    let engine = Engine::new();
    let counter = engine
        .declare_trait(
            Definition::new_trait("Counter")
                .property("private _n", 0)
                .method("public bump", 0, |ctx, _| {
                    let n = ctx.get("_n")?.as_number().unwrap_or(0.0) + 1.0;
                    ctx.set("_n", n)?;
                    Ok(Value::from(n))
                }),
        )
        .unwrap();
    let class = engine.mix([&counter]).extend(Definition::class("Counted")).unwrap();

    let a = engine.instantiate(&class, &[]).unwrap();
    let b = engine.instantiate(&class, &[]).unwrap();
    a.call("bump", &[]).unwrap();
    assert_eq!(a.call("bump", &[]).unwrap(), Value::from(2));
    assert_eq!(b.call("bump", &[]).unwrap(), Value::from(1));
}

// ============================================================================
// Mixin Ordering Tests
// ============================================================================

fn readiness(engine: &Engine) -> TraitRef {
    engine
        .declare_trait(
            Definition::new_trait("Readiness")
                .property("private _ready", false)
                .mixin(0, |ctx, _| ctx.set("_ready", true).map(|_| Value::Undefined))
                .method("public ready", 0, |ctx, _| ctx.get("_ready")),
        )
        .unwrap()
}

#[test]
fn test_use_then_extend_runs_mixin_before_constructor() {
    let engine = Engine::new();
    let tr = readiness(&engine);
    let base = base(&engine);
    let class = engine
        .use_traits(&base, [&tr])
        .extend(Definition::class("Eager").constructor(0, |ctx, _| {
            if !ctx.call("ready", &[])?.is_truthy() {
                return Err(EngineError::thrown("trait not initialized"));
            }
            Ok(Value::Undefined)
        }))
        .unwrap();

    assert!(engine.instantiate(&class, &[]).is_ok());
}

fn flag_checker(engine: &Engine) -> TraitRef {
    engine
        .declare_trait(
            Definition::new_trait("FlagChecker")
                .signature("abstract public flagged", &[])
                .mixin(0, |ctx, _| {
                    if !ctx.call("flagged", &[])?.is_truthy() {
                        return Err(EngineError::thrown("class constructor has not run"));
                    }
                    Ok(Value::Undefined)
                }),
        )
        .unwrap()
}

fn flagging_class() -> Definition {
    Definition::class("Flagging")
        .property("private _flag", false)
        .method("public flagged", 0, |ctx, _| ctx.get("_flag"))
        .constructor(0, |ctx, _| ctx.set("_flag", true).map(|_| Value::Undefined))
}

#[test]
fn test_mix_then_extend_from_runs_constructor_first() {
    let engine = Engine::new();
    let tr = flag_checker(&engine);
    let base = base(&engine);

    let class = engine.mix([&tr]).extend_from(&base, flagging_class()).unwrap();
    assert!(class.inherits(base.id()));
    assert!(engine.instantiate(&class, &[]).is_ok());
}

#[test]
fn test_extend_runs_mixin_before_constructor_sees_no_flag() {
    let engine = Engine::new();
    let tr = flag_checker(&engine);
    let base = base(&engine);

    let class = engine.use_traits(&base, [&tr]).extend(flagging_class()).unwrap();
    assert_eq!(
        engine.instantiate(&class, &[]).unwrap_err(),
        EngineError::thrown("class constructor has not run")
    );
}

#[test]
fn test_sibling_traits_initialize_once_each() {
    let engine = Engine::new();
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    let (f, s) = (Rc::clone(&first), Rc::clone(&second));
    let t1 = engine
        .declare_trait(Definition::new_trait("First").mixin(0, move |_, _| {
            f.set(f.get() + 1);
            Ok(Value::Undefined)
        }))
        .unwrap();
    let t2 = engine
        .declare_trait(Definition::new_trait("Second").mixin(0, move |_, _| {
            s.set(s.get() + 1);
            Ok(Value::Undefined)
        }))
        .unwrap();

    let class = engine.mix([&t1, &t2]).extend(Definition::class("Both")).unwrap();
    engine.instantiate(&class, &[]).unwrap();
    engine.instantiate(&class, &[]).unwrap();
    assert_eq!(first.get(), 2);
    assert_eq!(second.get(), 2);
}

#[test]
fn test_parameterized_trait() {
    let engine = Engine::new();
    let prefixed = engine
        .declare_trait(
            Definition::new_trait("Prefixed")
                .property("private _prefix", "")
                .mixin(1, |ctx, args| {
                    ctx.set("_prefix", args.first().cloned().unwrap_or_default())?;
                    Ok(Value::Undefined)
                })
                .method("public tag", 1, |ctx, args| {
                    let prefix = ctx.get("_prefix")?;
                    let text = args.first().cloned().unwrap_or_default();
                    Ok(Value::from(format!("{}{}", prefix, text)))
                }),
        )
        .unwrap();
    assert!(prefixed.has_mixin());

    let base = base(&engine);
    let class = engine
        .use_traits(&base, [TraitUse::new(&prefixed).with_args(vec![Value::from(">> ")])])
        .extend(Definition::class("Tagger"))
        .unwrap();

    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("tag", &[Value::from("done")]).unwrap(), Value::from(">> done"));
}

#[test]
fn test_arguments_to_trait_without_mixin() {
    let engine = Engine::new();
    let plain = engine
        .declare_trait(Definition::new_trait("Plain").method("public run", 0, |_, _| Ok(Value::Null)))
        .unwrap();
    let err = engine
        .mix([TraitUse::new(&plain).with_args(vec![Value::from(1)])])
        .extend(Definition::class("C"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::MixinArguments { .. }, .. }));
}

// ============================================================================
// Linearization Tests
// ============================================================================

#[test]
fn test_stacked_traits_compose_in_order() {
    let engine = Engine::new();
    let logger = logger(&engine);
    let t1 = stacking_trait(&engine, "First", "t1");
    let t2 = stacking_trait(&engine, "Second", "t2");

    let class = engine.use_traits(&logger, [&t1, &t2]).extend(Definition::class("Stacked")).unwrap();
    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("log", &[]).unwrap(), Value::from("t2>t1>base"));

    let reversed = engine.use_traits(&logger, [&t2, &t1]).extend(Definition::class("Reversed")).unwrap();
    let inst = engine.instantiate(&reversed, &[]).unwrap();
    assert_eq!(inst.call("log", &[]).unwrap(), Value::from("t1>t2>base"));
}

#[test]
fn test_class_override_supers_into_last_trait() {
    let engine = Engine::new();
    let logger = logger(&engine);
    let t1 = stacking_trait(&engine, "First", "t1");

    let class = engine
        .use_traits(&logger, [&t1])
        .extend(Definition::class("Own").method("override public log", 0, |ctx, _| {
            Ok(Value::from(format!("own>{}", ctx.call_super(&[])?)))
        }))
        .unwrap();

    let inst = engine.instantiate(&class, &[]).unwrap();
    assert_eq!(inst.call("log", &[]).unwrap(), Value::from("own>t1>base"));
}

#[test]
fn test_abstract_override_needs_super_method() {
    let engine = Engine::new();
    let t1 = stacking_trait(&engine, "First", "t1");
    let base = base(&engine);

    let err = engine.use_traits(&base, [&t1]).extend(Definition::class("C")).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation { error: ValidationError::AbstractOverrideWithoutSuper { .. }, .. }
    ));
}

#[test]
fn test_abstract_override_needs_concrete_super_method() {
    let engine = Engine::new();
    let shape = engine
        .declare_class(Definition::abstract_class("Shape").signature("abstract public area", &[]), None)
        .unwrap();
    let scaled = engine
        .declare_trait(Definition::new_trait("Scaled").method("abstract override public area", 0, |ctx, _| {
            let area = ctx.call_super(&[])?.as_number().unwrap_or(0.0);
            Ok(Value::from(area * 2.0))
        }))
        .unwrap();

    let err = engine
        .use_traits(&shape, [&scaled])
        .extend(Definition::class("Square"))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation { error: ValidationError::AbstractOverrideWithoutSuper { ref member }, .. } if member == "area"
    ));

    let unit = engine
        .declare_class(Definition::class("Unit").method("override public area", 0, |_, _| Ok(Value::from(1))), Some(&shape))
        .unwrap();
    let doubled = engine.use_traits(&unit, [&scaled]).extend(Definition::class("Doubled")).unwrap();
    let inst = engine.instantiate(&doubled, &[]).unwrap();
    assert_eq!(inst.call("area", &[]).unwrap(), Value::from(2.0));
}

#[test]
fn test_class_cannot_silently_replace_trait_method() {
    let engine = Engine::new();
    let tr = secretive(&engine);
    let result = engine
        .mix([&tr])
        .extend(Definition::class("Clash").method("public reveal", 0, |_, _| Ok(Value::Null)));
    assert!(matches!(result, Err(EngineError::Validation { .. })));
}

// ============================================================================
// Trait Declaration Error Tests
// ============================================================================

#[test]
fn test_trait_declaration_rules() {
    let engine = Engine::new();

    let err = engine
        .declare_trait(Definition::new_trait("T").constructor(0, |_, _| Ok(Value::Undefined)))
        .unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::TraitConstructor, .. }));

    let err = engine.declare_trait(Definition::new_trait("T").property("public x", 1)).unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::TraitProperty { .. }, .. }));

    let err = engine
        .declare_trait(Definition::new_trait("T").method("public static make", 0, |_, _| Ok(Value::Null)))
        .unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::TraitStatic { .. }, .. }));

    let iface = engine
        .declare_interface(Definition::interface("I").signature("public run", &[]), None)
        .unwrap();
    let err = engine.declare_trait(Definition::new_trait("T").implements(&iface)).unwrap_err();
    assert!(matches!(err, EngineError::Declaration { error: DeclarationError::InvalidSupertype { .. }, .. }));
}
