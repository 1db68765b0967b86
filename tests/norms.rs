//! Integration tests for norm declaration and verification.
//!
//! The fixture mirrors a layered application: a runtime library, a services library and a
//! test assembly whose types each break (or respect) one convention.

use std::sync::Arc;

use cilnorm::{metadata::builder::MethodBuilder, norm::build_failure_message, prelude::*};

const RUNTIME: &str = "System.Runtime";
const SERVICES: &str = "Norman.Services";
const TESTS: &str = "Norman.Tests";
const TYPES: &str = "Norman.Tests.Types";

fn runtime() -> Result<AssemblyRc> {
    AssemblyBuilder::new(RUNTIME)
        .class(TypeBuilder::new("Object").namespace("System").public())
        .class(
            TypeBuilder::new("IFormatProvider")
                .namespace("System")
                .public()
                .interface(),
        )
        .class(
            TypeBuilder::new("DateTime")
                .namespace("System")
                .public()
                .sealed()
                .static_property("Now", "System.DateTime")
                .static_property("UtcNow", "System.DateTime"),
        )
        .class(
            TypeBuilder::new("Int32")
                .namespace("System")
                .public()
                .method(|m| {
                    m.name("Parse")
                        .public()
                        .static_()
                        .param("System.String")
                        .returns("System.Int32")
                })
                .method(|m| {
                    m.name("Parse")
                        .public()
                        .static_()
                        .param("System.String")
                        .param("System.IFormatProvider")
                        .returns("System.Int32")
                }),
        )
        .build()
}

fn services() -> Result<AssemblyRc> {
    AssemblyBuilder::new(SERVICES)
        .class(
            TypeBuilder::new("RepositoryBase")
                .namespace(SERVICES)
                .public()
                .abstract_()
                .method(|m| m.name("Save").public().virtual_()),
        )
        .class(
            TypeBuilder::new("UserRepository")
                .namespace(SERVICES)
                .public()
                .extends("Norman.Services.RepositoryBase"),
        )
        .build()
}

fn stamp(getter: &str) -> impl FnOnce(MethodBuilder) -> MethodBuilder {
    let callee = Callee::getter("System.DateTime", getter, "System.DateTime").in_assembly(RUNTIME);
    move |m| {
        m.name("Stamp")
            .public()
            .returns("System.DateTime")
            .implementation(|body| body.call(callee).ret())
    }
}

fn tests_assembly() -> Result<AssemblyRc> {
    AssemblyBuilder::new(TESTS)
        .class(
            TypeBuilder::new("SimpleNormForTypesTests")
                .namespace(TESTS)
                .public(),
        )
        .class(TypeBuilder::new("FooTests").namespace(TESTS))
        .class(
            TypeBuilder::new("IActivable")
                .namespace(TYPES)
                .public()
                .interface()
                .method(|m| m.name("Activate").public()),
        )
        .class(
            TypeBuilder::new("HasIsActiveProperty")
                .namespace(TYPES)
                .public()
                .auto_property("IsActive", "System.Boolean"),
        )
        .class(
            TypeBuilder::new("ActivableThing")
                .namespace(TYPES)
                .public()
                .implements("Norman.Tests.Types.IActivable")
                .auto_property("IsActive", "System.Boolean")
                .method(|m| m.name("Activate").public().virtual_()),
        )
        .class(
            TypeBuilder::new("UseDateTimeNow")
                .namespace(TYPES)
                .public()
                .method(stamp("Now")),
        )
        .class(
            TypeBuilder::new("UseDateTimeUtcNow")
                .namespace(TYPES)
                .public()
                .method(stamp("UtcNow")),
        )
        .class(
            TypeBuilder::new("ParsesWithProvider")
                .namespace(TYPES)
                .public()
                .method(|m| {
                    m.name("Read").public().returns("System.Int32").implementation(|body| {
                        body.ldstr("42")
                            .ldnull()
                            .call(
                                Callee::method("System.Int32", "Parse")
                                    .in_assembly(RUNTIME)
                                    .params(["System.String", "System.IFormatProvider"])
                                    .returns("System.Int32"),
                            )
                            .ret()
                    })
                }),
        )
        .class(
            TypeBuilder::new("CallsInheritedSave")
                .namespace(TYPES)
                .public()
                .method(|m| {
                    m.name("Persist").public().implementation(|body| {
                        body.ldnull()
                            .callvirt(
                                Callee::method("Norman.Services.UserRepository", "Save")
                                    .in_assembly(SERVICES),
                            )
                            .ret()
                    })
                }),
        )
        .class(
            TypeBuilder::new("FooService")
                .namespace("Norman.Tests.Types.Services")
                .public()
                .method(|m| m.name("Fetch").public()),
        )
        .class(
            TypeBuilder::new("BarViewModel")
                .namespace("Norman.Tests.Types.ViewModels")
                .public()
                .method(|m| {
                    m.name("Load").public().implementation(|body| {
                        body.ldnull()
                            .callvirt(Callee::method(
                                "Norman.Tests.Types.Services.FooService",
                                "Fetch",
                            ))
                            .ret()
                    })
                }),
        )
        .class(
            TypeBuilder::new("FooViewModel")
                .namespace("Norman.Tests.Types.ViewModels")
                .public()
                .method(|m| m.name("Load").public()),
        )
        .build()
}

fn universe() -> Result<Arc<Universe>> {
    Ok(Arc::new(Universe::from_assemblies([
        runtime()?,
        services()?,
        tests_assembly()?,
    ])))
}

fn expect_failure(result: Result<()>) -> VerificationFailure {
    match result {
        Err(Error::VerificationFailure(failure)) => *failure,
        other => panic!("expected a verification failure, got {other:?}"),
    }
}

#[test]
fn test_types_named_tests_must_be_public() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_assemblies(|a| a.full_name().contains(".Tests"))
        .for_types(|t| t.name.ends_with("Tests"))
        .must_satisfy(CilType::is_public);

    let failure = expect_failure(norm.verify());
    assert_eq!(failure.violations.len(), 1);
    assert_eq!(failure.violations.full_names(), vec!["Norman.Tests.FooTests"]);
    assert_eq!(
        failure.message,
        "The following 1 types don't conform to the norm.\nNorman.Tests.FooTests\n"
    );
    Ok(())
}

#[test]
fn test_is_active_property_requires_interface() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_types(|t| t.property("IsActive").is_some())
        .must_implement("Norman.Tests.Types.IActivable")?;

    let error = norm.verify().unwrap_err();
    assert_eq!(
        error.to_string(),
        "The following 1 types don't conform to the norm.\nNorman.Tests.Types.HasIsActiveProperty\n"
    );
    Ok(())
}

#[test]
fn test_view_models_must_not_call_services() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_assemblies(|a| a.full_name().contains(".Tests"))
        .for_types(|t| t.namespace.ends_with(".ViewModels"))
        .must_not_call_any(|t| t.namespace.ends_with(".Services"));

    let failure = expect_failure(norm.verify());
    assert_eq!(
        failure.violations.full_names(),
        vec!["Norman.Tests.Types.ViewModels.BarViewModel"]
    );
    Ok(())
}

#[test]
fn test_types_must_not_read_the_clock() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_types(|t| t.namespace.ends_with(".Types"))
        .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;

    let failure = expect_failure(norm.verify());
    assert_eq!(
        failure.violations.full_names(),
        vec!["Norman.Tests.Types.UseDateTimeNow"]
    );
    assert!(!failure.violations.contains("Norman.Tests.Types.UseDateTimeUtcNow"));
    Ok(())
}

#[test]
fn test_conforming_scope_passes() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    // each type avoids at least one of the two clocks
    norm.for_types(|t| t.namespace.ends_with(".Types"))
        .must_not_call(MethodDescriptor::getter("System.DateTime", "UtcNow"))?
        .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;
    norm.for_types(|t| t.name.ends_with("Tests"));

    norm.verify()
}

#[test]
fn test_overloads_are_not_confused() -> Result<()> {
    let universe = universe()?;

    let mut single = Norm::new(universe.clone());
    single
        .for_types(|t| t.name == "ParsesWithProvider")
        .must_not_call(MethodDescriptor::method("System.Int32", "Parse").params(["System.String"]))?;
    single.verify()?;

    let mut provider = Norm::new(universe);
    provider
        .for_types(|t| t.name == "ParsesWithProvider")
        .must_not_call(
            MethodDescriptor::method("System.Int32", "Parse")
                .params(["System.String", "System.IFormatProvider"]),
        )?;
    assert_eq!(expect_failure(provider.verify()).violations.len(), 1);
    Ok(())
}

#[test]
fn test_inherited_method_through_derived_type() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_types(|t| t.namespace == TYPES)
        .must_not_call(MethodDescriptor::method("Norman.Services.RepositoryBase", "Save"))?;

    let failure = expect_failure(norm.verify());
    assert_eq!(
        failure.violations.full_names(),
        vec!["Norman.Tests.Types.CallsInheritedSave"]
    );
    Ok(())
}

const DATA: &str = "Norman.Data";
const APP: &str = "Norman.App";

fn data() -> Result<AssemblyRc> {
    AssemblyBuilder::new(DATA)
        .class(
            TypeBuilder::new("RepositoryBase")
                .namespace(DATA)
                .public()
                .abstract_()
                .method(|m| m.name("Save").public().virtual_()),
        )
        .class(
            TypeBuilder::new("AuditedRepository")
                .namespace(DATA)
                .public()
                .extends("Norman.Data.RepositoryBase")
                .method(|m| m.name("Save").public().virtual_()),
        )
        .class(
            TypeBuilder::new("Factory")
                .namespace(DATA)
                .public()
                .method(|m| m.name("Create").public().static_().returns("System.Object")),
        )
        .build()
}

fn calling(name: &str, callee: Callee) -> TypeBuilder {
    TypeBuilder::new(name).namespace(APP).public().method(|m| {
        m.name("Run")
            .public()
            .implementation(|body| body.ldnull().callvirt(callee).ret())
    })
}

fn app() -> Result<AssemblyRc> {
    AssemblyBuilder::new(APP)
        .class(calling(
            "CallsBase",
            Callee::method("Norman.Data.RepositoryBase", "Save").in_assembly(DATA),
        ))
        .class(calling(
            "CallsOverride",
            Callee::method("Norman.Data.AuditedRepository", "Save").in_assembly(DATA),
        ))
        .class(calling(
            "CallsGeneric",
            Callee::method("Norman.Data.Factory", "Create")
                .in_assembly(DATA)
                .returns("System.Object")
                .generic(),
        ))
        .class(TypeBuilder::new("Idle").namespace(APP).public())
        .build()
}

fn app_violations(config: VerifyConfig, method: MethodDescriptor) -> Result<Vec<String>> {
    let universe = Arc::new(Universe::from_assemblies([data()?, app()?]));
    let mut norm = Norm::with_config(universe, config);
    norm.for_assemblies(|a| a.name() == APP)
        .for_types(|_| true)
        .must_not_call(method)?;

    let sets = norm.evaluate();
    Ok(sets[0].full_names().into_iter().map(String::from).collect())
}

#[test]
fn test_override_with_same_name_is_a_different_method() -> Result<()> {
    let base = || MethodDescriptor::method("Norman.Data.RepositoryBase", "Save");
    let derived = || MethodDescriptor::method("Norman.Data.AuditedRepository", "Save");

    assert_eq!(
        app_violations(VerifyConfig::default(), base())?,
        vec!["Norman.App.CallsBase"]
    );
    assert_eq!(
        app_violations(VerifyConfig::default(), derived())?,
        vec!["Norman.App.CallsOverride"]
    );
    Ok(())
}

#[test]
fn test_generic_instantiation_matches_its_method() -> Result<()> {
    let create = || MethodDescriptor::method("Norman.Data.Factory", "Create");
    let unfiltered = VerifyConfig {
        name_prefilter: false,
        ..VerifyConfig::default()
    };

    for config in [
        VerifyConfig::sequential(),
        VerifyConfig::parallel(),
        unfiltered,
    ] {
        assert_eq!(
            app_violations(config, create())?,
            vec!["Norman.App.CallsGeneric"]
        );
    }
    Ok(())
}

#[test]
fn test_shared_predicates_across_groups() -> Result<()> {
    let public = type_predicate(CilType::is_public);
    let mut norm = Norm::new(universe()?);
    norm.for_types(|t| t.name.ends_with("Tests"))
        .must_satisfy_all([public.clone(), type_predicate(|t| t.namespace == TESTS)]);
    norm.for_types(|t| t.property("IsActive").is_some()).must(
        RuleGroup::new()
            .satisfies_shared(public)
            .implements("Norman.Tests.Types.IActivable"),
    )?;

    let sets = norm.evaluate();
    assert_eq!(sets[0].full_names(), vec!["Norman.Tests.FooTests"]);
    assert_eq!(
        sets[1].full_names(),
        vec!["Norman.Tests.Types.HasIsActiveProperty"]
    );
    Ok(())
}

#[test]
fn test_forbidden_types_come_from_all_matched_assemblies() -> Result<()> {
    let universe = universe()?;

    // Norman.Services is outside the scope, so RepositoryBase is not forbidden
    let mut scoped = Norm::new(universe.clone());
    scoped
        .for_assemblies(|a| a.name() == TESTS)
        .for_types(|t| t.name == "CallsInheritedSave")
        .must_not_call_any(|t| t.namespace.ends_with(".Services"));
    scoped.verify()?;

    let mut everything = Norm::new(universe);
    everything
        .for_types(|t| t.name == "CallsInheritedSave")
        .must_not_call_any(|t| t.namespace.ends_with(".Services"));
    assert_eq!(expect_failure(everything.verify()).violations.len(), 1);
    Ok(())
}

#[test]
fn test_groups_are_alternatives() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_types(|t| t.namespace == TYPES && !t.is_interface())
        .must(
            RuleGroup::new()
                .not_calling(MethodDescriptor::getter("System.DateTime", "Now"))
                .satisfies(|t| t.property("IsActive").is_none()),
        )?
        .must_implement("Norman.Tests.Types.IActivable")?;

    let failure = expect_failure(norm.verify());
    assert_eq!(
        failure.violations.full_names(),
        vec![
            "Norman.Tests.Types.HasIsActiveProperty",
            "Norman.Tests.Types.UseDateTimeNow"
        ]
    );
    Ok(())
}

#[test]
fn test_scope_without_rules_conforms() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_types(|_| true);
    norm.for_types(|_| true).must(RuleGroup::new())?;

    assert!(norm.evaluate().iter().all(ViolationSet::is_empty));
    norm.verify()
}

#[test]
fn test_declaration_errors() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    let types = norm.for_types(|_| true);

    match types.must_not_call(MethodDescriptor::method("System.Int32", "Parse")) {
        Err(Error::AmbiguousOrMissingMethod { method, candidates }) => {
            assert_eq!(method, "System.Int32::Parse");
            assert_eq!(candidates, 2);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
    assert!(matches!(
        types.must_not_call(MethodDescriptor::method("System.DateTime", "Tomorrow")),
        Err(Error::AmbiguousOrMissingMethod { candidates: 0, .. })
    ));
    assert!(matches!(
        types.must_implement("Norman.Tests.Types.IMissing"),
        Err(Error::TypeNotFound(name)) if name == "Norman.Tests.Types.IMissing"
    ));
    assert_eq!(types.group_count(), 0);
    Ok(())
}

#[test]
fn test_verification_is_repeatable() -> Result<()> {
    let mut norm = Norm::new(universe()?);
    norm.for_types(|t| t.namespace.ends_with(".ViewModels"))
        .must_not_call_any(|t| t.namespace.ends_with(".Services"));
    norm.for_types(|t| t.namespace.ends_with(".Types"))
        .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;

    let first = norm.evaluate();
    assert_eq!(norm.evaluate(), first);

    let once = expect_failure(norm.verify());
    let twice = expect_failure(norm.verify());
    assert_eq!(once.violations, first[0]);
    assert_eq!(twice.violations, first[0]);
    assert_eq!(once.message, twice.message);
    assert_eq!(once.message, build_failure_message(&first[0]));
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let universe = universe()?;
    let declare = |norm: &mut Norm| -> Result<()> {
        norm.for_types(|t| t.name.ends_with("Tests"))
            .must_satisfy(CilType::is_public);
        norm.for_types(|t| t.namespace.ends_with(".ViewModels"))
            .must_not_call_any(|t| t.namespace.ends_with(".Services"));
        norm.for_types(|t| t.namespace.ends_with(".Types"))
            .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;
        Ok(())
    };

    let mut sequential = Norm::with_config(universe.clone(), VerifyConfig::sequential());
    declare(&mut sequential)?;
    let mut parallel = Norm::with_config(universe, VerifyConfig::parallel());
    declare(&mut parallel)?;
    assert!(parallel.config().parallel);

    assert_eq!(sequential.evaluate(), parallel.evaluate());
    Ok(())
}

#[test]
fn test_prefilter_does_not_change_results() -> Result<()> {
    let universe = universe()?;
    let config = VerifyConfig {
        name_prefilter: false,
        ..VerifyConfig::default()
    };

    let mut with = Norm::new(universe.clone());
    let mut without = Norm::with_config(universe, config);
    for norm in [&mut with, &mut without] {
        norm.for_types(|t| t.namespace == TYPES)
            .must_not_call(MethodDescriptor::method("Norman.Services.RepositoryBase", "Save"))?;
    }
    assert_eq!(with.evaluate(), without.evaluate());
    Ok(())
}

#[test]
fn test_collecting_sink_sees_every_scope() -> Result<()> {
    let sink = Arc::new(CollectingSink::new());
    let mut norm = Norm::new(universe()?).with_sink(sink.clone());
    norm.for_types(|t| t.name.ends_with("Tests"))
        .must_satisfy(CilType::is_public);
    norm.for_types(|t| t.property("IsActive").is_some())
        .must_implement("Norman.Tests.Types.IActivable")?;
    norm.for_types(|t| t.namespace.ends_with(".Types"))
        .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;

    norm.verify()?;
    let failures = sink.take();
    assert_eq!(failures.len(), 3);
    assert!(failures
        .iter()
        .all(|failure| failure.violations.len() == 1 && failure.message.starts_with("The following 1")));
    Ok(())
}

#[test]
fn test_multi_module_assembly() -> Result<()> {
    let app = AssemblyBuilder::new("Modular.App")
        .class(TypeBuilder::new("Entry").namespace("Modular").public())
        .module(
            ModuleBuilder::new("Modular.Extra.netmodule").class(
                TypeBuilder::new("Clock").namespace("Modular").method(|m| {
                    m.name("Tick").implementation(|body| {
                        body.call(
                            Callee::getter("System.DateTime", "Now", "System.DateTime")
                                .in_assembly(RUNTIME),
                        )
                        .pop()
                        .ret()
                    })
                }),
            ),
        )
        .build()?;
    let universe = Arc::new(Universe::from_assemblies([runtime()?, app]));

    let mut norm = Norm::new(universe);
    norm.for_assemblies(|a| a.name() == "Modular.App")
        .for_types(|_| true)
        .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;

    let failure = expect_failure(norm.verify());
    assert_eq!(failure.violations.full_names(), vec!["Modular.Clock"]);
    assert_eq!(failure.violations.iter().next().unwrap().assembly, "Modular.App");
    Ok(())
}
