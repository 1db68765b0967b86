//! Shared fixtures for unit tests.
//!
//! [`fixture_universe`] mirrors a small layered application: a runtime library, a services
//! library and a test assembly whose types exercise every kind of rule.

use crate::metadata::{
    builder::{AssemblyBuilder, Callee, TypeBuilder},
    universe::{AssemblyRc, TypeHandle, Universe},
};

const RUNTIME: &str = "System.Runtime";
const SERVICES: &str = "Norman.Services";
const TESTS: &str = "Norman.Tests";

fn runtime() -> AssemblyRc {
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
                .sealed()
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
        .unwrap()
}

fn services() -> AssemblyRc {
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
        .unwrap()
}

fn tests() -> AssemblyRc {
    let types = "Norman.Tests.Types";
    let now = Callee::getter("System.DateTime", "Now", "System.DateTime").in_assembly(RUNTIME);
    let utc_now =
        Callee::getter("System.DateTime", "UtcNow", "System.DateTime").in_assembly(RUNTIME);

    AssemblyBuilder::new(TESTS)
        .class(
            TypeBuilder::new("SimpleNormForTypesTests")
                .namespace(TESTS)
                .public()
                .method(|m| m.name("Verify").public()),
        )
        .class(TypeBuilder::new("FooTests").namespace(TESTS))
        .class(
            TypeBuilder::new("IActivable")
                .namespace(types)
                .public()
                .interface()
                .method(|m| m.name("Activate").public()),
        )
        .class(
            TypeBuilder::new("HasIsActiveProperty")
                .namespace(types)
                .public()
                .auto_property("IsActive", "System.Boolean"),
        )
        .class(
            TypeBuilder::new("ActivableThing")
                .namespace(types)
                .public()
                .implements("Norman.Tests.Types.IActivable")
                .auto_property("IsActive", "System.Boolean")
                .method(|m| m.name("Activate").public().virtual_()),
        )
        .class(
            TypeBuilder::new("UseDateTimeNow")
                .namespace(types)
                .public()
                .method(|m| {
                    m.name("Stamp")
                        .public()
                        .returns("System.DateTime")
                        .implementation(|body| body.call(now).ret())
                }),
        )
        .class(
            TypeBuilder::new("UseDateTimeUtcNow")
                .namespace(types)
                .public()
                .method(|m| {
                    m.name("Stamp")
                        .public()
                        .returns("System.DateTime")
                        .implementation(|body| body.call(utc_now).ret())
                }),
        )
        .class(
            TypeBuilder::new("ParsesWithProvider")
                .namespace(types)
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
                .namespace(types)
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
                            .callvirt(Callee::method("Norman.Tests.Types.Services.FooService", "Fetch"))
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
        .unwrap()
}

/// A universe of a runtime library, a services library and a test assembly
pub fn fixture_universe() -> Universe {
    Universe::from_assemblies([runtime(), services(), tests()])
}

/// The single definition of `fullname` in `universe`
pub fn type_handle(universe: &Universe, fullname: &str) -> TypeHandle {
    let mut found = universe.find_types(fullname, None);
    assert_eq!(found.len(), 1, "expected one definition of '{fullname}'");
    found.remove(0)
}
