//! Fluent builders that construct assemblies in memory.
//!
//! The builders play the part a metadata reader plays for files on disk: they allocate
//! tokens, lower method bodies to [`Instruction`] lists and turn every call target into
//! the token a compiler would have emitted.
//!
//! - A [`Callee`] on a type of the same module becomes a `MethodDef` token.
//! - Any other callee becomes a `MemberRef` row (deduplicated per module).
//! - A callee marked [`Callee::generic`] is additionally wrapped in a `MethodSpec` row.
//!
//! # Examples
//!
//! ```rust,ignore
//! use cilnorm::prelude::*;
//!
//! let app = AssemblyBuilder::new("MyApp")
//!     .class(
//!         TypeBuilder::new("Clock")
//!             .namespace("MyApp.Types")
//!             .public()
//!             .method(|method| {
//!                 method.public().implementation(|body| {
//!                     body.call(
//!                         Callee::getter("System.DateTime", "Now", "System.DateTime")
//!                             .in_assembly("System.Runtime"),
//!                     )
//!                     .pop()
//!                     .ret()
//!                 })
//!             }),
//!     )
//!     .build()?;
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use sha1::{Digest, Sha1};

use crate::{
    assembly::{Instruction, OpCode, Operand, FE_PREFIX},
    metadata::{
        identity::{AssemblyIdentity, AssemblyVersion},
        method::{Method, MethodAccessFlags, MethodModifiers, MethodSignature},
        module::{MemberRef, MethodSpec, Module, ModuleRc},
        token::{Token, TABLE_MEMBERREF, TABLE_METHODDEF, TABLE_METHODSPEC, TABLE_TYPEDEF},
        typesystem::{CilType, Property, TypeAttributes},
        universe::{Assembly, AssemblyRc},
    },
    Result,
};

const VOID: &str = "System.Void";

/// The target of a call instruction, described by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callee {
    assembly: Option<String>,
    type_name: String,
    name: String,
    params: Option<Vec<String>>,
    returns: Option<String>,
    generic: bool,
}

impl Callee {
    /// A method `name` declared on (or inherited by) the type `type_name`
    pub fn method(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Callee {
            assembly: None,
            type_name: type_name.into(),
            name: name.into(),
            params: None,
            returns: None,
            generic: false,
        }
    }

    /// The getter of `property`, returning `property_type`
    pub fn getter(
        type_name: impl Into<String>,
        property: &str,
        property_type: impl Into<String>,
    ) -> Self {
        Callee::method(type_name, format!("get_{property}"))
            .params(Vec::<String>::new())
            .returns(property_type)
    }

    /// The setter of `property`, taking `property_type`
    pub fn setter(
        type_name: impl Into<String>,
        property: &str,
        property_type: impl Into<String>,
    ) -> Self {
        let property_type: String = property_type.into();
        Callee::method(type_name, format!("set_{property}"))
            .params([property_type])
            .returns(VOID)
    }

    /// The assembly expected to define the type
    #[must_use]
    pub fn in_assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }

    /// Parameter type names; selects one overload
    #[must_use]
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// Return type name
    #[must_use]
    pub fn returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }

    /// Emit the call through a generic instantiation (`MethodSpec`)
    #[must_use]
    pub fn generic(mut self) -> Self {
        self.generic = true;
        self
    }
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(assembly) = &self.assembly {
            write!(f, "[{assembly}]")?;
        }
        write!(f, "{}::{}", self.type_name, self.name)?;
        if let Some(params) = &self.params {
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}

enum PendingOp {
    Plain(OpCode, Operand),
    Call(OpCode, Callee),
}

/// Builds a method body instruction by instruction.
///
/// Offsets are assigned from the encoded size of each instruction when the owning
/// module is built.
#[derive(Default)]
pub struct BodyBuilder {
    ops: Vec<PendingOp>,
}

impl BodyBuilder {
    /// Creates an empty body
    #[must_use]
    pub fn new() -> Self {
        BodyBuilder { ops: Vec::new() }
    }

    /// Appends an arbitrary instruction
    #[must_use]
    pub fn emit(mut self, opcode: OpCode, operand: Operand) -> Self {
        self.ops.push(PendingOp::Plain(opcode, operand));
        self
    }

    /// `nop`
    #[must_use]
    pub fn nop(self) -> Self {
        self.emit(OpCode::Nop, Operand::None)
    }

    /// `ldarg.0`
    #[must_use]
    pub fn ldarg_0(self) -> Self {
        self.emit(OpCode::Ldarg0, Operand::None)
    }

    /// `ldnull`
    #[must_use]
    pub fn ldnull(self) -> Self {
        self.emit(OpCode::Ldnull, Operand::None)
    }

    /// `ldc.i4 value`
    #[must_use]
    pub fn ldc_i4(self, value: i32) -> Self {
        self.emit(OpCode::LdcI4, Operand::Immediate(i64::from(value)))
    }

    /// `ldstr value`
    #[must_use]
    pub fn ldstr(self, value: &str) -> Self {
        self.emit(OpCode::Ldstr, Operand::String(value.to_string()))
    }

    /// `pop`
    #[must_use]
    pub fn pop(self) -> Self {
        self.emit(OpCode::Pop, Operand::None)
    }

    /// `dup`
    #[must_use]
    pub fn dup(self) -> Self {
        self.emit(OpCode::Dup, Operand::None)
    }

    /// `throw`
    #[must_use]
    pub fn throw(self) -> Self {
        self.emit(OpCode::Throw, Operand::None)
    }

    /// `ret`
    #[must_use]
    pub fn ret(self) -> Self {
        self.emit(OpCode::Ret, Operand::None)
    }

    /// `call callee`
    #[must_use]
    pub fn call(mut self, callee: Callee) -> Self {
        self.ops.push(PendingOp::Call(OpCode::Call, callee));
        self
    }

    /// `callvirt callee`
    #[must_use]
    pub fn callvirt(mut self, callee: Callee) -> Self {
        self.ops.push(PendingOp::Call(OpCode::Callvirt, callee));
        self
    }

    /// `newobj callee`
    #[must_use]
    pub fn newobj(mut self, callee: Callee) -> Self {
        self.ops.push(PendingOp::Call(OpCode::Newobj, callee));
        self
    }

    /// `ldftn callee`
    #[must_use]
    pub fn ldftn(mut self, callee: Callee) -> Self {
        self.ops.push(PendingOp::Call(OpCode::Ldftn, callee));
        self
    }

    fn lower(self, lowering: &mut Lowering<'_>) -> Result<Vec<Instruction>> {
        let mut offset = 0u32;
        let mut instructions = Vec::with_capacity(self.ops.len());
        for op in self.ops {
            let (opcode, operand) = match op {
                PendingOp::Plain(opcode, operand) => (opcode, operand),
                PendingOp::Call(opcode, callee) => {
                    (opcode, Operand::Token(lowering.callee_token(&callee)?))
                }
            };
            let size = encoded_size(opcode, &operand);
            instructions.push(Instruction::new(offset, opcode, operand));
            offset += size;
        }
        Ok(instructions)
    }
}

fn encoded_size(opcode: OpCode, operand: &Operand) -> u32 {
    let opcode_size = if opcode.code() & 0xFF00 == FE_PREFIX {
        2
    } else {
        1
    };
    match operand {
        Operand::None => opcode_size,
        _ => opcode_size + 4,
    }
}

/// Builds a method definition.
pub struct MethodBuilder {
    name: String,
    params: Vec<String>,
    returns: String,
    access: MethodAccessFlags,
    modifiers: MethodModifiers,
    body: Option<BodyBuilder>,
}

impl MethodBuilder {
    /// A private instance method returning `System.Void`
    pub fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            name: name.into(),
            params: Vec::new(),
            returns: VOID.to_string(),
            access: MethodAccessFlags::PRIVATE,
            modifiers: MethodModifiers::HIDE_BY_SIG,
            body: None,
        }
    }

    /// Rename the method
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make the method public
    #[must_use]
    pub fn public(mut self) -> Self {
        self.access = MethodAccessFlags::PUBLIC;
        self
    }

    /// Make the method private
    #[must_use]
    pub fn private(mut self) -> Self {
        self.access = MethodAccessFlags::PRIVATE;
        self
    }

    /// Append a parameter of type `type_name`
    #[must_use]
    pub fn param(mut self, type_name: impl Into<String>) -> Self {
        self.params.push(type_name.into());
        self
    }

    /// Set the return type
    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = type_name.into();
        self
    }

    /// Mark the method `static`
    #[must_use]
    pub fn static_(mut self) -> Self {
        self.modifiers |= MethodModifiers::STATIC;
        self
    }

    /// Mark the method `virtual`
    #[must_use]
    pub fn virtual_(mut self) -> Self {
        self.modifiers |= MethodModifiers::VIRTUAL;
        self
    }

    /// Mark the method `abstract`, it will have no body
    #[must_use]
    pub fn abstract_(mut self) -> Self {
        self.modifiers |= MethodModifiers::ABSTRACT | MethodModifiers::VIRTUAL;
        self
    }

    /// Mark the method as implemented outside of IL, it will have no body
    #[must_use]
    pub fn extern_(mut self) -> Self {
        self.modifiers |= MethodModifiers::PINVOKE_IMPL | MethodModifiers::STATIC;
        self
    }

    /// Mark the method as a special name (accessors, operators)
    #[must_use]
    pub fn special_name(mut self) -> Self {
        self.modifiers |= MethodModifiers::SPECIAL_NAME;
        self
    }

    /// Provide the body. Methods without one get a single `ret`.
    #[must_use]
    pub fn implementation<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BodyBuilder) -> BodyBuilder,
    {
        self.body = Some(f(BodyBuilder::new()));
        self
    }

    fn signature(&self) -> MethodSignature {
        MethodSignature::new(self.params.iter().cloned(), self.returns.clone())
    }

    fn into_method(
        self,
        token: Token,
        in_interface: bool,
        lowering: &mut Lowering<'_>,
    ) -> Result<Method> {
        let mut modifiers = self.modifiers;
        if in_interface {
            modifiers |= MethodModifiers::ABSTRACT | MethodModifiers::VIRTUAL;
        }
        let signature = self.signature();

        let body = if modifiers.is_bodiless() {
            if self.body.is_some() {
                return Err(malformed_error!(
                    "Method '{}' has no IL implementation but was given a body",
                    self.name
                ));
            }
            None
        } else {
            let body = self.body.unwrap_or_else(|| BodyBuilder::new().ret());
            Some(body.lower(lowering)?)
        };

        Ok(Method {
            token,
            name: self.name,
            signature,
            flags_access: self.access,
            flags_modifiers: modifiers,
            body,
        })
    }
}

struct PropertyDecl {
    name: String,
    type_name: String,
    getter: Option<usize>,
    setter: Option<usize>,
}

/// Builds a type definition.
pub struct TypeBuilder {
    namespace: String,
    name: String,
    flags: u32,
    base: Option<String>,
    interfaces: Vec<String>,
    properties: Vec<PropertyDecl>,
    methods: Vec<MethodBuilder>,
}

impl TypeBuilder {
    /// A non-public class in the global namespace deriving from `System.Object`
    pub fn new(name: impl Into<String>) -> Self {
        TypeBuilder {
            namespace: String::new(),
            name: name.into(),
            flags: TypeAttributes::NOT_PUBLIC,
            base: Some("System.Object".to_string()),
            interfaces: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Set the namespace
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Make the type public
    #[must_use]
    pub fn public(mut self) -> Self {
        self.flags = (self.flags & !TypeAttributes::VISIBILITY_MASK) | TypeAttributes::PUBLIC;
        self
    }

    /// Make the type internal
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.flags &= !TypeAttributes::VISIBILITY_MASK;
        self
    }

    /// Turn the type into an interface; its methods become abstract
    #[must_use]
    pub fn interface(mut self) -> Self {
        self.flags |= TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT;
        self.base = None;
        self
    }

    /// Mark the type `abstract`
    #[must_use]
    pub fn abstract_(mut self) -> Self {
        self.flags |= TypeAttributes::ABSTRACT;
        self
    }

    /// Mark the type `sealed`
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeAttributes::SEALED;
        self
    }

    /// Set the base type (full name)
    #[must_use]
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Add an implemented interface (full name)
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Add a method
    #[must_use]
    pub fn method<F>(mut self, f: F) -> Self
    where
        F: FnOnce(MethodBuilder) -> MethodBuilder,
    {
        self.methods.push(f(MethodBuilder::new(".method")));
        self
    }

    /// Add a read-only property with a public `get_{name}` accessor
    #[must_use]
    pub fn property(self, name: &str, type_name: &str) -> Self {
        self.accessor_property(name, type_name, false, false)
    }

    /// Add a read-only static property with a public `get_{name}` accessor
    #[must_use]
    pub fn static_property(self, name: &str, type_name: &str) -> Self {
        self.accessor_property(name, type_name, false, true)
    }

    /// Add a property with public `get_{name}` and `set_{name}` accessors
    #[must_use]
    pub fn auto_property(self, name: &str, type_name: &str) -> Self {
        self.accessor_property(name, type_name, true, false)
    }

    fn accessor_property(
        mut self,
        name: &str,
        type_name: &str,
        with_setter: bool,
        is_static: bool,
    ) -> Self {
        let accessor = |method_name: String| {
            let method = MethodBuilder::new(method_name).public().special_name();
            if is_static {
                method.static_()
            } else {
                method
            }
        };

        let getter = self.methods.len();
        self.methods
            .push(accessor(format!("get_{name}")).returns(type_name));

        let setter = if with_setter {
            self.methods
                .push(accessor(format!("set_{name}")).param(type_name));
            Some(getter + 1)
        } else {
            None
        };

        self.properties.push(PropertyDecl {
            name: name.to_string(),
            type_name: type_name.to_string(),
            getter: Some(getter),
            setter,
        });
        self
    }

    fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

struct LocalMethod {
    name: String,
    signature: MethodSignature,
    token: Token,
}

type MemberRefKey = (Option<String>, String, String, MethodSignature);

/// Token allocation for call targets while one module is lowered
struct Lowering<'a> {
    assembly: &'a str,
    module: &'a str,
    local: &'a HashMap<String, Vec<LocalMethod>>,
    member_refs: Vec<MemberRef>,
    member_ref_index: HashMap<MemberRefKey, Token>,
    method_specs: Vec<MethodSpec>,
    method_spec_index: HashMap<Token, Token>,
    next_member_ref: u32,
    next_method_spec: u32,
}

impl Lowering<'_> {
    fn callee_token(&mut self, callee: &Callee) -> Result<Token> {
        let same_assembly = callee
            .assembly
            .as_deref()
            .map_or(true, |assembly| assembly == self.assembly);

        let target = if same_assembly && self.local.contains_key(&callee.type_name) {
            self.local_method(callee)?
        } else {
            self.member_ref(callee)
        };

        if callee.generic {
            Ok(self.method_spec(target))
        } else {
            Ok(target)
        }
    }

    fn local_method(&self, callee: &Callee) -> Result<Token> {
        let candidates: Vec<&LocalMethod> = self
            .local
            .get(&callee.type_name)
            .into_iter()
            .flatten()
            .filter(|method| method.name == callee.name)
            .filter(|method| {
                callee
                    .params
                    .as_ref()
                    .map_or(true, |params| method.signature.same_params(params))
            })
            .filter(|method| {
                callee
                    .returns
                    .as_ref()
                    .map_or(true, |returns| method.signature.returns == *returns)
            })
            .collect();

        match candidates.as_slice() {
            [single] => Ok(single.token),
            [] => Err(malformed_error!(
                "Callee {} is not defined in module '{}'",
                callee,
                self.module
            )),
            _ => Err(malformed_error!(
                "Callee {} matches {} methods in module '{}', specify the parameter types",
                callee,
                candidates.len(),
                self.module
            )),
        }
    }

    fn member_ref(&mut self, callee: &Callee) -> Token {
        let signature = MethodSignature {
            params: callee.params.clone().unwrap_or_default(),
            returns: callee.returns.clone().unwrap_or_else(|| VOID.to_string()),
        };
        let key = (
            callee.assembly.clone(),
            callee.type_name.clone(),
            callee.name.clone(),
            signature,
        );
        if let Some(token) = self.member_ref_index.get(&key) {
            return *token;
        }

        let token = Token::from_parts(TABLE_MEMBERREF, self.next_member_ref);
        self.next_member_ref += 1;
        self.member_refs.push(MemberRef {
            token,
            scope: key.0.clone(),
            parent: key.1.clone(),
            name: key.2.clone(),
            signature: key.3.clone(),
        });
        self.member_ref_index.insert(key, token);
        token
    }

    fn method_spec(&mut self, method: Token) -> Token {
        if let Some(token) = self.method_spec_index.get(&method) {
            return *token;
        }

        let token = Token::from_parts(TABLE_METHODSPEC, self.next_method_spec);
        self.next_method_spec += 1;
        self.method_specs.push(MethodSpec { token, method });
        self.method_spec_index.insert(method, token);
        token
    }
}

/// Builds one module of an assembly.
pub struct ModuleBuilder {
    name: String,
    mvid: Option<uguid::Guid>,
    types: Vec<TypeBuilder>,
}

impl ModuleBuilder {
    /// An empty module named `name` (e.g. `MyApp.dll`)
    pub fn new(name: impl Into<String>) -> Self {
        ModuleBuilder {
            name: name.into(),
            mvid: None,
            types: Vec::new(),
        }
    }

    /// Use an explicit MVID instead of the name-based default
    #[must_use]
    pub fn mvid(mut self, mvid: uguid::Guid) -> Self {
        self.mvid = Some(mvid);
        self
    }

    /// Add a type definition
    #[must_use]
    pub fn class(mut self, builder: TypeBuilder) -> Self {
        self.types.push(builder);
        self
    }

    /// Lowers all types and bodies into a [`Module`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a same-module callee is unknown or ambiguous,
    /// if a bodiless method was given a body, or if two types share a full name.
    pub fn build(self, assembly: &str) -> Result<ModuleRc> {
        let mvid = self
            .mvid
            .unwrap_or_else(|| name_based_mvid(assembly, &self.name));

        let mut local: HashMap<String, Vec<LocalMethod>> = HashMap::new();
        let mut plans = Vec::with_capacity(self.types.len());
        let mut next_type = 2u32;
        let mut next_method = 1u32;
        for ty in &self.types {
            let type_token = Token::from_parts(TABLE_TYPEDEF, next_type);
            next_type += 1;

            let entry = local.entry(ty.fullname()).or_default();
            let mut method_tokens = Vec::with_capacity(ty.methods.len());
            for method in &ty.methods {
                let token = Token::from_parts(TABLE_METHODDEF, next_method);
                next_method += 1;
                entry.push(LocalMethod {
                    name: method.name.clone(),
                    signature: method.signature(),
                    token,
                });
                method_tokens.push(token);
            }
            plans.push((type_token, method_tokens));
        }

        let mut lowering = Lowering {
            assembly,
            module: &self.name,
            local: &local,
            member_refs: Vec::new(),
            member_ref_index: HashMap::new(),
            method_specs: Vec::new(),
            method_spec_index: HashMap::new(),
            next_member_ref: 1,
            next_method_spec: 1,
        };

        let mut types = Vec::with_capacity(self.types.len());
        for (ty, (type_token, method_tokens)) in self.types.into_iter().zip(plans) {
            let in_interface = ty.flags & TypeAttributes::INTERFACE != 0;
            let fullname = ty.fullname();
            let properties = ty
                .properties
                .iter()
                .map(|property| Property {
                    name: property.name.clone(),
                    type_name: property.type_name.clone(),
                    getter: property
                        .getter
                        .and_then(|index| method_tokens.get(index).copied()),
                    setter: property
                        .setter
                        .and_then(|index| method_tokens.get(index).copied()),
                })
                .collect();

            let mut methods = Vec::with_capacity(ty.methods.len());
            for (method, token) in ty.methods.into_iter().zip(&method_tokens) {
                methods.push(Arc::new(method.into_method(
                    *token,
                    in_interface,
                    &mut lowering,
                )?));
            }

            types.push(Arc::new(CilType {
                token: type_token,
                namespace: ty.namespace,
                name: ty.name,
                flags: ty.flags,
                // System.Object is the root of the chain
                base: ty.base.filter(|base| *base != fullname),
                interfaces: ty.interfaces,
                properties,
                methods,
            }));
        }

        let Lowering {
            member_refs,
            method_specs,
            ..
        } = lowering;

        let mut module = Module::new(self.name, mvid);
        for member_ref in member_refs {
            module.add_member_ref(member_ref)?;
        }
        for spec in method_specs {
            module.add_method_spec(spec)?;
        }
        for ty in types {
            module.add_type(ty)?;
        }

        log::trace!(
            "Built module '{}' of '{}': {} types, {} member references",
            module.name,
            assembly,
            module.types().len(),
            module.member_ref_count()
        );
        Ok(Arc::new(module))
    }
}

/// Builds an assembly with a manifest module and optional further modules.
pub struct AssemblyBuilder {
    identity: AssemblyIdentity,
    manifest: ModuleBuilder,
    modules: Vec<ModuleBuilder>,
}

impl AssemblyBuilder {
    /// An assembly `name`, version 1.0.0.0, with a manifest module `{name}.dll`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        AssemblyBuilder {
            manifest: ModuleBuilder::new(format!("{name}.dll")),
            identity: AssemblyIdentity::new(name, AssemblyVersion::new(1, 0, 0, 0)),
            modules: Vec::new(),
        }
    }

    /// Set the assembly version
    #[must_use]
    pub fn version(mut self, version: AssemblyVersion) -> Self {
        self.identity.version = version;
        self
    }

    /// Set the culture of a satellite assembly
    #[must_use]
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.identity.culture = Some(culture.into());
        self
    }

    /// Set the MVID of the manifest module
    #[must_use]
    pub fn mvid(mut self, mvid: uguid::Guid) -> Self {
        self.manifest = self.manifest.mvid(mvid);
        self
    }

    /// Add a type to the manifest module
    #[must_use]
    pub fn class(mut self, builder: TypeBuilder) -> Self {
        self.manifest = self.manifest.class(builder);
        self
    }

    /// Add a further module
    #[must_use]
    pub fn module(mut self, module: ModuleBuilder) -> Self {
        self.modules.push(module);
        self
    }

    /// Builds all modules.
    ///
    /// # Errors
    /// Propagates the errors of [`ModuleBuilder::build`].
    pub fn build(self) -> Result<AssemblyRc> {
        let name = self.identity.name.clone();
        let mut modules = Vec::with_capacity(self.modules.len() + 1);
        modules.push(self.manifest.build(&name)?);
        for module in self.modules {
            modules.push(module.build(&name)?);
        }
        Ok(Arc::new(Assembly::new(self.identity, modules)))
    }
}

/// Deterministic MVID derived from the assembly and module names (RFC 4122 version 5 layout)
fn name_based_mvid(assembly: &str, module: &str) -> uguid::Guid {
    let mut hasher = Sha1::new();
    hasher.update(assembly.as_bytes());
    hasher.update(b"/");
    hasher.update(module.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    bytes[6] = (bytes[6] & 0x0F) | 0x50;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;
    uguid::Guid::from_bytes(bytes)
}
