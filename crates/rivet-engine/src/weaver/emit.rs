//! Apply weave plans to a compiled module.
//!
//! Every plan item is checked against the compiled type before anything is
//! written, so an item that cannot be woven leaves the module untouched
//! and is reported on its own.

use crate::codegen::inject::InjectSource;
use crate::config::CodegenConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::syntax::names;
use crate::syntax::Span;

use super::il::{IlAttribute, IlModule, IlType, Instr, Label, MethodRef, VOID};
use super::lifecycle::{LifecycleSynthesizer, MethodHandle};
use super::plan::{AccessorKind, AccessorPlan, InjectionPlan, RegistryKind, Storage, TypePlan};

const LOOKUP: &str = "Rivet.Lookup";
const CHECKS: &str = "Rivet.Checks";
const LOG: &str = "Rivet.Log";
const SINGLETON_REGISTRY: &str = "Rivet.Singleton";
const TRACKED_REGISTRY: &str = "Rivet.Tracked";
const STRATEGY_TYPE: &str = "Rivet.SingletonStrategy";

/// A plan item that could not be woven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaveFailure {
    pub type_name: String,
    /// Member or type the item belongs to.
    pub subject: String,
    pub file: String,
    pub span: Span,
    pub error: WeaveError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaveReport {
    /// Plan items applied.
    pub woven: usize,
    /// Base calls added to user callbacks hiding woven ones.
    pub base_calls: usize,
    pub failures: Vec<WeaveFailure>,
}

/// Apply `plans` to `module`. Types are processed base classes first so a
/// synthesized callback can call the already woven base callback.
pub fn weave(plans: &[TypePlan], module: &mut IlModule, config: &CodegenConfig) -> WeaveReport {
    let order = module.base_first_order();
    let rank = |plan: &TypePlan| {
        module
            .type_index(&plan.type_name)
            .and_then(|index| order.iter().position(|&i| i == index))
            .unwrap_or(usize::MAX)
    };
    let mut sorted: Vec<(usize, &TypePlan)> = plans.iter().map(|p| (rank(p), p)).collect();
    sorted.sort_by_key(|(r, _)| *r);

    let mut report = WeaveReport::default();
    let mut synth = LifecycleSynthesizer::new(&config.init_method);
    for (_, plan) in sorted {
        TypeWeaver {
            module: &mut *module,
            synth: &mut synth,
            config,
            plan,
            report: &mut report,
        }
        .run();
    }
    report.base_calls = synth.ensure_base_calls(module);
    tracing::debug!(
        module = %module.name,
        woven = report.woven,
        base_calls = report.base_calls,
        failures = report.failures.len(),
        "weaving finished"
    );
    report
}

struct TypeWeaver<'a> {
    module: &'a mut IlModule,
    synth: &'a mut LifecycleSynthesizer,
    config: &'a CodegenConfig,
    plan: &'a TypePlan,
    report: &'a mut WeaveReport,
}

impl TypeWeaver<'_> {
    fn run(mut self) {
        let plan = self.plan;
        let Some(index) = self.module.type_index(&plan.type_name) else {
            self.fail(&plan.type_name, plan.span, WeaveError::TypeNotFound(plan.type_name.clone()));
            return;
        };
        if let Some(order) = plan.execution_order {
            let attr = format!("{}.{}", self.config.engine_namespace, names::EXECUTION_ORDER);
            let ty = &mut self.module.types[index];
            if !ty.has_attribute(&attr) {
                ty.attributes.push(IlAttribute {
                    type_name: attr,
                    args: vec![i64::from(order)],
                });
                self.report.woven += 1;
            }
        }
        self.weave_init(index);
        for accessor in &plan.accessors {
            match self.replace_getter(index, accessor) {
                Ok(()) => self.report.woven += 1,
                Err(e) => self.fail(&accessor.property, accessor.span, e),
            }
        }
        if !plan.registrations.is_empty() {
            if let Err(e) = self.weave_registrations() {
                self.fail(&plan.type_name, plan.span, e);
            }
        }
    }

    fn fail(&mut self, subject: &str, span: Span, error: WeaveError) {
        tracing::warn!(ty = %self.plan.type_name, subject, %error, "weave item failed");
        self.report.failures.push(WeaveFailure {
            type_name: self.plan.type_name.clone(),
            subject: subject.to_string(),
            file: self.plan.file.clone(),
            span,
            error,
        });
    }

    fn ty(&self, index: usize) -> &IlType {
        &self.module.types[index]
    }

    fn component_ref(&self, name: &str, return_type: &str) -> MethodRef {
        MethodRef::new(
            format!("{}.{}", self.config.engine_namespace, names::COMPONENT),
            name,
            &[],
            return_type,
        )
    }

    fn game_object_type(&self) -> String {
        format!("{}.GameObject", self.config.engine_namespace)
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    fn weave_init(&mut self, index: usize) {
        let plan = self.plan;
        let mut stores = Vec::new();
        for injection in &plan.injections {
            match self.store_target(index, injection) {
                Ok(store) => stores.push((injection, store)),
                Err(e) => self.fail(&injection.member, injection.span, e),
            }
        }
        let mut calls = Vec::new();
        for call in &plan.init_calls {
            let target = self
                .ty(index)
                .method(&call.method)
                .filter(|m| m.is_lifecycle(&call.method))
                .map(|m| m.reference(&plan.type_name));
            match target {
                Some(target) => calls.push(target),
                None => self.fail(
                    &call.method,
                    call.span,
                    WeaveError::MethodNotFound {
                        type_name: plan.type_name.clone(),
                        method: call.method.clone(),
                    },
                ),
            }
        }
        if stores.is_empty() && calls.is_empty() {
            return;
        }

        let handle = match self.synth.get_or_create(
            self.module,
            &plan.type_name,
            &self.config.init_method,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                self.fail(&plan.type_name, plan.span, e);
                return;
            }
        };
        let code = self.init_code(handle, stores, calls);
        if let Err(e) = self.synth.insert(self.module, handle, code) {
            self.fail(&plan.type_name, plan.span, e);
        }
    }

    fn init_code(
        &mut self,
        handle: MethodHandle,
        stores: Vec<(&InjectionPlan, Store)>,
        calls: Vec<MethodRef>,
    ) -> Vec<Instr> {
        let plan = self.plan;
        let mut code = Vec::new();
        if !stores.is_empty() {
            let game_object = self.game_object_type();
            let get_game_object = self.component_ref("get_gameObject", &game_object);
            let method = &mut self.module.types[handle.type_index].methods[handle.method_index];
            let mut next_label = method.fresh_label().0;
            let owner = method.add_local(game_object.as_str());
            code.extend([
                Instr::LoadThis,
                Instr::CallVirt(get_game_object),
                Instr::StoreLocal(owner),
            ]);

            for (injection, store) in stores {
                let value = method.add_local(store.ty.as_str());
                code.push(Instr::LoadThis);
                code.push(Instr::LoadLocal(owner));
                if is_hierarchy(injection.source) {
                    code.push(Instr::LoadInt(i64::from(injection.include_inactive)));
                }
                code.push(Instr::Call(lookup_ref(
                    injection.source,
                    injection.is_array,
                    false,
                    &injection.element_type,
                    &game_object,
                    &store.ty,
                )));
                code.extend([Instr::Dup, Instr::StoreLocal(value), store.instr]);
                if !injection.optional {
                    let done = Label(next_label);
                    next_label += 1;
                    code.extend(missing_check(injection, &plan.type_name, &plan.file, value, done));
                }
                self.report.woven += 1;
            }
        }
        for call in calls {
            code.extend([Instr::LoadThis, Instr::Call(call)]);
            self.report.woven += 1;
        }
        code
    }

    /// Where an eager member's value is written.
    fn store_target(&self, index: usize, injection: &InjectionPlan) -> WeaveResult<Store> {
        let ty = self.ty(index);
        let missing_field = |field: String| WeaveError::FieldNotFound {
            type_name: ty.full_name.clone(),
            field,
        };
        match injection.storage {
            Storage::Field => {
                let field = ty
                    .field_ref(&injection.member)
                    .ok_or_else(|| missing_field(injection.member.clone()))?;
                Ok(Store {
                    ty: field.ty.clone(),
                    instr: Instr::StoreField(field),
                })
            }
            Storage::Setter | Storage::AutoProperty => {
                let property =
                    ty.property(&injection.member).ok_or_else(|| WeaveError::PropertyNotFound {
                        type_name: ty.full_name.clone(),
                        property: injection.member.clone(),
                    })?;
                if injection.storage == Storage::AutoProperty {
                    let field = ty
                        .field_ref(&property.backing_field_name())
                        .ok_or_else(|| missing_field(property.backing_field_name()))?;
                    return Ok(Store {
                        ty: field.ty.clone(),
                        instr: Instr::StoreField(field),
                    });
                }
                let setter = property
                    .setter
                    .as_deref()
                    .and_then(|name| ty.method(name))
                    .ok_or_else(|| WeaveError::MissingAccessor {
                        type_name: ty.full_name.clone(),
                        property: property.name.clone(),
                        accessor: "setter",
                    })?;
                Ok(Store {
                    ty: property.ty.clone(),
                    instr: Instr::Call(setter.reference(&ty.full_name)),
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    fn replace_getter(&mut self, index: usize, accessor: &AccessorPlan) -> WeaveResult<()> {
        let ty = self.ty(index);
        let property = ty.property(&accessor.property).ok_or_else(|| WeaveError::PropertyNotFound {
            type_name: ty.full_name.clone(),
            property: accessor.property.clone(),
        })?;
        let getter = property
            .getter
            .as_deref()
            .and_then(|name| ty.method_index(name))
            .ok_or_else(|| WeaveError::MissingAccessor {
                type_name: ty.full_name.clone(),
                property: property.name.clone(),
                accessor: "getter",
            })?;
        let property_ty = property.ty.clone();

        let body = match accessor.kind {
            AccessorKind::Lazy => {
                let game_object = self.game_object_type();
                let mut body = vec![
                    Instr::LoadThis,
                    Instr::CallVirt(self.component_ref("get_gameObject", &game_object)),
                ];
                if is_hierarchy(accessor.source) {
                    body.push(Instr::LoadInt(i64::from(accessor.include_inactive)));
                }
                body.push(Instr::Call(lookup_ref(
                    accessor.source,
                    accessor.is_array,
                    true,
                    &accessor.element_type,
                    &game_object,
                    &property_ty,
                )));
                body
            }
            AccessorKind::Singleton => vec![Instr::Call(
                MethodRef::new(SINGLETON_REGISTRY, "get_Instance", &[], property_ty.as_str())
                    .with_generic(accessor.element_type.as_str()),
            )],
            AccessorKind::Collection => vec![Instr::Call(
                MethodRef::new(TRACKED_REGISTRY, "get_Instances", &[], property_ty.as_str())
                    .with_generic(accessor.element_type.as_str()),
            )],
        };
        let method = &mut self.module.types[index].methods[getter];
        method.body = body;
        method.body.push(Instr::Return);
        method.locals.clear();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    fn weave_registrations(&mut self) -> WeaveResult<()> {
        let plan = self.plan;
        let enable = self
            .synth
            .get_or_create(self.module, &plan.type_name, &self.config.enable_method)?;
        let disable = self
            .synth
            .get_or_create(self.module, &plan.type_name, &self.config.disable_method)?;
        let mut on_enable = Vec::new();
        let mut on_disable = Vec::new();
        for registration in &plan.registrations {
            let key = registration.key.as_str();
            match registration.kind {
                RegistryKind::Tracked => {
                    on_enable.extend([
                        Instr::LoadThis,
                        Instr::Call(
                            MethodRef::new(TRACKED_REGISTRY, "Register", &["T"], VOID)
                                .with_generic(key),
                        ),
                    ]);
                    on_disable.extend([
                        Instr::LoadThis,
                        Instr::Call(
                            MethodRef::new(TRACKED_REGISTRY, "Unregister", &["T"], VOID)
                                .with_generic(key),
                        ),
                    ]);
                }
                RegistryKind::Singleton => {
                    let strategy =
                        registration.strategy.unwrap_or_else(|| self.config.default_strategy());
                    on_enable.extend([
                        Instr::LoadThis,
                        Instr::LoadInt(i64::from(strategy.bits())),
                        Instr::Call(
                            MethodRef::new(
                                SINGLETON_REGISTRY,
                                "Register",
                                &["T", STRATEGY_TYPE],
                                VOID,
                            )
                            .with_generic(key),
                        ),
                    ]);
                    on_disable.extend([
                        Instr::LoadThis,
                        Instr::Call(
                            MethodRef::new(SINGLETON_REGISTRY, "Unregister", &["T"], VOID)
                                .with_generic(key),
                        ),
                    ]);
                }
            }
            self.report.woven += 1;
        }
        self.synth.insert(self.module, enable, on_enable)?;
        self.synth.insert(self.module, disable, on_disable)
    }
}

/// How an eager value is stored, and the stored type.
struct Store {
    ty: String,
    instr: Instr,
}

fn is_hierarchy(source: InjectSource) -> bool {
    matches!(source, InjectSource::FromChildren | InjectSource::FromParents)
}

/// `Rivet.Lookup` helper for a source; lazy array lookups use the
/// non-allocating variants.
fn lookup_name(source: InjectSource, is_array: bool, lazy: bool) -> &'static str {
    match (source, is_array, lazy) {
        (InjectSource::FromChildren, false, _) => "GetComponentInChildren",
        (InjectSource::FromParents, false, _) => "GetComponentInParent",
        (_, false, _) => "GetComponent",
        (InjectSource::FromChildren, true, true) => "EnumerateComponentsInChildren",
        (InjectSource::FromParents, true, true) => "EnumerateComponentsInParent",
        (_, true, true) => "EnumerateComponents",
        (InjectSource::FromChildren, true, false) => "GetComponentsInChildren",
        (InjectSource::FromParents, true, false) => "GetComponentsInParent",
        (_, true, false) => "GetComponents",
    }
}

fn lookup_ref(
    source: InjectSource,
    is_array: bool,
    lazy: bool,
    element_type: &str,
    game_object: &str,
    return_type: &str,
) -> MethodRef {
    let mut params = vec![game_object];
    if is_hierarchy(source) {
        params.push("bool");
    }
    MethodRef::new(LOOKUP, lookup_name(source, is_array, lazy), &params, return_type)
        .with_generic(element_type)
}

/// `if (!Checks.IsAlive(value)) Log.MissingInjection(...)`.
fn missing_check(
    injection: &InjectionPlan,
    type_name: &str,
    file: &str,
    value: u16,
    done: Label,
) -> Vec<Instr> {
    let check = if injection.is_array {
        MethodRef::new(CHECKS, "IsNonEmpty", &["System.Array"], "bool")
    } else {
        MethodRef::new(CHECKS, "IsAlive", &["UnityEngine.Object"], "bool")
    };
    let log = MethodRef::new(
        LOG,
        "MissingInjection",
        &["string", "string", "string", "string", "int32"],
        VOID,
    );
    vec![
        Instr::LoadLocal(value),
        Instr::Call(check),
        Instr::BranchTrue(done),
        Instr::LoadStr(injection.member.clone()),
        Instr::LoadStr(type_name.to_string()),
        Instr::LoadStr(injection.attribute.clone()),
        Instr::LoadStr(file.to_string()),
        Instr::LoadInt(i64::from(injection.span.line)),
        Instr::Call(log),
        Instr::Label(done),
    ]
}
