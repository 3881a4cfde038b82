//! Rules: cache-in-new-injection-method (RV4002), cache-in-injection-method (RV4003),
//! reuse-cached-component (RV4004)
//!
//! A component lookup in a regular instance method runs every time the
//! method does. When the lookup only depends on the object itself (every
//! identifier is a member of the type or `this`) its result can be cached
//! by an `[Inject]` method instead.

use rustc_hash::FxHashSet;

use crate::codegen::injection::injection_methods;
use crate::codegen::lookup;
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::visitor::{self, Visitor};
use crate::syntax::{Block, Expression, Member, Span, Statement};

pub struct CacheInNewInjectionMethod;
pub struct CacheInInjectionMethod;
pub struct ReuseCachedComponent;

static NEW_METHOD_META: RuleMeta = RuleMeta {
    name: "cache-in-new-injection-method",
    code: "RV4002",
    description: "Cache repeated component lookups in a new [Inject] method",
    category: Category::Refactoring,
    default_severity: Severity::Info,
    fixable: false,
};

static EXISTING_METHOD_META: RuleMeta = RuleMeta {
    name: "cache-in-injection-method",
    code: "RV4003",
    description: "Cache repeated component lookups in the existing [Inject] method",
    category: Category::Refactoring,
    default_severity: Severity::Info,
    fixable: false,
};

static REUSE_META: RuleMeta = RuleMeta {
    name: "reuse-cached-component",
    code: "RV4004",
    description: "Use the member an [Inject] method already caches",
    category: Category::Refactoring,
    default_severity: Severity::Info,
    fixable: true,
};

enum CacheCase<'c> {
    NoInjectionMethod,
    NotCached { method: &'c str },
    Cached { method: &'c str, member: &'c str },
}

struct Hint<'c> {
    text: String,
    span: Span,
    case: CacheCase<'c>,
}

/// Names local to the body: parameters, locals, loop and lambda variables.
#[derive(Default)]
struct LocalNames<'a> {
    names: FxHashSet<&'a str>,
}

impl<'a> Visitor<'a> for LocalNames<'a> {
    fn visit_statement(&mut self, stmt: &'a Statement) {
        match stmt {
            Statement::Local(local) => {
                self.names.insert(local.name.as_str());
            }
            Statement::ForEach(s) => {
                self.names.insert(s.var_name.as_str());
            }
            _ => {}
        }
        visitor::walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &'a Expression) {
        if let Expression::Lambda(lambda) = expr {
            self.names.extend(lambda.params.iter().map(String::as_str));
        }
        visitor::walk_expression(self, expr);
    }
}

fn local_names<'a>(scope: &BodyScope<'a>) -> FxHashSet<&'a str> {
    let mut collector = LocalNames::default();
    match scope.member {
        Member::Method(m) => {
            collector.names.extend(m.params.iter().map(|p| p.name.as_str()));
            visitor::walk_method(&mut collector, m);
        }
        Member::Property(p) => {
            collector.names.insert("value");
            visitor::walk_property(&mut collector, p);
        }
        Member::Field(_) => {}
    }
    collector.names
}

/// Whether every identifier in `expr` names a member visible on `owner`.
fn only_members(
    expr: &Expression,
    owner: SymbolId,
    locals: &FxHashSet<&str>,
    ctx: &LintContext<'_>,
) -> bool {
    match expr {
        Expression::This(_) | Expression::Base(_) | Expression::Literal(_) => true,
        Expression::Identifier(id) => {
            !locals.contains(id.name.as_str()) && ctx.symbols.find_member(owner, &id.name).is_some()
        }
        Expression::Member(m) => only_members(&m.target, owner, locals, ctx),
        Expression::Invocation(call) => {
            let callee_ok = match call.callee.as_ref() {
                Expression::Identifier(_) => true,
                Expression::Member(m) => only_members(&m.target, owner, locals, ctx),
                other => only_members(other, owner, locals, ctx),
            };
            callee_ok && call.args.iter().all(|a| only_members(a, owner, locals, ctx))
        }
        Expression::Binary(b) => {
            only_members(&b.left, owner, locals, ctx) && only_members(&b.right, owner, locals, ctx)
        }
        Expression::Assign(_) | Expression::Lambda(_) | Expression::Other(_) => false,
    }
}

/// Top-level `Name = value` assignments of an injection body whose value
/// renders as `text`.
fn cached_as<'c>(body: &'c Block, text: &str) -> Option<&'c str> {
    body.statements.iter().find_map(|stmt| {
        let Statement::Expression(s) = stmt else {
            return None;
        };
        let Expression::Assign(assign) = &s.expr else {
            return None;
        };
        let name = match assign.target.as_ref() {
            Expression::Identifier(id) => id.name.as_str(),
            Expression::Member(m) if matches!(m.target.as_ref(), Expression::This(_)) => {
                m.name.as_str()
            }
            _ => return None,
        };
        let (value, _) = lookup::strip_optional(&assign.value);
        (value.to_string() == text).then_some(name)
    })
}

fn analyze<'c>(
    expr: &Expression,
    scope: &BodyScope<'_>,
    ctx: &LintContext<'c>,
) -> Option<Hint<'c>> {
    if scope.is_injection_method || scope.member.is_static() {
        return None;
    }
    let call = lookup::classify(expr)?;
    if !call.kind.is_component_lookup() || call.type_arg.is_none() {
        return None;
    }
    let locals = local_names(scope);
    if !only_members(expr, scope.owner, &locals, ctx) {
        return None;
    }

    let text = expr.to_string();
    let decl = ctx.symbols.decl(scope.owner);
    let methods = injection_methods(decl);
    let case = match methods.first() {
        None => CacheCase::NoInjectionMethod,
        Some(first) => methods
            .iter()
            .find_map(|m| {
                let member = cached_as(m.body.as_ref()?, &text)?;
                Some(CacheCase::Cached {
                    method: m.name.as_str(),
                    member,
                })
            })
            .unwrap_or(CacheCase::NotCached {
                method: first.name.as_str(),
            }),
    };
    Some(Hint {
        text,
        span: call.call.span,
        case,
    })
}

impl LintRule for CacheInNewInjectionMethod {
    fn meta(&self) -> &RuleMeta {
        &NEW_METHOD_META
    }

    fn check_expression(
        &self,
        expr: &Expression,
        scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        match analyze(expr, scope, ctx) {
            Some(hint @ Hint { case: CacheCase::NoInjectionMethod, .. }) => {
                vec![LintDiagnostic::new(
                    &NEW_METHOD_META,
                    ctx.file_path,
                    hint.span,
                    format!(
                        "'{}' looks the component up on every call; \
                         cache it in a new [Inject] method",
                        hint.text
                    ),
                )]
            }
            _ => vec![],
        }
    }
}

impl LintRule for CacheInInjectionMethod {
    fn meta(&self) -> &RuleMeta {
        &EXISTING_METHOD_META
    }

    fn check_expression(
        &self,
        expr: &Expression,
        scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        match analyze(expr, scope, ctx) {
            Some(Hint {
                text,
                span,
                case: CacheCase::NotCached { method },
            }) => vec![LintDiagnostic::new(
                &EXISTING_METHOD_META,
                ctx.file_path,
                span,
                format!(
                    "'{}' looks the component up on every call; cache it in [Inject] method '{}'",
                    text, method
                ),
            )],
            _ => vec![],
        }
    }
}

impl LintRule for ReuseCachedComponent {
    fn meta(&self) -> &RuleMeta {
        &REUSE_META
    }

    fn check_expression(
        &self,
        expr: &Expression,
        scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        match analyze(expr, scope, ctx) {
            Some(Hint {
                text,
                span,
                case: CacheCase::Cached { method, member },
            }) => vec![LintDiagnostic::new(
                &REUSE_META,
                ctx.file_path,
                span,
                format!(
                    "'{}' is already cached as '{}' by [Inject] method '{}'",
                    text, member, method
                ),
            )
            .with_fix(span, member)],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game, inject_method, lookup, method};
    use crate::syntax::{Expression, MethodDecl, Modifier, Span, Statement, TypeDecl};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn codes(diags: &[LintDiagnostic]) -> Vec<&str> {
        diags
            .iter()
            .map(|d| d.code)
            .filter(|c| matches!(*c, "RV4002" | "RV4003" | "RV4004"))
            .collect()
    }

    fn push(body_lookup: Expression) -> Statement {
        body_lookup
            .member("AddForce")
            .call(vec![Expression::ident("force")])
            .stmt()
    }

    fn update() -> MethodDecl {
        method(
            "FixedUpdate",
            vec![push(lookup("GetComponent", "Rigidbody").at(Span::new(50, 75, 8, 9)))],
        )
    }

    #[test]
    fn test_no_injection_method() {
        let diags = lint(vec![behaviour("Ship").with_member(update())]);
        assert_eq!(codes(&diags), vec!["RV4002"]);
    }

    #[test]
    fn test_injection_method_without_this_call() {
        let diags = lint(vec![behaviour("Ship")
            .with_member(inject_method(
                "Awake",
                vec![Expression::ident("Anim").assign(lookup("GetComponent", "Animator")).stmt()],
            ))
            .with_member(update())]);
        let d = diags.iter().find(|d| d.code == "RV4003").expect("RV4003");
        assert_eq!(
            d.message,
            "'GetComponent<Rigidbody>()' looks the component up on every call; cache it in [Inject] method 'Awake'"
        );
        assert_eq!(codes(&diags), vec!["RV4003"]);
    }

    #[test]
    fn test_already_cached_suggests_reuse() {
        let diags = lint(vec![behaviour("Ship")
            .with_member(inject_method(
                "Awake",
                vec![Expression::ident("Body").assign(lookup("GetComponent", "Rigidbody")).stmt()],
            ))
            .with_member(update())]);
        assert_eq!(codes(&diags), vec!["RV4004"]);
        let d = diags.iter().find(|d| d.code == "RV4004").unwrap();
        let fix = d.fix.as_ref().unwrap();
        assert_eq!(fix.span, Span::new(50, 75, 8, 9));
        assert_eq!(fix.replacement, "Body");
    }

    #[test]
    fn test_member_receiver_qualifies() {
        let call = Expression::ident("transform")
            .member("GetComponentInParent")
            .call_generic(vec!["Rigidbody".into()], vec![]);
        let diags = lint(vec![behaviour("Ship").with_member(method("Update", vec![call.stmt()]))]);
        assert_eq!(codes(&diags), vec!["RV4002"]);
    }

    #[test]
    fn test_parameter_receiver_skipped() {
        let call = Expression::ident("other")
            .member("GetComponent")
            .call_generic(vec!["Rigidbody".into()], vec![]);
        let diags = lint(vec![behaviour("Ship").with_member(
            MethodDecl::new("OnHit")
                .param("other", "Collider")
                .with_body(crate::syntax::Block::new(vec![call.stmt()])),
        )]);
        assert!(codes(&diags).is_empty(), "got: {:?}", diags);
    }

    #[test]
    fn test_static_method_skipped() {
        let ship = behaviour("Ship").with_member(update().with_modifier(Modifier::Static));
        let diags = lint(vec![ship]);
        assert!(codes(&diags).is_empty());
    }
}
