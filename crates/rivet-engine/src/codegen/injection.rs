//! Injection methods: `[Inject] void Awake() { Body = GetComponent<Rigidbody>(); }`.
//!
//! Each top-level assignment to a name the type does not declare becomes a
//! generated member. Its type is inferred from the assigned expression.

use crate::syntax::names;
use crate::syntax::{Expression, MethodDecl, Span, Statement, TypeDecl, TypeRef};

use super::lookup::{self, LookupCall};

/// Whether `method` is marked as an injection method.
pub fn is_injection_method(method: &MethodDecl) -> bool {
    method.attributes.iter().any(|a| a.is(names::INJECT))
}

/// Injection methods of `decl`, in declaration order.
pub fn injection_methods(decl: &TypeDecl) -> Vec<&MethodDecl> {
    decl.methods().filter(|m| is_injection_method(m)).collect()
}

/// An assignment inside an injection method that declares a member.
#[derive(Debug, Clone)]
pub struct InjectedAssignment<'a> {
    pub name: &'a str,
    /// Assigned value with any `.Optional()` marker removed.
    pub value: &'a Expression,
    pub optional: bool,
    pub lookup: Option<LookupCall<'a>>,
    pub span: Span,
}

impl InjectedAssignment<'_> {
    /// The generated member's type, when it can be inferred.
    pub fn inferred_type(&self) -> Option<TypeRef> {
        match &self.lookup {
            Some(lookup) => lookup.result_type(),
            None => self.value.as_invocation().and_then(|call| call.return_type.clone()),
        }
    }

    /// Source text of the assigned value, for messages and caching hints.
    pub fn value_text(&self) -> String {
        self.value.to_string()
    }
}

/// Assignments in `method` that declare members of `decl`. Names the type
/// already declares are ordinary assignments and are skipped, as are
/// repeated assignments to the same name.
pub fn assignments<'a>(decl: &TypeDecl, method: &'a MethodDecl) -> Vec<InjectedAssignment<'a>> {
    let Some(body) = &method.body else {
        return Vec::new();
    };
    let mut out: Vec<InjectedAssignment<'a>> = Vec::new();
    for stmt in &body.statements {
        let Statement::Expression(s) = stmt else {
            continue;
        };
        let Expression::Assign(assign) = &s.expr else {
            continue;
        };
        let name = match assign.target.as_ref() {
            Expression::Identifier(id) => id.name.as_str(),
            Expression::Member(m) if matches!(m.target.as_ref(), Expression::This(_)) => {
                m.name.as_str()
            }
            _ => continue,
        };
        if decl.member(name).is_some() || out.iter().any(|a| a.name == name) {
            continue;
        }
        let (value, optional) = lookup::strip_optional(&assign.value);
        out.push(InjectedAssignment {
            name,
            value,
            optional,
            lookup: lookup::classify(value),
            span: assign.span,
        });
    }
    out
}
