//! Short constructors for compilations, for tests and host shims that
//! assemble the input model by hand.

use super::{
    Attribute, Block, Compilation, Expression, MethodDecl, PropertyDecl, Statement, TypeDecl,
    TypeKind, TypeRef,
};

/// File used by [`game`].
pub const GAME_FILE: &str = "Assets/Game.cs";

/// Namespace used by [`game`] and [`behaviour`].
pub const GAME_NAMESPACE: &str = "Game";

/// Metadata for the engine types the analysis relies on.
pub fn engine_references(namespace: &str) -> Vec<TypeDecl> {
    let class = |name: &str| TypeDecl::new(name, TypeKind::Class).in_namespace(namespace);
    vec![
        class("Object"),
        class("Component")
            .extends("Object")
            .with_member(PropertyDecl::new("transform", "Transform").get_only())
            .with_member(PropertyDecl::new("gameObject", "GameObject").get_only()),
        class("Behaviour")
            .extends("Component")
            .with_member(PropertyDecl::new("enabled", "bool")),
        class("MonoBehaviour").extends("Behaviour"),
        class("ScriptableObject").extends("Object"),
        class("GameObject").extends("Object"),
        class("Transform").extends("Component"),
        class("Rigidbody").extends("Component"),
        class("Collider").extends("Component"),
        class("Renderer").extends("Component"),
        class("Animator").extends("Behaviour"),
        class("Camera").extends("Behaviour"),
    ]
}

/// One source file of game types plus the engine references.
pub fn game(types: Vec<TypeDecl>) -> Compilation {
    Compilation::new("Assembly-CSharp")
        .with_file(GAME_FILE, types)
        .with_references(engine_references("UnityEngine"))
}

/// A partial `MonoBehaviour` subclass in the game namespace.
pub fn behaviour(name: &str) -> TypeDecl {
    TypeDecl::new(name, TypeKind::Class)
        .in_namespace(GAME_NAMESPACE)
        .partial()
        .extends("MonoBehaviour")
}

/// A partial interface in the game namespace.
pub fn interface(name: &str) -> TypeDecl {
    TypeDecl::new(name, TypeKind::Interface)
        .in_namespace(GAME_NAMESPACE)
        .partial()
}

/// `Method<T>()`
pub fn lookup(method: &str, ty: &str) -> Expression {
    Expression::ident(method).call_generic(vec![TypeRef::named(ty)], vec![])
}

/// `Find.Singleton<T>()` or `Find.Instances<T>()`
pub fn find(kind: &str, ty: &str) -> Expression {
    Expression::ident("Find")
        .member(kind)
        .call_generic(vec![TypeRef::named(ty)], vec![])
}

/// `[Inject] void name() { statements }`
pub fn inject_method(name: &str, statements: Vec<Statement>) -> MethodDecl {
    MethodDecl::new(name)
        .with_attr(Attribute::new("Inject"))
        .with_body(Block::new(statements))
}

/// `void name() { statements }`
pub fn method(name: &str, statements: Vec<Statement>) -> MethodDecl {
    MethodDecl::new(name).with_body(Block::new(statements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;

    #[test]
    fn test_behaviour_is_component() {
        let c = game(vec![behaviour("Player")]);
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let player = symbols.lookup("Game.Player").unwrap();
        assert!(symbols.is_component(player));
        assert!(symbols.find_member(player, "transform").is_some());
    }
}
