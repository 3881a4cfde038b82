//! Generate plans from source, then weave them into a hand-built module.

use rivet_engine::syntax::build::{behaviour, game};
use rivet_engine::syntax::{Attribute, FieldDecl, PropertyDecl, TypeDecl, TypeKind, TypeRef};
use rivet_engine::weaver::il::MethodFlags;
use rivet_engine::weaver::lifecycle::INITIALIZABLE;
use rivet_engine::weaver::{
    self, IlMethod, IlModule, IlType, Instr, LifecycleSynthesizer, MethodRef,
};
use rivet_engine::{CodegenConfig, GenerationOutput, Generator, PrettyPrint, RivetConfig};

fn generator() -> Generator {
    Generator::new(RivetConfig::default()).unwrap()
}

fn generate(types: Vec<TypeDecl>) -> GenerationOutput {
    generator().run(&game(types))
}

fn engine() -> IlType {
    IlType::new("UnityEngine.MonoBehaviour")
}

#[test]
fn test_singleton_with_injected_field() {
    let output = generate(vec![behaviour("Audio")
        .with_attr(Attribute::new("Singleton"))
        .with_member(FieldDecl::new("body", "Rigidbody").with_attr(Attribute::new("Inject")))]);
    let mut module = IlModule::new("Assembly-CSharp").with_reference(engine()).with_type(
        IlType::new("Game.Audio")
            .extends("UnityEngine.MonoBehaviour")
            .with_field("body", "UnityEngine.Rigidbody"),
    );

    let failures = generator().weave(&output.plans, &mut module);
    assert!(failures.is_empty(), "{:?}", failures);

    let audio = &module.types[0];
    assert_eq!(audio.attributes[0].type_name, "UnityEngine.DefaultExecutionOrder");
    assert_eq!(audio.attributes[0].args, vec![-1]);
    assert!(audio.interfaces.iter().any(|i| i == INITIALIZABLE));
    assert!(audio.method("OnDisable").is_some());

    let text = module.pretty_print();
    assert!(text.contains(
        "call void Rivet.Singleton::Register<Game.Audio>(T, Rivet.SingletonStrategy)"
    ));
    assert!(text.contains(
        "call UnityEngine.Rigidbody \
         Rivet.Lookup::GetComponent<UnityEngine.Rigidbody>(UnityEngine.GameObject)"
    ));
    assert!(text.contains("stfld UnityEngine.Rigidbody Game.Audio::body"));
    assert!(text.contains("ldstr \"[Inject]\""));
}

#[test]
fn test_missing_property_is_internal_error_for_that_member() {
    let output = generate(vec![
        behaviour("Enemy").with_attr(Attribute::new("Track")),
        behaviour("Radar").with_member(
            PropertyDecl::new("Enemies", TypeRef::array_of("Enemy".into()))
                .get_only()
                .with_attr(Attribute::new("Inject.All")),
        ),
    ]);
    let mut module = IlModule::new("Assembly-CSharp")
        .with_reference(engine())
        .with_type(IlType::new("Game.Enemy").extends("UnityEngine.MonoBehaviour"))
        .with_type(IlType::new("Game.Radar").extends("UnityEngine.MonoBehaviour"));

    let failures = generator().weave(&output.plans, &mut module);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].code, "RV9001");
    assert!(failures[0].message.contains("'Game.Radar.Enemies'"), "{}", failures[0].message);
    // Registration of the tracked type still happened.
    assert!(module.types[0].method("OnEnable").is_some());
}

#[test]
fn test_hiding_callback_calls_woven_base() {
    let output = generate(vec![
        behaviour("Enemy").with_attr(Attribute::new("Track")),
        TypeDecl::new("Boss", TypeKind::Class)
            .in_namespace("Game")
            .partial()
            .extends("Enemy"),
    ]);
    let mut module = IlModule::new("Assembly-CSharp")
        .with_reference(engine())
        .with_type(
            IlType::new("Game.Boss")
                .extends("Game.Enemy")
                .with_method(IlMethod::new("OnEnable")),
        )
        .with_type(IlType::new("Game.Enemy").extends("UnityEngine.MonoBehaviour"));

    let report = weaver::weave(&output.plans, &mut module, &CodegenConfig::default());
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.base_calls, 1);

    let boss = module.types[0].method("OnEnable").unwrap();
    assert_eq!(
        boss.body[..2],
        [Instr::LoadThis, Instr::Call(MethodRef::void("Game.Enemy", "OnEnable"))]
    );
    let register =
        MethodRef::new("Rivet.Tracked", "Register", &["T"], "void").with_generic("Game.Boss");
    assert!(boss.calls(&register));

    let synthesized = module.types[0].method("OnDisable").unwrap();
    assert!(synthesized.calls(&MethodRef::void("Game.Enemy", "OnDisable")));
    assert!(!synthesized.flags.contains(MethodFlags::PRIVATE));
}

#[test]
fn test_synthesizer_creates_one_method_per_callback() {
    let mut module = IlModule::new("Assembly-CSharp")
        .with_reference(
            engine().with_method(IlMethod::new("OnEnable").with_flags(MethodFlags::VIRTUAL)),
        )
        .with_type(IlType::new("Game.Hud").extends("UnityEngine.MonoBehaviour"));
    let mut synth = LifecycleSynthesizer::new("Awake");
    let first = synth.get_or_create(&mut module, "Game.Hud", "OnEnable").unwrap();
    let second = synth.get_or_create(&mut module, "Game.Hud", "OnEnable").unwrap();
    assert_eq!(first, second);

    let hud = &module.types[0];
    assert_eq!(hud.methods.len(), 1);
    let base = MethodRef::void("UnityEngine.MonoBehaviour", "OnEnable");
    let prologues = hud.methods[0]
        .body
        .iter()
        .filter(|i| i.call_target() == Some(&base))
        .count();
    assert_eq!(prologues, 1);
}
