//! Error kinds surfaced by generation, instantiation and invocation.

use super::harness::*;

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_bad_hook_body_is_compilation_error() {
    let generator = ClassGenerator::new(body_hooks("return 42;"));
    let diagnostics = expect_compilation_error(generator.resolve(&greeter()));
    assert!(
        diagnostics
            .iter()
            .any(|d| d.contains("incompatible types: int cannot be converted to String")),
        "{:?}",
        diagnostics
    );
    assert!(!generator.is_cached(&greeter()));
}

#[test]
fn test_missing_body_is_compilation_error() {
    let generator = ClassGenerator::new(ClosureHooks::new());
    let diagnostics = expect_compilation_error(generator.resolve(&greeter()));
    assert!(diagnostics.iter().any(|d| d.contains("missing return statement")));
}

#[test]
fn test_syntax_error_in_class_body() {
    let generator = ClassGenerator::new(class_hooks("private int = 3;", &[("greet", "return par0;")]));
    let err = expect_err(generator.resolve(&greeter()));
    match err {
        MorphError::Compilation { class, diagnostics } => {
            assert_eq!(class, class_name_for("demo.Greeter"));
            assert!(!diagnostics.is_empty());
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_unknown_import_is_compilation_error() {
    let hooks = ClosureHooks::new()
        .with_imports(|_| vec!["com.nowhere.Missing".to_string()])
        .with_method_body(|_, _| Some("return par0;".to_string()));
    let diagnostics = expect_compilation_error(ClassGenerator::new(hooks).resolve(&greeter()));
    assert!(diagnostics.iter().any(|d| d.contains("com.nowhere.Missing")));
}

#[test]
fn test_inherited_abstract_method_must_be_implemented() {
    // only methods declared on the contract itself are synthesized
    let classpath = ClassPath::new();
    classpath.define_if_absent(
        &TypeDescriptor::interface("demo.Named").method(MethodDescriptor::new("name").returns(TypeRef::string())),
    );
    let contract = TypeDescriptor::interface("demo.Person")
        .implements("demo.Named")
        .method(MethodDescriptor::new("age").returns(TypeRef::int()));
    let generator = ClassGenerator::new(body_hooks("return 1;")).with_classpath(classpath);
    let diagnostics = expect_compilation_error(generator.resolve(&contract));
    assert!(
        diagnostics
            .iter()
            .any(|d| d.contains("does not override abstract method name()")),
        "{:?}",
        diagnostics
    );
}

#[test]
fn test_superclass_without_default_constructor() {
    let base = TypeDescriptor::abstract_class("demo.Needy")
        .constructor(ConstructorDescriptor::with_params([TypeRef::int()]))
        .method(MethodDescriptor::new("run"));
    let diagnostics = expect_compilation_error(ClassGenerator::new(body_hooks("")).resolve(&base));
    assert!(diagnostics.iter().any(|d| d.contains("no default constructor")));
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_interface_as_superclass_is_invalid_hierarchy() {
    let hooks = ClosureHooks::new()
        .with_superclass(|_| Some(marker("demo.NotAClass")))
        .with_method_body(|_, _| Some("return par0;".to_string()));
    let (generator, compiler) = {
        let compiler = std::sync::Arc::new(CountingCompiler::default());
        (ClassGenerator::new(hooks).with_compiler(compiler.clone()), compiler)
    };
    assert!(matches!(
        expect_err(generator.resolve(&greeter())),
        MorphError::InvalidHierarchy { .. }
    ));
    assert_eq!(compiler.calls(), 0);
}

#[test]
fn test_class_as_interface_is_invalid_hierarchy() {
    let hooks = ClosureHooks::new()
        .with_interfaces(|_| vec![TypeDescriptor::class("demo.Concrete")])
        .with_method_body(|_, _| Some("return par0;".to_string()));
    assert!(matches!(
        expect_err(ClassGenerator::new(hooks).resolve(&greeter())),
        MorphError::InvalidHierarchy { .. }
    ));
}

// ============================================================================
// Instantiation and invocation
// ============================================================================

#[test]
fn test_throwing_constructor_is_instantiation_error() {
    let hooks = body_hooks("return par0;").with_constructor_body(|_, _| Some("throw \"no\";".to_string()));
    let generator = ClassGenerator::new(hooks);
    // the class itself is fine and stays cached
    generator.resolve(&greeter()).unwrap();
    let err = expect_err(generator.new_instance(&greeter()));
    assert!(matches!(err, MorphError::Instantiation { .. }), "{}", err);
    assert!(err.to_string().contains("no"));
    assert!(generator.is_cached(&greeter()));
}

#[test]
fn test_failing_field_initializer_is_instantiation_error() {
    let hooks = class_hooks("private int ratio = 1 / zero();\nprivate int zero() {\n    return 0;\n}", &[("greet", "return par0;")]);
    let err = expect_err(ClassGenerator::new(hooks).new_instance(&greeter()));
    assert!(matches!(err, MorphError::Instantiation { .. }), "{}", err);
}

#[test]
fn test_unknown_method_and_wrong_arguments() {
    let object = instance_with(body_hooks("return par0;"), &greeter());
    assert!(matches!(
        expect_err(object.invoke("wave", &[])),
        MorphError::NoSuchMethod { .. }
    ));
    assert!(matches!(
        expect_err(object.invoke("greet", &[])),
        MorphError::NoSuchMethod { .. }
    ));
    assert!(matches!(
        expect_err(object.invoke("greet", &[Value::Int(1)])),
        MorphError::IllegalArgument(_)
    ));
}

#[test]
fn test_default_without_native_is_no_such_method() {
    // a concrete interface method without a native implementation
    let contract = TypeDescriptor::interface("demo.Partial").methods([
        MethodDescriptor::new("done").returns(TypeRef::int()),
        MethodDescriptor::new("later").returns(TypeRef::int()).concrete(),
    ]);
    let object = instance_with(body_hooks("return 1;"), &contract);
    expect_invoke(&object, "done", &[], 1);
    assert!(matches!(
        expect_err(object.invoke("later", &[])),
        MorphError::NoSuchMethod { .. }
    ));
}

#[test]
fn test_null_receiver() {
    let contract = TypeDescriptor::interface("demo.Len").method(
        MethodDescriptor::new("len")
            .param(TypeRef::string())
            .returns(TypeRef::int()),
    );
    let object = instance_with(body_hooks("return par0.length();"), &contract);
    expect_invoke(&object, "len", &[Value::from("four")], 4);
    assert!(matches!(
        expect_err(object.invoke("len", &[Value::Null])),
        MorphError::NullReference(ref method) if method == "length"
    ));
}

#[test]
fn test_stub_hooks_throw_not_implemented() {
    let object = instance_with(StubHooks, &greeter());
    match expect_err(object.invoke("greet", &[Value::from("x")])) {
        MorphError::Thrown(value) => {
            assert_eq!(value, Value::from("demo.Greeter.greet is not implemented"))
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_private_constructor_blocks_instantiation() {
    let contract = TypeDescriptor::interface("demo.Runner").method(MethodDescriptor::new("run"));
    let class_body = format!("private {}() {{\n}}", class_name_for(&contract.name));
    let generator = ClassGenerator::new(class_hooks(&class_body, &[("run", "")]));
    generator.resolve(&contract).unwrap();
    let err = expect_err(generator.new_instance(&contract));
    assert!(matches!(err, MorphError::Instantiation { .. }), "{}", err);
    assert!(err.to_string().contains("Illegal access"));
}
