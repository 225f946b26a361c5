//! Class generation engine: pipeline, caching, hooks and cleanup.

use super::harness::*;
use std::sync::Arc;

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_hello_world() {
    let object = instance_with(body_hooks("return \"Hello \" + par0;"), &greeter());
    expect_invoke(&object, "greet", &[Value::from("World")], "Hello World");
}

#[test]
fn test_block_comments_in_bodies() {
    for body in [
        "/* simple */ return \"Hello \" + par0;",
        "/* greet\n * the caller */\nreturn \"Hello \" + /* inline */ par0;",
    ] {
        let object = instance_with(body_hooks(body), &greeter());
        expect_invoke(&object, "greet", &[Value::from("World")], "Hello World");
    }
}

#[test]
fn test_unterminated_block_comment_is_compilation_error() {
    let diagnostics = expect_compilation_error(
        ClassGenerator::new(body_hooks("/* never closed\nreturn par0;")).resolve(&greeter()),
    );
    assert!(
        diagnostics.iter().any(|d| d.contains("Unterminated block comment")),
        "{:?}",
        diagnostics
    );
}

#[test]
fn test_each_method_runs_its_own_body() {
    let contract = TypeDescriptor::interface("demo.Numbers").methods([
        MethodDescriptor::new("one").returns(TypeRef::int()),
        MethodDescriptor::new("two").returns(TypeRef::int()),
        MethodDescriptor::new("sum")
            .params([TypeRef::int(), TypeRef::int()])
            .returns(TypeRef::long()),
    ]);
    let hooks = class_hooks(
        "",
        &[
            ("one", "return 1;"),
            ("two", "return one() + 1;"),
            ("sum", "return par0 + par1;"),
        ],
    );
    let object = instance_with(hooks, &contract);
    expect_invoke(&object, "one", &[], 1);
    expect_invoke(&object, "two", &[], 2);
    expect_invoke(&object, "sum", &[Value::Int(40), Value::Int(2)], Value::Long(42));
}

#[test]
fn test_class_name_is_deterministic() {
    let (generator, _) = counting_generator(body_hooks("return par0;"));
    let class = generator.resolve(&greeter()).unwrap();
    assert_eq!(class.name(), class_name_for("demo.Greeter"));
    assert!(class.name().starts_with("Rtc"));
    assert!(class.is_subtype_of("demo.Greeter"));
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn test_resolve_compiles_once() {
    let (generator, compiler) = counting_generator(body_hooks("return par0;"));
    let first = generator.resolve(&greeter()).unwrap();
    let second = generator.resolve(&greeter().clone()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(compiler.calls(), 1);

    // instances share the cached class
    let a = generator.new_instance(&greeter()).unwrap();
    let b = generator.new_instance(&greeter()).unwrap();
    assert!(Arc::ptr_eq(a.class(), b.class()));
    assert!(a != b);
    assert_eq!(compiler.calls(), 1);
}

#[test]
fn test_distinct_contracts_get_distinct_classes() {
    let (generator, compiler) = counting_generator(body_hooks("return par0;"));
    let other = TypeDescriptor::interface("demo.Echo").method(
        MethodDescriptor::new("greet")
            .param(TypeRef::string())
            .returns(TypeRef::string()),
    );
    let a = generator.resolve(&greeter()).unwrap();
    let b = generator.resolve(&other).unwrap();
    assert_ne!(a.name(), b.name());
    assert_eq!(compiler.calls(), 2);
    assert_eq!(generator.cached_count(), 2);
}

#[test]
fn test_same_name_different_shape_is_rejected() {
    let (generator, compiler) = counting_generator(body_hooks("return par0;"));
    let full = greeter().method(
        MethodDescriptor::new("bye")
            .param(TypeRef::string())
            .returns(TypeRef::string()),
    );
    let object = generator.new_instance(&full).unwrap();
    expect_invoke(&object, "bye", &[Value::from("x")], "x");

    let err = expect_err(generator.resolve(&greeter()));
    assert!(matches!(err, MorphError::InvalidContract { ref name, .. } if name == "demo.Greeter"));
    assert!(err.to_string().contains("conflicting descriptor for demo.Greeter"));
    assert_eq!(compiler.calls(), 1);
    assert!(!generator.is_cached(&greeter()));

    // the first shape keeps working
    assert!(generator.is_cached(&full));
    generator.resolve(&full).unwrap();
}

#[test]
fn test_concurrent_resolve_generates_once() {
    let (generator, compiler) = counting_generator(body_hooks("return par0;"));
    let classes: Vec<Artifact> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| generator.resolve(&greeter()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(compiler.calls(), 1);
    assert!(classes.iter().all(|c| Arc::ptr_eq(c, &classes[0])));
}

#[test]
fn test_rejects_primitive_and_array_without_compiling() {
    let (generator, compiler) = counting_generator(body_hooks("return par0;"));
    for contract in [
        TypeDescriptor::primitive(PrimitiveKind::Int),
        TypeDescriptor::array(TypeRef::string()),
    ] {
        let err = expect_err(generator.resolve(&contract));
        assert!(matches!(err, MorphError::InvalidContract { .. }));
        assert!(expect_err(generator.new_instance(&contract))
            .to_string()
            .contains("cannot be implemented"));
    }
    assert_eq!(compiler.calls(), 0);
}

#[test]
fn test_failed_generation_is_retried() {
    let compiler = Arc::new(FailingCompiler::default());
    let generator = ClassGenerator::new(body_hooks("return par0;")).with_compiler(compiler.clone());

    let diagnostics = expect_compilation_error(generator.resolve(&greeter()));
    assert!(diagnostics[0].contains("refusing to compile"));
    assert!(!generator.is_cached(&greeter()));

    expect_compilation_error(generator.resolve(&greeter()));
    assert_eq!(compiler.calls(), 2);
}

// ============================================================================
// Source synthesis
// ============================================================================

#[test]
fn test_interface_order_does_not_change_source() {
    let with_order = |names: &'static [&'static str]| {
        ClosureHooks::new()
            .with_interfaces(move |_| names.iter().map(|n| marker(n)).collect())
            .with_method_body(|_, _| Some("return par0;".to_string()))
    };
    let a = ClassGenerator::new(with_order(&["demo.B", "demo.A", "demo.C"]))
        .synthesize(&greeter())
        .unwrap();
    let b = ClassGenerator::new(with_order(&["demo.C", "demo.B", "demo.A", "demo.B"]))
        .synthesize(&greeter())
        .unwrap();
    assert_eq!(a.text, b.text);
    assert!(a
        .text
        .contains("implements demo.A, demo.B, demo.C, demo.Greeter {"));
}

#[test]
fn test_nominated_interfaces_are_implemented() {
    let hooks = ClosureHooks::new()
        .with_interfaces(|_| vec![marker("demo.Serializable")])
        .with_method_body(|_, _| Some("return par0;".to_string()));
    let object = instance_with(hooks, &greeter());
    assert!(object.is_instance_of("demo.Serializable"));
    assert!(object.is_instance_of("demo.Greeter"));
    assert!(object.is_instance_of("Object"));
    assert!(!object.is_instance_of("demo.Other"));
}

#[test]
fn test_constructor_fragment_runs_on_instantiation() {
    let contract = TypeDescriptor::interface("demo.Counter")
        .method(MethodDescriptor::new("next").returns(TypeRef::int()));
    let hooks = class_hooks("private int count;", &[("next", "count += 1;\nreturn count;")])
        .with_constructor_body(|_, _| Some("count = 10;".to_string()));
    let object = instance_with(hooks, &contract);
    expect_invoke(&object, "next", &[], 11);
    expect_invoke(&object, "next", &[], 12);
}

#[test]
fn test_imports_are_usable() {
    let classpath = ClassPath::new();
    classpath.define_if_absent(&marker("com.acme.Tag"));
    let contract = TypeDescriptor::interface("demo.Tagger").method(
        MethodDescriptor::new("tag")
            .param(TypeRef::named("com.acme.Tag"))
            .returns(TypeRef::boolean()),
    );
    let hooks = ClosureHooks::new()
        .with_imports(|_| vec!["com.acme.Tag".to_string()])
        .with_class_body(|_| Some("private Tag last;".to_string()))
        .with_method_body(|_, _| Some("last = par0;\nreturn last == null;".to_string()));
    let generator = ClassGenerator::new(hooks).with_classpath(classpath);
    let object = generator.new_instance(&contract).unwrap();
    expect_invoke(&object, "tag", &[Value::Null], true);
}

// ============================================================================
// Class contracts
// ============================================================================

fn template_classpath() -> (ClassPath, TypeDescriptor) {
    let template = TypeDescriptor::abstract_class("demo.Template").methods([
        MethodDescriptor::new("render")
            .returns(TypeRef::string())
            .concrete(),
        MethodDescriptor::new("title").returns(TypeRef::string()),
    ]);
    let classpath = ClassPath::new();
    classpath.define(HostType::new(template.clone()).implement("render", 0, |this, _| {
        let title = this.invoke("title", &[])?;
        Ok(Value::from(format!("[{}]", title)))
    }));
    (classpath, template)
}

#[test]
fn test_template_method_sees_synthesized_body() {
    let (classpath, template) = template_classpath();
    let generator = ClassGenerator::new(body_hooks("return \"Report\";")).with_classpath(classpath);
    let object = generator.new_instance(&template).unwrap();
    expect_invoke(&object, "title", &[], "Report");
    expect_invoke(&object, "render", &[], "[Report]");
    assert_eq!(object.class().superclass(), "demo.Template");
    assert!(object.class().interfaces().is_empty());
}

#[test]
fn test_default_methods_are_inherited() {
    let shape = TypeDescriptor::interface("demo.Shape").methods([
        MethodDescriptor::new("area").returns(TypeRef::double()),
        MethodDescriptor::new("describe")
            .returns(TypeRef::string())
            .concrete(),
    ]);
    let classpath = ClassPath::new();
    classpath.define(HostType::new(shape.clone()).implement("describe", 0, |this, _| {
        let area = this.invoke("area", &[])?;
        Ok(Value::from(format!("shape of area {}", area)))
    }));

    let generator = ClassGenerator::new(body_hooks("return 2.5;")).with_classpath(classpath);
    let source = generator.synthesize(&shape).unwrap();
    assert!(!source.text.contains("describe"));

    let object = generator.new_instance(&shape).unwrap();
    expect_invoke(&object, "describe", &[], "shape of area 2.5");
}

#[test]
fn test_hook_superclass_for_interface_contract() {
    let base = TypeDescriptor::class("demo.Base").method(
        MethodDescriptor::new("kind")
            .returns(TypeRef::string())
            .concrete(),
    );
    let classpath = ClassPath::new();
    classpath.define(HostType::new(base.clone()).implement("kind", 0, |_, _| Ok(Value::from("base"))));

    let hooks = ClosureHooks::new()
        .with_superclass(move |_| Some(base.clone()))
        .with_method_body(|_, _| Some("return kind() + \":\" + par0;".to_string()));
    let generator = ClassGenerator::new(hooks).with_classpath(classpath);
    let object = generator.new_instance(&greeter()).unwrap();
    assert!(object.is_instance_of("demo.Base"));
    expect_invoke(&object, "greet", &[Value::from("x")], "base:x");
}

// ============================================================================
// Configuration and temporary storage
// ============================================================================

#[test]
fn test_temporary_storage_is_released() {
    let work = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::from_toml_str(&format!(
        "temp_prefix = \"gen\"\nwork_dir = {:?}\n",
        work.path().display().to_string()
    ))
    .unwrap();
    let generator = ClassGenerator::with_config(body_hooks("return \"x\" + par0;"), config).unwrap();
    generator.resolve(&greeter()).unwrap();

    let broken = TypeDescriptor::interface("demo.Broken")
        .method(MethodDescriptor::new("n").returns(TypeRef::int()));
    expect_compilation_error(generator.resolve(&broken));

    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn test_config_classpath_entries_are_loaded() {
    let types = tempfile::tempdir().unwrap();
    std::fs::write(
        types.path().join("tag.json"),
        marker("com.acme.Tag").to_json().unwrap(),
    )
    .unwrap();
    let config = GeneratorConfig {
        classpath: vec![types.path().to_path_buf()],
        ..GeneratorConfig::default()
    };
    let generator = ClassGenerator::with_config(body_hooks("return par0;"), config).unwrap();
    assert!(generator.classpath().contains("com.acme.Tag"));
}

#[cfg(unix)]
#[test]
fn test_command_compiler_failure_is_compilation_error() {
    let config = GeneratorConfig {
        compiler: CompilerConfig::Command {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo 'external failure' >&2; exit 1".to_string()],
        },
        ..GeneratorConfig::default()
    };
    let generator = ClassGenerator::with_config(body_hooks("return par0;"), config).unwrap();
    let diagnostics = expect_compilation_error(generator.resolve(&greeter()));
    assert_eq!(diagnostics, vec!["external failure".to_string()]);
}
