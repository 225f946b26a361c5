//! Generated class bodies: fields, statics, control flow and builtins.

use super::harness::*;

fn runner(return_type: TypeRef) -> TypeDescriptor {
    TypeDescriptor::interface("demo.Runner").method(MethodDescriptor::new("run").returns(return_type))
}

/// Generate `demo.Runner` with `class_body` and the `run` body, then call it.
fn run(class_body: &str, body: &str, return_type: TypeRef) -> MorphResult<Value> {
    let object = instance_with(class_hooks(class_body, &[("run", body)]), &runner(return_type));
    object.invoke("run", &[])
}

fn run_ok(class_body: &str, body: &str, return_type: TypeRef) -> Value {
    run(class_body, body, return_type).unwrap_or_else(|e| panic!("run failed: {}", e))
}

// ============================================================================
// Fields
// ============================================================================

#[test]
fn test_field_initializers_and_state() {
    let contract = TypeDescriptor::interface("demo.Account").methods([
        MethodDescriptor::new("deposit").param(TypeRef::long()),
        MethodDescriptor::new("balance").returns(TypeRef::long()),
    ]);
    let hooks = class_hooks(
        "private long balance = 100;\nprivate final String owner = \"ann\";",
        &[
            ("deposit", "balance += par0;"),
            ("balance", "return balance;"),
        ],
    );
    let account = instance_with(hooks, &contract);
    account.invoke("deposit", &[Value::Int(5)]).unwrap();
    account.invoke("deposit", &[Value::Long(10)]).unwrap();
    expect_invoke(&account, "balance", &[], Value::Long(115));

    let owner = account.class().declared_field("owner").unwrap();
    let _access = owner.grant();
    assert_eq!(owner.get(&account).unwrap(), Value::from("ann"));
}

#[test]
fn test_instances_have_separate_state() {
    let contract = TypeDescriptor::interface("demo.Counter")
        .method(MethodDescriptor::new("next").returns(TypeRef::int()));
    let generator = ClassGenerator::new(class_hooks(
        "private int n;",
        &[("next", "n = n + 1;\nreturn n;")],
    ));
    let a = generator.new_instance(&contract).unwrap();
    let b = generator.new_instance(&contract).unwrap();
    expect_invoke(&a, "next", &[], 1);
    expect_invoke(&a, "next", &[], 2);
    expect_invoke(&b, "next", &[], 1);
}

#[test]
fn test_static_fields_are_shared() {
    let contract = TypeDescriptor::interface("demo.Ticket")
        .method(MethodDescriptor::new("issue").returns(TypeRef::int()));
    let generator = ClassGenerator::new(class_hooks(
        "private static int issued = 1000;",
        &[("issue", "issued += 1;\nreturn issued;")],
    ));
    let a = generator.new_instance(&contract).unwrap();
    let b = generator.new_instance(&contract).unwrap();
    expect_invoke(&a, "issue", &[], 1001);
    expect_invoke(&b, "issue", &[], 1002);
    assert_eq!(a.class().static_field("issued"), Some(Value::Int(1002)));
}

#[test]
fn test_public_field_reflection() {
    let contract = runner(TypeRef::int());
    let object = instance_with(class_hooks("public int limit = 3;", &[("run", "return limit;")]), &contract);
    let limit = object.class().declared_field("limit").unwrap();
    assert_eq!(limit.get(&object).unwrap(), Value::Int(3));
    limit.set(&object, Value::Byte(9)).unwrap();
    expect_invoke(&object, "run", &[], 9);
    assert!(matches!(
        limit.set(&object, Value::from("nine")),
        Err(MorphError::IllegalArgument(_))
    ));
    assert!(matches!(
        object.class().declared_field("missing"),
        Err(MorphError::NoSuchField { .. })
    ));
}

// ============================================================================
// Statements and expressions
// ============================================================================

#[test]
fn test_loops_and_branches() {
    let body = "int i = 0;
int evens = 0;
while (i < 10) {
    if (i % 2 == 0) {
        evens += 1;
    }
    i += 1;
}
return evens;";
    assert_eq!(run_ok("", body, TypeRef::int()), Value::Int(5));
}

#[test]
fn test_recursion() {
    let contract = TypeDescriptor::interface("demo.Math").method(
        MethodDescriptor::new("fact")
            .param(TypeRef::int())
            .returns(TypeRef::long()),
    );
    let object = instance_with(
        body_hooks("if (par0 <= 1) return 1;\nreturn par0 * fact(par0 - 1);"),
        &contract,
    );
    expect_invoke(&object, "fact", &[Value::Int(20)], Value::Long(2432902008176640000));
}

#[test]
fn test_helper_methods_in_class_body() {
    let body = "return twice(\"ab\") + \"|\" + twice(\"c\").length();";
    let class_body = "private String twice(String s) {\n    return s + s;\n}";
    assert_eq!(run_ok(class_body, body, TypeRef::string()), Value::from("abab|2"));
}

#[test]
fn test_string_builtins_and_concatenation() {
    assert_eq!(
        run_ok("", "return \"  Morph \".trim().toUpperCase() + 1 + 2.5 + 'x' + true;", TypeRef::string()),
        Value::from("MORPH12.5xtrue")
    );
    assert_eq!(
        run_ok("", "String a = \"ab\";\nreturn a == \"a\" + \"b\" && a.contains(\"b\");", TypeRef::boolean()),
        Value::Bool(true)
    );
    assert_eq!(run_ok("", "return \"hello\".hashCode();", TypeRef::int()), Value::Int(99162322));
}

#[test]
fn test_numeric_semantics() {
    assert_eq!(run_ok("", "return 2147483647 + 1;", TypeRef::int()), Value::Int(i32::MIN));
    assert_eq!(run_ok("", "return 7 / 2 + 7 % 2;", TypeRef::int()), Value::Int(4));
    assert_eq!(run_ok("", "return 7 / 2.0;", TypeRef::double()), Value::Double(3.5));
    assert_eq!(run_ok("", "return (int) 9.99;", TypeRef::int()), Value::Int(9));
    assert_eq!(run_ok("", "return 1 < 2 ? 10L : 20L;", TypeRef::long()), Value::Long(10));
    assert!(matches!(
        run("", "int zero = 0;\nreturn 1 / zero;", TypeRef::int()),
        Err(MorphError::Arithmetic(_))
    ));
}

#[test]
fn test_to_string_override_used_in_concatenation() {
    let contract = runner(TypeRef::string());
    let object = instance_with(
        class_hooks(
            "public String toString() {\n    return \"runner\";\n}",
            &[("run", "return \"I am \" + this;")],
        ),
        &contract,
    );
    expect_invoke(&object, "run", &[], "I am runner");
    expect_invoke(&object, "toString", &[], "runner");
}

#[test]
fn test_identity_builtins() {
    let contract = runner(TypeRef::boolean());
    let object = instance_with(class_hooks("", &[("run", "return this.equals(this);")]), &contract);
    expect_invoke(&object, "run", &[], true);

    let text = object.invoke("toString", &[]).unwrap();
    let expected = format!("{}@{:x}", object.class().name(), object.id());
    assert_eq!(text, Value::from(expected));
    expect_invoke(&object, "hashCode", &[], Value::Int(object.id() as i32));
    expect_invoke(&object, "equals", &[Value::Null], false);
}

#[test]
fn test_throw_surfaces_as_thrown() {
    match run("", "throw \"bad input\";", TypeRef::int()) {
        Err(MorphError::Thrown(value)) => assert_eq!(value, Value::from("bad input")),
        other => panic!("expected a thrown value, got {:?}", other),
    }
}

#[test]
fn test_super_calls_reach_host_natives() {
    let base = TypeDescriptor::abstract_class("demo.Labelled").methods([
        MethodDescriptor::new("label")
            .returns(TypeRef::string())
            .concrete(),
        MethodDescriptor::new("describe").returns(TypeRef::string()),
    ]);
    let classpath = ClassPath::new();
    classpath.define(HostType::new(base.clone()).implement("label", 0, |_, _| Ok(Value::from("base"))));

    let hooks = class_hooks(
        "public String label() {\n    return \"own:\" + super.label();\n}",
        &[("describe", "return label();")],
    );
    let generator = ClassGenerator::new(hooks).with_classpath(classpath);
    let object = generator.new_instance(&base).unwrap();
    expect_invoke(&object, "describe", &[], "own:base");
}

#[test]
fn test_runaway_recursion_is_stopped() {
    let contract = TypeDescriptor::interface("demo.Loop").method(
        MethodDescriptor::new("down")
            .param(TypeRef::int())
            .returns(TypeRef::int()),
    );
    let config = GeneratorConfig {
        max_call_depth: 32,
        ..GeneratorConfig::default()
    };
    let generator = ClassGenerator::with_config(body_hooks("return down(par0 + 1);"), config).unwrap();
    let object = generator.new_instance(&contract).unwrap();
    assert!(matches!(
        expect_err(object.invoke("down", &[Value::Int(0)])),
        MorphError::StackOverflow { depth: 32 }
    ));
}
