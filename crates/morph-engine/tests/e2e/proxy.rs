//! Delegating proxies: forwarding, patching and result checking.

use super::harness::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn test_forwards_calls_with_descriptors() {
    let handler = RecordingHandler::new(|method, args| match method.name.as_str() {
        "m1" => Ok(Value::Int(args[0].as_i32().unwrap_or(0) * args[1].as_i32().unwrap_or(0))),
        _ => Ok(Value::from("ignored")),
    });
    let builder = DelegatingProxyBuilder::new();
    let proxy = builder.augment(&calc(), handler.clone()).unwrap();

    expect_invoke(&proxy, "m1", &[Value::Int(3), Value::Int(4)], 12);
    expect_invoke(&proxy, "m2", &[], Value::Null);

    let contract = calc();
    assert_eq!(
        handler.calls(),
        vec![
            Call {
                iface: contract.clone(),
                method: contract.methods[0].clone(),
                args: vec![Value::Int(3), Value::Int(4)],
            },
            Call {
                iface: contract.clone(),
                method: contract.methods[1].clone(),
                args: vec![],
            },
        ]
    );
}

#[test]
fn test_proxy_implements_interface() {
    let builder = DelegatingProxyBuilder::new();
    let proxy = builder.augment(&calc(), RecordingHandler::silent()).unwrap();
    assert!(proxy.is_instance_of("demo.Calc"));
    assert_eq!(proxy.class().name(), class_name_for("demo.Calc"));
}

#[test]
fn test_proxies_share_class_but_not_handlers() {
    let builder = DelegatingProxyBuilder::new();
    let greet = |prefix: &'static str| -> Arc<dyn CallHandler> {
        Arc::new(move |_: &TypeDescriptor, _: &MethodDescriptor, args: &[Value]| {
            Ok::<_, MorphError>(Value::from(format!("{} {}", prefix, args[0])))
        })
    };
    let english = builder.augment(&greeter(), greet("Hello")).unwrap();
    let french = builder.augment(&greeter(), greet("Bonjour")).unwrap();

    assert!(Arc::ptr_eq(english.class(), french.class()));
    assert_eq!(builder.generator().cached_count(), 1);
    expect_invoke(&english, "greet", &[Value::from("World")], "Hello World");
    expect_invoke(&french, "greet", &[Value::from("Monde")], "Bonjour Monde");
}

#[test]
fn test_overloads_get_their_own_descriptor() {
    let printer = TypeDescriptor::interface("demo.Printer").methods([
        MethodDescriptor::new("print")
            .param(TypeRef::int())
            .returns(TypeRef::string()),
        MethodDescriptor::new("print")
            .param(TypeRef::string())
            .returns(TypeRef::string()),
    ]);
    let handler = RecordingHandler::new(|method, _| {
        Ok(Value::from(method.params[0].to_string()))
    });
    let proxy = DelegatingProxyBuilder::new()
        .augment(&printer, handler.clone())
        .unwrap();

    expect_invoke(&proxy, "print", &[Value::Int(1)], "int");
    expect_invoke(&proxy, "print", &[Value::from("s")], "String");
    let calls = handler.calls();
    assert_eq!(calls[0].method, printer.methods[0]);
    assert_eq!(calls[1].method, printer.methods[1]);
}

#[test]
fn test_rejects_non_interfaces_before_patching() {
    let handler = RecordingHandler::silent();
    let builder = DelegatingProxyBuilder::new();
    for contract in [
        TypeDescriptor::class("demo.Concrete"),
        TypeDescriptor::abstract_class("demo.Abstract")
            .method(MethodDescriptor::new("run")),
        TypeDescriptor::primitive(PrimitiveKind::Boolean),
    ] {
        let err = expect_err(builder.augment(&contract, handler.clone()));
        assert!(matches!(err, MorphError::InvalidContract { .. }), "{}", err);
    }
    assert!(handler.calls().is_empty());
    assert_eq!(builder.generator().cached_count(), 0);
}

#[test]
fn test_incompatible_result_fails_invocation() {
    let misbehave = Arc::new(AtomicBool::new(true));
    let flag = misbehave.clone();
    let handler = RecordingHandler::new(move |_, _| {
        if flag.load(Ordering::SeqCst) {
            Ok(Value::from("not a number"))
        } else {
            Ok(Value::Int(7))
        }
    });
    let proxy = DelegatingProxyBuilder::new()
        .augment(&calc(), handler)
        .unwrap();

    let err = expect_err(proxy.invoke("m1", &[Value::Int(1), Value::Int(2)]));
    assert!(
        matches!(err, MorphError::InvalidResultType { ref expected, ref found } if expected == "int" && found == "String"),
        "{}",
        err
    );

    // the proxy keeps working once the handler behaves
    misbehave.store(false, Ordering::SeqCst);
    expect_invoke(&proxy, "m1", &[Value::Int(1), Value::Int(2)], 7);
}

#[test]
fn test_result_kind_must_match_exactly() {
    let counter = TypeDescriptor::interface("demo.Total")
        .method(MethodDescriptor::new("total").returns(TypeRef::long()));
    let handler: Arc<dyn CallHandler> =
        Arc::new(|_: &TypeDescriptor, _: &MethodDescriptor, _: &[Value]| Ok::<_, MorphError>(Value::Int(1)));
    let proxy = DelegatingProxyBuilder::new().augment(&counter, handler).unwrap();
    assert!(matches!(
        expect_err(proxy.invoke("total", &[])),
        MorphError::InvalidResultType { .. }
    ));
}

#[test]
fn test_void_methods_discard_results() {
    let handler = RecordingHandler::new(|_, _| Ok(Value::from("dropped")));
    let proxy = DelegatingProxyBuilder::new()
        .augment(&calc(), handler.clone())
        .unwrap();
    expect_invoke(&proxy, "m2", &[], Value::Null);
    assert_eq!(handler.calls().len(), 1);
}

#[test]
fn test_handler_errors_propagate() {
    let handler = RecordingHandler::new(|method, _| Err(MorphError::handler(format!("{} refused", method.name))));
    let proxy = DelegatingProxyBuilder::new()
        .augment(&calc(), handler)
        .unwrap();
    let err = expect_err(proxy.invoke("m2", &[]));
    assert!(matches!(err, MorphError::Handler(ref message) if message == "m2 refused"));
}

#[test]
fn test_arguments_are_converted_to_parameter_types() {
    let widen = TypeDescriptor::interface("demo.Widen").method(
        MethodDescriptor::new("take")
            .params([TypeRef::long(), TypeRef::object()])
            .returns(TypeRef::object()),
    );
    let handler = RecordingHandler::new(|_, args| Ok(Value::array(args.iter().cloned())));
    let proxy = DelegatingProxyBuilder::new()
        .augment(&widen, handler)
        .unwrap();
    expect_invoke(
        &proxy,
        "take",
        &[Value::Int(5), Value::Char('c')],
        Value::array([Value::Long(5), Value::Char('c')]),
    );
    assert!(matches!(
        expect_err(proxy.invoke("take", &[Value::from("x"), Value::Null])),
        MorphError::IllegalArgument(_)
    ));
}

#[test]
fn test_default_methods_get_descriptor_fields() {
    let shape = TypeDescriptor::interface("demo.Shape").methods([
        MethodDescriptor::new("area").returns(TypeRef::double()),
        MethodDescriptor::new("describe")
            .returns(TypeRef::string())
            .concrete(),
    ]);
    let classpath = ClassPath::new();
    classpath.define(HostType::new(shape.clone()).implement("describe", 0, |this, _| {
        let area = this.invoke("area", &[])?;
        Ok(Value::from(format!("area {}", area)))
    }));

    let handler = RecordingHandler::new(|_, _| Ok(Value::Double(2.0)));
    let proxy = DelegatingProxyBuilder::new()
        .with_classpath(classpath)
        .augment(&shape, handler.clone())
        .unwrap();

    // the default body runs and only the abstract method reaches the handler
    expect_invoke(&proxy, "describe", &[], "area 2.0");
    let calls = handler.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method.name, "area");

    let field = proxy.class().declared_field("method_describe").unwrap();
    assert_eq!(field.visibility(), Visibility::Private);
    let _access = field.grant();
    assert_eq!(field.get(&proxy).unwrap(), Value::from(shape.methods[1].clone()));
}

#[test]
fn test_patched_fields_stay_private() {
    let proxy = DelegatingProxyBuilder::new()
        .augment(&calc(), RecordingHandler::silent())
        .unwrap();
    let class = proxy.class();
    for name in ["handler", "iface", "method_m1", "method_m2"] {
        let field = class.declared_field(name).unwrap();
        assert_eq!(field.visibility(), Visibility::Private);
        assert!(!field.is_accessible());
        assert!(matches!(
            expect_err(field.get(&proxy)),
            MorphError::IllegalAccess { .. }
        ));
    }
    let method = class.declared_field("method_m1").unwrap();
    let _access = method.grant();
    assert_eq!(method.get(&proxy).unwrap(), Value::from(calc().methods[0].clone()));
}

#[test]
fn test_proxy_methods_visible_to_generated_code() {
    // a proxy passed into another generated object is called like any instance
    let proxy = DelegatingProxyBuilder::new()
        .augment(&greeter(), Arc::new(|_: &TypeDescriptor, _: &MethodDescriptor, args: &[Value]| {
            Ok::<_, MorphError>(Value::from(format!("<{}>", args[0])))
        }))
        .unwrap();

    let classpath = ClassPath::new();
    classpath.define_if_absent(&greeter());
    let twice = TypeDescriptor::interface("demo.Twice").method(
        MethodDescriptor::new("twice")
            .params([TypeRef::named("demo.Greeter"), TypeRef::string()])
            .returns(TypeRef::string()),
    );
    let generator = ClassGenerator::new(body_hooks("return par0.greet(par0.greet(par1));"))
        .with_classpath(classpath);
    let object = generator.new_instance(&twice).unwrap();
    expect_invoke(
        &object,
        "twice",
        &[Value::from(proxy), Value::from("x")],
        "<<x>>",
    );
}
