mod common;

use common::*;
use std::thread;
use xtract::{ExecutionResult, ExtractXpath, MemoryContext, MessageContext, Properties};

#[test]
fn test_source_variable_missing() -> TestResult {
    let mut ctx = MemoryContext::new().with_variable("message-content", ORDER_XML);
    let props = Properties::new().with("source", "not-message.content");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("source variable resolves to null")
    );
    assert!(ctx.variable("xpath_exception").is_some());
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    Ok(())
}

#[test]
fn test_no_directives() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = Properties::new().with("source", "message.content");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    assert_eq!(ctx.variable("xpath_error").as_deref(), Some("no xpaths provided"));
    assert_eq!(
        ctx.variable("xpath_exception").as_deref(),
        Some("xtract::error::ExtractError: no xpaths provided")
    );
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    Ok(())
}

#[test]
fn test_rubbish_expression() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = Properties::new()
        .with("source", "message.content")
        .with("xpath:var1", "$%rubbish-here");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    let exception = ctx.variable("xpath_exception").ok_or("no exception")?;
    assert!(exception.starts_with("xtract_xpath1::error::XPathError: "));
    let error = ctx.variable("xpath_error").ok_or("no error")?;
    assert!(error.contains("$%rubbish-here"), "unexpected error: {error}");
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    assert_eq!(ctx.variable("var1"), None);
    Ok(())
}

#[test]
fn test_unbound_prefix() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = Properties::new()
        .with("source", "message.content")
        .with("xpath:var1", "/tx:order/payment");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("Prefix must resolve to a namespace: tx")
    );
    assert!(ctx.variable("xpath_exception").is_some());
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    Ok(())
}

#[test]
fn test_attribute_value() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties().with("xpath:var1", "/tx:order/e:payment/@type");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_no_failure(&ctx);
    assert_eq!(ctx.variable("var1").as_deref(), Some("CC"));
    Ok(())
}

#[test]
fn test_element_content() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props =
        order_properties().with("xpath:var1", "/tx:order/e:payment/e:creditcard/e:number");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_no_failure(&ctx);
    assert_eq!(ctx.variable("var1").as_deref(), Some("5201 2345 6789 0123"));
    Ok(())
}

#[test]
fn test_text_node() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties().with(
        "xpath:var1",
        "/tx:order/e:payment/e:creditcard/e:number/text()",
    );

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_no_failure(&ctx);
    assert_eq!(ctx.variable("var1").as_deref(), Some("5201 2345 6789 0123"));
    Ok(())
}

#[test]
fn test_abbreviated_descendant_path() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties().with("xpath:name", "//e:customer/e:address/e:city");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_eq!(ctx.variable("name").as_deref(), Some("Linz"));
    Ok(())
}

/// Namespaces and the expression come from pipeline variables.
fn interpolated_properties() -> Properties {
    Properties::new()
        .with("source", "message.content")
        .with("xmlns:tx", "{xmlns1}")
        .with("xmlns:e", "{xmlns2}")
        .with("xpath:var1", "{xpath1}")
}

fn interpolated_context(xpath: &str) -> MemoryContext {
    context_with(ORDER_XML)
        .with_variable("xmlns1", TX_NAMESPACE)
        .with_variable("xmlns2", ENTITIES_NAMESPACE)
        .with_variable("xpath1", xpath)
}

#[test]
fn test_interpolated_configuration() -> TestResult {
    let mut ctx = interpolated_context("/tx:order/e:payment/e:creditcard/e:number/text()");

    assert_eq!(run(interpolated_properties(), &mut ctx), ExecutionResult::Success);
    assert_no_failure(&ctx);
    assert_eq!(ctx.variable("var1").as_deref(), Some("5201 2345 6789 0123"));
    Ok(())
}

#[test]
fn test_expression_selects_nothing() -> TestResult {
    let mut ctx = interpolated_context("/tx:order/e:payment/e:foo/e:number/text()");

    assert_eq!(run(interpolated_properties(), &mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("xpath does not resolve to one node. (length=0)")
    );
    assert!(ctx.variable("xpath_exception").is_some());
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    assert_eq!(ctx.variable("var1"), None);
    Ok(())
}

#[test]
fn test_expression_selects_too_many() -> TestResult {
    let mut ctx = interpolated_context("/tx:order/*/text()");

    assert_eq!(run(interpolated_properties(), &mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("xpath does not resolve to one node. (length=12)")
    );
    assert!(ctx.variable("xpath_exception").is_some());
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    assert_eq!(ctx.variable("var1"), None);
    Ok(())
}

#[test]
fn test_xml_1_1_declaration() -> TestResult {
    let mut ctx = context_with(TASK_XML);
    let props = Properties::new()
        .with("source", "message.content")
        .with("xpath:var1", "/Task/Triggers/EventTrigger/ExecutionTimeLimit/text()");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_no_failure(&ctx);
    assert_eq!(ctx.variable("var1").as_deref(), Some("123"));
    Ok(())
}

#[test]
fn test_bad_namespace_in_first_directive_stops_the_batch() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties()
        .with("xpath:first", "/bad:order")
        .with("xpath:second", "/tx:order/e:payment/@type");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("Prefix must resolve to a namespace: bad")
    );
    assert_eq!(ctx.variable("first"), None);
    assert_eq!(ctx.variable("second"), None);
    Ok(())
}

#[test]
fn test_cardinality_failure_does_not_stop_the_batch() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties()
        .with("xpath:lines", "//e:line")
        .with("xpath:issuer", "//e:creditcard/@issuer")
        .with("xpath:nothing", "//e:refund");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_eq!(ctx.variable("issuer").as_deref(), Some("Mastercard"));
    assert_eq!(ctx.variable("lines"), None);
    assert_eq!(ctx.variable("nothing"), None);
    // The last recorded failure wins.
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("xpath does not resolve to one node. (length=0)")
    );
    Ok(())
}

#[test]
fn test_non_node_set_result_aborts() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties().with("xpath:count", "count(//e:line)");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    assert_eq!(ctx.variable("count"), None);
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    let error = ctx.variable("xpath_error").ok_or("no error")?;
    assert!(error.contains("count(//e:line)"));
    Ok(())
}

#[test]
fn test_malformed_document_records_stacktrace() -> TestResult {
    let mut ctx = context_with("<tx:order xmlns:tx='urn:tx'><payment></tx:order>");
    let props = order_properties()
        .with("debug", "true")
        .with("xpath:var1", "/tx:order");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    let exception = ctx.variable("xpath_exception").ok_or("no exception")?;
    assert!(exception.starts_with("roxmltree::"), "unexpected: {exception}");
    let stacktrace = ctx.variable("xpath_stacktrace").ok_or("no stacktrace")?;
    assert!(stacktrace.starts_with(&exception));
    assert_eq!(ctx.variable("var1"), None);
    Ok(())
}

#[test]
fn test_default_message_content() -> TestResult {
    let mut ctx = MemoryContext::new().with_content(TASK_XML);
    let props = Properties::new().with("xpath:limit", "//ExecutionTimeLimit");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_eq!(ctx.variable("limit").as_deref(), Some("123"));
    Ok(())
}

#[test]
fn test_unreadable_message_content_records_stacktrace() -> TestResult {
    let mut ctx = MemoryContext::new();
    let props = Properties::new().with("xpath:limit", "//ExecutionTimeLimit");

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.variable("xpath_error").as_deref(),
        Some("message has no content")
    );
    assert!(ctx.variable("xpath_stacktrace").is_some());
    Ok(())
}

#[test]
fn test_properties_from_json() -> TestResult {
    let props = Properties::from_json(&format!(
        r#"{{
            "source": "message.content",
            "xmlns:tx": "{TX_NAMESPACE}",
            "xmlns:e": "{ENTITIES_NAMESPACE}",
            "xpath:currency": "//e:line[2]/e:price/@currency",
            "xpath:juice": "//e:product[@productNumber = '007']"
        }}"#
    ))?;
    let mut ctx = context_with(ORDER_XML);

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_no_failure(&ctx);
    assert_eq!(ctx.variable("currency").as_deref(), Some("EUR"));
    assert_eq!(ctx.variable("juice").as_deref(), Some("Super juice"));
    Ok(())
}

#[test]
fn test_concurrent_operations_are_independent() -> TestResult {
    let step = ExtractXpath::new(interpolated_properties());
    let cases = [
        ("//e:line[1]/e:product", "XML editing widget"),
        ("//e:line[2]/e:product", "Course supervisor handbook"),
        ("//e:line[3]/e:product", "Super juice"),
        ("/tx:order/e:payment/@type", "CC"),
    ];

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = cases
            .iter()
            .map(|&(xpath, _)| {
                let step = &step;
                scope.spawn(move || {
                    let mut ctx = interpolated_context(xpath);
                    let outcome = step.execute(&mut ctx);
                    (outcome, ctx.variable("var1"))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });

    for (result, (_, expected)) in results.into_iter().zip(cases) {
        let (outcome, value) = result.map_err(|_| "worker panicked")?;
        assert_eq!(outcome, ExecutionResult::Success);
        assert_eq!(value.as_deref(), Some(expected));
    }
    Ok(())
}

fn nested_predicate(depth: usize) -> String {
    format!(
        "/tx:order/e:payment[{}1{}]/@type",
        "(".repeat(depth),
        ")".repeat(depth)
    )
}

#[test]
fn test_nested_expression_within_limit() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties().with("xpath:var1", nested_predicate(40));

    assert_eq!(run(props, &mut ctx), ExecutionResult::Success);
    assert_eq!(ctx.variable("var1").as_deref(), Some("CC"));
    assert_no_failure(&ctx);
    Ok(())
}

#[test]
fn test_deeply_nested_expression_aborts() -> TestResult {
    let mut ctx = context_with(ORDER_XML);
    let props = order_properties().with("xpath:var1", nested_predicate(300));

    assert_eq!(run(props, &mut ctx), ExecutionResult::Abort);
    let exception = ctx.variable("xpath_exception").ok_or("no exception")?;
    assert!(exception.starts_with("xtract_xpath1::error::XPathError: "));
    let error = ctx.variable("xpath_error").ok_or("no error")?;
    assert!(error.contains("nested deeper than"), "unexpected error: {error}");
    assert_eq!(ctx.variable("xpath_stacktrace"), None);
    assert_eq!(ctx.variable("var1"), None);
    Ok(())
}
