//! Integration tests for the fused render loop: grammar, escapes, nesting,
//! policies

use pretty_assertions::assert_eq;

use stencil::error::codes;
use stencil::{EngineConfig, ErrorKind, SharedRegistry, Template, UnmatchedKeywords};

fn template(text: &str) -> Template {
    Template::from_text(text, EngineConfig::default(), SharedRegistry::handle())
}

#[test]
fn test_round_trip_without_tags() {
    let input = "A perfectly ordinary paragraph.\nSecond line, no markup.\n";
    let mut t = template(input);
    assert_eq!(t.render(false).expect("renders"), input);
}

#[test]
fn test_keyword_substitution() {
    let mut t = template("Hi {{name}}!");
    t.set_keyword("name", "World");
    assert_eq!(t.render(false).expect("renders"), "Hi World!");
}

#[test]
fn test_unmatched_keyword_policies() {
    let mut t = template("-{{ghost}}-");
    assert_eq!(t.render(false).expect("renders"), "-{{ghost}}-");

    let config = EngineConfig::default().with_unmatched_keywords(UnmatchedKeywords::Drop);
    let mut t = Template::from_text("-{{ghost}}-", config, SharedRegistry::handle());
    assert_eq!(t.render(false).expect("renders"), "--");
}

#[test]
fn test_backslash_escapes() {
    let mut t = template(r"a\\b");
    assert_eq!(t.render(false).expect("renders"), "a\\b");

    let mut t = template(r"a\{b");
    assert_eq!(t.render(false).expect("renders"), "a{b");

    let mut t = template(r"a\xb");
    assert_eq!(t.render(false).expect("renders"), "a\\xb");
}

#[test]
fn test_escaped_brace_keeps_tag_literal() {
    let mut t = template(r"\{{k}}");
    t.set_keyword("k", "v");
    assert_eq!(t.render(false).expect("renders"), "{{k}}");
}

#[test]
fn test_lone_brace_is_literal() {
    let mut t = template("a{b } c");
    assert_eq!(t.render(false).expect("renders"), "a{b } c");
}

#[test]
fn test_newline_after_keyword_is_swallowed() {
    let mut t = template("x{{k}}\ny");
    t.set_keyword("k", "1");
    assert_eq!(t.render(false).expect("renders"), "x1y");
}

#[test]
fn test_newline_after_builtin_is_swallowed() {
    let mut t = template("{%if 1}}Y{/if}}\nZ");
    assert_eq!(t.render(false).expect("renders"), "YZ");
}

#[test]
fn test_plain_newlines_survive() {
    let mut t = template("x\ny\n");
    assert_eq!(t.render(false).expect("renders"), "x\ny\n");
}

#[test]
fn test_function_receives_rendered_body() {
    let mut t = template("{!wrap}}k={{k}}{/wrap}}");
    t.set_keyword("k", "5");
    t.set_function("wrap", |_t, _args, body| Ok(format!("({body})")));
    assert_eq!(t.render(false).expect("renders"), "(k=5)");
}

#[test]
fn test_function_receives_arguments() {
    let mut t = template(r#"{!greet name=Ada greeting="Good day"/}"#);
    t.set_function("greet", |_t, args, _body| {
        let name = args.get("name").cloned().unwrap_or_default();
        let greeting = args.get("greeting").cloned().unwrap_or_default();
        Ok(format!("{greeting}, {name}!"))
    });
    assert_eq!(t.render(false).expect("renders"), "Good day, Ada!");
}

#[test]
fn test_nested_functions_close_in_order() {
    let mut t = template("{!f}}a{!g}}b{/g}}c{/f}}");
    t.set_function("f", |_t, _args, body| Ok(format!("F[{body}]")));
    t.set_function("g", |_t, _args, body| Ok(format!("G[{body}]")));
    assert_eq!(t.render(false).expect("renders"), "F[aG[b]c]");
}

#[test]
fn test_mismatched_close_is_syntax_error() {
    let mut t = template("{!f}}{!g}}{/f}}");
    t.set_function("f", |_t, _args, body| Ok(body.to_string()));
    t.set_function("g", |_t, _args, body| Ok(body.to_string()));
    let err = t.render(false).expect_err("mismatch");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.code(), codes::UNMATCHING_CLOSE);
}

#[test]
fn test_unclosed_construct_is_syntax_error() {
    let mut t = template("{!f}}abc");
    t.set_function("f", |_t, _args, body| Ok(body.to_string()));
    let err = t.render(false).expect_err("left open");
    assert_eq!(err.code(), codes::UNCLOSED_CONSTRUCT);
}

#[test]
fn test_undefined_function_is_semantic_error() {
    let mut t = template("{!nope}}x{/nope}}");
    let err = t.render(false).expect_err("undefined");
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert_eq!(err.code(), codes::UNDEFINED_FUNCTION);
}

#[test]
fn test_undefined_function_in_false_branch_still_errors() {
    // The name is resolved even in a suppressed branch; only the call is
    // gated on the write flag.
    let mut t = template("{%if 0}}{!nope/}{/if}}");
    let err = t.render(false).expect_err("undefined in false branch");
    assert_eq!(err.code(), codes::UNDEFINED_FUNCTION);
}

#[test]
fn test_false_branch_still_validates_structure() {
    let mut t = template("{%if 0}}{%if 1}}x{/if}}");
    let err = t.render(false).expect_err("outer if never closed");
    assert_eq!(err.code(), codes::UNCLOSED_CONSTRUCT);
}

#[test]
fn test_false_branch_suppresses_side_effects() {
    use std::cell::Cell;
    use std::rc::Rc;

    let calls = Rc::new(Cell::new(0u32));
    let seen = calls.clone();
    let mut t = template("{%if 0}}{!tick/}{/if}}{%if 1}}{!tick/}{/if}}");
    t.set_function("tick", move |_t, _args, _body| {
        seen.set(seen.get() + 1);
        Ok(String::new())
    });
    t.render(false).expect("renders");
    assert_eq!(calls.get(), 1, "callback runs only in the written branch");
}

#[test]
fn test_autoclosed_function() {
    let mut t = template("a {!stamp/} b");
    t.set_function("stamp", |_t, _args, _body| Ok("X".to_string()));
    assert_eq!(t.render(false).expect("renders"), "a X b");
}

#[test]
fn test_callback_can_parse_fragments() {
    let mut t = template("{!twice}}{{k}}{/twice}}");
    t.set_keyword("k", "ha");
    t.set_function("twice", |caller, _args, body| {
        let again = caller.parse("{{k}}")?;
        Ok(format!("{body}{again}"))
    });
    assert_eq!(t.render(false).expect("renders"), "haha");
}

#[test]
fn test_depth_ceiling() {
    let config = EngineConfig::default().with_max_depth(Some(3));
    let mut t = Template::from_text(
        "{%if 1}}{%if 1}}{%if 1}}{%if 1}}x{/if}}{/if}}{/if}}{/if}}",
        config,
        SharedRegistry::handle(),
    );
    let err = t.render(false).expect_err("too deep");
    assert_eq!(err.code(), codes::DEPTH_EXCEEDED);
}

#[test]
fn test_depth_within_ceiling_renders() {
    let config = EngineConfig::default().with_max_depth(Some(3));
    let mut t = Template::from_text(
        "{%if 1}}{%if 1}}{%if 1}}x{/if}}{/if}}{/if}}",
        config,
        SharedRegistry::handle(),
    );
    assert_eq!(t.render(false).expect("renders"), "x");
}

#[test]
fn test_unterminated_keyword_is_syntax_error() {
    let mut t = template("Hi {{name");
    let err = t.render(false).expect_err("unterminated");
    assert_eq!(err.code(), codes::UNTERMINATED_KEYWORD);
}

#[test]
fn test_unterminated_function_is_syntax_error() {
    let mut t = template("{!calc a b");
    let err = t.render(false).expect_err("unterminated");
    assert_eq!(err.code(), codes::UNTERMINATED_FUNCTION);
}

#[test]
fn test_shared_function_shadowed_by_local() {
    let shared = SharedRegistry::handle();
    shared
        .borrow_mut()
        .set_function("who", |_t, _args, _body| Ok("shared".to_string()));
    let mut t = Template::from_text("{!who/}", EngineConfig::default(), shared.clone());
    assert_eq!(t.render(false).expect("renders"), "shared");
    t.set_function("who", |_t, _args, _body| Ok("local".to_string()));
    assert_eq!(t.render(false).expect("renders"), "local");
}

#[test]
fn test_full_featured_render_snapshot() {
    let shared = SharedRegistry::handle();
    let mut t = Template::from_text(
        "Report for {{site}}: {%collection var=items loops=2}}[{{items._lineNumber}}:{{items.name}}]{/collection}} done",
        EngineConfig::default(),
        shared,
    );
    t.set_keyword("site", "Example");
    for name in ["alpha", "beta", "gamma"] {
        t.upsert_row("items", -1, "name", name);
    }
    let out = t.render(false).expect("renders");
    insta::assert_snapshot!(out, @"Report for Example: [1:alpha][2:beta] done");
}
