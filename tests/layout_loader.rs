//! Integration tests for layout composition and file loading

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use stencil::{loader, EngineConfig, ErrorKind, SharedRegistry, Template};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stencil-it-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

#[test]
fn test_layout_wraps_rendered_body() {
    let shared = SharedRegistry::handle();
    shared
        .borrow_mut()
        .set_layout("<html><body>{{contents}}</body></html>");
    let mut t = Template::from_text("Hi {{name}}", EngineConfig::default(), shared);
    t.set_keyword("name", "World");
    assert_eq!(
        t.render(true).expect("renders"),
        "<html><body>Hi World</body></html>"
    );
}

#[test]
fn test_layout_equivalent_to_manual_contents() {
    let layout = "== {{contents}} ==";

    let shared = SharedRegistry::handle();
    shared.borrow_mut().set_layout(layout);
    let mut with_layout = Template::from_text("Hi", EngineConfig::default(), shared);
    let composed = with_layout.render(true).expect("renders");

    let mut manual = Template::from_text(layout, EngineConfig::default(), SharedRegistry::handle());
    manual.set_keyword("contents", "Hi");
    let direct = manual.render(false).expect("renders");

    assert_eq!(composed, direct);
}

#[test]
fn test_layout_sees_instance_keywords() {
    let shared = SharedRegistry::handle();
    shared
        .borrow_mut()
        .set_layout("<title>{{title}}</title>{{contents}}");
    let mut t = Template::from_text("body", EngineConfig::default(), shared);
    t.set_keyword("title", "Page");
    assert_eq!(
        t.render(true).expect("renders"),
        "<title>Page</title>body"
    );
}

#[test]
fn test_layout_runs_once_not_recursively() {
    // A layout that mentions the contents keyword twice substitutes the same
    // body twice; nothing loops.
    let shared = SharedRegistry::handle();
    shared.borrow_mut().set_layout("{{contents}}|{{contents}}");
    let mut t = Template::from_text("X", EngineConfig::default(), shared);
    assert_eq!(t.render(true).expect("renders"), "X|X");
}

#[test]
fn test_layout_loaded_from_file() {
    let dir = scratch_dir("layout");
    let path = dir.join("layout.tpl");
    fs::write(&path, "[{{contents}}]").expect("write layout");

    let shared = SharedRegistry::handle();
    shared
        .borrow_mut()
        .set_layout_file(&path)
        .expect("layout loads");
    let mut t = Template::from_text("inner", EngineConfig::default(), shared);
    assert_eq!(t.render(true).expect("renders"), "[inner]");
}

#[test]
fn test_missing_layout_file_is_resource_error() {
    let shared = SharedRegistry::handle();
    let err = shared
        .borrow_mut()
        .set_layout_file("/nonexistent/layout.tpl")
        .expect_err("missing layout");
    assert_eq!(err.kind(), ErrorKind::Resource);
}

#[test]
fn test_template_from_file_with_base_path() {
    let dir = scratch_dir("fromfile");
    fs::write(dir.join("page.tpl"), "Hi {{name}}").expect("write template");

    let config = EngineConfig::default().with_base_path(&dir);
    let mut t = Template::from_file("page.tpl", config, SharedRegistry::handle())
        .expect("template loads");
    t.set_keyword("name", "World");
    assert_eq!(t.render(false).expect("renders"), "Hi World");
}

#[test]
fn test_template_from_missing_file_is_resource_error() {
    let err = Template::from_file(
        "/nonexistent/page.tpl",
        EngineConfig::default(),
        SharedRegistry::handle(),
    )
    .expect_err("missing template");
    assert_eq!(err.kind(), ErrorKind::Resource);
}

#[test]
fn test_block_function_renders_sub_template() {
    let dir = scratch_dir("blockfn");
    fs::write(dir.join("nav.tpl"), "<nav>{{page}}</nav>").expect("write block");

    let shared = SharedRegistry::handle();
    loader::install(&mut shared.borrow_mut());
    let config = EngineConfig::default().with_base_path(&dir);
    let mut t = Template::from_text("{!block template=nav.tpl/}<main/>", config, shared);
    t.set_keyword("page", "home");
    assert_eq!(
        t.render(false).expect("renders"),
        "<nav>home</nav><main/>"
    );
}

#[test]
fn test_block_respects_buffer_cap() {
    let dir = scratch_dir("blockcap");
    fs::write(dir.join("big.tpl"), "x".repeat(100)).expect("write block");

    let shared = SharedRegistry::handle();
    loader::install(&mut shared.borrow_mut());
    let config = EngineConfig::default()
        .with_base_path(&dir)
        .with_max_buffer_len(10);
    let mut t = Template::from_text("{!block template=big.tpl/}", config, shared);
    assert_eq!(t.render(false).expect("renders"), "x".repeat(10));
}

#[test]
fn test_layout_with_block_and_collection() {
    let dir = scratch_dir("composed");
    fs::write(dir.join("footer.tpl"), "-- {{site}} --").expect("write block");

    let shared = SharedRegistry::handle();
    loader::install(&mut shared.borrow_mut());
    shared
        .borrow_mut()
        .set_layout("{{contents}}\n{!block template=footer.tpl/}");

    let config = EngineConfig::default().with_base_path(&dir);
    let mut t = Template::from_text(
        "{%collection var=posts}}* {{posts.title}} {/collection}}",
        config,
        shared,
    );
    t.set_keyword("site", "Example");
    t.upsert_row("posts", -1, "title", "One");
    t.upsert_row("posts", -1, "title", "Two");
    // The newline after {{contents}} in the layout is swallowed.
    assert_eq!(
        t.render(true).expect("renders"),
        "* One * Two -- Example --"
    );
}
