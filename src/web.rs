//! Web helper pack: link/script tag builders and a collection list renderer
//!
//! These are ordinary user functions; nothing here is special to the engine.
//! Install them on a shared registry for every instance, or on a single
//! instance. Base URLs resolve keyword-first (`_baseURL`, `_cssURL`,
//! `_jsURL` on the instance) falling back to the pack defaults.

use crate::collection::Row;
use crate::engine::Template;
use crate::error::EngineError;
use crate::registry::{Args, SharedRegistry};

/// Pack-level URL defaults; the per-instance keywords override them.
#[derive(Debug, Clone, Default)]
pub struct WebPack {
    default_url: String,
    css_url: String,
    js_url: String,
}

impl WebPack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default base URL for assets without a more specific one.
    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = url.into();
        self
    }

    /// Base URL for stylesheet includes.
    pub fn with_css_url(mut self, url: impl Into<String>) -> Self {
        self.css_url = url.into();
        self
    }

    /// Base URL for script includes.
    pub fn with_js_url(mut self, url: impl Into<String>) -> Self {
        self.js_url = url.into();
        self
    }

    /// Register the pack's functions on a shared registry.
    pub fn install(&self, registry: &mut SharedRegistry) {
        let pack = self.clone();
        registry.set_function("includeCss", move |t, args, _body| {
            Ok(pack.include_css(t, args))
        });
        let pack = self.clone();
        registry.set_function("includeJs", move |t, args, _body| {
            Ok(pack.include_js(t, args))
        });
        registry.set_function("directJs", |_t, _args, body| Ok(direct_js(body)));
        registry.set_function("list", |t, args, _body| list(t, args));
    }

    /// Register the pack's functions on a single instance.
    pub fn install_local(&self, template: &mut Template) {
        let pack = self.clone();
        template.set_function("includeCss", move |t, args, _body| {
            Ok(pack.include_css(t, args))
        });
        let pack = self.clone();
        template.set_function("includeJs", move |t, args, _body| {
            Ok(pack.include_js(t, args))
        });
        template.set_function("directJs", |_t, _args, body| Ok(direct_js(body)));
        template.set_function("list", |t, args, _body| list(t, args));
    }

    /// `{!includeCss file=style.css media=screen/}`
    fn include_css(&self, template: &Template, args: &Args) -> String {
        let Some(file) = args.get("file") else {
            return String::new();
        };
        let mut out = format!(
            "<link href=\"{}{}\" rel=\"stylesheet\" type=\"text/css\"",
            self.css_base(template),
            file
        );
        if let Some(media) = args.get("media") {
            out.push_str(&format!(" media=\"{media}\""));
        }
        out.push('>');
        out
    }

    /// `{!includeJs file=app.js/}`
    fn include_js(&self, template: &Template, args: &Args) -> String {
        let Some(file) = args.get("file") else {
            return String::new();
        };
        format!(
            "<script src=\"{}{}\" type=\"text/javascript\"></script>",
            self.js_base(template),
            file
        )
    }

    fn base(&self, template: &Template) -> String {
        match template.keyword("_baseURL") {
            Some(url) => add_slash(&url),
            None => add_slash(&self.default_url),
        }
    }

    fn css_base(&self, template: &Template) -> String {
        match template.keyword("_cssURL") {
            Some(url) => add_slash(&url),
            None if !self.css_url.is_empty() => add_slash(&self.css_url),
            None => self.base(template),
        }
    }

    fn js_base(&self, template: &Template) -> String {
        match template.keyword("_jsURL") {
            Some(url) => add_slash(&url),
            None if !self.js_url.is_empty() => add_slash(&self.js_url),
            None => self.base(template),
        }
    }
}

/// `{!directJs}}…{/directJs}}` — wrap the rendered body in script tags.
fn direct_js(body: &str) -> String {
    format!("<script type=\"text/javascript\">\n{body}\n</script>")
}

/// `{!list var=items [field=text] [class=menu]/}` — render a collection as an
/// unordered list, one item per row, then run the result through the engine
/// so markup inside rows still renders.
fn list(template: &mut Template, args: &Args) -> Result<String, EngineError> {
    let Some(var) = args.get("var") else {
        return Ok(String::new());
    };
    let field = args.get("field").cloned().unwrap_or_else(|| "text".into());
    let rows: Vec<Row> = template
        .collection(var)
        .map(<[Row]>::to_vec)
        .unwrap_or_default();

    let mut markup = match args.get("class") {
        Some(class) => format!("<ul class=\"{class}\">\n"),
        None => "<ul>\n".to_string(),
    };
    for row in &rows {
        let text = row.get(&field).cloned().unwrap_or_default();
        markup.push_str(&format!("  <li>{text}</li>\n"));
    }
    markup.push_str("</ul>");
    template.parse(&markup)
}

/// Guarantee a trailing slash on non-empty URLs.
fn add_slash(url: &str) -> String {
    if !url.is_empty() && !url.ends_with('/') {
        format!("{url}/")
    } else {
        url.to_string()
    }
}
