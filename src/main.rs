//! Stencil CLI
//!
//! Usage:
//!   stencil [OPTIONS] [FILE]
//!
//! Renders a template from FILE (or stdin) with keywords and collections
//! taken from a TOML context document:
//!
//!   [keywords]
//!   name = "World"
//!
//!   [[collections.people]]
//!   name = "Ada"
//!   age = "36"

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Deserialize;

use stencil::web::WebPack;
use stencil::{loader, EngineConfig, Row, SharedRegistry, Template, UnmatchedKeywords};

#[derive(Parser)]
#[command(name = "stencil")]
#[command(about = "Single-pass text templating engine")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// TOML document with keywords and collections
    #[arg(short, long)]
    context: Option<PathBuf>,

    /// Layout template wrapped around the rendered body
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Drop unresolved keywords instead of leaving their tags in place
    #[arg(long)]
    drop_unmatched: bool,

    /// Track line/column positions for error reports (on by default in
    /// debug builds)
    #[arg(long)]
    trace_positions: bool,

    /// Print keyword/function statistics to stderr after rendering
    #[arg(long)]
    stats: bool,
}

/// TOML structure for the data context.
#[derive(Deserialize, Default)]
struct ContextFile {
    #[serde(default)]
    keywords: BTreeMap<String, String>,
    #[serde(default)]
    collections: BTreeMap<String, Vec<Row>>,
}

fn main() {
    let cli = Cli::parse();

    // Read the template
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(err) => {
                eprintln!("Error reading template '{}': {}", path.display(), err);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(err) => {
                    eprintln!("Error reading from stdin: {}", err);
                    process::exit(1);
                }
            }
        }
    };

    let mut config = EngineConfig::default();
    if cli.trace_positions {
        config = config.with_track_positions(true);
    }
    if cli.drop_unmatched {
        config = config.with_unmatched_keywords(UnmatchedKeywords::Drop);
    }
    if let Some(parent) = cli.input.as_ref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            config = config.with_base_path(parent);
        }
    }

    // Shared registry: block loading, web helpers, optional layout
    let shared = SharedRegistry::handle();
    {
        let mut registry = shared.borrow_mut();
        loader::install(&mut registry);
        WebPack::new().install(&mut registry);
        if let Some(layout) = &cli.layout {
            if let Err(err) = registry.set_layout_file(layout) {
                eprintln!("Error loading layout '{}': {}", layout.display(), err);
                process::exit(1);
            }
        }
    }

    let mut template = Template::from_text(&source, config, shared);

    if let Some(context_path) = &cli.context {
        let context = match load_context(context_path) {
            Ok(context) => context,
            Err(message) => {
                eprintln!("{message}");
                process::exit(1);
            }
        };
        for (name, value) in context.keywords {
            template.set_keyword(name, value);
        }
        for (name, rows) in context.collections {
            template.add_collection(name, rows);
        }
    }

    match template.render(cli.layout.is_some()) {
        Ok(output) => {
            print!("{}", output);
            let _ = io::stdout().flush();
            if cli.stats {
                let stats = template.stats();
                eprintln!(
                    "keywords resolved: {}, functions invoked: {}",
                    stats.keywords, stats.functions
                );
            }
        }
        Err(err) => {
            eprintln!("{}", err.format(&source, &filename));
            process::exit(1);
        }
    }
}

fn load_context(path: &Path) -> Result<ContextFile, String> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("Error reading context '{}': {}", path.display(), err))?;
    toml::from_str(&text)
        .map_err(|err| format!("Error parsing context '{}': {}", path.display(), err))
}
