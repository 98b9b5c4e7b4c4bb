//! `trait-impls`: print the merged implementor index of a documentation tree.
//!
//! # Responsibility
//! - Load every generated implementor chunk below a doc root.
//! - Attach one consumer per trait page and render what it receives.
//!
//! # Invariants
//! - Exit code 0 on success, 1 on configuration or load errors.

use clap::{Parser, ValueEnum};
use log::info;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use trait_impls_core::{
    default_log_level, init_logging, load_implementors_dir, CapabilityMapping, LoggingConfig,
    TraitIndex,
};

const IMPLEMENTORS_DIR_NAME: &str = "implementors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "trait-impls")]
#[command(about = "Show which types implement which traits in a generated documentation tree")]
#[command(version)]
struct Cli {
    /// Documentation output dir containing `implementors/`, or that dir itself
    doc_root: PathBuf,

    /// Only show this trait, e.g. `core::fmt::Display`
    #[arg(long = "trait", value_name = "PATH")]
    trait_path: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// trace|debug|info|warn|error; requires --log-dir
    #[arg(long, env = "TRAIT_IMPLS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; file logging is off when unset
    #[arg(long, env = "TRAIT_IMPLS_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("trait-impls: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    if let Some(config) = logging_config(cli)? {
        init_logging(&config)?;
    }

    let root = resolve_implementors_dir(&cli.doc_root);
    let mut index = TraitIndex::new();
    let chunks = load_implementors_dir(&root, &mut index).map_err(|err| err.to_string())?;

    let selected = match &cli.trait_path {
        Some(path) => {
            let path = path.trim().to_string();
            if index.get(&path).is_none() {
                return Err(format!("no implementor chunk for trait `{path}`"));
            }
            vec![path]
        }
        None => index.trait_paths(),
    };
    info!(
        "event=cli_render module=cli status=start chunks={} traits={} format={:?}",
        chunks,
        selected.len(),
        cli.format
    );

    let rendered: Rc<RefCell<Vec<(String, CapabilityMapping)>>> = Rc::default();
    for trait_path in &selected {
        let sink = Rc::clone(&rendered);
        let page = trait_path.clone();
        // Data is already loaded, so the consumer fires inside this call.
        index.attach_consumer(trait_path, move |mapping: &CapabilityMapping| {
            sink.borrow_mut().push((page.clone(), mapping.clone()));
        });
    }

    let rendered = rendered.borrow();
    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&rendered)),
        OutputFormat::Json => println!("{}", render_json(&rendered)?),
    }
    Ok(())
}

/// File logging is opt-in; a level without a directory is rejected, not ignored.
fn logging_config(cli: &Cli) -> Result<Option<LoggingConfig>, String> {
    match (&cli.log_dir, &cli.log_level) {
        (Some(log_dir), level) => {
            let level = level.as_deref().unwrap_or(default_log_level());
            LoggingConfig::new(level, log_dir).map(Some)
        }
        (None, Some(level)) => Err(format!(
            "log level `{level}` given without a log dir (set --log-dir or TRAIT_IMPLS_LOG_DIR)"
        )),
        (None, None) => Ok(None),
    }
}

fn resolve_implementors_dir(doc_root: &Path) -> PathBuf {
    let nested = doc_root.join(IMPLEMENTORS_DIR_NAME);
    if nested.is_dir() {
        nested
    } else {
        doc_root.to_path_buf()
    }
}

fn render_text(pages: &[(String, CapabilityMapping)]) -> String {
    let mut out = String::new();
    for (trait_path, mapping) in pages {
        out.push_str(&format!(
            "{trait_path} ({} implementors)\n",
            mapping.implementor_count()
        ));
        for (package, implementors) in mapping {
            out.push_str(&format!("  {package} ({})\n", implementors.len()));
            for descriptor in implementors {
                let marker = if descriptor.is_synthetic() { " [auto]" } else { "" };
                out.push_str(&format!("    {}{marker}\n", descriptor.header_text()));
            }
        }
    }
    out
}

fn render_json(pages: &[(String, CapabilityMapping)]) -> Result<String, String> {
    // Serialized straight from the mappings so package order survives.
    let object: BTreeMap<&str, &CapabilityMapping> = pages
        .iter()
        .map(|(trait_path, mapping)| (trait_path.as_str(), mapping))
        .collect();
    serde_json::to_string_pretty(&object).map_err(|err| err.to_string())
}
