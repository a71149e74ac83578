/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! `canopy render` renders a template once against a JSON model. With
//! `--script`, it then wraps the model and replays a list of mutations;
//! the wrapper's listener re-renders the document after every step, the
//! same way an interactive host would.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use canopy::{Engine, EngineError, Reactive, Scope, Value, wrap};
use canopy_dom::{Document, HostTree};
use serde::Deserialize;
use tracing::{debug, info};

use super::{load_config, load_template};

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Markup template
    pub template: PathBuf,
    /// JSON model file
    pub model: Option<PathBuf>,
    /// JSON mutation script
    pub script: Option<PathBuf>,
    /// YAML engine settings
    pub config: Option<PathBuf>,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
    /// Emit the tree after every script step
    pub snapshots: bool,
}

/// One model mutation in a script.
///
/// `path` names the container for `push` and `insert`, and the entry
/// itself (`parent.key`) for `set` and `remove`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Set {
        path: String,
        value: Value,
    },
    Push {
        #[serde(default)]
        path: String,
        value: Value,
    },
    Insert {
        #[serde(default)]
        path: String,
        index: usize,
        value: Value,
    },
    Remove {
        path: String,
    },
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let rendered = render_to_string(&args)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(output = %path.display(), "wrote rendered markup");
        }
        None => {
            std::io::stdout()
                .lock()
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Run the whole command and return what it would write.
pub fn render_to_string(args: &RenderArgs) -> Result<String> {
    let mut doc = load_template(&args.template)?;
    let model = load_model(args.model.as_deref())?;
    let config = load_config(args.config.as_deref())?;
    let mut engine = Engine::new(config).context("Invalid engine configuration")?;

    let root = doc.root();
    let stats = engine
        .render(&mut doc, root, &model, &Scope::new())
        .with_context(|| format!("Failed to render {}", args.template.display()))?;
    debug!(
        directives = stats.directives,
        generated = stats.generated,
        "initial render"
    );

    let Some(script) = &args.script else {
        return Ok(with_newline(doc.to_markup()));
    };
    let steps = load_script(script)?;
    let snapshots = replay(doc, engine, model, &steps)?;

    if args.snapshots {
        Ok(with_newline(snapshots.join("\n\n")))
    } else {
        Ok(with_newline(snapshots.last().cloned().unwrap_or_default()))
    }
}

fn with_newline(mut markup: String) -> String {
    markup.push('\n');
    markup
}

/// Read the JSON model, or start from an empty mapping.
pub fn load_model(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::map());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model: {}", path.display()))?;
    let model: Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in model: {}", path.display()))?;
    if !model.is_container() {
        anyhow::bail!(
            "Model must be a mapping or sequence, found {}: {}",
            model.kind(),
            path.display()
        );
    }
    Ok(model)
}

/// Read a mutation script.
pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid script: {}", path.display()))
}

/// Wrap `model`, apply every step through the wrapper and return the
/// markup after each step. The listener does the rendering; a failed
/// render or a rejected write stops the replay.
fn replay(doc: Document, engine: Engine, model: Value, steps: &[Step]) -> Result<Vec<String>> {
    let doc = Rc::new(RefCell::new(doc));
    let engine = Rc::new(RefCell::new(engine));
    let failure: Rc<RefCell<Option<EngineError>>> = Rc::new(RefCell::new(None));

    let listener = {
        let doc = Rc::clone(&doc);
        let engine = Rc::clone(&engine);
        let failure = Rc::clone(&failure);
        move |model: &Value| {
            let mut doc = doc.borrow_mut();
            let root = doc.root();
            if let Err(e) = engine
                .borrow_mut()
                .render(&mut *doc, root, model, &Scope::new())
            {
                failure.borrow_mut().get_or_insert(e);
            }
        }
    };
    let reactive = wrap(model, listener);

    let mut snapshots = Vec::with_capacity(steps.len());
    for (n, step) in steps.iter().enumerate() {
        apply_step(&reactive, step).with_context(|| format!("Script step {} failed", n + 1))?;
        if let Some(e) = failure.borrow_mut().take() {
            return Err(anyhow!(e)).with_context(|| format!("Render after step {} failed", n + 1));
        }
        snapshots.push(doc.borrow().to_markup());
    }
    info!(steps = steps.len(), "replayed script");
    Ok(snapshots)
}

/// Split `a.b.c` into the container path `a.b` and the key `c`.
fn split_entry(path: &str) -> (&str, &str) {
    path.rsplit_once('.').unwrap_or(("", path))
}

/// The handle for a container path; the empty path is the root.
fn container(root: &Reactive, path: &str) -> Result<Reactive> {
    if path.is_empty() {
        return Ok(root.root());
    }
    root.nested(path)
        .ok_or_else(|| anyhow!("No mapping or sequence at {:?}", path))
}

fn apply_step(root: &Reactive, step: &Step) -> Result<()> {
    debug!(?step, "applying script step");
    match step {
        Step::Set { path, value } => {
            let (parent, key) = split_entry(path);
            container(root, parent)?.set(key, value.clone())?;
        }
        Step::Push { path, value } => container(root, path)?.push(value.clone())?,
        Step::Insert { path, index, value } => {
            container(root, path)?.insert(*index, value.clone())?
        }
        Step::Remove { path } => {
            let (parent, key) = split_entry(path);
            container(root, parent)?.remove(key)?;
        }
    }
    Ok(())
}
