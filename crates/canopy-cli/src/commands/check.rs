/*
 * check.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Check command implementation.
//!
//! `canopy check` parses a template without rendering it and lists every
//! directive it finds, nested ones indented under their parents.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use canopy::{DirectiveKind, EngineConfig};
use canopy_dom::{Document, HostTree, NodeId};
use tracing::warn;

use super::{load_config, load_template};

/// Arguments for the check command
#[derive(Debug)]
pub struct CheckArgs {
    /// Markup template
    pub template: PathBuf,
    /// YAML engine settings
    pub config: Option<PathBuf>,
}

/// A directive found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveReport {
    pub kind: DirectiveKind,
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Number of enclosing directives.
    pub depth: usize,
}

impl DirectiveReport {
    fn line(&self) -> String {
        let mut line = format!("{}<{}", "  ".repeat(self.depth), self.tag);
        for (name, value) in &self.attributes {
            line.push_str(&format!(" {}=\"{}\"", name, value));
        }
        line.push('>');
        line
    }
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    config.validate().context("Invalid engine configuration")?;
    let doc = load_template(&args.template)?;

    let reports = find_directives(&doc, &config);
    for report in &reports {
        println!("{}", report.line());
    }
    for name in unresolved_references(&reports) {
        warn!(name, "recursive template is used but never defined");
    }
    println!(
        "{}: {} directive{}",
        args.template.display(),
        reports.len(),
        if reports.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Every directive in `doc`, in document order.
pub fn find_directives(doc: &Document, config: &EngineConfig) -> Vec<DirectiveReport> {
    let mut reports = Vec::new();
    collect(doc, doc.root(), config, 0, &mut reports);
    reports
}

fn collect(
    doc: &Document,
    node: NodeId,
    config: &EngineConfig,
    depth: usize,
    reports: &mut Vec<DirectiveReport>,
) {
    for child in doc.child_elements(node) {
        let Some(tag) = doc.tag_name(child) else {
            continue;
        };
        match config.directive_kind(tag) {
            Some(kind) => {
                reports.push(DirectiveReport {
                    kind,
                    tag: tag.to_string(),
                    attributes: doc.attributes(child),
                    depth,
                });
                collect(doc, child, config, depth + 1, reports);
            }
            None => collect(doc, child, config, depth, reports),
        }
    }
}

/// Names referenced with `use` that no `name` in the same template defines.
///
/// A definition may live in another template rendered by the same engine,
/// so this is a warning rather than an error.
pub fn unresolved_references(reports: &[DirectiveReport]) -> Vec<String> {
    let attr = |report: &DirectiveReport, key: &str| {
        report
            .attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    };
    let recursive = reports
        .iter()
        .filter(|r| r.kind == DirectiveKind::RecursiveTemplate);

    let defined: HashSet<String> = recursive.clone().filter_map(|r| attr(r, "name")).collect();
    let mut missing = Vec::new();
    for report in recursive {
        if attr(report, "name").is_some() {
            continue;
        }
        if let Some(target) = attr(report, "use")
            && !defined.contains(&target)
            && !missing.contains(&target)
        {
            missing.push(target);
        }
    }
    missing
}
