/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the canopy CLI.
//!
//! Each command module handles the CLI interface and delegates to the
//! `canopy` engine for the actual work.

pub mod check;
pub mod render;

use std::path::Path;

use anyhow::{Context, Result};
use canopy::EngineConfig;
use canopy_dom::Document;

/// Read and parse a markup template.
pub fn load_template(path: &Path) -> Result<Document> {
    let markup = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template: {}", path.display()))?;
    Document::parse(&markup)
        .with_context(|| format!("Failed to parse template: {}", path.display()))
}

/// Read engine settings from a YAML file, or use the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    // An empty file is an empty mapping.
    if text.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    serde_yaml::from_str(&text)
        .with_context(|| format!("Invalid engine config: {}", path.display()))
}
