//! Catalog source file parsing.
//!
//! The catalog is a YAML document declaring tools (shell commands or HTTP
//! endpoints) and workflows (ordered pipelines of tool invocations). Absent
//! fields default to zero values so partial catalogs load cleanly.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A declared parameter, surfaced verbatim in the MCP input schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    /// JSON-schema type tag ("string", "number", ...). Opaque to the core.
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    pub required: bool,
}

/// How a tool executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Http,
    Shell,
}

/// A single callable tool. Exactly one of the shell/HTTP field groups is
/// meaningful depending on `kind`; the other is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub description: String,

    // HTTP specific
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,

    // Shell specific
    pub command: String,

    pub parameters: Vec<Parameter>,
}

/// One workflow step: a tool reference plus its (possibly templated) args.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub name: String,
    pub tool: String,
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// An ordered pipeline of steps with an output template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub steps: Vec<StepConfig>,
    pub output: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

/// Top-level catalog source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logfile: String,
    pub server: ServerConfig,
    pub tools: Vec<ToolConfig>,
    pub workflows: Vec<WorkflowConfig>,
}

impl Config {
    /// Load and parse the catalog source file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&content)
            .context(format!("Failed to parse config file {}", path.as_ref().display()))?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
