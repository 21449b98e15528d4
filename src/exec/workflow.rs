//! Workflow engine: sequenced tool calls with template wiring.
//!
//! Steps run strictly in declaration order. Each step's trimmed output is
//! recorded under its name and becomes available to later steps and to the
//! final output template.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{execute_tool, lexical};
use crate::config::{ToolConfig, WorkflowConfig};
use crate::error::{ExecError, ExecResult};

/// Execute a workflow against the given tool list. The first failing step
/// aborts the run; later steps are not executed.
pub async fn execute_workflow(
    workflow: &WorkflowConfig,
    tools: &[ToolConfig],
    inputs: &Map<String, Value>,
) -> ExecResult {
    let mut outputs: HashMap<String, String> = HashMap::new();

    for step in &workflow.steps {
        let tool = tools.iter().find(|t| t.name == step.tool).ok_or_else(|| {
            ExecError::new(
                format!("tool '{}' not found for step '{}'", step.tool, step.name),
                "",
            )
        })?;

        // Only string args are templated; other values pass through untouched.
        let mut step_args = Map::new();
        for (key, value) in &step.args {
            let resolved = match value {
                Value::String(template) => Value::String(substitute(template, inputs, &outputs)),
                other => other.clone(),
            };
            step_args.insert(key.clone(), resolved);
        }

        let output = execute_tool(tool, &step_args).await.map_err(|e| {
            ExecError::new(
                format!("step '{}' failed: {}. Output: {}", step.name, e.message, e.output),
                "",
            )
        })?;

        outputs.insert(step.name.clone(), output.trim().to_string());
    }

    if workflow.output.is_empty() {
        // No template: one line per step, in declaration order.
        let mut result = String::new();
        for step in &workflow.steps {
            if let Some(output) = outputs.get(&step.name) {
                result.push_str(&format!("{}: {}\n", step.name, output));
            }
        }
        return Ok(result);
    }

    Ok(substitute(&workflow.output, inputs, &outputs))
}

/// Literal, non-recursive placeholder replacement: first `{{input.<k>}}`
/// from caller inputs, then `{{<step>}}` from recorded step outputs.
/// Unknown placeholders are left intact. There is no escaping syntax.
fn substitute(
    template: &str,
    inputs: &Map<String, Value>,
    outputs: &HashMap<String, String>,
) -> String {
    let mut result = template.to_string();
    for (key, value) in inputs {
        result = result.replace(&format!("{{{{input.{key}}}}}"), &lexical(value));
    }
    for (name, output) in outputs {
        result = result.replace(&format!("{{{{{name}}}}}"), output);
    }
    result
}
