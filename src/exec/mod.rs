//! Tool and workflow execution.
//!
//! Arguments cross this boundary as untyped JSON values and are converted
//! only at the sink points: environment variables for shell tools, query
//! parameters or a JSON body for HTTP tools.

mod tool;
mod workflow;

pub use tool::execute_tool;
pub use workflow::execute_workflow;

use serde_json::Value;

/// Render a JSON value in its lexical form: strings verbatim, scalars in
/// their canonical text form, composites as compact JSON.
pub(crate) fn lexical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lexical_string_verbatim() {
        assert_eq!(lexical(&json!("hello world")), "hello world");
    }

    #[test]
    fn test_lexical_scalars() {
        assert_eq!(lexical(&json!(42)), "42");
        assert_eq!(lexical(&json!(3.5)), "3.5");
        assert_eq!(lexical(&json!(true)), "true");
        assert_eq!(lexical(&json!(false)), "false");
        assert_eq!(lexical(&json!(null)), "null");
    }

    #[test]
    fn test_lexical_composites_as_json() {
        assert_eq!(lexical(&json!([1, 2])), "[1,2]");
        assert_eq!(lexical(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
