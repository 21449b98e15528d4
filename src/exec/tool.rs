//! Single tool invocation: shell subprocess or outbound HTTP request.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tokio::process::Command;

use super::lexical;
use crate::config::{ToolConfig, ToolKind};
use crate::error::{ExecError, ExecResult};

/// Execute one tool with the given arguments. Returns the textual product of
/// execution; on failure the error carries any output captured so far.
pub async fn execute_tool(tool: &ToolConfig, args: &Map<String, Value>) -> ExecResult {
    match tool.kind {
        ToolKind::Shell => execute_shell(tool, args).await,
        ToolKind::Http => execute_http(tool, args).await,
    }
}

async fn execute_shell(tool: &ToolConfig, args: &Map<String, Value>) -> ExecResult {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(&tool.command);

    // Arguments ride in as environment variables on top of the parent
    // environment. Keys colliding after the transform are last-write-wins.
    for (key, value) in args {
        cmd.env(env_key(key), lexical(value));
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| ExecError::new(format!("command execution failed: {e}"), ""))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        let status = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string());
        return Err(ExecError::new(
            format!("command execution failed: exit status {status}"),
            text,
        ));
    }

    Ok(text)
}

/// Uppercase the key and map `-` to `_` so it is a valid variable name.
fn env_key(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

async fn execute_http(tool: &ToolConfig, args: &Map<String, Value>) -> ExecResult {
    // An empty method is pinned to GET rather than left to the client.
    let method = if tool.method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(tool.method.to_uppercase().as_bytes())
            .map_err(|e| ExecError::new(format!("invalid method '{}': {e}", tool.method), ""))?
    };

    let has_body = method == Method::POST || method == Method::PUT || method == Method::PATCH;

    let client = Client::new();
    let mut request = client.request(method, &tool.url);

    if has_body {
        let body = serde_json::to_string(args)
            .map_err(|e| ExecError::new(format!("failed to marshal args: {e}"), ""))?;
        request = request.body(body);
    } else if !args.is_empty() {
        let query: Vec<(&str, String)> = args
            .iter()
            .map(|(key, value)| (key.as_str(), lexical(value)))
            .collect();
        request = request.query(&query);
    }

    let mut headers = HeaderMap::new();
    for (key, value) in &tool.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ExecError::new(format!("invalid header '{key}': {e}"), ""))?;
        let value = HeaderValue::from_str(&expand_env(value))
            .map_err(|e| ExecError::new(format!("invalid header '{key}': {e}"), ""))?;
        headers.insert(name, value);
    }
    // Always set last, overriding any user-supplied value.
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    request = request.headers(headers);

    let response = request
        .send()
        .await
        .map_err(|e| ExecError::new(format!("request failed: {e}"), ""))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ExecError::new(format!("failed to read response body: {e}"), ""))?;

    if status.as_u16() >= 400 {
        return Err(ExecError::new(
            format!("server returned error status: {}", status.as_u16()),
            body,
        ));
    }

    Ok(body)
}

/// Expand `$VAR` and `${VAR}` references from the process environment.
/// Unset variables expand to the empty string; a `$` that does not start a
/// variable reference is kept literally.
fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if closed {
                    out.push_str(&std::env::var(&name).unwrap_or_default());
                } else {
                    // Unterminated reference stays literal.
                    out.push_str("${");
                    out.push_str(&name);
                }
            }
            Some(next) if next.is_ascii_alphanumeric() || *next == '_' => {
                let mut name = String::new();
                while let Some(next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || *next == '_' {
                        name.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn shell_tool(command: &str) -> ToolConfig {
        ToolConfig {
            name: "shell-tool".to_string(),
            kind: ToolKind::Shell,
            command: command.to_string(),
            ..Default::default()
        }
    }

    fn http_tool(url: &str, method: &str) -> ToolConfig {
        ToolConfig {
            name: "http-tool".to_string(),
            kind: ToolKind::Http,
            url: url.to_string(),
            method: method.to_string(),
            ..Default::default()
        }
    }

    fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn test_shell_echo() {
        let tool = shell_tool("echo $MESSAGE");
        let output = execute_tool(&tool, &args(&[("message", json!("Hello World"))]))
            .await
            .unwrap();
        assert_eq!(output, "Hello World\n");
    }

    #[tokio::test]
    async fn test_shell_failure() {
        let tool = shell_tool("exit 1");
        let err = execute_tool(&tool, &Map::new()).await.unwrap_err();
        assert!(err.message.contains("exit status 1"));
        assert_eq!(err.output, "");
    }

    #[tokio::test]
    async fn test_shell_failure_keeps_partial_output() {
        let tool = shell_tool("echo before; exit 3");
        let err = execute_tool(&tool, &Map::new()).await.unwrap_err();
        assert!(err.message.contains("exit status 3"));
        assert_eq!(err.output, "before\n");
    }

    #[tokio::test]
    async fn test_shell_captures_stderr() {
        let tool = shell_tool("echo visible >&2");
        let output = execute_tool(&tool, &Map::new()).await.unwrap();
        assert_eq!(output, "visible\n");
    }

    #[tokio::test]
    async fn test_shell_key_transform() {
        let tool = shell_tool("printf '%s' \"$API_KEY\"");
        let output = execute_tool(&tool, &args(&[("api-key", json!("secret"))]))
            .await
            .unwrap();
        assert_eq!(output, "secret");
    }

    #[tokio::test]
    async fn test_shell_numeric_arg() {
        let tool = shell_tool("printf '%s' \"$COUNT\"");
        let output = execute_tool(&tool, &args(&[("count", json!(42))])).await.unwrap();
        assert_eq!(output, "42");
    }

    #[tokio::test]
    async fn test_http_get_query_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).query_param("q", "test");
            then.status(200).body("success");
        });

        let tool = http_tool(&server.url("/"), "GET");
        let output = execute_tool(&tool, &args(&[("q", json!("test"))])).await.unwrap();

        mock.assert();
        assert_eq!(output, "success");
    }

    #[tokio::test]
    async fn test_http_get_preserves_existing_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .query_param("fixed", "yes")
                .query_param("q", "test");
            then.status(200).body("ok");
        });

        let tool = http_tool(&format!("{}?fixed=yes", server.url("/")), "GET");
        execute_tool(&tool, &args(&[("q", json!("test"))])).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_http_post_json_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .header("content-type", "application/json")
                .json_body(json!({"name": "test"}));
            then.status(200).body("created");
        });

        let tool = http_tool(&server.url("/"), "POST");
        let output = execute_tool(&tool, &args(&[("name", json!("test"))])).await.unwrap();

        mock.assert();
        assert_eq!(output, "created");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(500).body("error");
        });

        let tool = http_tool(&server.url("/"), "GET");
        let err = execute_tool(&tool, &Map::new()).await.unwrap_err();
        assert!(err.message.contains("500"));
        assert_eq!(err.output, "error");
    }

    #[tokio::test]
    async fn test_http_connect_failure() {
        // Nothing listens here.
        let tool = http_tool("http://127.0.0.1:9/", "GET");
        let err = execute_tool(&tool, &Map::new()).await.unwrap_err();
        assert!(err.message.contains("request failed"));
        assert_eq!(err.output, "");
    }

    #[tokio::test]
    async fn test_http_empty_method_defaults_to_get() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(200).body("ok");
        });

        let tool = http_tool(&server.url("/"), "");
        execute_tool(&tool, &Map::new()).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_http_lowercase_method_normalized() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).json_body(json!({"a": 1}));
            then.status(200).body("ok");
        });

        let tool = http_tool(&server.url("/"), "post");
        execute_tool(&tool, &args(&[("a", json!(1))])).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_http_headers_env_expanded() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).header("x-token", "expanded-token");
            then.status(200).body("ok");
        });

        std::env::set_var("TOOLBELT_TEST_TOKEN", "expanded-token");
        let mut tool = http_tool(&server.url("/"), "GET");
        tool.headers
            .insert("X-Token".to_string(), "${TOOLBELT_TEST_TOKEN}".to_string());

        execute_tool(&tool, &Map::new()).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_http_content_type_wins_over_user_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).header("content-type", "application/json");
            then.status(200).body("ok");
        });

        let mut tool = http_tool(&server.url("/"), "POST");
        tool.headers
            .insert("Content-Type".to_string(), "text/plain".to_string());

        execute_tool(&tool, &Map::new()).await.unwrap();
        mock.assert();
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("message"), "MESSAGE");
        assert_eq!(env_key("api-key"), "API_KEY");
        assert_eq!(env_key("Already_Mixed"), "ALREADY_MIXED");
    }

    #[test]
    fn test_expand_env_braced_and_bare() {
        std::env::set_var("TOOLBELT_EXPAND_A", "alpha");
        assert_eq!(expand_env("v=${TOOLBELT_EXPAND_A}"), "v=alpha");
        assert_eq!(expand_env("v=$TOOLBELT_EXPAND_A!"), "v=alpha!");
    }

    #[test]
    fn test_expand_env_unset_is_empty() {
        std::env::remove_var("TOOLBELT_EXPAND_MISSING");
        assert_eq!(expand_env("v=${TOOLBELT_EXPAND_MISSING}end"), "v=end");
        assert_eq!(expand_env("v=$TOOLBELT_EXPAND_MISSING"), "v=");
    }

    #[test]
    fn test_expand_env_literal_dollar() {
        assert_eq!(expand_env("cost: $ 5"), "cost: $ 5");
        assert_eq!(expand_env("trailing $"), "trailing $");
        assert_eq!(expand_env("${unterminated"), "${unterminated");
    }
}
