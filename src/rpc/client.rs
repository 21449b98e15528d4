//! Probe client for a running server.
//!
//! Opens one TCP session and exercises the full method surface: initialize,
//! tools/list, then tools/call against each listed entry with synthetic
//! arguments. Used by the `test` subcommand.

use eyre::{bail, Context, Result};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::rpc::protocol::{CallToolParams, JsonRpcRequest, JsonRpcResponse, ListToolsResult};

/// Exercise the server at `addr`, optionally restricted to one entry name.
/// Per-call failures are reported but do not abort the run.
pub async fn run_probe(addr: &str, filter: Option<&str>) -> Result<()> {
    println!("Connecting to MCP server at {addr}...");

    let stream = TcpStream::connect(addr)
        .await
        .context(format!("Failed to connect to server at {addr}"))?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut next_id = 1u64;

    println!("\n--- Sending initialize ---");
    let resp = send(&mut reader, &mut writer, next_id, "initialize", None).await?;
    next_id += 1;
    if let Some(err) = resp.error {
        println!("Initialize failed: {} ({})", err.message, err.code);
        return Ok(());
    }
    println!("Initialize success.");

    println!("\n--- Listing tools ---");
    let resp = send(&mut reader, &mut writer, next_id, "tools/list", None).await?;
    next_id += 1;
    if let Some(err) = resp.error {
        println!("List tools failed: {} ({})", err.message, err.code);
        return Ok(());
    }
    let list: ListToolsResult = serde_json::from_value(resp.result.unwrap_or_default())
        .context("Unexpected tools/list result")?;
    println!("Found {} tools.", list.tools.len());

    for tool in &list.tools {
        if filter.is_some_and(|name| name != tool.name) {
            continue;
        }
        println!("\n--- Testing tool: {} ---", tool.name);

        let params = CallToolParams {
            name: tool.name.clone(),
            arguments: synthetic_arguments(&tool.input_schema.required, &tool.input_schema.properties),
        };
        let resp = send(
            &mut reader,
            &mut writer,
            next_id,
            "tools/call",
            Some(serde_json::to_value(&params)?),
        )
        .await?;
        next_id += 1;

        match resp.error {
            Some(err) => println!("Tool call failed: {} ({})", err.message, err.code),
            None => println!("Tool call success. Result: {}", resp.result.unwrap_or_default()),
        }
    }

    println!("\nTest run completed.");
    Ok(())
}

/// Dummy values for every required parameter: "test-value" for strings,
/// 1 for everything else.
fn synthetic_arguments(required: &[String], properties: &Map<String, Value>) -> Map<String, Value> {
    let mut arguments = Map::new();
    for name in required {
        let is_string = properties
            .get(name)
            .and_then(|prop| prop.get("type"))
            .and_then(Value::as_str)
            == Some("string");
        let value = if is_string { json!("test-value") } else { json!(1) };
        arguments.insert(name.clone(), value);
    }
    arguments
}

async fn send(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    id: u64,
    method: &str,
    params: Option<Value>,
) -> Result<JsonRpcResponse> {
    let request = JsonRpcRequest::new(id, method, params);
    let mut payload = serde_json::to_string(&request)?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .context("Write failed")?;

    let mut line = String::new();
    let n = reader.read_line(&mut line).await.context("Read failed")?;
    if n == 0 {
        bail!("Server closed the connection");
    }
    serde_json::from_str(line.trim()).context("Parse response failed")
}
