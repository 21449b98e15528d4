//! The MCP server loop: framing, dispatch, and transports.
//!
//! Frames are newline-delimited JSON objects. A single stdio session or any
//! number of concurrent TCP sessions share one catalog store; within a
//! session requests are handled strictly in arrival order.

use std::sync::Arc;

use eyre::{Context, Result};
use log::{error, info};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::catalog::{CatalogStore, Entity};
use crate::exec::{execute_tool, execute_workflow};
use crate::rpc::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ToolSchema,
};

#[derive(Clone)]
pub struct Server {
    store: Arc<CatalogStore>,
}

impl Server {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<CatalogStore> {
        Arc::clone(&self.store)
    }

    /// Serve a single session over the process's standard streams.
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("MCP server started. Mode: stdio");
        self.serve_stream(tokio::io::stdin(), tokio::io::stdout()).await;
        Ok(())
    }

    /// Bind a TCP listener and serve each accepted connection concurrently.
    pub async fn serve_tcp(&self, port: u16) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .context(format!("Failed to bind TCP listener on port {port}"))?;
        self.serve_listener(listener).await
    }

    /// Accept loop over an already-bound listener. Accept errors are logged
    /// and the loop continues; there is no graceful drain.
    pub async fn serve_listener(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("Failed to read listener address")?;
        info!("MCP server started. Mode: TCP. Port: {}", addr.port());

        loop {
            match listener.accept().await {
                Ok((stream, _peer)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        server.serve_stream(reader, writer).await;
                    });
                }
                Err(e) => error!("Accept error: {e}"),
            }
        }
    }

    /// One session: read frames until EOF, answering each request in order.
    /// Empty frames are skipped; malformed JSON is logged and dropped.
    pub async fn serve_stream<R, W>(&self, reader: R, mut writer: W)
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let frame = line.trim();
                    if frame.is_empty() {
                        continue;
                    }

                    let request: JsonRpcRequest = match serde_json::from_str(frame) {
                        Ok(request) => request,
                        Err(e) => {
                            error!("Failed to parse JSON frame: {e}");
                            continue;
                        }
                    };

                    let Some(response) = self.handle_request(request).await else {
                        continue;
                    };
                    let payload = match serde_json::to_string(&response) {
                        Ok(payload) => payload,
                        Err(e) => {
                            error!("Failed to serialize response: {e}");
                            continue;
                        }
                    };
                    if writer.write_all(payload.as_bytes()).await.is_err() {
                        break;
                    }
                    if writer.write_all(b"\n").await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Read error: {e}");
                    break;
                }
            }
        }
    }

    /// Dispatch one request. Notifications never yield a response frame,
    /// even when dispatch fails.
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let result = match request.method.as_str() {
            "initialize" => Ok(serde_json::to_value(InitializeResult::current()).unwrap_or_default()),
            "notifications/initialized" => return None,
            "tools/list" => Ok(self.list_tools().await),
            "tools/call" => self.call_tool(request.params).await,
            _ => Err(JsonRpcError::method_not_found()),
        };

        let id = request.id?;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => JsonRpcResponse::error(id, err),
        })
    }

    /// Every tool, then every workflow, each group in declaration order.
    async fn list_tools(&self) -> Value {
        let catalog = self.store.snapshot().await;

        let mut tools = Vec::with_capacity(catalog.tools.len() + catalog.workflows.len());
        for tool in &catalog.tools {
            tools.push(ToolSchema::from_parameters(
                &tool.name,
                &tool.description,
                &tool.parameters,
            ));
        }
        for workflow in &catalog.workflows {
            tools.push(ToolSchema::from_parameters(
                &workflow.name,
                &workflow.description,
                &workflow.parameters,
            ));
        }

        serde_json::to_value(ListToolsResult { tools }).unwrap_or_default()
    }

    /// Resolve and execute a tool or workflow. Execution failures are
    /// reported through the MCP `isError` flag, not the RPC envelope.
    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .ok_or_else(JsonRpcError::parse_error)?;

        // The snapshot is captured once: a concurrent reload cannot give
        // this call a mixed view of the catalog.
        let catalog = self.store.snapshot().await;
        let Some(entity) = catalog.find(&params.name) else {
            return Err(JsonRpcError::custom(
                JsonRpcError::METHOD_NOT_FOUND,
                "Tool or Workflow not found",
            ));
        };

        info!("Executing {} with arguments: {:?}", params.name, params.arguments);

        let outcome = match &entity {
            Entity::Tool(tool) => execute_tool(tool, &params.arguments).await,
            Entity::Workflow(workflow) => {
                execute_workflow(workflow, &catalog.tools, &params.arguments).await
            }
        };

        let result = match outcome {
            Ok(output) => {
                info!("Execution {} finished successfully.", params.name);
                CallToolResult::success(output)
            }
            Err(e) => {
                error!("Execution {} finished with error: {}. Output: {}", params.name, e.message, e.output);
                CallToolResult::failure(format!("Error: {}\nOutput: {}", e.message, e.output))
            }
        };

        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}
