//! LeetCode MCP server provider
//!
//! Spawns the server as a child process and speaks newline-delimited
//! JSON-RPC 2.0 over its stdin/stdout. The child is started lazily on the
//! first lookup and kept for later ones; it is respawned after an I/O
//! failure or when the credential situation changes.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::{PlatformCredential, ProblemData, ProblemProvider, ProblemQuery, Site, decode};
use crate::error::{ProviderError, ProviderErrorKind};

/// MCP protocol revision sent during `initialize`
const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResult {
    #[serde(default)]
    content: Vec<ToolContent>,
    #[serde(default)]
    is_error: bool,
}

#[derive(Debug, Deserialize)]
struct ToolContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ToolResult {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.kind == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn write_failed(err: std::io::Error) -> ProviderError {
    ProviderError::connectivity(format!("failed to write to MCP server: {err}"))
}

/// A running server process
struct Connection {
    // Held so the process lives as long as the connection; killed on drop
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
    authenticated: bool,
}

impl Connection {
    async fn send(&mut self, request: &JsonRpcRequest<'_>) -> Result<(), ProviderError> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| ProviderError::protocol(format!("failed to encode request: {e}")))?;
        line.push('\n');

        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(write_failed)?;
        self.stdin.flush().await.map_err(write_failed)
    }

    async fn request(
        &mut self,
        method: &str,
        params: Value,
        wait: Duration,
    ) -> Result<Value, ProviderError> {
        let id = self.next_id;
        self.next_id += 1;

        self.send(&JsonRpcRequest {
            jsonrpc: "2.0",
            id: Some(id),
            method,
            params: Some(params),
        })
        .await?;

        tokio::time::timeout(wait, self.read_response(id))
            .await
            .map_err(|_| {
                ProviderError::connectivity(format!(
                    "MCP server did not answer {method} within {}s",
                    wait.as_secs()
                ))
            })?
    }

    async fn notify(&mut self, method: &str) -> Result<(), ProviderError> {
        self.send(&JsonRpcRequest {
            jsonrpc: "2.0",
            id: None,
            method,
            params: None,
        })
        .await
    }

    async fn read_response(&mut self, id: u64) -> Result<Value, ProviderError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.stdout.read_line(&mut line).await.map_err(|e| {
                ProviderError::connectivity(format!("failed to read from MCP server: {e}"))
            })?;
            if read == 0 {
                return Err(ProviderError::connectivity("MCP server closed its output"));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // npx and some servers print banners on stdout
            let Ok(response) = serde_json::from_str::<JsonRpcResponse>(trimmed) else {
                tracing::debug!(line = trimmed, "skipping non JSON-RPC output");
                continue;
            };
            if response.id != Some(id) {
                continue;
            }

            if let Some(error) = response.error {
                return Err(ProviderError::protocol(format!(
                    "MCP error {}: {}",
                    error.code, error.message
                )));
            }
            return response
                .result
                .ok_or_else(|| ProviderError::protocol("MCP response had no result"));
        }
    }
}

/// Provider backed by a LeetCode MCP server
pub struct McpProvider {
    command: Vec<String>,
    site: Site,
    startup_timeout: Duration,
    request_timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl McpProvider {
    /// Create a provider; the server is not started until the first lookup
    #[must_use]
    pub fn new(
        command: Vec<String>,
        site: Site,
        startup_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            command,
            site,
            startup_timeout,
            request_timeout,
            connection: Mutex::new(None),
        }
    }

    async fn connect(
        &self,
        credential: Option<&PlatformCredential>,
    ) -> Result<Connection, ProviderError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| ProviderError::connectivity("MCP server command is empty"))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .env("LEETCODE_SITE", self.site.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        match credential {
            Some(credential) => command.env("LEETCODE_SESSION", credential.expose()),
            None => command.env_remove("LEETCODE_SESSION"),
        };

        let mut child = command
            .spawn()
            .map_err(|e| ProviderError::connectivity(format!("failed to start {program}: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::connectivity("MCP server stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::connectivity("MCP server stdout unavailable"))?;

        let mut connection = Connection {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
            authenticated: credential.is_some(),
        };

        let init = connection
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": { "name": "voice-qa", "version": env!("CARGO_PKG_VERSION") },
                }),
                self.startup_timeout,
            )
            .await?;
        connection.notify("notifications/initialized").await?;

        tracing::info!(
            program = %program,
            server = %init.pointer("/serverInfo/name").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
            authenticated = connection.authenticated,
            "MCP server ready"
        );
        Ok(connection)
    }
}

/// Tool name and arguments for a query
fn tool_call(query: &ProblemQuery) -> (&'static str, Value) {
    match query {
        ProblemQuery::Problem { slug } => ("get_problem", json!({ "titleSlug": slug })),
        ProblemQuery::DailyChallenge => ("get_daily_challenge", json!({})),
        ProblemQuery::Search {
            keywords,
            difficulty,
            limit,
        } => {
            let mut args = serde_json::Map::new();
            args.insert("limit".into(), json!(limit));
            if !keywords.is_empty() {
                args.insert("searchKeywords".into(), json!(keywords));
            }
            if let Some(difficulty) = difficulty {
                args.insert("difficulty".into(), json!(difficulty.as_api_str()));
            }
            ("search_problems", Value::Object(args))
        }
        ProblemQuery::UserProfile { username } => {
            ("get_user_profile", json!({ "username": username }))
        }
        ProblemQuery::RecentSubmissions { username, limit } => (
            "get_recent_submissions",
            json!({ "username": username, "limit": limit }),
        ),
    }
}

/// Turn a `tools/call` result into a payload or a classified error
fn parse_tool_result(
    result: Value,
    authenticated: bool,
) -> Result<Value, ProviderError> {
    let result: ToolResult = serde_json::from_value(result)
        .map_err(|e| ProviderError::protocol(format!("malformed tool result: {e}")))?;
    let text = result.text();

    if result.is_error {
        let lower = text.to_ascii_lowercase();
        if authenticated
            && ["session", "auth", "login", "401", "403"]
                .iter()
                .any(|needle| lower.contains(needle))
        {
            return Err(ProviderError::auth(text));
        }
        if lower.contains("not found") || lower.contains("does not exist") {
            return Err(ProviderError::not_found(text));
        }
        return Err(ProviderError::protocol(text));
    }

    serde_json::from_str(&text)
        .map_err(|_| ProviderError::protocol(format!("tool returned non-JSON text: {text}")))
}

#[async_trait]
impl ProblemProvider for McpProvider {
    fn name(&self) -> &'static str {
        "mcp"
    }

    async fn fetch(
        &self,
        query: &ProblemQuery,
        credential: Option<&PlatformCredential>,
    ) -> Result<ProblemData, ProviderError> {
        let mut guard = self.connection.lock().await;

        let authenticated = credential.is_some();
        let mut connection = match guard.take() {
            Some(existing) if existing.authenticated == authenticated => existing,
            _ => self.connect(credential).await?,
        };

        let (tool, arguments) = tool_call(query);
        tracing::debug!(%query, tool, "calling MCP tool");

        let outcome = connection
            .request(
                "tools/call",
                json!({ "name": tool, "arguments": arguments }),
                self.request_timeout,
            )
            .await;

        match outcome {
            Err(e) if e.kind == ProviderErrorKind::Connectivity => {
                tracing::debug!(error = %e, "dropping MCP connection");
                Err(e)
            }
            Err(e) => {
                *guard = Some(connection);
                Err(e)
            }
            Ok(result) => {
                *guard = Some(connection);
                let payload = parse_tool_result(result, authenticated)?;
                decode(query, &payload)
            }
        }
    }
}
