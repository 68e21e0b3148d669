//! Transport layer for JSON-RPC communication
//!
//! Messages are framed LSP-style with a `Content-Length` header, over stdio or
//! a Unix domain socket.

use crate::jsonrpc::protocol::{error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace};

/// The peer hung up between messages
#[derive(Debug, thiserror::Error)]
#[error("Connection closed")]
pub struct ConnectionClosed;

/// A complete frame arrived but its body is not a usable request.
///
/// The stream is still in sync, so the peer gets an error response on the same
/// connection.
#[derive(Debug, thiserror::Error)]
#[error("Malformed request: {}", .error.message)]
pub struct MalformedRequest {
    pub error: JsonRpcError,
    pub id: Option<Value>,
}

impl MalformedRequest {
    fn parse(e: serde_json::Error) -> Self {
        Self {
            error: JsonRpcError::custom(error_codes::PARSE_ERROR, format!("Parse error: {}", e), None),
            id: None,
        }
    }

    /// The response to send back for this request
    pub fn response(&self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.error.clone(), self.id.clone())
    }
}

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send {
    /// Read a JSON-RPC request from the transport
    async fn read_request(&mut self) -> Result<JsonRpcRequest>;

    /// Write a JSON-RPC response to the transport
    async fn write_response(&mut self, response: JsonRpcResponse) -> Result<()>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;

    /// Get transport description for logging
    fn description(&self) -> &'static str;
}

/// A reader/writer pair speaking Content-Length framed JSON
pub struct FramedConnection<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> FramedConnection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn read_request(&mut self) -> Result<JsonRpcRequest> {
        let content = lsp_format::read_message(&mut self.reader).await?;
        let request: JsonRpcRequest = serde_json::from_str(&content).map_err(MalformedRequest::parse)?;
        if let Err(error) = request.validate() {
            return Err(MalformedRequest { error, id: request.id }.into());
        }
        Ok(request)
    }

    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> Result<()> {
        let content = serde_json::to_string(response)?;
        lsp_format::write_message(&mut self.writer, &content).await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Stdio transport
pub struct StdioTransport {
    connection: FramedConnection<tokio::io::Stdin, tokio::io::Stdout>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            connection: FramedConnection::new(tokio::io::stdin(), tokio::io::stdout()),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn read_request(&mut self) -> Result<JsonRpcRequest> {
        self.connection.read_request().await
    }

    async fn write_response(&mut self, response: JsonRpcResponse) -> Result<()> {
        self.connection.write_response(&response).await
    }

    async fn close(&mut self) -> Result<()> {
        self.connection.writer.flush().await?;
        debug!("Stdio transport closed");
        Ok(())
    }

    fn description(&self) -> &'static str {
        "JSON-RPC over stdin/stdout (LSP-style)"
    }
}

type IpcConnection = FramedConnection<tokio::net::unix::OwnedReadHalf, tokio::net::unix::OwnedWriteHalf>;

/// Unix domain socket server transport.
///
/// Accepts one connection at a time and serves it until the peer hangs up,
/// then waits for the next one.
pub struct IpcServerTransport {
    listener: tokio::net::UnixListener,
    socket_path: String,
    current_connection: Option<IpcConnection>,
}

impl IpcServerTransport {
    /// Bind to a Unix socket path and start listening
    pub async fn bind<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let socket_path = path_ref.to_string_lossy().to_string();

        if path_ref.exists() {
            std::fs::remove_file(path_ref)
                .map_err(|e| anyhow!("Failed to remove existing socket file: {}", e))?;
        }

        let listener = tokio::net::UnixListener::bind(path_ref)
            .map_err(|e| anyhow!("Failed to bind to socket {}: {}", socket_path, e))?;

        debug!("IPC server listening on: {}", socket_path);

        Ok(Self {
            listener,
            socket_path,
            current_connection: None,
        })
    }

    async fn accept_connection(&mut self) -> Result<()> {
        debug!("Waiting for client connection on {}", self.socket_path);

        let (stream, _addr) = self.listener.accept().await
            .map_err(|e| anyhow!("Failed to accept connection: {}", e))?;

        debug!("Client connected to {}", self.socket_path);
        let (read_half, write_half) = stream.into_split();
        self.current_connection = Some(FramedConnection::new(read_half, write_half));

        Ok(())
    }
}

#[async_trait]
impl Transport for IpcServerTransport {
    async fn read_request(&mut self) -> Result<JsonRpcRequest> {
        loop {
            if self.current_connection.is_none() {
                self.accept_connection().await?;
            }

            let connection = match self.current_connection.as_mut() {
                Some(connection) => connection,
                None => continue,
            };

            match connection.read_request().await {
                Ok(request) => return Ok(request),
                Err(e) if e.downcast_ref::<MalformedRequest>().is_some() => return Err(e),
                Err(e) => {
                    // Peer gone or framing lost; wait for the next client
                    debug!("Connection error (will accept new connection): {}", e);
                    self.current_connection = None;
                }
            }
        }
    }

    async fn write_response(&mut self, response: JsonRpcResponse) -> Result<()> {
        let connection = self.current_connection.as_mut()
            .ok_or_else(|| anyhow!("No active connection"))?;
        connection.write_response(&response).await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(connection) = self.current_connection.as_mut() {
            connection.shutdown().await?;
        }

        if Path::new(&self.socket_path).exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        debug!("IPC server transport closed: {}", self.socket_path);
        Ok(())
    }

    fn description(&self) -> &'static str {
        "JSON-RPC server over Unix domain socket (LSP-style)"
    }
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Standard input/output with LSP message framing
    Stdio,
    /// Unix domain socket with specified path
    UnixSocket { path: String },
}

impl TransportConfig {
    /// Create a server-side transport from configuration
    pub async fn create_transport(&self) -> Result<Box<dyn Transport>> {
        match self {
            TransportConfig::Stdio => Ok(Box::new(StdioTransport::new())),
            TransportConfig::UnixSocket { path } => {
                let transport = IpcServerTransport::bind(path).await?;
                Ok(Box::new(transport))
            }
        }
    }

    /// Build from the `[server]` settings section, with an optional socket
    /// path override
    pub fn from_settings(server: &crate::config::ServerConfig, socket_override: Option<String>) -> Result<Self> {
        match server.transport.as_str() {
            "stdio" => Ok(TransportConfig::Stdio),
            "socket" => {
                let path = socket_override
                    .or_else(|| server.socket_path.clone())
                    .ok_or_else(|| anyhow!("Socket path is required when using socket transport"))?;
                Ok(TransportConfig::UnixSocket { path })
            }
            other => Err(anyhow!("Unsupported transport type: {}", other)),
        }
    }

    pub fn description(&self) -> String {
        match self {
            TransportConfig::Stdio => "stdin/stdout".to_string(),
            TransportConfig::UnixSocket { path } => format!("Unix socket ({})", path),
        }
    }
}

/// Content-Length framing helpers shared by server and client
pub mod lsp_format {
    use super::*;

    /// Read one framed message body
    pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String> {
        let mut content_length: Option<usize> = None;

        loop {
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                return Err(ConnectionClosed.into());
            }

            let line = line.trim_end();
            if line.is_empty() {
                break;
            }

            if let Some(length_str) = line.strip_prefix("Content-Length: ") {
                content_length = Some(length_str.parse::<usize>()
                    .map_err(|e| anyhow!("Invalid Content-Length: {}", e))?);
            }
            trace!("Received header: {}", line);
        }

        let content_length = content_length
            .ok_or_else(|| anyhow!("Missing Content-Length header"))?;

        let mut buffer = vec![0u8; content_length];
        reader.read_exact(&mut buffer).await?;

        let content = String::from_utf8(buffer)?;
        debug!("Received message: {} bytes", content_length);
        trace!("Message content: {}", content);
        Ok(content)
    }

    /// Write one framed message and flush
    pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, content: &str) -> Result<()> {
        writer.write_all(format_message(content).as_bytes()).await?;
        writer.flush().await?;
        debug!("Sent message: {} bytes", content.len());
        Ok(())
    }

    /// Format message with LSP headers
    pub fn format_message(content: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{}", content.len(), content)
    }
}
