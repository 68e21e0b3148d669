//! JSON-RPC server with method dispatch
//!
//! Reads requests from a [`Transport`], dispatches them to registered method
//! handlers and writes back responses. Notifications are executed but never
//! answered.

use crate::jsonrpc::{
    protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse},
    transport::{ConnectionClosed, MalformedRequest, Transport, TransportConfig},
};
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// Method handler function signature
/// Takes JSON parameters and returns a JSON result
pub type MethodHandler =
    Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, Result<Value, JsonRpcError>> + Send + Sync>;

/// Registered methods, independent of any transport
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: Arc<RwLock<HashMap<String, MethodHandler>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method handler, replacing any previous one with the same name
    pub async fn register_method<F, Fut>(&self, method_name: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, JsonRpcError>> + Send + 'static,
    {
        let method_name = method_name.into();
        let wrapped_handler: MethodHandler = Arc::new(move |params| Box::pin(handler(params)));

        let mut methods = self.methods.write().await;
        if methods.insert(method_name.clone(), wrapped_handler).is_some() {
            warn!("Replaced existing handler for method: {}", method_name);
        }
        debug!("Registered method: {}", method_name);
    }

    /// Sorted names of every registered method
    pub async fn method_names(&self) -> Vec<String> {
        let methods = self.methods.read().await;
        let mut names: Vec<String> = methods.keys().cloned().collect();
        names.sort();
        names
    }

    /// Process a request and return a response, or `None` for notifications
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let request_id = request.id.clone();
        let is_notification = request.is_notification();

        if let Err(error) = request.validate() {
            if is_notification {
                warn!("Invalid notification: {}", error.message);
                return None;
            }
            return Some(JsonRpcResponse::error(error, request_id));
        }

        let handler = self.methods.read().await.get(&request.method).cloned();
        let handler = match handler {
            Some(handler) => handler,
            None if is_notification => {
                warn!("Method not found for notification: {}", request.method);
                return None;
            }
            None => return Some(JsonRpcResponse::method_not_found(&request.method, request_id)),
        };

        match handler(request.params).await {
            Ok(_) if is_notification => None,
            Ok(result) => Some(JsonRpcResponse::success(result, request_id)),
            Err(error) if is_notification => {
                error!("Error in notification handler for {}: {}", request.method, error.message);
                None
            }
            Err(error) => Some(JsonRpcResponse::error(error, request_id)),
        }
    }
}

/// JSON-RPC server bound to a single transport
pub struct JsonRpcServer {
    transport: Box<dyn Transport>,
    registry: MethodRegistry,
}

impl JsonRpcServer {
    /// Create a new JSON-RPC server with the specified transport
    pub async fn new(transport_config: TransportConfig) -> Result<Self> {
        let transport = transport_config.create_transport().await?;
        Ok(Self::with_transport(transport))
    }

    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            registry: MethodRegistry::new(),
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Serve requests until the peer disconnects or the process is interrupted
    pub async fn start(&mut self) -> Result<()> {
        self.serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for interrupt: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve requests until the peer disconnects or `shutdown` completes.
    ///
    /// Shutdown is only observed while waiting for the next request; a request
    /// already being handled runs to completion and gets its response.
    pub async fn serve_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!("Starting JSON-RPC server with {} transport", self.transport.description());
        tokio::pin!(shutdown);

        loop {
            let read = tokio::select! {
                read = self.transport.read_request() => read,
                _ = &mut shutdown => {
                    info!("Interrupt received, shutting down");
                    break;
                }
            };

            match self.handle_read(read).await {
                Ok(()) => {}
                Err(e) if e.downcast_ref::<ConnectionClosed>().is_some() => {
                    info!("Client disconnected");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        self.stop().await
    }

    /// Close the transport
    pub async fn stop(&mut self) -> Result<()> {
        self.transport.close().await?;
        info!("JSON-RPC server stopped");
        Ok(())
    }

    async fn handle_read(&mut self, read: Result<JsonRpcRequest>) -> Result<()> {
        let request = match read {
            Ok(req) => req,
            Err(e) if e.downcast_ref::<ConnectionClosed>().is_some() => return Err(e),
            Err(e) => {
                error!("Failed to read request: {}", e);
                let response = match e.downcast_ref::<MalformedRequest>() {
                    Some(malformed) => malformed.response(),
                    None => JsonRpcResponse::parse_error(),
                };
                self.transport
                    .write_response(response)
                    .await
                    .map_err(|write_err| anyhow!("Failed to send error response: {}", write_err))?;
                return Ok(());
            }
        };

        debug!("Received request: method={}, id={:?}", request.method, request.id);

        if let Some(response) = self.registry.dispatch(request).await {
            if let Err(e) = self.transport.write_response(response).await {
                error!("Failed to send response: {}", e);
            }
        }

        Ok(())
    }
}
