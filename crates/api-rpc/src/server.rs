//! JSON-RPC Server
//!
//! Serves the JSON-RPC 2.0 methods over HTTP on a loopback address.

use crate::handler::RpcHandler;
use crate::types::{
    AuthBeginRequest, AuthCompleteRequest, SessionRequest, TransferStartRequest,
    TransferStatusRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9528;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the stop handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.module().map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }

    fn module(&self) -> Result<RpcModule<()>, jsonrpsee::core::RegisterMethodError> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module.register_async_method("platforms.list.v1", move |_, _, _| {
            let handler = handler.clone();
            async move { handler.platforms().await }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("session.create.v1", move |_, _, _| {
            let handler = handler.clone();
            async move { handler.create_session().await }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("session.status.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SessionRequest = params.parse()?;
                handler.session_status(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("session.delete.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SessionRequest = params.parse()?;
                handler.delete_session(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("auth.begin.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: AuthBeginRequest = params.parse()?;
                handler.auth_begin(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("auth.complete.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: AuthCompleteRequest = params.parse()?;
                handler.auth_complete(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("subscriptions.list.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SessionRequest = params.parse()?;
                handler.subscriptions(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("content.export.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SessionRequest = params.parse()?;
                handler.export_content(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("transfer.start.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: TransferStartRequest = params.parse()?;
                handler.start_transfer(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("transfer.clear_all.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SessionRequest = params.parse()?;
                handler.clear_all(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("transfer.status.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: TransferStatusRequest = params.parse()?;
                handler.transfer_status(req).await
            }
        })?;

        Ok(module)
    }
}
