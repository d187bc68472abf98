//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    AccountSummary, AuthBeginRequest, AuthBeginResponse, AuthCompleteRequest,
    AuthCompleteResponse, PlatformInfo, PlatformsResponse, SessionCreatedResponse,
    SessionDeletedResponse, SessionRequest, SessionStatusResponse, TransferStartRequest, TransferStartedResponse,
    TransferStatusRequest,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use subsync_core::application::{TransferEngine, TransferOptions};
use subsync_core::domain::{
    Account, AccountRole, ContentSnapshot, PendingAuth, Platform, Session, Subscription,
    TransferJob,
};
use subsync_core::error::{AppError, Result};
use subsync_core::port::{PendingAuthStore, SessionStore, TimeProvider};
use tracing::{info, warn};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: Arc<TransferEngine>,
    sessions: Arc<dyn SessionStore>,
    pending: Arc<dyn PendingAuthStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RpcHandler {
    pub fn new(
        engine: Arc<TransferEngine>,
        sessions: Arc<dyn SessionStore>,
        pending: Arc<dyn PendingAuthStore>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            engine,
            sessions,
            pending,
            time_provider,
        }
    }

    /// platforms.list.v1
    pub async fn platforms(&self) -> std::result::Result<PlatformsResponse, ErrorObjectOwned> {
        let registry = self.engine.registry();
        let platforms = Platform::ALL
            .iter()
            .map(|p| PlatformInfo {
                id: *p,
                name: p.display_name().to_string(),
                enabled: registry.is_registered(*p),
            })
            .collect();
        Ok(PlatformsResponse { platforms })
    }

    /// session.create.v1
    pub async fn create_session(
        &self,
    ) -> std::result::Result<SessionCreatedResponse, ErrorObjectOwned> {
        let session = self.sessions.create_session().await.map_err(to_rpc_error)?;
        info!(session_id = %session.id, "Session created");
        Ok(SessionCreatedResponse {
            session_id: session.id,
        })
    }

    /// session.status.v1
    pub async fn session_status(
        &self,
        params: SessionRequest,
    ) -> std::result::Result<SessionStatusResponse, ErrorObjectOwned> {
        let session = self.session(&params.session_id).await.map_err(to_rpc_error)?;
        Ok(SessionStatusResponse {
            source: session.source.as_ref().map(AccountSummary::from),
            target: session.target.as_ref().map(AccountSummary::from),
            session_id: session.id,
            enabled_platforms: self.engine.registry().list_available(),
        })
    }

    /// session.delete.v1
    ///
    /// Connected accounts are forgotten; running transfers keep going.
    pub async fn delete_session(
        &self,
        params: SessionRequest,
    ) -> std::result::Result<SessionDeletedResponse, ErrorObjectOwned> {
        let deleted = self
            .sessions
            .delete_session(&params.session_id)
            .await
            .map_err(to_rpc_error)?;
        if deleted {
            info!(session_id = %params.session_id, "Session deleted");
        }
        Ok(SessionDeletedResponse { deleted })
    }

    /// auth.begin.v1
    pub async fn auth_begin(
        &self,
        params: AuthBeginRequest,
    ) -> std::result::Result<AuthBeginResponse, ErrorObjectOwned> {
        self.begin(params).await.map_err(to_rpc_error)
    }

    async fn begin(&self, params: AuthBeginRequest) -> Result<AuthBeginResponse> {
        let session = self.session(&params.session_id).await?;
        let provider = self.engine.registry().create(params.platform)?;
        let request = provider.auth_url()?;

        self.pending
            .put(
                &request.state,
                PendingAuth {
                    role: params.role,
                    session_id: session.id,
                    platform: params.platform,
                    created_at: self.time_provider.now(),
                },
            )
            .await?;

        info!(
            session_id = %params.session_id,
            platform = %params.platform,
            role = %params.role,
            "OAuth flow started"
        );
        Ok(AuthBeginResponse {
            auth_url: request.auth_url,
            state: request.state,
        })
    }

    /// auth.complete.v1
    pub async fn auth_complete(
        &self,
        params: AuthCompleteRequest,
    ) -> std::result::Result<AuthCompleteResponse, ErrorObjectOwned> {
        self.complete(params).await.map_err(to_rpc_error)
    }

    async fn complete(&self, params: AuthCompleteRequest) -> Result<AuthCompleteResponse> {
        if params.code.is_empty() || params.state.is_empty() {
            return Err(AppError::Validation("Missing OAuth parameters".to_string()));
        }

        let pending = self
            .pending
            .take(&params.state)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid OAuth state".to_string()))?;
        if pending.session_id != params.session_id {
            warn!(session_id = %params.session_id, "OAuth state presented by another session");
            return Err(AppError::Validation("Invalid OAuth state".to_string()));
        }

        let provider = self.engine.registry().create(pending.platform)?;
        let tokens = provider.exchange_code_for_tokens(&params.code).await?;
        let account = provider
            .get_user_info(&tokens.access_token)
            .await?
            .with_tokens(&tokens, self.time_provider.now());

        let response = AuthCompleteResponse {
            role: pending.role,
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            platform: account.platform,
        };
        self.sessions
            .set_account(&params.session_id, pending.role, account)
            .await?;

        info!(
            session_id = %params.session_id,
            platform = %response.platform,
            role = %response.role,
            username = %response.username,
            "Account connected"
        );
        Ok(response)
    }

    /// subscriptions.list.v1
    pub async fn subscriptions(
        &self,
        params: SessionRequest,
    ) -> std::result::Result<Vec<Subscription>, ErrorObjectOwned> {
        self.list_subscriptions(&params.session_id)
            .await
            .map_err(to_rpc_error)
    }

    async fn list_subscriptions(&self, session_id: &str) -> Result<Vec<Subscription>> {
        let source = self.account(session_id, AccountRole::Source).await?;
        let provider = self.engine.registry().create(source.platform)?;
        Ok(provider.get_subscriptions(&source.access_token).await?)
    }

    /// content.export.v1
    pub async fn export_content(
        &self,
        params: SessionRequest,
    ) -> std::result::Result<ContentSnapshot, ErrorObjectOwned> {
        self.snapshot(&params.session_id).await.map_err(to_rpc_error)
    }

    async fn snapshot(&self, session_id: &str) -> Result<ContentSnapshot> {
        let source = self.account(session_id, AccountRole::Source).await?;
        let provider = self.engine.registry().create(source.platform)?;
        let content = provider
            .get_content(&source.access_token, Some(&source.username))
            .await?;

        info!(
            platform = %source.platform,
            count = content.len(),
            "Content exported"
        );
        Ok(ContentSnapshot::new(
            source.platform,
            source.username,
            self.time_provider.now(),
            content,
        ))
    }

    /// transfer.start.v1
    pub async fn start_transfer(
        &self,
        params: TransferStartRequest,
    ) -> std::result::Result<TransferStartedResponse, ErrorObjectOwned> {
        self.start(params).await.map(started).map_err(to_rpc_error)
    }

    async fn start(&self, params: TransferStartRequest) -> Result<String> {
        let source = self.account(&params.session_id, AccountRole::Source).await?;
        let target = self.account(&params.session_id, AccountRole::Target).await?;
        let options = TransferOptions {
            transfer_content: params.transfer_saved_posts,
            content_data: params.saved_posts_data,
        };
        self.engine
            .start_transfer(&source, &target, params.subscriptions, options)
            .await
    }

    /// transfer.clear_all.v1
    pub async fn clear_all(
        &self,
        params: SessionRequest,
    ) -> std::result::Result<TransferStartedResponse, ErrorObjectOwned> {
        self.clear(&params.session_id)
            .await
            .map(started)
            .map_err(to_rpc_error)
    }

    async fn clear(&self, session_id: &str) -> Result<String> {
        let target = self.account(session_id, AccountRole::Target).await?;
        self.engine.clear_all_subscriptions(&target).await
    }

    /// transfer.status.v1
    pub async fn transfer_status(
        &self,
        params: TransferStatusRequest,
    ) -> std::result::Result<TransferJob, ErrorObjectOwned> {
        self.engine
            .get_status(&params.transfer_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Transfer {} not found",
                    params.transfer_id
                )))
            })
    }

    async fn session(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .get_session(&session_id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
    }

    /// Connected account for `role`, refreshed first when its token expired
    async fn account(&self, session_id: &str, role: AccountRole) -> Result<Account> {
        let session = self.session(session_id).await?;
        let account = session.account(role).cloned().ok_or_else(|| {
            AppError::Unauthenticated(format!("{} account not authenticated", role))
        })?;

        let now = self.time_provider.now();
        if !account.is_expired(now) {
            return Ok(account);
        }
        if account.refresh_token.is_empty() {
            return Err(AppError::Unauthenticated(format!(
                "{} account token expired, please reconnect",
                role
            )));
        }

        let provider = self.engine.registry().create(account.platform)?;
        let tokens = provider.refresh_access_token(&account.refresh_token).await?;
        let refreshed = account.with_tokens(&tokens, now);
        self.sessions
            .set_account(&session.id, role, refreshed.clone())
            .await?;

        info!(session_id = %session.id, role = %role, "Access token refreshed");
        Ok(refreshed)
    }
}

fn started(transfer_id: String) -> TransferStartedResponse {
    TransferStartedResponse {
        transfer_id,
        status: "started".to_string(),
    }
}
