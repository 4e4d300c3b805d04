use crate::graph::GraphError;
use crate::models::AuthUser;
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Identity calls behind the session. `GraphClient` is the production
/// implementation.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn current_user(&self, access_token: &str) -> Result<AuthUser, GraphError>;
    async fn revoke_access(&self, access_token: &str) -> Result<(), GraphError>;
}

/// An authenticated session over the graph API. Initialization is one-shot:
/// the first `login` verifies the token remotely, concurrent callers await
/// that same in-flight verification, and later calls return the cached
/// identity.
pub struct Session<A> {
    api: A,
    access_token: String,
    auth: OnceCell<AuthUser>,
}

impl<A: UserApi> Session<A> {
    pub fn new(api: A, access_token: String) -> Self {
        Self {
            api,
            access_token,
            auth: OnceCell::new(),
        }
    }

    pub async fn login(&self) -> Result<&AuthUser, GraphError> {
        self.auth
            .get_or_try_init(|| async {
                let user = self.api.current_user(&self.access_token).await?;
                tracing::info!(user_id = %user.id, "graph session initialized");
                Ok(user)
            })
            .await
    }

    pub fn login_status(&self) -> bool {
        self.auth.initialized()
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        self.auth.get()
    }

    /// Revokes the session token remotely. The cached identity is left as
    /// is; a logged-out session is expected to be dropped.
    pub async fn logout(&self) -> Result<(), GraphError> {
        self.api.revoke_access(&self.access_token).await
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}
