use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use cupid_api::{ApiError, MessagesApi};
use cupid_session::SessionRepository;
use cupid_types::api::LoginRequest;
use cupid_types::models::User;

use crate::guard::DEFAULT_LOGIN_PATH;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Please enter a username and password")]
    MissingCredentials,

    /// Credentials were fine but the account is not an admin.
    #[error("Access denied: Admins only")]
    NotAdmin,

    #[error("{}", rejection_text(.0))]
    Rejected(Option<String>),

    #[error("Could not save session: {0}")]
    Storage(String),
}

fn rejection_text(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("Login failed")
}

impl From<ApiError> for LoginError {
    fn from(err: ApiError) -> Self {
        Self::Rejected(err.server_message().map(str::to_string))
    }
}

pub struct LoginController<A, R> {
    api: Arc<A>,
    session: Arc<R>,
    login_path: String,
}

impl<A: MessagesApi, R: SessionRepository> LoginController<A, R> {
    pub fn new(api: Arc<A>, session: Arc<R>) -> Self {
        Self {
            api,
            session,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Sign in. The session is only written for admins; anyone else leaves
    /// whatever was stored before untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, LoginError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await.map_err(|e| {
            warn!("Login failed for {}: {}", request.username, e);
            LoginError::from(e)
        })?;

        if !response.user.role.is_admin() {
            warn!(
                "Login by {} refused: role {} is not admin",
                response.user.username, response.user.role
            );
            return Err(LoginError::NotAdmin);
        }

        self.session
            .write(&response.token, &response.user)
            .map_err(|e| LoginError::Storage(format!("{:#}", e)))?;
        info!("Admin {} signed in", response.user.username);
        Ok(response.user)
    }

    /// Clear the session. Returns where to go next.
    pub fn logout(&self) -> anyhow::Result<&str> {
        self.session.clear()?;
        Ok(&self.login_path)
    }
}
