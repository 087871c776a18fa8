// Shared authentication session.
// The current user and tokens live in one place; readers subscribe to changes instead of
// polling storage.

use crate::api::{ApiError, TravelApi};
use crate::catalog::User;
use crate::forms::{check_fields, validate_email, ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use validator::Validate;

// Access tokens expire after 30 minutes; refresh a little before that
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(29 * 60);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Result<Self, ValidationError> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::Blank("password"));
        }
        Ok(Self {
            email,
            password: password.to_string(),
        })
    }
}

const REGISTRATION_FIELDS: [(&str, &str); 3] = [
    ("username", "username"),
    ("email", "email"),
    ("password", "password"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let trimmed = Registration {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        };
        check_fields(&trimmed, &REGISTRATION_FIELDS, &trimmed.email)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpVerification {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

/// Snapshot of the session as seen by subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.access_token.is_some()
    }
}

/// Cloneable handle to the shared session. Every clone sees the same state.
#[derive(Debug, Clone)]
pub struct AuthSession {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    pub fn new() -> Self {
        Self::restore(SessionState::default())
    }

    // Resume from previously persisted state
    pub fn restore(state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.borrow().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn sign_in(&self, response: LoginResponse) {
        info!(user_id = response.user.id, "session started");
        self.state.send_replace(SessionState {
            user: Some(response.user),
            access_token: Some(response.access),
            refresh_token: Some(response.refresh),
        });
    }

    pub fn sign_out(&self) {
        info!("session cleared");
        self.state.send_replace(SessionState::default());
    }

    pub fn set_access_token(&self, token: String) {
        self.state.send_modify(|state| state.access_token = Some(token));
    }

    // Drops only the access token; the user and refresh token stay for a later refresh
    pub fn clear_access_token(&self) {
        let cleared = self.state.send_if_modified(|state| state.access_token.take().is_some());
        if cleared {
            warn!("access token rejected by server, cleared");
        }
    }
}

// Validates credentials, logs in and starts the session
pub async fn login<A: TravelApi + ?Sized>(
    api: &A,
    session: &AuthSession,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let credentials = Credentials::new(email, password)?;
    let response = api.login(&credentials).await?;
    let user = response.user.clone();
    session.sign_in(response);
    Ok(user)
}

// Exchanges the refresh token for a new access token. A rejected refresh ends the session.
pub async fn refresh_access_token<A: TravelApi + ?Sized>(
    api: &A,
    session: &AuthSession,
) -> Result<(), ApiError> {
    let refresh = match session.refresh_token() {
        Some(token) => token,
        None => return Err(ApiError::Unauthorized("No refresh token".to_string())),
    };

    match api.refresh_token(&refresh).await {
        Ok(access) => {
            session.set_access_token(access);
            Ok(())
        }
        Err(ApiError::Unauthorized(message)) => {
            session.sign_out();
            Err(ApiError::Unauthorized(message))
        }
        Err(e) => Err(e),
    }
}

// Periodically refreshes the access token while a refresh token is present
pub fn spawn_token_refresher(
    api: Arc<dyn TravelApi>,
    session: AuthSession,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if session.refresh_token().is_none() {
                continue;
            }
            if let Err(e) = refresh_access_token(api.as_ref(), &session).await {
                warn!(error = %e, "token refresh failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_server::MockTravelApi;

    fn user() -> User {
        User {
            id: 1,
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            phone: None,
        }
    }

    fn signed_in() -> AuthSession {
        let session = AuthSession::new();
        session.sign_in(LoginResponse {
            user: user(),
            access: "access-0".to_string(),
            refresh: "refresh-0".to_string(),
        });
        session
    }

    #[test]
    fn test_sign_in_and_out() {
        let session = signed_in();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("access-0"));

        session.sign_out();
        assert!(!session.is_authenticated());
        assert_eq!(session.snapshot(), SessionState::default());
    }

    #[test]
    fn test_clones_share_state() {
        let session = AuthSession::new();
        let other = session.clone();
        session.set_access_token("abc".to_string());
        assert_eq!(other.access_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_clear_access_token_keeps_user() {
        let session = signed_in();
        session.clear_access_token();

        let state = session.snapshot();
        assert_eq!(state.access_token, None);
        assert_eq!(state.refresh_token.as_deref(), Some("refresh-0"));
        assert!(state.user.is_some());
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let session = AuthSession::new();
        let mut rx = session.subscribe();

        session.sign_in(LoginResponse {
            user: user(),
            access: "a".to_string(),
            refresh: "r".to_string(),
        });
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        // Clearing an already empty token does not notify
        session.sign_out();
        rx.changed().await.unwrap();
        rx.borrow_and_update();
        session.clear_access_token();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_login_flow() {
        let api = MockTravelApi::new();
        let session = AuthSession::new();

        let user = login(&api, &session, "asha@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(user.display_name(), "Asha Rao");
        assert_eq!(session.refresh_token().as_deref(), Some("refresh-1"));

        let bad = login(&api, &session, "not-an-email", "secret").await;
        assert!(matches!(bad, Err(ApiError::Validation(_))));
        // Rejected before any request
        assert_eq!(api.requests(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_session_empty() {
        let api = MockTravelApi::new();
        let session = AuthSession::new();
        let result = login(&api, &session, "asha@example.com", "wrong").await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_replaces_access_token() {
        let api = MockTravelApi::new();
        let session = signed_in();

        refresh_access_token(&api, &session).await.unwrap();
        let token = session.access_token().unwrap();
        assert_ne!(token, "access-0");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_signs_out() {
        let api = MockTravelApi::new();
        let session = AuthSession::restore(SessionState {
            user: Some(user()),
            access_token: Some("stale".to_string()),
            refresh_token: Some("revoked".to_string()),
        });

        let result = refresh_access_token(&api, &session).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert_eq!(session.snapshot(), SessionState::default());
    }

    #[test]
    fn test_registration_validation() {
        let mut registration = Registration {
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
            first_name: "Asha".to_string(),
            last_name: String::new(),
        };
        assert!(registration.validate().is_ok());

        registration.password = "abc".to_string();
        assert_eq!(
            registration.validate(),
            Err(ValidationError::TooShort {
                field: "password",
                min: 6
            })
        );

        registration.username = "   ".to_string();
        registration.email = "not-an-email".to_string();
        assert_eq!(
            registration.validate(),
            Err(ValidationError::Blank("username"))
        );

        registration.username = "asha".to_string();
        assert_eq!(
            registration.validate(),
            Err(ValidationError::InvalidEmail("not-an-email".to_string()))
        );
    }
}
