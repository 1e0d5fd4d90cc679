use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::models::auth::UserRole;

/// Sesión del usuario que opera el cliente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>, role: UserRole, ttl: Duration) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            role,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Contexto de sesión compartido por el cliente y los flujos.
///
/// `init` al hacer login, `teardown` al hacer logout. El cliente también
/// llama a `teardown` cuando el backend responde 401.
#[derive(Debug, Default)]
pub struct SessionContext {
    session: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn init(&self, session: Session) {
        info!("🔐 Sesión iniciada para {} ({})", session.username, session.role.as_str());
        *self.session.write().await = Some(session);
    }

    pub async fn teardown(&self) {
        if let Some(session) = self.session.write().await.take() {
            info!("👋 Sesión cerrada para {}", session.username);
        }
    }

    /// Sesión vigente; una sesión caducada no cuenta
    pub async fn current(&self) -> Option<Session> {
        self.session
            .read()
            .await
            .as_ref()
            .filter(|s| !s.is_expired(Utc::now()))
            .cloned()
    }
}
