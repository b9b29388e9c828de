// Session manager
// Mirrors the auth service's session per request and fans out auth events

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{
    AuthError, AuthEvent, AuthEventKind, AuthService, Credentials, Session, SessionContext,
    SignUpOutcome,
};

const EVENT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    events: broadcast::Sender<AuthEvent>,
}

/// Receives auth events until dropped
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Next event, or `None` once the manager is gone
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth subscriber lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { auth, events }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.events.subscribe(),
        }
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Session behind `access_token`. Any failure yields an anonymous context.
    pub async fn current(&self, access_token: Option<&str>) -> SessionContext {
        let token = match access_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return SessionContext::anonymous(),
        };

        match self.auth.get_user(token).await {
            Ok(Some(user)) => SessionContext::authenticated(user, token.to_string()),
            Ok(None) => SessionContext::anonymous(),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating caller as anonymous");
                SessionContext::anonymous()
            }
        }
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let session = self
            .auth
            .sign_in(&credentials.email, &credentials.password)
            .await?;
        tracing::info!(user_id = %session.user.id, "User signed in");
        self.publish(AuthEvent::new(AuthEventKind::SignedIn, Some(&session.user)));
        Ok(session)
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let outcome = self
            .auth
            .sign_up(&credentials.email, &credentials.password)
            .await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.publish(AuthEvent::new(AuthEventKind::SignedIn, Some(&session.user)));
        }
        Ok(outcome)
    }

    pub async fn sign_out(&self, session: &SessionContext) -> Result<(), AuthError> {
        if let Some(token) = &session.access_token {
            self.auth.sign_out(token).await?;
        }
        self.publish(AuthEvent::new(AuthEventKind::SignedOut, session.user.as_ref()));
        Ok(())
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let session = self.auth.refresh(refresh_token).await?;
        self.publish(AuthEvent::new(
            AuthEventKind::TokenRefreshed,
            Some(&session.user),
        ));
        Ok(session)
    }

    pub async fn verify_email(&self, email: &str, token: &str) -> Result<Session, AuthError> {
        let session = self.auth.verify_email(email, token).await?;
        self.publish(AuthEvent::new(AuthEventKind::SignedIn, Some(&session.user)));
        Ok(session)
    }
}

/// Logs every auth event until the manager shuts down or the task is aborted
pub fn spawn_session_audit(manager: &SessionManager) -> JoinHandle<()> {
    let mut subscription = manager.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            tracing::info!(
                kind = ?event.kind,
                user_id = ?event.user_id,
                email = event.email.as_deref().unwrap_or("-"),
                at = %event.at,
                "Auth state changed"
            );
        }
    })
}
