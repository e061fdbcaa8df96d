use tracing::{debug, info};

use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Explicit holder for the signed-in user. Created empty, filled by
/// [`SessionContext::login`] and cleared by [`SessionContext::logout`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    jwt_secret: String,
    current: Option<Session>,
}

impl SessionContext {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            current: None,
        }
    }

    pub fn login(&mut self, token: &str) -> Result<&Session, AppError> {
        let user = validate_token(token, &self.jwt_secret).map_err(AppError::Auth)?;
        info!("Session started for user {}", user.id);
        Ok(&*self.current.insert(Session::new(user, token)))
    }

    pub fn logout(&mut self) -> Option<Session> {
        let ended = self.current.take();
        if let Some(session) = &ended {
            info!("Session ended for user {}", session.user.id);
        } else {
            debug!("Logout requested without an active session");
        }
        ended
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn require(&self) -> Result<&Session, AppError> {
        self.current
            .as_ref()
            .ok_or_else(|| AppError::Auth("No active session".to_string()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared_models::auth::User;

    use crate::jwt::sign_token;

    #[test]
    fn login_then_logout() {
        let user = User {
            id: "user-42".to_string(),
            email: None,
            role: Some("patient".to_string()),
            name: None,
            created_at: None,
        };
        let token = sign_token(&user, "secret", Duration::minutes(5)).unwrap();

        let mut context = SessionContext::new("secret");
        assert!(context.require().is_err());

        let session = context.login(&token).unwrap();
        assert_eq!(session.user_id(), "user-42");
        assert!(context.is_authenticated());

        let ended = context.logout().unwrap();
        assert_eq!(ended.token, token);
        assert!(context.current().is_none());
        assert!(context.logout().is_none());
    }

    #[test]
    fn bad_token_leaves_context_empty() {
        let mut context = SessionContext::new("secret");
        assert!(matches!(context.login("nope"), Err(AppError::Auth(_))));
        assert!(!context.is_authenticated());
    }
}
