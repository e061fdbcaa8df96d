use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Validates the bearer token and attaches the resulting [`Session`] to the request.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?.to_string();

    let user = validate_token(&token, &config.jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(Session::new(user, token));

    Ok(next.run(request).await)
}

fn bearer_token<B>(request: &Request<B>) -> Result<&str, AppError> {
    let auth_value = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

pub fn extract_session<B>(request: &Request<B>) -> Result<Session, AppError> {
    request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Session not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Token abc")
            .body(())
            .unwrap();
        assert!(bearer_token(&request).is_err());

        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer abc")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&request).unwrap(), "abc");
    }

    #[test]
    fn missing_session_is_auth_error() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(extract_session(&request), Err(AppError::Auth(_))));
    }
}
