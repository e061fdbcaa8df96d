use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

fn mac_for(jwt_secret: &str) -> Result<HmacSha256, String> {
    HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())
}

/// Verifies an HS256 token and returns the user it was issued for.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) => (h, c, s),
        _ => return Err("Invalid token format".to_string()),
    };

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        "Invalid signature encoding".to_string()
    })?;

    let mut mac = mac_for(jwt_secret)?;
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
    mac.verify_slice(&signature).map_err(|_| {
        debug!("Token signature verification failed");
        "Invalid token signature".to_string()
    })?;

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| "Invalid claims encoding".to_string())?;

    let claims: JwtClaims = serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        name: claims.name,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

/// Issues an HS256 token for `user`, valid for `ttl`.
pub fn sign_token(user: &User, jwt_secret: &str, ttl: Duration) -> Result<String, String> {
    let now = Utc::now();
    let exp = now + ttl;

    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let claims = json!({
        "sub": user.id,
        "email": user.email,
        "role": user.role,
        "name": user.name,
        "iat": now.timestamp().max(0),
        "exp": exp.timestamp().max(0),
    });

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
    );

    let mut mac = mac_for(jwt_secret)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> User {
        User {
            id: "user-001".to_string(),
            email: Some("patient@jendo.test".to_string()),
            role: Some("patient".to_string()),
            name: Some("Test Patient".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn signed_token_round_trips_claims() {
        let token = sign_token(&patient(), "secret", Duration::hours(1)).unwrap();
        let user = validate_token(&token, "secret").unwrap();

        assert_eq!(user.id, "user-001");
        assert_eq!(user.role.as_deref(), Some("patient"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_token(&patient(), "secret", Duration::hours(1)).unwrap();
        assert_eq!(validate_token(&token, "other").unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign_token(&patient(), "secret", Duration::hours(-2)).unwrap();
        assert_eq!(validate_token(&token, "secret").unwrap_err(), "Token expired");
    }

    #[test]
    fn rejects_malformed_token() {
        assert_eq!(validate_token("a.b", "secret").unwrap_err(), "Invalid token format");
        assert_eq!(validate_token("a.b.c.d", "secret").unwrap_err(), "Invalid token format");
        assert_eq!(validate_token("a.b.c", "").unwrap_err(), "JWT secret is not set");
    }
}
