use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decode and validate an access token. Refresh tokens are not accepted on API calls.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("Access token required".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(token_type: TokenType, exp_offset: i64) -> String {
        let claims = Claims {
            user_id: 11,
            sub: "jane".into(),
            role: 3,
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
            jti: "test-jti".into(),
            token_type,
            employee_id: Some(1000),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap()
    }

    #[test]
    fn accepts_access_token() {
        let claims = verify_token(&token(TokenType::Access, 600), "secret").unwrap();
        assert_eq!(claims.employee_id, Some(1000));
    }

    #[test]
    fn rejects_refresh_token() {
        assert!(verify_token(&token(TokenType::Refresh, 600), "secret").is_err());
    }

    #[test]
    fn rejects_expired_or_foreign_tokens() {
        assert!(verify_token(&token(TokenType::Access, -3600), "secret").is_err());
        assert!(verify_token(&token(TokenType::Access, 600), "other").is_err());
    }
}
