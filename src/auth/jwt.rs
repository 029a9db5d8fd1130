use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

/// What a signed token authorises its bearer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenAction {
    Confirm,
    Reset,
    ChangeEmail,
    Auth,
}

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    expiry: Duration,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let expiry = Duration::try_seconds(config.token_expiry_seconds)
            .filter(|expiry| *expiry > Duration::zero())
            .with_context(|| {
                format!(
                    "TOKEN_EXPIRY_SECONDS out of range: {}",
                    config.token_expiry_seconds
                )
            })?;
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret_key.as_bytes()),
            issuer: config.token_issuer.clone(),
            audience: config.token_audience.clone(),
            expiry,
        })
    }

    pub fn generate_token(
        &self,
        user_id: Uuid,
        action: TokenAction,
        new_email: Option<&str>,
        expires_in: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(expires_in)
            .ok_or_else(|| anyhow!("token expiry overflows: {expires_in}"))?;
        let claims = ActionClaims {
            sub: user_id,
            action,
            new_email: new_email.map(str::to_owned),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn generate_confirmation_token(&self, user_id: Uuid) -> Result<String> {
        self.generate_token(user_id, TokenAction::Confirm, None, self.expiry)
    }

    pub fn generate_reset_token(&self, user_id: Uuid) -> Result<String> {
        self.generate_token(user_id, TokenAction::Reset, None, self.expiry)
    }

    pub fn generate_email_change_token(&self, user_id: Uuid, new_email: &str) -> Result<String> {
        self.generate_token(
            user_id,
            TokenAction::ChangeEmail,
            Some(new_email),
            self.expiry,
        )
    }

    pub fn generate_auth_token(&self, user_id: Uuid, expires_in: Duration) -> Result<String> {
        self.generate_token(user_id, TokenAction::Auth, None, expires_in)
    }

    /// Decodes and checks a token for `action`. Bad signatures, expiry,
    /// malformed input and action mismatches all yield `None`.
    pub fn verify_token(&self, token: &str, action: TokenAction) -> Option<ActionClaims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);

        let claims = match decode::<ActionClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(err) => {
                tracing::debug!(component = "tokens", error = %err, "token rejected");
                return None;
            }
        };

        (claims.action == action).then_some(claims)
    }

    /// Like [`JwtService::verify_token`], additionally requiring the token to
    /// have been issued to `user_id`.
    pub fn verify_token_for(
        &self,
        token: &str,
        action: TokenAction,
        user_id: Uuid,
    ) -> Option<ActionClaims> {
        self.verify_token(token, action)
            .filter(|claims| claims.sub == user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionClaims {
    pub sub: Uuid,
    pub action: TokenAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_email: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_base_url;

    fn config(secret: &str, expiry_seconds: i64) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/blog".to_string(),
            database_max_pool_size: 1,
            secret_key: secret.to_string(),
            token_issuer: "test-issuer".to_string(),
            token_audience: "test-audience".to_string(),
            token_expiry_seconds: expiry_seconds,
            admin_email: None,
            api_base_url: parse_base_url("http://localhost/api/v1/").expect("valid url"),
        }
    }

    fn service(secret: &str) -> JwtService {
        JwtService::from_config(&config(secret, 3600)).expect("jwt service")
    }

    #[test]
    fn out_of_range_expiry_is_a_config_error() {
        for seconds in [i64::MAX, i64::MIN, 0, -60] {
            assert!(JwtService::from_config(&config("s3cret", seconds)).is_err());
        }
    }

    #[test]
    fn overflowing_expiry_fails_to_issue() {
        let jwt = service("s3cret");
        let huge = Duration::try_seconds(i64::MAX / 2000).expect("representable duration");
        let result = jwt.generate_token(Uuid::new_v4(), TokenAction::Auth, None, huge);
        assert!(result.is_err());
    }

    #[test]
    fn confirmation_token_verifies_for_its_user() {
        let jwt = service("s3cret");
        let user = Uuid::new_v4();
        let token = jwt.generate_confirmation_token(user).expect("token");

        let claims = jwt
            .verify_token_for(&token, TokenAction::Confirm, user)
            .expect("valid token");
        assert_eq!(claims.sub, user);
        assert!(claims.new_email.is_none());
    }

    #[test]
    fn token_for_one_user_never_validates_for_another() {
        let jwt = service("s3cret");
        let token = jwt.generate_confirmation_token(Uuid::new_v4()).expect("token");
        assert!(jwt
            .verify_token_for(&token, TokenAction::Confirm, Uuid::new_v4())
            .is_none());
    }

    #[test]
    fn expired_token_is_rejected_even_for_the_right_user() {
        let jwt = service("s3cret");
        let user = Uuid::new_v4();
        let token = jwt
            .generate_token(user, TokenAction::Confirm, None, Duration::seconds(-5))
            .expect("token");
        assert!(jwt
            .verify_token_for(&token, TokenAction::Confirm, user)
            .is_none());
    }

    #[test]
    fn action_tags_are_not_interchangeable() {
        let jwt = service("s3cret");
        let user = Uuid::new_v4();
        let reset = jwt.generate_reset_token(user).expect("token");
        assert!(jwt.verify_token(&reset, TokenAction::Confirm).is_none());
        assert!(jwt.verify_token(&reset, TokenAction::Reset).is_some());
    }

    #[test]
    fn tampered_and_foreign_tokens_are_rejected() {
        let jwt = service("s3cret");
        let other = service("different");
        let user = Uuid::new_v4();
        let token = other.generate_confirmation_token(user).expect("token");
        assert!(jwt.verify_token(&token, TokenAction::Confirm).is_none());

        let mut tampered = jwt.generate_confirmation_token(user).expect("token");
        tampered.push('x');
        assert!(jwt.verify_token(&tampered, TokenAction::Confirm).is_none());
        assert!(jwt.verify_token("garbage", TokenAction::Confirm).is_none());
    }

    #[test]
    fn email_change_token_carries_new_address() {
        let jwt = service("s3cret");
        let user = Uuid::new_v4();
        let token = jwt
            .generate_email_change_token(user, "new@example.com")
            .expect("token");
        let claims = jwt
            .verify_token_for(&token, TokenAction::ChangeEmail, user)
            .expect("valid token");
        assert_eq!(claims.new_email.as_deref(), Some("new@example.com"));
    }
}
