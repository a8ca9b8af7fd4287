//! JWT 身份解析
//!
//! 凭证存储和登录流程在上游身份提供方；这里只解码它签发的 token，
//! 还原出调用方的身份投影（id、角色、司机的车辆类别）。

use axum::http::HeaderMap;
use config::JwtConfig;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::{Identity, Role, UserId, VehicleClass};

use crate::error::ApiError;

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
    /// 司机必须携带车辆类别
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_class: Option<String>,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为身份签发 token（测试和上游签发方使用）
    pub fn generate_token(&self, identity: &Identity) -> Result<String, ApiError> {
        let exp = chrono::Utc::now() + chrono::Duration::hours(self.config.expiration_hours);
        let claims = Claims {
            user_id: identity.id().into(),
            role: identity.role(),
            vehicle_class: identity
                .vehicle_class()
                .map(|class| class.as_str().to_owned()),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| ApiError::unauthorized(format!("Token generation failed: {err}")))
    }

    /// 验证 token 并还原身份
    pub fn identity_from_token(&self, token: &str) -> Result<Identity, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|err| ApiError::unauthorized(format!("Invalid token: {err}")))?;

        let user_id = UserId::new(claims.user_id);
        match claims.role {
            Role::Rider => Ok(Identity::rider(user_id)),
            Role::Driver => {
                let raw = claims
                    .vehicle_class
                    .ok_or_else(|| ApiError::unauthorized("driver token without vehicle class"))?;
                let vehicle_class = VehicleClass::parse(raw)
                    .map_err(|err| ApiError::unauthorized(err.to_string()))?;
                Ok(Identity::driver(user_id, vehicle_class))
            }
        }
    }

    /// 从 headers 中提取和验证 token
    pub fn identity_from_headers(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let auth_header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

        self.identity_from_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
        })
    }

    #[test]
    fn driver_identity_round_trips() {
        let service = service();
        let identity = Identity::driver(
            UserId::new(Uuid::new_v4()),
            VehicleClass::parse("sedan").unwrap(),
        );

        let token = service.generate_token(&identity).unwrap();
        let decoded = service.identity_from_token(&token).unwrap();
        assert_eq!(decoded, identity);
    }

    #[test]
    fn rider_identity_round_trips() {
        let service = service();
        let identity = Identity::rider(UserId::new(Uuid::new_v4()));

        let token = service.generate_token(&identity).unwrap();
        assert_eq!(service.identity_from_token(&token).unwrap(), identity);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(service().identity_from_token("not-a-jwt").is_err());
    }
}
