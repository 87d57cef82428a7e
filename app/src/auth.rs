// orderflow_server/src/auth.rs
//
// Bearer-token verification. Tokens are issued elsewhere; this side only decodes
// and checks them against JWT_SECRET.

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[serde(other)]
  User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub user_id: Uuid,
  pub email: String,
  pub username: String,
  pub role: Role,
  pub iat: i64,
  pub exp: i64,
}

impl Claims {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// Whether these claims may act on resources owned by `user_id`.
  pub fn can_access_user(&self, user_id: Uuid) -> bool {
    self.is_admin() || self.user_id == user_id
  }
}

pub fn decode_token(secret: &[u8], token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
  let mut validation = Validation::default();
  validation.validate_exp = true;
  let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
  Ok(token_data.claims)
}

/// Signs `claims` with HS256. Used by tooling and tests.
pub fn encode_token(secret: &[u8], claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
  encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
}

fn claims_from_request(req: &HttpRequest) -> Result<Claims, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Config("Application state is not registered".to_string()))?;

  let raw = req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| AppError::Auth("Authorization header is missing.".to_string()))?;
  let token = raw
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Auth("Authorization header must be a Bearer token.".to_string()))?;

  decode_token(state.config.jwt_secret.as_bytes(), token).map_err(|e| {
    warn!(error = %e, "Rejected bearer token.");
    AppError::Auth("Invalid or expired token.".to_string())
  })
}

/// Any caller holding a valid token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(claims_from_request(req).map(AuthenticatedUser))
  }
}

/// A caller whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = claims_from_request(req).and_then(|claims| {
      if claims.is_admin() {
        Ok(AdminUser(claims))
      } else {
        warn!(user_id = %claims.user_id, "Non-admin caller on admin route.");
        Err(AppError::Forbidden("Admin access required".to_string()))
      }
    });
    ready(result)
  }
}
