//! JWT authentication and role-based access control.
//!
//! Roles are a closed enum ([`Role`]); route groups are gated with
//! [`AuthRouterExt::with_role`] / [`AuthRouterExt::with_any_role`] and
//! fine-grained checks use the capability methods on `Role`.

pub mod password;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{user, user_allergen},
    errors::ServiceError,
    AppState,
};

pub use crate::entities::user::Role;

/// JWT claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// The authenticated caller, extracted from request extensions by handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<&Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("malformed subject".into()))?;
        Ok(AuthUser {
            id,
            username: claims.username.clone(),
            role: claims.role,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("account disabled")]
    AccountDisabled,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("weak password: {0}")]
    WeakPassword(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WeakPassword(msg) => ServiceError::ValidationError(msg),
            AuthError::Hash(msg) => ServiceError::InternalError(msg),
            other => ServiceError::AuthError(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    token_lifetime: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_lifetime_secs: i64) -> Self {
        Self {
            jwt_secret,
            token_lifetime: Duration::seconds(token_lifetime_secs),
        }
    }
}

/// Issues and validates access tokens; owns registration and login.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub balance: Decimal,
    pub bonus_points: i32,
    pub allergens: Vec<Uuid>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Registers a new account. Self-registration always produces a student;
    /// staff roles are granted later by an admin.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<user::Model, ServiceError> {
        request.validate()?;

        let existing = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(request.username.clone()))
                    .add(user::Column::Email.eq(request.email.clone())),
            )
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "username or email already taken".into(),
            ));
        }

        let password_hash = password::hash_password(&request.password)?;
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(request.username),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(Role::Student),
            phone: Set(request.phone),
            balance: Set(Decimal::ZERO),
            bonus_points: Set(0),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let created = model.insert(&*self.db).await?;
        info!(user_id = %created.id, "account registered");
        Ok(created)
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, ServiceError> {
        let account = user::Entity::find()
            .filter(user::Column::Username.eq(request.username.clone()))
            .one(&*self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)
            .map_err(ServiceError::from)?;

        if !account.is_active {
            return Err(AuthError::AccountDisabled.into());
        }
        if !password::verify_password(&request.password, &account.password_hash)
            .map_err(ServiceError::from)?
        {
            warn!(username = %request.username, "failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }

        self.generate_token(&account).map_err(ServiceError::from)
    }

    pub fn generate_token(&self, account: &user::Model) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.config.token_lifetime;
        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenPair {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_lifetime.num_seconds(),
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
    }
}

/// Extracts a bearer token (when present), validates it and stores the
/// caller in request extensions. Unauthenticated requests pass through; the
/// role guards reject them where authentication is required.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        match auth.validate_token(token) {
            Ok(claims) => match AuthUser::try_from(&claims) {
                Ok(auth_user) => {
                    request.extensions_mut().insert(auth_user);
                }
                Err(e) => warn!(error = %e, "token subject rejected"),
            },
            Err(e) => warn!(error = %e, "token rejected"),
        }
    }

    next.run(request).await
}

async fn require_roles(allowed: &[Role], request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if allowed.contains(&user.role) => next.run(request).await,
        Some(user) => {
            warn!(user_id = %user.id, role = %user.role, "role not permitted for route");
            ServiceError::Forbidden("insufficient role".into()).into_response()
        }
        None => ServiceError::Unauthorized("authentication required".into()).into_response(),
    }
}

/// Router extension for declarative role gating, applied per route group.
pub trait AuthRouterExt {
    fn with_role(self, role: Role) -> Self;
    fn with_any_role(self, roles: &'static [Role]) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_role(self, role: Role) -> Self {
        self.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| async move {
                require_roles(&[role], request, next).await
            },
        ))
    }

    fn with_any_role(self, roles: &'static [Role]) -> Self {
        self.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| async move {
                require_roles(roles, request, next).await
            },
        ))
    }
}

/// `/auth` routes: register, login and the caller's profile.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    let auth = state.services.auth.clone();
    let account = auth.register(request).await?;
    let tokens = auth.generate_token(&account).map_err(ServiceError::from)?;
    Ok(Json(tokens))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenPair),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    let tokens = state.services.auth.login(request).await?;
    Ok(Json(tokens))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
async fn me_handler(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
) -> Result<Json<ProfileResponse>, ServiceError> {
    let Extension(auth_user) =
        auth_user.ok_or_else(|| ServiceError::Unauthorized("authentication required".into()))?;

    let account = user::Entity::find_by_id(auth_user.id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;

    let allergens = user_allergen::Entity::find()
        .filter(user_allergen::Column::UserId.eq(auth_user.id))
        .all(&*state.db)
        .await?
        .into_iter()
        .map(|row| row.ingredient_id)
        .collect();

    Ok(Json(ProfileResponse {
        id: account.id,
        username: account.username,
        email: account.email,
        role: account.role,
        phone: account.phone,
        balance: account.balance,
        bonus_points: account.bonus_points,
        allergens,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let db = Arc::new(DatabaseConnection::Disconnected);
        AuthService::new(
            AuthConfig::new("unit-test-secret-key-0123456789abcdef".into(), 3600),
            db,
        )
    }

    fn account() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            username: "vasya".into(),
            email: "vasya@school.example".into(),
            password_hash: String::new(),
            role: Role::Student,
            phone: None,
            balance: Decimal::ZERO,
            bonus_points: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn issued_tokens_validate_and_carry_the_role() {
        let svc = service();
        let acct = account();
        let pair = svc.generate_token(&acct).unwrap();
        assert_eq!(pair.token_type, "Bearer");

        let claims = svc.validate_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, acct.id.to_string());
        assert_eq!(claims.role, Role::Student);

        let auth_user = AuthUser::try_from(&claims).unwrap();
        assert_eq!(auth_user.id, acct.id);
    }

    #[test]
    fn foreign_tokens_are_rejected() {
        let svc = service();
        let other = AuthService::new(
            AuthConfig::new("a-completely-different-secret-key!!".into(), 3600),
            Arc::new(DatabaseConnection::Disconnected),
        );
        let pair = other.generate_token(&account()).unwrap();
        assert!(svc.validate_token(&pair.access_token).is_err());
    }
}
