//! HTTP Handlers

use axum::Extension;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::{AccessClaims, AuthConfig, AuthService, CreateUserInput, RegisterAdminInput};
use crate::domain::entity::user::PublicUser;
use crate::domain::repository::UserStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AccessTokenResponse, ChangePasswordRequest, CreateUserRequest, CreateUserResponse,
    ForgotPasswordRequest, ForgotPasswordResponse, LinkResponse, LoginRequest, LoginResponse,
    MessageResponse, RegisterAdminRequest, ResetPasswordRequest, SessionListResponse,
    SetPasswordRequest,
};

pub const BOOTSTRAP_SECRET_HEADER: &str = "x-bootstrap-secret";

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been generated";

/// Shared state for auth handlers
pub struct AuthAppState<S> {
    pub service: AuthService<S>,
}

impl<S> Clone for AuthAppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

// ============================================================================
// Cookie helpers
// ============================================================================

fn refresh_cookie(config: &AuthConfig, token: &str) -> AuthResult<HeaderValue> {
    config
        .refresh_cookie()
        .set_cookie_header(token)
        .ok_or_else(|| AuthError::Internal("Refresh token is not a valid header value".to_string()))
}

fn clear_refresh_cookie(config: &AuthConfig) -> AuthResult<HeaderValue> {
    config
        .refresh_cookie()
        .delete_cookie_header()
        .ok_or_else(|| AuthError::Internal("Cookie name is not a valid header value".to_string()))
}

fn presented_refresh(config: &AuthConfig, headers: &HeaderMap) -> Option<String> {
    platform::cookie::extract_cookie(headers, &config.refresh_cookie_name)
}

// ============================================================================
// Bootstrap
// ============================================================================

/// POST /api/auth/register-admin
pub async fn register_admin<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
    Json(req): Json<RegisterAdminRequest>,
) -> AuthResult<(StatusCode, Json<PublicUser>)>
where
    S: UserStore + Sync + 'static,
{
    // Header wins over the body so the secret can stay out of request logs
    let secret = headers
        .get(BOOTSTRAP_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(req.secret)
        .unwrap_or_default();

    let admin = state
        .service
        .register_admin(RegisterAdminInput {
            secret,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(admin)))
}

// ============================================================================
// Sign In / Refresh / Sign Out
// ============================================================================

/// POST /api/auth/login
pub async fn login<S>(
    State(state): State<AuthAppState<S>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: UserStore + Sync + 'static,
{
    let output = state.service.login(&req.email, req.password).await?;
    let cookie = refresh_cookie(state.service.config(), &output.tokens.refresh_token)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            access_token: output.tokens.access_token,
            expires_in: output.tokens.expires_in,
            user: output.user,
        }),
    ))
}

/// POST /api/auth/refresh
///
/// Any failure also clears the cookie: a rejected refresh token is never
/// worth presenting again.
pub async fn refresh<S>(State(state): State<AuthAppState<S>>, headers: HeaderMap) -> Response
where
    S: UserStore + Sync + 'static,
{
    let config = state.service.config();
    let presented = presented_refresh(config, &headers);

    let result = async {
        let pair = state
            .service
            .refresh_access_token(presented.as_deref())
            .await?;
        let cookie = refresh_cookie(config, &pair.refresh_token)?;
        Ok::<_, AuthError>((
            [(header::SET_COOKIE, cookie)],
            Json(AccessTokenResponse {
                access_token: pair.access_token,
                expires_in: pair.expires_in,
            }),
        ))
    }
    .await;

    match (result, clear_refresh_cookie(config)) {
        (Ok(ok), _) => ok.into_response(),
        (Err(e), Ok(clear)) => ([(header::SET_COOKIE, clear)], e).into_response(),
        (Err(e), Err(_)) => e.into_response(),
    }
}

/// POST /api/auth/logout
pub async fn logout<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    S: UserStore + Sync + 'static,
{
    let config = state.service.config();
    let presented = presented_refresh(config, &headers);

    state
        .service
        .logout(&claims.sub, presented.as_deref())
        .await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_refresh_cookie(config)?)],
    ))
}

// ============================================================================
// Onboarding / Passwords
// ============================================================================

/// POST /api/auth/set-password
pub async fn set_password<S>(
    State(state): State<AuthAppState<S>>,
    Json(req): Json<SetPasswordRequest>,
) -> AuthResult<Json<PublicUser>>
where
    S: UserStore + Sync + 'static,
{
    let user = state.service.set_password(&req.token, req.password).await?;
    Ok(Json(user))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password<S>(
    State(state): State<AuthAppState<S>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<Json<ForgotPasswordResponse>>
where
    S: UserStore + Sync + 'static,
{
    let issued = state.service.request_password_reset(&req.email).await?;

    let reset_link = issued
        .filter(|_| state.service.config().deliver_reset_links_in_response)
        .map(LinkResponse::from);

    Ok(Json(ForgotPasswordResponse {
        message: FORGOT_PASSWORD_MESSAGE,
        reset_link,
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password<S>(
    State(state): State<AuthAppState<S>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    S: UserStore + Sync + 'static,
{
    state
        .service
        .reset_password(&req.token, req.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset. Please log in with your new password",
    }))
}

/// PUT /api/auth/change-password
pub async fn change_password<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: UserStore + Sync + 'static,
{
    state
        .service
        .change_password(&claims.sub, req.current_password, req.new_password)
        .await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_refresh_cookie(state.service.config())?)],
        Json(MessageResponse {
            message: "Password changed. Please log in again",
        }),
    ))
}

// ============================================================================
// Current user
// ============================================================================

/// GET /api/auth/me
pub async fn me<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
) -> AuthResult<Json<PublicUser>>
where
    S: UserStore + Sync + 'static,
{
    let user = state.service.current_user(&claims.sub).await?;
    Ok(Json(user))
}

/// GET /api/auth/sessions
pub async fn sessions<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    headers: HeaderMap,
) -> AuthResult<Json<SessionListResponse>>
where
    S: UserStore + Sync + 'static,
{
    let presented = presented_refresh(state.service.config(), &headers);
    let sessions = state
        .service
        .list_sessions(&claims.sub, presented.as_deref())
        .await?;

    Ok(Json(SessionListResponse { sessions }))
}

// ============================================================================
// Administration
// ============================================================================

/// POST /api/auth/users
pub async fn create_user<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<CreateUserRequest>,
) -> AuthResult<(StatusCode, Json<CreateUserResponse>)>
where
    S: UserStore + Sync + 'static,
{
    let output = state
        .service
        .create_user(
            &claims.sub,
            CreateUserInput {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                role: req.role,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user: output.user,
            invite: output.invite.into(),
        }),
    ))
}

/// POST /api/auth/users/{id}/deactivate
pub async fn deactivate_user<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<PublicUser>>
where
    S: UserStore + Sync + 'static,
{
    let user = state.service.deactivate_user(&claims.sub, &user_id).await?;
    Ok(Json(user))
}

/// POST /api/auth/users/{id}/invite
pub async fn reissue_invite<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<LinkResponse>>
where
    S: UserStore + Sync + 'static,
{
    let link = state.service.reissue_invite(&claims.sub, &user_id).await?;
    Ok(Json(link.into()))
}
