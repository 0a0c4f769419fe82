//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::application::AuthService;
use crate::domain::repository::UserStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_access_token;

/// Create the Auth router for any store implementation.
///
/// Meant to be nested under `/api/auth`, which is also the refresh
/// cookie's `Path`.
pub fn auth_router<S>(service: AuthService<S>) -> Router
where
    S: UserStore + Sync + 'static,
{
    let state = AuthAppState { service };

    let protected = Router::new()
        .route("/logout", post(handlers::logout::<S>))
        .route("/me", get(handlers::me::<S>))
        .route("/change-password", put(handlers::change_password::<S>))
        .route("/sessions", get(handlers::sessions::<S>))
        .route("/users", post(handlers::create_user::<S>))
        .route("/users/{id}/deactivate", post(handlers::deactivate_user::<S>))
        .route("/users/{id}/invite", post(handlers::reissue_invite::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token::<S>,
        ));

    Router::new()
        .route("/register-admin", post(handlers::register_admin::<S>))
        .route("/login", post(handlers::login::<S>))
        .route("/refresh", post(handlers::refresh::<S>))
        .route("/set-password", post(handlers::set_password::<S>))
        .route("/forgot-password", post(handlers::forgot_password::<S>))
        .route("/reset-password", post(handlers::reset_password::<S>))
        .merge(protected)
        .with_state(state)
}
