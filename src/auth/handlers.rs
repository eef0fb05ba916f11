use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_cookies::Cookies;
use tracing::instrument;

use crate::{
    auth::{
        cookie,
        dto::{AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest},
        extractors::AuthUser,
        repo_types::User,
        services,
    },
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn start_session(state: &AppState, cookies: &Cookies, user: &User) -> AppResult<()> {
    let token = state.keys.issue(user.id, &user.username)?;
    cookie::store(
        cookies,
        token,
        state.config.secure_cookies(),
        state.keys.ttl(),
    );
    Ok(())
}

#[instrument(skip(state, cookies, payload))]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    services::validate_registration(&mut payload)?;
    let user = services::register_user(&state.db, payload).await?;
    start_session(&state, &cookies, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, cookies, payload))]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(mut payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    services::validate_login(&mut payload)?;
    let user = services::authenticate(&state.db, payload).await?;
    start_session(&state, &cookies, &user)?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        user: user.into(),
    }))
}

#[instrument(skip(cookies))]
pub async fn logout(cookies: Cookies) -> Json<MessageResponse> {
    cookie::clear(&cookies);
    Json(MessageResponse {
        message: "Logged out",
    })
}

/// Session check. Unauthenticated callers get `401 {"user": null}`.
#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Result<Json<MeResponse>, (StatusCode, Json<MeResponse>)> {
    let unauthenticated = || (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None }));

    let Some(auth) = auth else {
        return Err(unauthenticated());
    };

    match User::find_by_id(&state.db, auth.id).await {
        Ok(Some(user)) => Ok(Json(MeResponse {
            user: Some(user.into()),
        })),
        Ok(None) => {
            tracing::warn!(user_id = %auth.id, "session for deleted user");
            Err(unauthenticated())
        }
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!(error = %err, user_id = %auth.id, "session lookup failed");
            Err((err.status(), Json(MeResponse { user: None })))
        }
    }
}
