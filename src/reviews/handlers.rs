use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{FilmReviews, FilmReviewsQuery, SubmitReviewRequest, SubmitReviewResponse},
    services,
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(submit_review))
        .route("/films/:tmdb_id/reviews", get(film_reviews))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id, username = %user.username))]
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SubmitReviewRequest>,
) -> AppResult<(StatusCode, Json<SubmitReviewResponse>)> {
    let review = services::validate_submission(payload)?;
    let review_id = services::submit_review(&state.db, user.id, &review).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitReviewResponse {
            success: true,
            review_id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn film_reviews(
    State(state): State<AppState>,
    AppPath(tmdb_id): AppPath<i64>,
    AppQuery(q): AppQuery<FilmReviewsQuery>,
) -> AppResult<Json<FilmReviews>> {
    if tmdb_id <= 0 {
        return Err(AppError::validation("tmdb_id", "Invalid film id"));
    }
    let reviews = services::get_reviews(&state.db, tmdb_id, q.media_type).await?;
    Ok(Json(reviews))
}
