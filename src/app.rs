use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{auth, reviews, tmdb};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api",
              Router::new()
                  .merge(auth::router())
                  .merge(reviews::router())
                  .merge(tmdb::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn send(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = build_app(AppState::fake()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health() {
        let res = build_app(AppState::fake())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_validates_before_storage() {
        let (status, body) = send(post_json(
            "/api/auth/register",
            serde_json::json!({ "email": "not-an-email", "username": "alice", "password": "pw123" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "email");

        let (status, body) = send(post_json(
            "/api/auth/register",
            serde_json::json!({ "email": "alice@example.com", "username": "alice" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "password");
    }

    #[tokio::test]
    async fn me_without_session_is_null_user() {
        let (status, body) = send(Request::get("/api/auth/me").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "user": null }));
    }

    #[tokio::test]
    async fn review_requires_session() {
        let payload = serde_json::json!({ "tmdbId": 550, "title": "Fight Club", "rating": 4.5 });
        let (status, body) = send(post_json("/api/reviews", payload.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let mut req = post_json("/api/reviews", payload);
        req.headers_mut()
            .insert(header::COOKIE, "session=forged.token.value".parse().unwrap());
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn review_with_session_is_validated() {
        let state = AppState::fake();
        let token = state.keys.issue(Uuid::new_v4(), "alice").unwrap();
        let mut req = post_json(
            "/api/reviews",
            serde_json::json!({ "tmdbId": 550, "title": "Fight Club", "rating": 4.25 }),
        );
        req.headers_mut()
            .insert(header::COOKIE, format!("session={token}").parse().unwrap());

        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["field"], "rating");
    }

    #[tokio::test]
    async fn logout_expires_cookie() {
        let req = Request::post("/api/auth/logout")
            .header(header::COOKIE, "session=some.session.token")
            .body(Body::empty())
            .unwrap();
        let res = build_app(AppState::fake()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn search_empty_query_skips_upstream() {
        let (status, body) =
            send(Request::get("/api/search/movie?query=").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "results": [] }));
    }

    #[tokio::test]
    async fn search_passes_through_catalog() {
        let (status, body) =
            send(Request::get("/api/search/multi?query=thrones").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["media_type"], "tv");
        assert_eq!(body["results"][0]["title"], "thrones series");
    }

    #[tokio::test]
    async fn upstream_failure_is_generic() {
        let (status, body) =
            send(Request::get("/api/search/movie?query=fail").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to fetch catalog data");
    }

    #[tokio::test]
    async fn film_reviews_rejects_bad_id() {
        let (status, _) =
            send(Request::get("/api/films/0/reviews").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(Request::get("/api/films/abc/reviews").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "path");
    }

    #[tokio::test]
    async fn body_without_content_type_is_validation_error() {
        let req = Request::post("/api/auth/register")
            .body(Body::from(r#"{"email":"alice@example.com"}"#))
            .unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "body");
        assert_eq!(body["error"], "Expected a JSON request body");
    }

    #[tokio::test]
    async fn mistyped_body_hides_deserializer_detail() {
        let state = AppState::fake();
        let token = state.keys.issue(Uuid::new_v4(), "alice").unwrap();
        let mut req = post_json(
            "/api/reviews",
            serde_json::json!({ "tmdbId": "550", "title": "Fight Club", "rating": 4.5 }),
        );
        req.headers_mut()
            .insert(header::COOKIE, format!("session={token}").parse().unwrap());

        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["field"], "body");
        assert!(!body["error"].as_str().unwrap().contains("invalid type"));

        let (status, body) = send(post_json("/api/auth/login", serde_json::json!("{"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "body");
    }

    #[tokio::test]
    async fn bad_query_is_validation_error() {
        let (status, body) =
            send(Request::get("/api/films/popular?page=abc").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "query");
    }

    mod db {
        use super::*;
        use axum::response::Response;
        use sqlx::PgPool;

        struct Reply {
            status: StatusCode,
            session: Option<String>,
            body: serde_json::Value,
        }

        /// `session=<token>` pair from the response, if one was set.
        fn session_pair(res: &Response) -> Option<String> {
            res.headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find(|v| v.starts_with("session="))
                .and_then(|v| v.split(';').next())
                .map(str::to_owned)
        }

        async fn call(state: &AppState, req: Request<Body>) -> Reply {
            let res = build_app(state.clone()).oneshot(req).await.unwrap();
            let status = res.status();
            let session = session_pair(&res);
            let bytes = res.into_body().collect().await.unwrap().to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            Reply { status, session, body }
        }

        fn with_session(mut req: Request<Body>, session: &str) -> Request<Body> {
            req.headers_mut()
                .insert(header::COOKIE, session.parse().unwrap());
            req
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "needs DATABASE_URL"]
        async fn register_review_and_read_back(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let alice = serde_json::json!({
                "email": "alice@example.com",
                "username": "alice",
                "password": "pw123",
            });

            let reply = call(&state, post_json("/api/auth/register", alice.clone())).await;
            assert_eq!(reply.status, StatusCode::CREATED);
            assert_eq!(reply.body["user"]["username"], "alice");
            assert!(reply.body["user"].get("password_hash").is_none());
            let session = reply.session.expect("register sets the session cookie");

            let reply = call(&state, post_json("/api/auth/register", alice)).await;
            assert_eq!(reply.status, StatusCode::CONFLICT);
            assert!(reply.session.is_none());
            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(users, 1);

            let review = post_json(
                "/api/reviews",
                serde_json::json!({ "tmdbId": 550, "title": "Fight Club", "rating": 4.5 }),
            );
            let reply = call(&state, with_session(review, &session)).await;
            assert_eq!(reply.status, StatusCode::CREATED);
            assert_eq!(reply.body["success"], true);

            let reply = call(
                &state,
                Request::get("/api/films/550/reviews").body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(reply.body["totalReviews"], 1);
            assert_eq!(reply.body["averageRating"], 4.5);
            assert_eq!(reply.body["reviews"][0]["user"]["username"], "alice");

            let me = Request::get("/api/auth/me").body(Body::empty()).unwrap();
            let reply = call(&state, with_session(me, &session)).await;
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(reply.body["user"]["username"], "alice");
            assert_eq!(reply.body["user"]["email"], "alice@example.com");
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "needs DATABASE_URL"]
        async fn login_issues_session_only_on_success(pool: PgPool) {
            let state = AppState::with_pool(pool);
            let register = post_json(
                "/api/auth/register",
                serde_json::json!({ "email": "bob@example.com", "username": "bob", "password": "pw123" }),
            );
            assert_eq!(call(&state, register).await.status, StatusCode::CREATED);

            let reply = call(
                &state,
                post_json(
                    "/api/auth/login",
                    serde_json::json!({ "email": "BOB@example.com", "password": "pw123" }),
                ),
            )
            .await;
            assert_eq!(reply.status, StatusCode::OK);
            let session = reply.session.expect("login sets the session cookie");

            let me = Request::get("/api/auth/me").body(Body::empty()).unwrap();
            let reply = call(&state, with_session(me, &session)).await;
            assert_eq!(reply.body["user"]["username"], "bob");

            for body in [
                serde_json::json!({ "email": "bob@example.com", "password": "wrong" }),
                serde_json::json!({ "email": "nobody@example.com", "password": "pw123" }),
            ] {
                let reply = call(&state, post_json("/api/auth/login", body)).await;
                assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
                assert_eq!(reply.body["error"], "Invalid credentials");
                assert!(reply.session.is_none());
            }
        }
    }
}
