use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    password,
    repo::is_unique_violation,
    repo_types::User,
};
use crate::error::{AppError, AppResult};

const MAX_PASSWORD_LEN: usize = 128;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{2,32}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

fn check_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::validation("password", "Password is required"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("password", "Password is too long"));
    }
    Ok(())
}

/// Normalises and checks a registration request before any storage access.
pub fn validate_registration(req: &mut RegisterRequest) -> AppResult<()> {
    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_owned();

    if req.email.is_empty() {
        return Err(AppError::validation("email", "Email is required"));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::validation("email", "Invalid email"));
    }
    if req.username.is_empty() {
        return Err(AppError::validation("username", "Username is required"));
    }
    if !is_valid_username(&req.username) {
        return Err(AppError::validation(
            "username",
            "Username must be 2-32 letters, digits, '.', '_' or '-'",
        ));
    }
    check_password(&req.password)
}

pub fn validate_login(req: &mut LoginRequest) -> AppResult<()> {
    req.email = req.email.trim().to_lowercase();
    if req.email.is_empty() {
        return Err(AppError::validation("email", "Email is required"));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::validation("email", "Invalid email"));
    }
    check_password(&req.password)
}

/// Runs CPU-bound hashing off the async workers.
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// Creates the account described by an already validated request.
pub async fn register_user(db: &PgPool, req: RegisterRequest) -> AppResult<User> {
    if User::exists(db, &req.email, &req.username).await? {
        warn!(email = %req.email, username = %req.username, "email or username already registered");
        return Err(AppError::Conflict(
            "User with this email or username already exists".into(),
        ));
    }

    let plain = req.password;
    let hash = blocking(move || password::hash_password(&plain)).await??;

    let user = match User::create(db, &req.email, &req.username, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %req.email, "lost registration race");
            return Err(AppError::Conflict(
                "User with this email or username already exists".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks credentials. Unknown email and wrong password fail identically.
pub async fn authenticate(db: &PgPool, req: LoginRequest) -> AppResult<User> {
    let Some(user) = User::find_by_email(db, &req.email).await? else {
        let plain = req.password;
        blocking(move || password::verify_against_dummy(&plain)).await?;
        warn!(email = %req.email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let plain = req.password;
    let hash = user.password_hash.clone();
    let ok = blocking(move || password::verify_password(&plain, &hash)).await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("al ice@example.com"));
    }

    #[test]
    fn registration_normalises_email() {
        let mut req = register("  Alice@Example.COM ", " alice ", "pw123");
        validate_registration(&mut req).expect("valid");
        assert_eq!(req.email, "alice@example.com");
        assert_eq!(req.username, "alice");
    }

    #[test]
    fn registration_reports_the_offending_field() {
        let cases = [
            (register("", "alice", "pw123"), "email"),
            (register("nope", "alice", "pw123"), "email"),
            (register("alice@example.com", "", "pw123"), "username"),
            (register("alice@example.com", "a b", "pw123"), "username"),
            (register("alice@example.com", "alice", ""), "password"),
            (register("alice@example.com", "alice", &"x".repeat(200)), "password"),
        ];
        for (mut req, expected) in cases {
            match validate_registration(&mut req) {
                Err(AppError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let mut req = LoginRequest {
            email: "alice@example.com".into(),
            password: String::new(),
        };
        assert!(matches!(
            validate_login(&mut req),
            Err(AppError::Validation { field: "password", .. })
        ));
    }

    mod db {
        use super::*;

        fn alice() -> RegisterRequest {
            let mut req = register("alice@example.com", "alice", "pw123");
            validate_registration(&mut req).unwrap();
            req
        }

        fn login(email: &str, password: &str) -> LoginRequest {
            let mut req = LoginRequest {
                email: email.into(),
                password: password.into(),
            };
            validate_login(&mut req).unwrap();
            req
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "needs DATABASE_URL"]
        async fn duplicate_email_conflicts(pool: PgPool) {
            let user = register_user(&pool, alice()).await.unwrap();
            assert_eq!(user.username, "alice");
            assert_ne!(user.password_hash, "pw123");

            let mut again = register("ALICE@example.com", "alice2", "other");
            validate_registration(&mut again).unwrap();
            assert!(matches!(
                register_user(&pool, again).await,
                Err(AppError::Conflict(_))
            ));

            let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(rows, 1);
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "needs DATABASE_URL"]
        async fn usernames_differing_in_case_conflict(pool: PgPool) {
            register_user(&pool, alice()).await.unwrap();

            let mut shouty = register("other@example.com", "ALICE", "pw123");
            validate_registration(&mut shouty).unwrap();
            assert_eq!(shouty.username, "ALICE");
            assert!(matches!(
                register_user(&pool, shouty).await,
                Err(AppError::Conflict(_))
            ));
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "needs DATABASE_URL"]
        async fn case_insensitive_index_catches_raced_usernames(pool: PgPool) {
            User::create(&pool, "a@example.com", "alice", "$argon2id$unused")
                .await
                .unwrap();
            let err = User::create(&pool, "b@example.com", "Alice", "$argon2id$unused")
                .await
                .unwrap_err();
            assert!(is_unique_violation(&err));
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "needs DATABASE_URL"]
        async fn login_failures_are_indistinguishable(pool: PgPool) {
            let user = register_user(&pool, alice()).await.unwrap();

            let ok = authenticate(&pool, login("alice@example.com", "pw123")).await.unwrap();
            assert_eq!(ok.id, user.id);

            let wrong_password = authenticate(&pool, login("alice@example.com", "nope")).await;
            let unknown_email = authenticate(&pool, login("bob@example.com", "pw123")).await;
            assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
            assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
        }
    }
}
