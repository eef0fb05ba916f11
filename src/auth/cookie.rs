use tower_cookies::{
    cookie::{time::Duration, SameSite},
    Cookie, Cookies,
};

pub const SESSION_COOKIE: &str = "session";

/// Builds the session cookie carrying `token`.
pub fn session_cookie(token: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    cookie
}

pub fn store(cookies: &Cookies, token: String, secure: bool, max_age: Duration) {
    cookies.add(session_cookie(token, secure, max_age));
}

pub fn retrieve(cookies: &Cookies) -> Option<String> {
    cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

/// Logout. The token itself stays valid until it expires.
pub fn clear(cookies: &Cookies) {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookies.remove(cookie);
}
