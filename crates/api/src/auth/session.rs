use tower_cookies::{Cookie, Cookies};

/// Cookie carrying the authentication token.
pub const AUTH_COOKIE: &str = "dsu_auth_token";

/// Query parameter accepted in place of the cookie.
pub const AUTH_QUERY_PARAM: &str = "auth_token";

pub fn set_auth_cookie(cookies: &Cookies, token: &str, max_age: chrono::Duration) {
    let cookie = Cookie::build((AUTH_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::seconds(
            max_age.num_seconds(),
        ))
        .build();
    cookies.add(cookie);
}
