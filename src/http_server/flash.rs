//! One-shot messages carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

const FLASH_COOKIE: &str = "flash";

/// Queue `message` for the next rendered page. The jar percent-encodes it on the wire.
pub fn push(jar: CookieJar, message: &str) -> CookieJar {
    let mut cookie = Cookie::new(FLASH_COOKIE, message.to_owned());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Remove any pending message from the jar and return it
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, Vec::new());
    };

    let messages = match cookie.value() {
        "" => Vec::new(),
        message => vec![message.to_string()],
    };

    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}
