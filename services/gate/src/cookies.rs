use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

/// Session cookie name.
pub const GATE_SESSION: &str = "parlor_session";

pub fn session_id_from(jar: &CookieJar) -> Option<String> {
    jar.get(GATE_SESSION).map(|c| c.value().to_owned())
}

pub fn set_session_cookie(jar: CookieJar, session_id: String, domain: String) -> CookieJar {
    let cookie = Cookie::build((GATE_SESSION, session_id))
        .domain(domain)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: CookieJar, domain: String) -> CookieJar {
    let cookie = Cookie::build((GATE_SESSION, ""))
        .domain(domain)
        .path("/")
        .build();
    jar.remove(cookie)
}
