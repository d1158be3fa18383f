use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};

use crate::{config::Config, services::sessions::SESSION_COOKIE};

pub fn session_cookie(token: &str, config: &Config) -> Cookie<'static> {
    let max_age = CookieDuration::seconds(config.effective_session_ttl().num_seconds());
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(max_age)
        .finish()
}

/// Cookie that makes the browser drop the session token.
pub fn expired_session_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("tok", &Config::default());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(CookieDuration::hours(720)));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = expired_session_cookie(&Config::default());
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
