//! HTML views. Submodules hold one handler per user facing page; this
//! module carries the shared rendering, redirect, and flash plumbing.

use cookie::{Cookie, CookieJar, SameSite};
use gotham::{
    helpers::http::response::{create_response, create_temporary_redirect as temp_redirect},
    state::{FromState, State},
};
use http::StatusCode;
use hyper::{header, Body, Response};

use crate::config::Settings;

pub mod index;
pub mod project;
pub mod user;

pub type DocumentResult = Result<Response<Body>, failure::Error>;

const FLASH_COOKIE: &str = "flash";

pub trait TemplateExt {
    fn to_response(&self, state: &State) -> Response<Body>;
}

impl<T: askama::Template> TemplateExt for T {
    fn to_response(&self, state: &State) -> Response<Body> {
        match self.render() {
            Ok(string) => create_response(state, StatusCode::OK, mime::TEXT_HTML, string),
            Err(e) => create_response(
                state,
                StatusCode::INTERNAL_SERVER_ERROR,
                mime::TEXT_PLAIN,
                format!("Template error: {}", e),
            ),
        }
    }
}

/// Redirect for the post/redirect/get pattern: 303 forces the follow-up
/// request to be a GET.
pub fn see_other(state: &State, location: String) -> Response<Body> {
    let mut response = temp_redirect(state, location);
    *response.status_mut() = StatusCode::SEE_OTHER;
    response
}

pub fn session_cookie<'a>(state: &State, id: &str) -> Cookie<'a> {
    let settings = Settings::borrow_from(state);
    let mut cookie = Cookie::build("session", id.to_owned())
        .same_site(SameSite::Strict)
        .http_only(true)
        .path("/")
        .finish();
    if settings.cookie.secure {
        cookie.set_secure(true);
    }
    if let Some(ref domain) = settings.cookie.domain {
        cookie.set_domain(domain.to_owned());
    }
    cookie
}

pub fn set_cookie(response: &mut Response<Body>, cookie: Cookie) -> Result<(), failure::Error> {
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);
    Ok(())
}

/// Redirects with a one-shot notice for the next rendered page. The message
/// rides in a cookie, base64 encoded to stay within the cookie value
/// alphabet.
pub fn flash_redirect(
    state: &State,
    location: &str,
    message: &str,
) -> Result<Response<Body>, failure::Error> {
    let mut response = see_other(state, location.to_owned());
    let cookie = Cookie::build(FLASH_COOKIE, base64::encode(message))
        .http_only(true)
        .path("/")
        .finish();
    set_cookie(&mut response, cookie)?;
    Ok(response)
}

/// The pending flash message, if any.
pub fn flash_message(state: &State) -> Option<String> {
    CookieJar::borrow_from(state)
        .get(FLASH_COOKIE)
        .and_then(|cookie| base64::decode(cookie.value()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Expires the flash cookie once its message has been rendered.
pub fn clear_flash(response: &mut Response<Body>) -> Result<(), failure::Error> {
    let cookie = Cookie::build(FLASH_COOKIE, "")
        .max_age(time::Duration::zero())
        .path("/")
        .finish();
    set_cookie(response, cookie)
}

#[cfg(test)]
mod tests {
    #[test]
    fn flash_payload_roundtrips() {
        let message = "You need to login or register to comment.";
        let encoded = base64::encode(message);
        // The encoded form has to survive as a raw cookie value.
        assert!(!encoded.contains(|c: char| c.is_whitespace() || c == ';' || c == ','));
        let decoded = String::from_utf8(base64::decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, message);
    }
}
