//! Session-cookie extractor.

use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::CookieJar;
use http::request::Parts;
use std::convert::Infallible;

use crate::cookie::{SESSION_COOKIE, is_valid_session_id};

/// Session id read from the request's session cookie.
///
/// `None` when the cookie is absent or malformed; handlers decide whether a
/// missing session is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie(pub Option<String>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let session_id = CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|v| is_valid_session_id(v));
        async move { Ok(Self(session_id)) }
    }
}
