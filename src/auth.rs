use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;

use crate::{
    error::SessionError,
    session::{MemorySessionStore, SessionState, SessionStore, keys},
};

/// CurrentSession Extractor Result
///
/// The resolved session of the request being served. Resolution happens once,
/// here; handlers only ever see the enum, never the raw cookie strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentSession(pub SessionState);

/// CurrentSession Extractor Implementation
///
/// Snapshots the `token` and `isAdmin` cookies into a store and resolves them.
///
/// Never rejects: missing or garbled cookies resolve to an anonymous session,
/// and the guard turns that into a redirect rather than an error.
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let store = MemorySessionStore::from_cookies(&jar);
        Ok(CurrentSession(SessionState::read(&store).await))
    }
}

/// write_session_cookies
///
/// Mirrors the session keys held by `store` onto the response cookie jar:
/// present keys are set, absent keys are expired. The jar percent-encodes
/// values on the way out and decodes them on the way in, so tokens holding
/// `;` or `,` survive the round trip. Cookies are HttpOnly and `SameSite=Lax`;
/// `secure` adds the Secure attribute.
pub async fn write_session_cookies(
    mut jar: CookieJar,
    store: &dyn SessionStore,
    secure: bool,
) -> Result<CookieJar, SessionError> {
    for key in [keys::TOKEN, keys::IS_ADMIN] {
        jar = match store.get(key).await? {
            Some(value) => jar.add(
                Cookie::build((key, value))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(secure),
            ),
            None => jar.remove(Cookie::build(key).path("/")),
        };
    }
    Ok(jar)
}
