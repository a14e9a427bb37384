//! The navigation guard and the navigator that applies it.

use crate::{
    error::NavigationError,
    models::{DecisionKind, NavigationResponse},
    route_table::{DEFAULT_PATH, LOGIN_PATH, REDIRECT_PARAM, ResolvedRoute, RouteTable},
    session::{SessionState, SessionStore, SessionStoreState},
};
use std::sync::Arc;

/// Redirects followed by a single navigation before giving up.
const MAX_REDIRECTS: usize = 3;

/// NavigationDecision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    /// `redirect` is the full path originally requested.
    RedirectToLogin { redirect: String },
    RedirectToDefault,
}

impl NavigationDecision {
    /// Where the browser should be sent, or `None` to stay on the target.
    pub fn location(&self) -> Option<String> {
        match self {
            NavigationDecision::Proceed => None,
            NavigationDecision::RedirectToLogin { redirect } => Some(format!(
                "{}?{}={}",
                LOGIN_PATH,
                REDIRECT_PARAM,
                urlencoding::encode(redirect)
            )),
            NavigationDecision::RedirectToDefault => Some(DEFAULT_PATH.to_string()),
        }
    }

    pub fn kind(&self) -> DecisionKind {
        match self {
            NavigationDecision::Proceed => DecisionKind::Proceed,
            NavigationDecision::RedirectToLogin { .. } => DecisionKind::RedirectToLogin,
            NavigationDecision::RedirectToDefault => DecisionKind::RedirectToDefault,
        }
    }

    /// Wire form returned by GET /navigation.
    pub fn to_response(&self, target: &ResolvedRoute) -> NavigationResponse {
        NavigationResponse {
            decision: self.kind(),
            location: self.location(),
            route: target.name.clone(),
        }
    }
}

/// check
///
/// Decides whether a navigation to `target` may proceed. The authentication
/// check runs before the admin check, so an anonymous request for an admin
/// page goes to login rather than home.
pub fn check(target: &ResolvedRoute, session: SessionState) -> NavigationDecision {
    let meta = target.meta();

    if meta.needs_auth() && !session.is_authenticated() {
        return NavigationDecision::RedirectToLogin {
            redirect: target.full_path.clone(),
        };
    }

    if meta.requires_admin && !session.is_admin() {
        return NavigationDecision::RedirectToDefault;
    }

    NavigationDecision::Proceed
}

/// Navigation
///
/// Outcome of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// The route that ends up displayed.
    pub route: ResolvedRoute,
    /// The location originally asked for, when a redirect happened.
    pub redirected_from: Option<String>,
}

/// Navigator
///
/// Applies the guard before every transition and follows redirects in
/// process, for callers that hold the session store themselves. The HTTP
/// handlers answer one hop at a time instead and let the browser follow.
/// `&mut self` serialises navigations: the next one only starts after the
/// previous one resolved.
pub struct Navigator {
    table: Arc<RouteTable>,
    store: SessionStoreState,
    current: Option<ResolvedRoute>,
}

impl Navigator {
    pub fn new(table: Arc<RouteTable>, store: SessionStoreState) -> Self {
        Self {
            table,
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    /// navigate
    ///
    /// Resolves `to`, reads the session once, and follows guard redirects
    /// until a route is allowed.
    pub async fn navigate(&mut self, to: &str) -> Result<Navigation, NavigationError> {
        let mut target = self.table.resolve(to);
        let session = SessionState::read(self.store.as_ref()).await;
        let mut redirected_from = None;

        for _ in 0..=MAX_REDIRECTS {
            let decision = check(&target, session);
            tracing::debug!(
                from = self.current.as_ref().map(|r| r.full_path.as_str()),
                to = %target.full_path,
                ?session,
                ?decision,
                "navigation guard"
            );

            match decision.location() {
                None => {
                    self.current = Some(target.clone());
                    return Ok(Navigation {
                        route: target,
                        redirected_from,
                    });
                }
                Some(location) => {
                    redirected_from.get_or_insert_with(|| target.full_path.clone());
                    target = self.table.resolve(&location);
                }
            }
        }

        Err(NavigationError::RedirectLoop(to.to_string()))
    }
}
