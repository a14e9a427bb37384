//! Static table of SPA pages and the path matcher behind it.
//!
//! Patterns are `/`-separated; a segment starting with `:` captures one path
//! segment. Child routes are declared relative to their parent and inherit the
//! parent's access flags through the matched chain.

use crate::{
    error::RouteTableError,
    models::{RouteMeta, RouteSummary, View},
};
use std::collections::HashSet;

/// Path of the login page; unauthenticated navigations are sent here.
pub const LOGIN_PATH: &str = "/";
/// Landing page for authenticated users who lack admin rights.
pub const DEFAULT_PATH: &str = "/home";
/// Query parameter carrying the originally requested location.
pub const REDIRECT_PARAM: &str = "redirect";

/// Route
///
/// Declaration of one navigable page. Built with the chained setters and
/// handed to [`RouteTable::new`].
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    name: String,
    view: View,
    meta: RouteMeta,
    children: Vec<Route>,
}

impl Route {
    pub fn new(path: impl Into<String>, name: impl Into<String>, view: View) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            view,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn child(mut self, route: Route) -> Self {
        self.children.push(route);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// A compiled route. `parent` indexes into the owning table.
#[derive(Debug, Clone)]
struct RouteRecord {
    name: String,
    pattern: String,
    view: View,
    meta: RouteMeta,
    segments: Vec<Segment>,
    parent: Option<usize>,
}

impl RouteRecord {
    fn static_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count()
    }
}

/// MatchedRecord
///
/// One link of the matched chain, outermost parent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
    pub name: String,
    pub pattern: String,
    pub meta: RouteMeta,
}

/// ResolvedRoute
///
/// The result of resolving a location against the table. An unmatched
/// location resolves to the not-found view with an empty chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Path plus query, as requested. Used as the post-login return path.
    pub full_path: String,
    pub path: String,
    pub name: Option<String>,
    pub view: View,
    pub params: Vec<(String, String)>,
    pub matched: Vec<MatchedRecord>,
}

impl ResolvedRoute {
    /// Access flags OR-ed across every matched record.
    pub fn meta(&self) -> RouteMeta {
        self.matched
            .iter()
            .fold(RouteMeta::default(), |acc, record| acc.merge(record.meta))
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_not_found(&self) -> bool {
        self.matched.is_empty()
    }
}

/// RouteTable
///
/// Immutable after construction. Records are stored depth-first, parents
/// before their children, which is also the tie-break order for matching.
#[derive(Debug, Clone)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTableError> {
        let mut records = Vec::new();
        let mut names = HashSet::new();
        for route in routes {
            compile(route, None, &mut records, &mut names)?;
        }
        Ok(Self { records })
    }

    /// The room-booking application's pages.
    pub fn booking_app() -> Result<Self, RouteTableError> {
        Self::new(vec![
            Route::new(LOGIN_PATH, "login", View::Login),
            Route::new(DEFAULT_PATH, "home", View::Home).meta(RouteMeta::AUTH),
            Route::new("/about", "about", View::About),
            Route::new("/bookings", "bookings", View::Bookings).meta(RouteMeta::AUTH),
            Route::new("/book/:roomId", "book", View::Booking).meta(RouteMeta::AUTH),
            Route::new("/payment/:bookingId", "payment", View::Payment).meta(RouteMeta::AUTH),
            // Admin CRUD. Edit pages inherit the admin flag from their parent.
            Route::new("/rooms", "rooms", View::Rooms)
                .meta(RouteMeta::ADMIN)
                .child(Route::new(":id/edit", "editRoom", View::EditRoom)),
            Route::new("/createRoom", "createRoom", View::CreateRoom).meta(RouteMeta::ADMIN),
            Route::new("/users", "users", View::Users)
                .meta(RouteMeta::ADMIN)
                .child(Route::new(":id/edit", "editUser", View::EditUser)),
            Route::new("/createUser", "createUser", View::CreateUser).meta(RouteMeta::ADMIN),
        ])
    }

    /// resolve
    ///
    /// Matches a location (path, optional `?query`, optional `#hash`) against
    /// the table. Static segments compare ASCII case-insensitively; a trailing
    /// slash is ignored. The record with the most static segments wins.
    pub fn resolve(&self, location: &str) -> ResolvedRoute {
        let without_hash = location.split_once('#').map_or(location, |(l, _)| l);
        let (raw_path, query) = match without_hash.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (without_hash, None),
        };

        let path = if raw_path.starts_with('/') {
            raw_path.to_string()
        } else {
            format!("/{}", raw_path)
        };
        let full_path = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", path, q),
            _ => path.clone(),
        };

        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut best: Option<(usize, Vec<(String, String)>)> = None;
        for (index, record) in self.records.iter().enumerate() {
            let Some(params) = match_segments(&record.segments, &parts) else {
                continue;
            };
            let better = match &best {
                Some((current, _)) => {
                    record.static_count() > self.records[*current].static_count()
                }
                None => true,
            };
            if better {
                best = Some((index, params));
            }
        }

        match best {
            Some((index, params)) => {
                let record = &self.records[index];
                ResolvedRoute {
                    full_path,
                    path,
                    name: Some(record.name.clone()),
                    view: record.view,
                    params,
                    matched: self.chain(index),
                }
            }
            None => ResolvedRoute {
                full_path,
                path,
                name: None,
                view: View::NotFound,
                params: Vec::new(),
                matched: Vec::new(),
            },
        }
    }

    /// Full pattern of a named route, e.g. `editRoom` -> `/rooms/:id/edit`.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|record| record.name == name)
            .map(|record| record.pattern.as_str())
    }

    /// Every declared route with flags aggregated over its ancestry.
    pub fn routes(&self) -> Vec<RouteSummary> {
        (0..self.records.len())
            .map(|index| {
                let record = &self.records[index];
                let meta = self
                    .chain(index)
                    .iter()
                    .fold(RouteMeta::default(), |acc, r| acc.merge(r.meta));
                RouteSummary {
                    name: record.name.clone(),
                    path: record.pattern.clone(),
                    view: record.view,
                    requires_auth: meta.requires_auth,
                    requires_admin: meta.requires_admin,
                }
            })
            .collect()
    }

    fn chain(&self, index: usize) -> Vec<MatchedRecord> {
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            let record = &self.records[i];
            chain.push(MatchedRecord {
                name: record.name.clone(),
                pattern: record.pattern.clone(),
                meta: record.meta,
            });
            cursor = record.parent;
        }
        chain.reverse();
        chain
    }
}

fn compile(
    route: Route,
    parent: Option<usize>,
    records: &mut Vec<RouteRecord>,
    names: &mut HashSet<String>,
) -> Result<(), RouteTableError> {
    let pattern = match parent {
        // Children are relative unless they start with '/'.
        Some(p) if !route.path.starts_with('/') => {
            let base = records[p].pattern.trim_end_matches('/');
            format!("{}/{}", base, route.path)
        }
        Some(_) => route.path.clone(),
        None => {
            if !route.path.starts_with('/') {
                return Err(RouteTableError::InvalidPattern {
                    pattern: route.path,
                    reason: "top-level patterns must start with '/'",
                });
            }
            route.path.clone()
        }
    };

    let segments = parse_pattern(&pattern)?;

    if !names.insert(route.name.clone()) {
        return Err(RouteTableError::DuplicateName(route.name));
    }

    let index = records.len();
    records.push(RouteRecord {
        name: route.name,
        pattern,
        view: route.view,
        meta: route.meta,
        segments,
        parent,
    });

    for child in route.children {
        compile(child, Some(index), records, names)?;
    }
    Ok(())
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteTableError> {
    let invalid = |reason| RouteTableError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let body = pattern.trim_start_matches('/').trim_end_matches('/');
    if body.is_empty() {
        return Ok(Vec::new());
    }

    body.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            match segment.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        Err(invalid("parameter names must be alphanumeric"))
                    } else {
                        Ok(Segment::Param(name.to_string()))
                    }
                }
                None => Ok(Segment::Static(segment.to_string())),
            }
        })
        .collect()
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> Option<Vec<(String, String)>> {
    if segments.len() != parts.len() {
        return None;
    }
    let mut params = Vec::new();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            Segment::Static(expected) => {
                if !expected.eq_ignore_ascii_case(part) {
                    return None;
                }
            }
            Segment::Param(name) => {
                let value = urlencoding::decode(part)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| (*part).to_string());
                params.push((name.clone(), value));
            }
        }
    }
    Some(params)
}
