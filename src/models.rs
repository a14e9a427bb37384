use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Route Metadata & Views ---

/// View
///
/// Opaque identifier of a page the SPA renders. The gateway never looks inside
/// a view; it only decides whether the user may reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum View {
    Login,
    Home,
    About,
    Bookings,
    Booking,
    Payment,
    Rooms,
    EditRoom,
    CreateRoom,
    Users,
    EditUser,
    CreateUser,
    NotFound,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Login => "Login",
            View::Home => "Home",
            View::About => "About",
            View::Bookings => "Bookings",
            View::Booking => "Booking",
            View::Payment => "Payment",
            View::Rooms => "Rooms",
            View::EditRoom => "EditRoom",
            View::CreateRoom => "CreateRoom",
            View::Users => "Users",
            View::EditUser => "EditUser",
            View::CreateUser => "CreateUser",
            View::NotFound => "NotFound",
        }
    }
}

/// RouteMeta
///
/// Access requirements attached to a route. Both flags default to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl RouteMeta {
    pub const PUBLIC: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_admin: false,
    };
    pub const AUTH: RouteMeta = RouteMeta {
        requires_auth: true,
        requires_admin: false,
    };
    pub const ADMIN: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_admin: true,
    };

    /// Flag-wise OR, used to aggregate metadata across a matched chain.
    pub fn merge(self, other: RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_auth: self.requires_auth || other.requires_auth,
            requires_admin: self.requires_admin || other.requires_admin,
        }
    }

    /// Admin implies logged-in, however the flags were declared.
    pub fn needs_auth(&self) -> bool {
        self.requires_auth || self.requires_admin
    }
}

// --- Output Schemas ---

/// RouteSummary
///
/// Output schema for GET /routes. Flags are aggregated over the route's
/// ancestry, so a child of an admin route reports `requiresAdmin: true`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RouteSummary {
    pub name: String,
    pub path: String,
    pub view: View,
    pub requires_auth: bool,
    pub requires_admin: bool,
}

/// DecisionKind
///
/// Wire form of a navigation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DecisionKind {
    Proceed,
    RedirectToLogin,
    RedirectToDefault,
}

/// NavigationResponse
///
/// Output schema for GET /navigation. `location` is set for redirects and
/// `route` names the resolved target when one matched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationResponse {
    pub decision: DecisionKind,
    pub location: Option<String>,
    pub route: Option<String>,
}

/// ClientConfig
///
/// Output schema for GET /config: the settings the SPA needs at boot.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientConfig {
    pub api_base_url: String,
}

/// SessionResponse
///
/// Output schema for POST/DELETE /session: where the SPA should go next.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionResponse {
    pub location: String,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /session. The token is issued by the booking API and
/// is opaque to the gateway. `redirect` carries the page the user was bounced
/// from, for post-login resumption.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    pub token: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// NavigateQuery
///
/// Query parameters for GET /navigation.
#[derive(Debug, Deserialize, IntoParams)]
pub struct NavigateQuery {
    /// The location the SPA is about to navigate to, e.g. `/rooms?page=2`.
    pub to: String,
}
