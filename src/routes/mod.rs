/// Router Module Index
///
/// Splits the gateway's routing by concern, so each group's access story is
/// visible where it is declared.

/// JSON endpoints open to every caller: health, route table, guard queries,
/// client config and session login/logout.
pub mod public;

/// The `/api` forwarder to the booking backend, with CORS handling.
pub mod proxy;

/// Guarded SPA pages. Registered as the fallback.
pub mod pages;
