use axum::http::header;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use dashmap::DashSet;
use tower_http::set_header::SetResponseHeaderLayer;

use super::handlers;
use super::registry::RouteBinder;
use crate::shared::AppState;

/// Path prefix for dynamically bound room endpoints.
pub const ROOM_ROUTE_PREFIX: &str = "/room-";

pub fn room_route(room_id: &str) -> String {
    format!("{ROOM_ROUTE_PREFIX}{room_id}")
}

/// Transport-side dynamic route table: the set of room paths currently
/// exposed. The registry drives it through [`RouteBinder`]; the router's
/// fallback consults it before touching the registry.
#[derive(Default)]
pub struct DynamicRoutes {
    bound: DashSet<String>,
}

impl DynamicRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self, room_id: &str) -> bool {
        self.bound.contains(room_id)
    }
}

impl RouteBinder for DynamicRoutes {
    fn bind(&self, room_id: &str) {
        self.bound.insert(room_id.to_string());
    }

    fn unbind(&self, room_id: &str) {
        self.bound.remove(room_id);
    }
}

/// Builds the application router: the fixed routes, the dynamic room
/// fallback, and the blanket no-cache headers every response carries.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api-add-room", get(handlers::add_room))
        .route("/api-add-estimation", get(handlers::add_estimation))
        .route("/api-set-description", get(handlers::set_description))
        .fallback(handlers::room_page)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_unbind_track_the_bound_set() {
        let routes = DynamicRoutes::new();

        assert!(!routes.is_bound("Azure-Brave-Ant"));
        routes.bind("Azure-Brave-Ant");
        assert!(routes.is_bound("Azure-Brave-Ant"));
        routes.unbind("Azure-Brave-Ant");
        assert!(!routes.is_bound("Azure-Brave-Ant"));
    }

    #[test]
    fn unbinding_an_unknown_path_is_harmless() {
        let routes = DynamicRoutes::new();
        routes.unbind("Pink-Wise-Fox");
        assert!(!routes.is_bound("Pink-Wise-Fox"));
    }

    #[test]
    fn room_routes_carry_the_prefix() {
        assert_eq!(room_route("Azure-Brave-Ant"), "/room-Azure-Brave-Ant");
    }
}
