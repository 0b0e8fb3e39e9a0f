use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::render::{self, ErrorView, LoginView};
use crate::room::namegen::CapacityExhausted;
use crate::room::registry::{RoomRegistry, RouteBinder};
use crate::room::routes::DynamicRoutes;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub routes: Arc<DynamicRoutes>,
}

impl AppState {
    /// Wires the registry to the dynamic route table. The composition root
    /// owns the result; handlers receive clones through axum state.
    pub fn new() -> Self {
        let routes = Arc::new(DynamicRoutes::new());
        let registry = Arc::new(RoomRegistry::new(Arc::clone(&routes) as Arc<dyn RouteBinder>));
        Self { registry, routes }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Recoverable user mistake; surfaced inline on the login view and not
    /// logged as an error.
    #[error("{0}")]
    Validation(String),

    /// Stale or expired room URL; a first-class outcome, not a crash.
    #[error("room {0} does not exist or has expired")]
    RoomNotFound(String),

    /// Creation could not win a free identifier.
    #[error("could not create room: {0}")]
    RoomCreation(#[from] CapacityExhausted),

    /// Anything unexpected; details stay server-side.
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(message) => {
                Html(render::login_page(&LoginView { message })).into_response()
            }
            AppError::RoomNotFound(_) => {
                let message = self.to_string();
                (
                    StatusCode::NOT_FOUND,
                    Html(render::error_page(&ErrorView { message: &message })),
                )
                    .into_response()
            }
            AppError::RoomCreation(_) => {
                error!(error = %self, "Room creation failed");
                let message = self.to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::error_page(&ErrorView { message: &message })),
                )
                    .into_response()
            }
            AppError::Internal => {
                error!(error = %self, "Unclassified failure");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
