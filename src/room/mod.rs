// Public API - what other modules can use
pub use registry::{RoomRegistry, RouteBinder};
pub use routes::{router, DynamicRoutes};

// Internal modules
pub mod cleanup_task;
mod handlers;
pub mod models;
pub mod namegen;
pub mod registry;
pub mod routes;
