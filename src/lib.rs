// Library crate for the planning poker server
// This file exposes the public API for integration tests

pub mod render;
pub mod room;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use room::cleanup_task::{start_cleanup_task, CleanupConfig};
pub use room::models::{Room, RoomSnapshot, DEFAULT_DESCRIPTION, SENTINEL_ESTIMATE};
pub use room::{router, DynamicRoutes, RoomRegistry, RouteBinder};
pub use shared::{AppError, AppState};
