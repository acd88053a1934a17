pub mod routes;

// Re-export route handlers for convenience
pub use routes::activities;
pub use routes::app;
pub use routes::state::AppState;
