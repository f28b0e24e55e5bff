//! HTTP front end

mod routes;

pub use routes::{create_router, status_for, AppState};
