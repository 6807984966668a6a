//! Library surface of the evaluation server, exposed so integration
//! tests can drive the router in-process.

pub mod app;

pub use app::{router, AppState};
