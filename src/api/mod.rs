//! REST surface: routes, handlers, request/response models and error mapping.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
