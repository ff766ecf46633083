pub mod error;
pub mod files;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod preview;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
