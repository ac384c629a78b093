// Core library for the hello-htmx application
// Request/response model, middleware pipeline, routing and the hyper server loop

pub mod application;
pub mod error;
pub mod extensions;
pub mod form;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routing;

// Re-export commonly used types
pub use application::*;
pub use error::*;
pub use extensions::Extensions;
pub use form::*;
pub use http::*;
pub use middleware::*;
pub use routing::{Route, Router};
