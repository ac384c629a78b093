//! Testing utilities for hello-htmx applications.
//!
//! Drives an [`Application`](hello_htmx_core::Application) in-process, with a
//! browser-like cookie jar per client.
//!
//! ## Quick Start
//!
//! ```
//! use hello_htmx_core::{Application, HttpResponse, Router};
//! use hello_htmx_testing::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut router = Router::new();
//! router.get("/hello", |_req| async {
//!     Ok(HttpResponse::ok().with_body(b"Hello!".to_vec()))
//! });
//!
//! let client = TestClient::new(Application::new(router));
//! let response = client.get("/hello").send().await;
//! assert_status(&response, 200);
//! assert_eq!(response.text(), "Hello!");
//! # });
//! ```

pub mod assertions;
pub mod test_client;

pub use assertions::*;
pub use test_client::{TestClient, TestRequestBuilder, TestResponse};
