// Middleware system for request/response processing

use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Boxed future returned by handlers and middleware continuations
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// Type alias for the next handler in the middleware chain
pub type Next = Box<dyn FnOnce(HttpRequest) -> HandlerFuture + Send>;

/// Type alias for handler functions
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Middleware trait for processing requests before they reach the handler
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request and optionally pass to next middleware
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error>;
}

/// Middleware chain executor
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add a middleware to the end of the chain
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        let mut mws = (*self.middlewares).clone();
        mws.push(Arc::new(middleware));
        self.middlewares = Arc::new(mws);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Execute the middleware chain with a handler
    pub async fn apply(&self, req: HttpRequest, handler: HandlerFn) -> Result<HttpResponse, Error> {
        debug!(
            middleware_count = self.middlewares.len(),
            path = %req.path,
            method = %req.method,
            "Executing middleware chain"
        );
        self.execute_from(0, req, handler).await
    }

    fn execute_from(&self, index: usize, req: HttpRequest, handler: HandlerFn) -> HandlerFuture {
        if index >= self.middlewares.len() {
            trace!("Middleware chain complete, calling handler");
            handler(req)
        } else {
            let middleware = self.middlewares[index].clone();
            let chain = self.clone();

            trace!(middleware_index = index, "Executing middleware");
            Box::pin(async move {
                middleware
                    .handle(
                        req,
                        Box::new(move |req| chain.execute_from(index + 1, req, handler)),
                    )
                    .await
            })
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Request ID middleware
///
/// Reuses an incoming `x-request-id` or generates one, and echoes it on the response.
pub struct RequestIdMiddleware;

#[async_trait]
impl Middleware for RequestIdMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let request_id = req
            .header("x-request-id")
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        req.set_header("x-request-id", request_id.clone());

        let mut response = next(req).await?;
        response
            .headers
            .insert("x-request-id".to_string(), request_id);

        Ok(response)
    }
}

/// HTTP request/response logging middleware
///
/// Logs each request on arrival and its outcome with the elapsed time.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let start = std::time::Instant::now();
        let method = req.method;
        let path = req.path.clone();
        let request_id = req.header("x-request-id").unwrap_or("-").to_string();

        info!(method = %method, path = %path, request_id = %request_id, "HTTP request received");

        let result = next(req).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                info!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    status = response.status,
                    duration_ms = duration.as_millis(),
                    "HTTP response sent"
                );
            }
            Err(err) if err.is_client_error() => {
                info!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    status = err.status_code(),
                    duration_ms = duration.as_millis(),
                    error = %err,
                    "HTTP request rejected"
                );
            }
            Err(err) => {
                error!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    duration_ms = duration.as_millis(),
                    error = %err,
                    "HTTP request failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;

    fn ok_handler() -> HandlerFn {
        Arc::new(|_req: HttpRequest| Box::pin(async { Ok(HttpResponse::ok()) }) as HandlerFuture)
    }

    fn next_ok() -> Next {
        Box::new(|_req| Box::pin(async { Ok(HttpResponse::ok()) }) as HandlerFuture)
    }

    struct Tag(&'static str);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
            let mut response = next(req).await?;
            let order = response
                .headers
                .get("x-order")
                .map(|v| format!("{},{}", v, self.0))
                .unwrap_or_else(|| self.0.to_string());
            response.headers.insert("x-order".to_string(), order);
            Ok(response)
        }
    }

    #[tokio::test]
    async fn test_middleware_chain() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(LoggingMiddleware);

        let req = HttpRequest::new(HttpMethod::GET, "/test");
        let result = chain.apply(req, ok_handler()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_middleware_runs_in_registration_order() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(Tag("outer"));
        chain.use_middleware(Tag("inner"));

        let req = HttpRequest::new(HttpMethod::GET, "/test");
        let response = chain.apply(req, ok_handler()).await.unwrap();

        // Responses unwind inner-first
        assert_eq!(response.headers.get("x-order"), Some(&"inner,outer".to_string()));
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let req = HttpRequest::new(HttpMethod::GET, "/test");

        let response = RequestIdMiddleware
            .handle(req, next_ok())
            .await
            .unwrap();

        assert!(response.headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let req = HttpRequest::new(HttpMethod::GET, "/test").with_header("X-Request-Id", "abc-123");

        let response = RequestIdMiddleware
            .handle(
                req,
                Box::new(|req: HttpRequest| {
                    Box::pin(async move {
                        assert_eq!(req.header("x-request-id"), Some("abc-123"));
                        Ok(HttpResponse::ok())
                    }) as HandlerFuture
                }),
            )
            .await
            .unwrap();

        assert_eq!(response.headers.get("x-request-id"), Some(&"abc-123".to_string()));
    }

    #[tokio::test]
    async fn test_logging_passes_errors_through() {
        let req = HttpRequest::new(HttpMethod::POST, "/test");

        let result = LoggingMiddleware
            .handle(
                req,
                Box::new(|_req| {
                    Box::pin(async { Err(Error::Forbidden("nope".into())) }) as HandlerFuture
                }),
            )
            .await;

        assert_eq!(result.unwrap_err().status_code(), 403);
    }
}
