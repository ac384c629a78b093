// Routing system for HTTP requests

use crate::{Error, HandlerFn, HandlerFuture, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// Route definition with handler
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub handler: HandlerFn,
}

impl Route {
    pub fn new<F, Fut>(method: HttpMethod, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        Self {
            method,
            path: path.into(),
            handler: Arc::new(move |req| Box::pin(handler(req)) as HandlerFuture),
        }
    }
}

/// Router for managing routes and dispatching requests
#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route to the router
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.add_route(Route::new(HttpMethod::GET, path, handler));
        self
    }

    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.add_route(Route::new(HttpMethod::POST, path, handler));
        self
    }

    pub fn delete<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.add_route(Route::new(HttpMethod::DELETE, path, handler));
        self
    }

    /// Find a route that matches the request and run its handler
    ///
    /// A path that matches only under other methods yields `MethodNotAllowed`.
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut path_matched = false;

        for route in &self.routes {
            let Some(params) = match_path(&route.path, &request.path) else {
                continue;
            };

            if route.method != request.method {
                path_matched = true;
                continue;
            }

            trace!(method = %route.method, pattern = %route.path, "Route matched");
            request.path_params = params;
            return (route.handler)(request).await;
        }

        let target = format!("{} {}", request.method, request.path);
        if path_matched {
            Err(Error::MethodNotAllowed(target))
        } else {
            Err(Error::RouteNotFound(target))
        }
    }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_router() -> Router {
        let mut router = Router::new();
        router
            .get("/todos", |_req| async { Ok(HttpResponse::ok().with_body(b"list".to_vec())) })
            .post("/todos", |_req| async { Ok(HttpResponse::created()) })
            .post("/todos/:id/toggle", |req: HttpRequest| async move {
                let id = req.param("id").cloned().unwrap_or_default();
                Ok(HttpResponse::ok().with_body(id.into_bytes()))
            });
        router
    }

    #[test]
    fn test_match_path_static() {
        let result = match_path("/todos", "/todos");
        assert_eq!(result.map(|p| p.len()), Some(0));
    }

    #[test]
    fn test_match_path_with_param() {
        let params = match_path("/todos/:id/toggle", "/todos/123/toggle").unwrap();
        assert_eq!(params.get("id"), Some(&"123".to_string()));
    }

    #[test]
    fn test_match_path_no_match() {
        assert!(match_path("/todos/:id", "/users/123").is_none());
        assert!(match_path("/todos/:id", "/todos").is_none());
    }

    #[test]
    fn test_match_path_root_and_trailing_slash() {
        assert!(match_path("/", "/").is_some());
        assert!(match_path("/todos", "/todos/").is_some());
    }

    #[tokio::test]
    async fn test_route_dispatches_with_params() {
        let router = test_router();
        let req = HttpRequest::new(HttpMethod::POST, "/todos/7/toggle");
        let response = router.route(req).await.unwrap();
        assert_eq!(response.text(), "7");
    }

    #[tokio::test]
    async fn test_route_selects_by_method() {
        let router = test_router();
        let response = router
            .route(HttpRequest::new(HttpMethod::POST, "/todos"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let router = test_router();
        let err = router
            .route(HttpRequest::new(HttpMethod::GET, "/missing"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_allowed() {
        let router = test_router();
        let err = router
            .route(HttpRequest::new(HttpMethod::DELETE, "/todos"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 405);
    }
}
