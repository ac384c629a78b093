// Application bootstrapper and HTTP server

use crate::{
    Error, HandlerFn, HandlerFuture, HttpMethod, HttpRequest, HttpResponse, Middleware,
    MiddlewareChain, Router,
};
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderName, HeaderValue, SET_COOKIE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// The main application struct: a router behind a middleware chain
#[derive(Clone)]
pub struct Application {
    pub router: Arc<Router>,
    pub middleware: MiddlewareChain,
}

impl Application {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            middleware: MiddlewareChain::new(),
        }
    }

    /// Append a middleware; the first one added sees the request first
    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.use_middleware(middleware);
        self
    }

    /// Run a request through the middleware chain and router.
    ///
    /// Errors are rendered as JSON error responses and never escape.
    pub async fn dispatch(&self, req: HttpRequest) -> HttpResponse {
        let router = self.router.clone();
        let handler: HandlerFn = Arc::new(move |req| {
            let router = router.clone();
            Box::pin(async move { router.route(req).await }) as HandlerFuture
        });

        match self.middleware.apply(req, handler).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_server_error() {
                    error!(error = %err, "Request handling failed");
                } else {
                    debug!(status = err.status_code(), error = %err, "Request rejected");
                }
                HttpResponse::from_error(&err)
            }
        }
    }

    /// Start the HTTP server and serve until the process exits
    pub async fn listen(self, addr: SocketAddr) -> Result<(), Error> {
        self.listen_with_shutdown(addr, std::future::pending::<()>())
            .await
    }

    /// Start the HTTP server and stop accepting connections once `shutdown` resolves
    pub async fn listen_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, "Server listening");

        let app = Arc::new(self);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let app = app.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let app = app.clone();
                    async move { handle_request(req, app).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(peer = %peer, error = %err, "Error serving connection");
                }
            });
        }
    }
}

/// Bridge a hyper request through the application and back
async fn handle_request(
    req: Request<IncomingBody>,
    app: Arc<Application>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    let Some(method) = HttpMethod::from_str(req.method().as_str()) else {
        let err = Error::MethodNotAllowed(req.method().to_string());
        return Ok(into_hyper_response(HttpResponse::from_error(&err)));
    };

    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut http_req = HttpRequest::new(method, target);

    let mut cookie_headers = Vec::new();
    for (name, value) in req.headers() {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if name == hyper::header::COOKIE {
            cookie_headers.push(value.to_string());
        } else {
            http_req.set_header(name.as_str(), value);
        }
    }
    if !cookie_headers.is_empty() {
        http_req.set_header("cookie", cookie_headers.join("; "));
    }

    http_req.body = req.collect().await?.to_bytes().to_vec();

    let response = app.dispatch(http_req).await;
    Ok(into_hyper_response(response))
}

fn into_hyper_response(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let mut hyper_response = Response::new(Full::new(bytes::Bytes::from(response.body)));

    *hyper_response.status_mut() = hyper::StatusCode::from_u16(response.status)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);

    let headers = hyper_response.headers_mut();
    for (key, value) in response.headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %key, "Dropping invalid response header"),
        }
    }

    for cookie in response.cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(_) => warn!(cookie = %cookie.name(), "Dropping invalid Set-Cookie value"),
        }
    }

    hyper_response
}
