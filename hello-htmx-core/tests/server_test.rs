//! Serves real HTTP/1.1 over a loopback socket

use cookie::Cookie;
use hello_htmx_core::*;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

fn app() -> Application {
    let mut router = Router::new();
    router
        .get("/cookies", |req: HttpRequest| async move {
            let mut names: Vec<_> = req.cookies.keys().cloned().collect();
            names.sort();
            Ok(HttpResponse::ok()
                .with_body(names.join(",").into_bytes())
                .with_cookie(Cookie::new("first", "1"))
                .with_cookie(Cookie::new("second", "2")))
        })
        .post("/echo", |req: HttpRequest| async move {
            Ok(HttpResponse::created().with_body(req.body))
        });
    Application::new(router).with_middleware(RequestIdMiddleware)
}

fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

async fn send_raw(addr: SocketAddr, request: &str) -> String {
    let mut stream = None;
    for _ in 0..50 {
        if let Ok(s) = TcpStream::connect(addr).await {
            stream = Some(s);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let mut stream = stream.expect("server did not start");

    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_requests_until_shutdown() {
    let addr = free_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(app().listen_with_shutdown(addr, async {
        let _ = stopped.await;
    }));

    let response = send_raw(
        addr,
        "GET /cookies HTTP/1.1\r\nHost: localhost\r\nCookie: b=2\r\nCookie: a=1\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("a,b"), "{}", response);
    assert!(response.contains("set-cookie: first=1"));
    assert!(response.contains("set-cookie: second=2"));
    assert!(response.contains("x-request-id: "));

    let response = send_raw(
        addr,
        "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 201"), "{}", response);
    assert!(response.ends_with("hello"));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_method_is_rejected() {
    let addr = free_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(app().listen_with_shutdown(addr, async {
        let _ = stopped.await;
    }));

    let response = send_raw(
        addr,
        "TRACE /cookies HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 405"), "{}", response);
    assert!(response.contains(r#""status_code":405"#));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
