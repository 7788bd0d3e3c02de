//! Server lifecycle tests over a real socket.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use calendar_server::api::{create_router, ApiState, RestApiConfig};
use calendar_server::calendar::CalendarService;
use calendar_server::server::serve;
use calendar_server::storage::MemoryEventStore;

fn state() -> Arc<ApiState> {
    let service = Arc::new(CalendarService::new(Arc::new(MemoryEventStore::new())));
    Arc::new(ApiState::new(service).unwrap())
}

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_until_signalled_then_cancels_root() {
    let state = state();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone(), &RestApiConfig::default());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(
        listener,
        app,
        state.root_context().clone(),
        Duration::from_secs(2),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let body = "user_id=1&date=2025-10-08&event=Meet";
    let response = raw_request(
        addr,
        &format!(
            "POST /create_event HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains(r#""event":"Meet""#), "{response}");

    let response = raw_request(
        addr,
        "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    assert!(!state.root_context().is_cancelled());
    stop_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops after the signal")
        .unwrap()
        .unwrap();
    assert!(state.root_context().is_cancelled());
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_drain_window_bounds_shutdown() {
    let state = state();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone(), &RestApiConfig::default());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(
        listener,
        app,
        state.root_context().clone(),
        Duration::from_millis(200),
        async move {
            let _ = stop_rx.await;
        },
    ));

    // A keep-alive connection holding a half-sent request keeps the drain busy.
    let mut idle = TcpStream::connect(addr).await.unwrap();
    idle.write_all(b"POST /create_event HTTP/1.1\r\nHost: localhost\r\nContent-Length: 100\r\n\r\nuser_id=1")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("drain window elapses")
        .unwrap()
        .unwrap();
    assert!(state.root_context().is_cancelled());
    drop(idle);
}

#[tokio::test]
async fn test_stalled_request_body_is_cut_off() {
    let service = Arc::new(CalendarService::new(Arc::new(MemoryEventStore::new())));
    let state = Arc::new(
        ApiState::new(service)
            .unwrap()
            .with_request_timeout(Some(Duration::from_millis(200))),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone(), &RestApiConfig::default());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(
        listener,
        app,
        state.root_context().clone(),
        Duration::from_secs(2),
        async move {
            let _ = stop_rx.await;
        },
    ));

    // Promise 100 body bytes, send 9, then go quiet.
    let mut stalled = TcpStream::connect(addr).await.unwrap();
    stalled
        .write_all(
            b"POST /create_event HTTP/1.1\r\nHost: localhost\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Content-Length: 100\r\n\r\nuser_id=1",
        )
        .await
        .unwrap();

    let mut response = Vec::new();
    let mut buf = [0u8; 1024];
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let n = match stalled.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            response.extend_from_slice(&buf[..n]);
            if String::from_utf8_lossy(&response).contains("request timed out") {
                break;
            }
        }
    })
    .await
    .expect("server answers a stalled request");

    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 408"), "{response}");
    assert!(response.contains(r#"{"error":"request timed out"}"#), "{response}");
    assert_eq!(state.metrics.request_errors_total.get(), 1);

    drop(stalled);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
