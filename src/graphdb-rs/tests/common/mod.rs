//! Local HTTP server for exercising the client over real sockets.

#![allow(dead_code)]

use axum::Router;
use graphdb_rs::Client;

/// Serve `router` on an ephemeral port and return its base URL
pub async fn serve(router: Router) -> String {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serve `router` and return a client without credentials
pub async fn client_for(router: Router) -> Client {
    Client::new(serve(router).await)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
