//! Mock signing-API helpers shared by the integration tests

use axum::Router;

use esign_client::{AuthHeaders, SigningApi};

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Client authenticated as the default test user.
pub fn api_for(base_url: &str) -> SigningApi {
    let auth = AuthHeaders::bearer("test-token", "ops@x.com").unwrap();
    SigningApi::new(base_url, auth).unwrap()
}

/// An address nothing is listening on, for transport-failure tests.
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
