use std::net::SocketAddr;

use configs::{AppConfig, StoreBackend};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let mut cfg = AppConfig::default();
    cfg.store.backend = StoreBackend::Memory;
    let app = server::startup::build_app(&cfg).await?;

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

#[tokio::test]
async fn e2e_put_then_get() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    // nothing saved yet
    let res = c.get(format!("{}/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    let res = c.put(format!("{}/set_string", app.base_url))
        .json(&json!({"saved-string": "hello"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body, json!({"saved-string": "hello"}));

    let res = c.get(format!("{}/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.text().await?, "<h1>The saved string is hello</h1>");

    let res = c.put(format!("{}/set_string", app.base_url))
        .json(&json!({}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}
