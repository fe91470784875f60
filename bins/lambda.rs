//! AWS Lambda entry point.
//!
//! `lambda_http` turns API Gateway / ALB / function URL events into plain
//! `http::Request`s, so the same axum router serves both this binary and the
//! local server. There are no startup or shutdown hooks beyond building the
//! store client once before the first invocation.

use dotenvy::dotenv;
use lambda_http::{run, Error};
use tracing::{error, info};

async fn serve() -> Result<(), Error> {
    let cfg = configs::AppConfig::load_and_validate().map_err(|e| {
        error!(service = "lambda", event = "config_invalid", error = %e, "failed to load configuration");
        e
    })?;
    let app = server::startup::build_app(&cfg).await?;

    info!(
        service = "lambda",
        event = "start",
        version = env!("CARGO_PKG_VERSION"),
        backend = ?cfg.store.backend,
        table = %cfg.store.table_name,
        "lambda handler ready"
    );
    run(app).await
}

fn main() -> Result<(), Error> {
    dotenv().ok();
    // 路由按 "/" 与 "/set_string" 注册，去掉 API Gateway 的 stage 前缀；
    // 必须在运行时线程启动前写环境变量
    std::env::set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");
    common::utils::logging::init_logging_json();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(serve())
}
