//! The `POST /execute` endpoint: decodes `{ "script": "..." }`, runs it
//! against the shared [`Context`] under a single mutex (one script
//! execution at a time, per the single-writer design), and returns
//! `{ "output": "..." }`. Malformed JSON bodies yield 400.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::context::Context;
use crate::dispatcher;

pub type SharedContext = Arc<Mutex<Context>>;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub script: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub output: String,
}

pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/execute", post(execute))
        .with_state(ctx)
}

async fn execute(
    State(ctx): State<SharedContext>,
    body: Result<Json<ExecuteRequest>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!(error = %err, "malformed /execute body");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let output = {
        let mut ctx = ctx.lock().await;
        dispatcher::run_script(&mut ctx, &req.script)
    };

    (StatusCode::OK, Json(ExecuteResponse { output })).into_response()
}
