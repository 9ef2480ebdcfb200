use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// GET /api/health - 健康检查 / Health check
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "signgate",
        "time": Utc::now().to_rfc3339(),
    }))
}
