pub mod assets;
pub mod proxy;
pub mod server;
pub mod upload;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::rewrite;
use crate::state::AppState;

/// Assemble the route table / 组装路由表
///
/// The host-rewrite middleware wraps only the backend-role `/api` routes.
/// The streaming proxy route stays outside it: proxied object bytes must
/// pass through untouched and unbuffered, whatever their content type.
/// 主机重写中间件仅包裹后端角色的 /api 路由。流式代理路由不在其内：
/// 代理的对象字节无论内容类型如何都必须原样、不缓冲地透传。
pub fn build_router(state: Arc<AppState>) -> Router {
    let backend = Router::new()
        .route("/api/health", get(server::health_check))
        .route(
            "/api/signed-storage-url",
            post(upload::create_signed_storage_url),
        )
        .route("/api/assets/:file", get(assets::asset_redirect))
        // JSON响应中的私有源地址重写为公开源地址
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rewrite::rewrite_response_hosts,
        ));

    Router::new()
        .merge(backend)
        .route("/assets/:file", get(proxy::asset_proxy))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
