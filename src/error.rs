//! Gateway error taxonomy / 网关错误分类
//!
//! Errors crossing the HTTP boundary. Bodies are short and textual and never
//! contain signed URLs, credentials, or internal header values.
//! 跨越HTTP边界的错误。响应体简短纯文本，绝不包含签名URL、凭证或内部请求头值。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced by the gateway routes / 网关路由暴露的错误
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad request: asset identifier missing / 请求缺少资产标识符
    #[error("Missing asset filename")]
    MissingFilename,

    /// Fatal misconfiguration, named knob only / 致命配置缺失，仅指明配置项
    #[error("{0} not configured")]
    Configuration(&'static str),

    /// Presigned URL computation failed / 预签名URL计算失败
    #[error("Failed to presign storage URL")]
    Signing,

    /// Network failure reaching the backend / 无法连接后端
    #[error("Failed to reach backend: {0}")]
    BackendUnreachable(String),

    /// Backend responded 3xx without a Location header / 后端3xx响应缺少Location头
    #[error("Backend did not provide Location for redirect")]
    NoRedirectTarget,

    /// Network failure reaching the object store / 无法连接对象存储
    #[error("Failed to fetch asset: {0}")]
    AssetUnreachable(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingFilename => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) | GatewayError::Signing => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::BackendUnreachable(_)
            | GatewayError::NoRedirectTarget
            | GatewayError::AssetUnreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::MissingFilename.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::Configuration("private_api_base").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(GatewayError::Signing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            GatewayError::BackendUnreachable("connection refused".to_string()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(GatewayError::NoRedirectTarget.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GatewayError::AssetUnreachable("timed out".to_string()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_messages_are_short_and_name_no_urls() {
        let err = GatewayError::Configuration("private_api_base");
        assert_eq!(err.to_string(), "private_api_base not configured");

        let err = GatewayError::NoRedirectTarget;
        assert_eq!(err.to_string(), "Backend did not provide Location for redirect");
    }
}
