//! HTTP 상태 조회 클라이언트.
//!
//! `StatusSource` 포트 구현. `GET {api}/plugin/<id>/status`.
//! 재시도하지 않는다. 실패한 조회는 다음 폴링 주기가 대신한다.

use async_trait::async_trait;
use filamentreload_core::error::CoreError;
use filamentreload_core::models::message::StatusReport;
use filamentreload_core::models::status::PLUGIN_ID;
use filamentreload_core::ports::status_source::StatusSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::ApiKeyAuth;

/// 응답 상태 코드 확인 및 에러 매핑
pub(crate) async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, CoreError> {
    let status = resp.status();

    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_else(|e| {
        tracing::warn!("응답 본문 읽기 실패: {e}");
        String::new()
    });

    match status.as_u16() {
        401 | 403 => Err(CoreError::Auth(format!("인증 실패 ({status}): {text}"))),
        404 => Err(CoreError::NotFound {
            resource_type: "API".to_string(),
            id: text,
        }),
        503 => Err(CoreError::ServiceUnavailable(text)),
        _ => Err(CoreError::Internal(format!("API 에러 ({status}): {text}"))),
    }
}

/// 플러그인 상태 API 클라이언트: `StatusSource` 포트 구현
pub struct HttpStatusClient {
    client: reqwest::Client,
    status_url: String,
    auth: Arc<ApiKeyAuth>,
}

impl HttpStatusClient {
    /// 새 상태 클라이언트 생성
    ///
    /// `api_base_url`은 REST API 기본 경로 (예: `http://octopi.local/api`).
    pub fn new(
        api_base_url: &str,
        auth: Arc<ApiKeyAuth>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self {
            client,
            status_url: format!(
                "{}/plugin/{}/status",
                api_base_url.trim_end_matches('/'),
                PLUGIN_ID
            ),
            auth,
        })
    }

    /// 상태 엔드포인트 URL
    pub fn status_url(&self) -> &str {
        &self.status_url
    }
}

#[async_trait]
impl StatusSource for HttpStatusClient {
    async fn fetch_status(&self) -> Result<StatusReport, CoreError> {
        debug!("상태 조회 요청: {}", self.status_url);

        let resp = self
            .auth
            .apply(self.client.get(&self.status_url))
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("상태 조회 요청 실패: {e}")))?;

        let resp = match check_response(resp).await {
            Ok(resp) => resp,
            Err(e @ CoreError::Auth(_)) => {
                // 인증이 거부되면 로그인 세션도 끝난 것으로 본다
                if self.auth.invalidate_session(None) {
                    warn!("상태 조회 인증 거부, 세션 종료: {e}");
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let report: StatusReport = resp
            .json()
            .await
            .map_err(|e| CoreError::MalformedResponse(format!("상태 응답 파싱 실패: {e}")))?;

        debug!("상태 조회 성공: {:?}", report.status);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filamentreload_core::ports::settings::LoginStateProvider;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> HttpStatusClient {
        let api = format!("{}/api", server.url());
        let auth = Arc::new(ApiKeyAuth::new(&api, Some("secret")));
        HttpStatusClient::new(&api, auth, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn status_url_is_plugin_scoped() {
        let auth = Arc::new(ApiKeyAuth::new("http://localhost:5000/api", None));
        let client =
            HttpStatusClient::new("http://localhost:5000/api/", auth, Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.status_url(),
            "http://localhost:5000/api/plugin/filamentreload/status"
        );
    }

    #[tokio::test]
    async fn fetch_status_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/plugin/filamentreload/status")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": 0}"#)
            .create_async()
            .await;

        let report = client_for(&server).fetch_status().await.unwrap();
        assert_eq!(report.status, Some(json!(0)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_status_without_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugin/filamentreload/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"enabled": false}"#)
            .create_async()
            .await;

        let report = client_for(&server).fetch_status().await.unwrap();
        assert!(report.status.is_none());
    }

    #[tokio::test]
    async fn fetch_status_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugin/filamentreload/status")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = client_for(&server).fetch_status().await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn fetch_status_error_codes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugin/filamentreload/status")
            .with_status(403)
            .with_body("Forbidden")
            .create_async()
            .await;

        let err = client_for(&server).fetch_status().await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(_)));

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugin/filamentreload/status")
            .with_status(503)
            .create_async()
            .await;

        let err = client_for(&server).fetch_status().await.unwrap_err();
        assert!(matches!(err, CoreError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn fetch_status_connection_refused() {
        let auth = Arc::new(ApiKeyAuth::new("http://127.0.0.1:1/api", None));
        let client =
            HttpStatusClient::new("http://127.0.0.1:1/api", auth, Duration::from_secs(2)).unwrap();
        let err = client.fetch_status().await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }

    #[tokio::test]
    async fn rejected_status_request_ends_session() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/api/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"pi","session":"sess_1"}"#)
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/api/plugin/filamentreload/status")
            .with_status(403)
            .create_async()
            .await;

        let api = format!("{}/api", server.url());
        let auth = Arc::new(ApiKeyAuth::new(&api, Some("secret")));
        auth.login().await.unwrap();
        assert!(auth.is_logged_in());

        let client = HttpStatusClient::new(&api, auth.clone(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_status().await.unwrap_err();

        assert!(matches!(err, CoreError::Auth(_)));
        assert!(!auth.is_logged_in());
        assert!(auth.session().is_none());
    }
}
