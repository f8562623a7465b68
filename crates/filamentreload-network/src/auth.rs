//! API 키 기반 세션 인증.
//!
//! 모든 요청에 `X-Api-Key` 헤더를 주입하고, passive 로그인으로 얻은
//! 사용자 세션을 웹소켓 인증과 로그인 상태 추적에 사용한다.

use filamentreload_core::error::CoreError;
use filamentreload_core::ports::settings::LoginStateProvider;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// API 키 헤더 이름
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// 서버 응답: passive 로그인
#[derive(Debug, Deserialize)]
struct LoginResponse {
    name: Option<String>,
    session: Option<String>,
}

/// 로그인된 사용자 세션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    /// 사용자 이름
    pub name: String,
    /// 세션 키 (웹소켓 인증용)
    pub session: String,
}

impl UserSession {
    /// 웹소켓 `auth` 메시지 페이로드 (`name:session`)
    pub fn socket_auth(&self) -> String {
        format!("{}:{}", self.name, self.session)
    }
}

/// API 키 인증 관리자: 헤더 주입/세션 로그인/로그아웃
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    session: Arc<RwLock<Option<UserSession>>>,
    logged_in_tx: Arc<watch::Sender<bool>>,
}

impl ApiKeyAuth {
    /// 새 인증 관리자 생성
    pub fn new(api_base_url: &str, api_key: Option<&str>) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
            client: reqwest::Client::new(),
            session: Arc::new(RwLock::new(None)),
            logged_in_tx: Arc::new(tx),
        }
    }

    /// API 키 헤더 주입 (키가 없으면 그대로)
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }

    /// API 키 설정 여부
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// passive 로그인 → 사용자 세션 획득
    pub async fn login(&self) -> Result<UserSession, CoreError> {
        let url = format!("{}/login", self.api_base_url);
        let body = serde_json::json!({ "passive": true });

        let resp = self
            .apply(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("로그인 요청 실패: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CoreError::Auth(format!("로그인 실패 ({status}): {text}")));
        }

        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Auth(format!("로그인 응답 파싱 실패: {e}")))?;

        let (Some(name), Some(session)) = (login.name, login.session) else {
            return Err(CoreError::Auth("로그인 응답에 사용자 세션 없음".to_string()));
        };

        let user = UserSession { name, session };
        *self.session.write() = Some(user.clone());
        self.set_logged_in(true);

        info!("로그인 성공: user={}", user.name);
        Ok(user)
    }

    /// 로그아웃. 세션이 없으면 no-op.
    ///
    /// 서버 요청이 실패해도 로컬 세션은 정리한다.
    pub async fn logout(&self) -> Result<(), CoreError> {
        let taken = self.session.write().take();
        let Some(user) = taken else {
            return Ok(());
        };

        let url = format!("{}/logout", self.api_base_url);
        match self.apply(self.client.post(&url)).send().await {
            Ok(resp) if resp.status().is_success() => debug!("로그아웃 완료: user={}", user.name),
            Ok(resp) => warn!("로그아웃 응답 비정상: {}", resp.status()),
            Err(e) => warn!("로그아웃 요청 실패: {e}"),
        }

        self.set_logged_in(false);
        Ok(())
    }

    /// 서버 쪽에서 끝난 세션을 로컬에서 정리한다 (서버 요청 없음).
    ///
    /// `user`가 있으면 현재 세션 사용자와 같을 때만 정리한다. 정리했으면 `true`.
    pub fn invalidate_session(&self, user: Option<&str>) -> bool {
        let taken = {
            let mut session = self.session.write();
            let matches = match (session.as_ref(), user) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(current), Some(name)) => current.name == name,
            };
            if !matches {
                return false;
            }
            session.take()
        };

        if let Some(user) = taken {
            info!("세션 종료됨: user={}", user.name);
        }
        self.set_logged_in(false);
        true
    }

    /// 현재 세션 (로그인 전이면 `None`)
    pub fn session(&self) -> Option<UserSession> {
        self.session.read().clone()
    }

    fn set_logged_in(&self, logged_in: bool) {
        self.logged_in_tx.send_if_modified(|current| {
            if *current == logged_in {
                return false;
            }
            *current = logged_in;
            true
        });
    }
}

impl LoginStateProvider for ApiKeyAuth {
    fn is_logged_in(&self) -> bool {
        *self.logged_in_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.logged_in_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_ignored() {
        let auth = ApiKeyAuth::new("http://localhost:5000/api/", Some(""));
        assert!(!auth.has_api_key());
        assert_eq!(auth.api_base_url, "http://localhost:5000/api");
    }

    #[test]
    fn socket_auth_format() {
        let user = UserSession {
            name: "pi".to_string(),
            session: "abc123".to_string(),
        };
        assert_eq!(user.socket_auth(), "pi:abc123");
    }

    #[test]
    fn logout_without_login_is_noop() {
        let auth = ApiKeyAuth::new("http://localhost:9999/api", Some("key"));
        let result = tokio_test::block_on(auth.logout());
        assert!(result.is_ok());
        assert!(!auth.is_logged_in());
    }

    #[tokio::test]
    async fn login_sends_api_key_and_tracks_state() {
        let mut server = mockito::Server::new_async().await;
        let login_mock = server
            .mock("POST", "/api/login")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"pi","session":"sess_1","admin":true}"#)
            .create_async()
            .await;
        let logout_mock = server
            .mock("POST", "/api/logout")
            .with_status(204)
            .create_async()
            .await;

        let auth = ApiKeyAuth::new(&format!("{}/api", server.url()), Some("secret"));
        let mut rx = auth.subscribe();

        let user = auth.login().await.unwrap();
        assert_eq!(user.name, "pi");
        assert!(auth.is_logged_in());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        auth.logout().await.unwrap();
        assert!(!auth.is_logged_in());
        assert!(auth.session().is_none());
        assert!(rx.has_changed().unwrap());

        login_mock.assert_async().await;
        logout_mock.assert_async().await;
    }

    #[tokio::test]
    async fn login_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/login")
            .with_status(403)
            .with_body("Forbidden")
            .create_async()
            .await;

        let auth = ApiKeyAuth::new(&format!("{}/api", server.url()), Some("wrong"));
        let result = auth.login().await;
        assert!(matches!(result, Err(CoreError::Auth(_))));
        assert!(!auth.is_logged_in());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn login_without_session_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":null}"#)
            .create_async()
            .await;

        let auth = ApiKeyAuth::new(&format!("{}/api", server.url()), None);
        let err = auth.login().await.unwrap_err();
        assert!(err.to_string().contains("인증"));
    }

    async fn logged_in(server: &mut mockito::ServerGuard) -> ApiKeyAuth {
        server
            .mock("POST", "/api/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"pi","session":"sess_1"}"#)
            .create_async()
            .await;
        let auth = ApiKeyAuth::new(&format!("{}/api", server.url()), Some("secret"));
        auth.login().await.unwrap();
        auth
    }

    #[tokio::test]
    async fn invalidate_session_for_other_user_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;

        assert!(!auth.invalidate_session(Some("someone_else")));
        assert!(auth.is_logged_in());

        assert!(auth.invalidate_session(Some("pi")));
        assert!(!auth.is_logged_in());
        assert!(auth.session().is_none());

        // 세션이 없으면 no-op
        assert!(!auth.invalidate_session(None));
    }
}
