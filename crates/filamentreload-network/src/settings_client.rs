//! 원격 플러그인 설정 클라이언트.
//!
//! `GET {api}/settings`의 `plugins` 섹션을 캐시하고 `SettingsProvider`로 노출한다.
//! 캐시에 없는 값은 로컬 설정으로 위임한다.

use filamentreload_core::error::CoreError;
use filamentreload_core::ports::settings::SettingsProvider;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::auth::ApiKeyAuth;
use crate::http_client::check_response;

/// 원격 설정 캐시: `SettingsProvider` 포트 구현
pub struct RemoteSettings {
    client: reqwest::Client,
    settings_url: String,
    auth: Arc<ApiKeyAuth>,
    plugins: RwLock<serde_json::Map<String, serde_json::Value>>,
    fallback: Option<Arc<dyn SettingsProvider>>,
}

impl RemoteSettings {
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
            settings_url: format!("{}/settings", api_base_url.trim_end_matches('/')),
            auth,
            plugins: RwLock::new(serde_json::Map::new()),
            fallback: None,
        })
    }

    /// 캐시 미스 시 사용할 로컬 설정
    pub fn with_fallback(mut self, fallback: Arc<dyn SettingsProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// 서버에서 플러그인 설정을 다시 읽어 캐시를 교체한다.
    ///
    /// 실패하면 기존 캐시를 유지한다.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let resp = self
            .auth
            .apply(self.client.get(&self.settings_url))
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("설정 조회 요청 실패: {e}")))?;

        let resp = check_response(resp).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CoreError::MalformedResponse(format!("설정 응답 파싱 실패: {e}")))?;

        let plugins = match body.get("plugins") {
            Some(serde_json::Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(CoreError::MalformedResponse(
                    "settings.plugins가 객체가 아님".to_string(),
                ))
            }
            None => serde_json::Map::new(),
        };

        debug!("원격 플러그인 설정 갱신: {}개 플러그인", plugins.len());
        *self.plugins.write() = plugins;
        Ok(())
    }
}

impl SettingsProvider for RemoteSettings {
    fn plugin_setting(&self, plugin_id: &str, key: &str) -> Option<serde_json::Value> {
        let cached = self
            .plugins
            .read()
            .get(plugin_id)
            .and_then(|plugin| plugin.get(key))
            .cloned();

        cached.or_else(|| {
            self.fallback
                .as_ref()
                .and_then(|fallback| fallback.plugin_setting(plugin_id, key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSettings(serde_json::Value);

    impl SettingsProvider for FixedSettings {
        fn plugin_setting(&self, _plugin_id: &str, key: &str) -> Option<serde_json::Value> {
            self.0.get(key).cloned()
        }
    }

    fn remote_for(server: &mockito::ServerGuard) -> RemoteSettings {
        let api = format!("{}/api", server.url());
        let auth = Arc::new(ApiKeyAuth::new(&api, Some("secret")));
        RemoteSettings::new(&api, auth, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn refresh_reads_plugin_section() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/settings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"api": {"allowCrossOrigin": false},
                    "plugins": {"filamentreload": {"check_freq": 10, "pin": 17}}}"#,
            )
            .create_async()
            .await;

        let remote = remote_for(&server);
        assert!(remote.plugin_setting("filamentreload", "check_freq").is_none());

        remote.refresh().await.unwrap();
        assert_eq!(remote.plugin_setting("filamentreload", "check_freq"), Some(json!(10)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn falls_back_to_local_settings() {
        let server = mockito::Server::new_async().await;
        let remote = remote_for(&server)
            .with_fallback(Arc::new(FixedSettings(json!({"check_freq": 7}))));

        assert_eq!(remote.plugin_setting("filamentreload", "check_freq"), Some(json!(7)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_cache() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/api/settings")
            .with_status(200)
            .with_body(r#"{"plugins": {"filamentreload": {"check_freq": 12}}}"#)
            .expect(1)
            .create_async()
            .await;

        let remote = remote_for(&server);
        remote.refresh().await.unwrap();
        ok.assert_async().await;
        ok.remove_async().await;

        let _fail = server
            .mock("GET", "/api/settings")
            .with_status(500)
            .create_async()
            .await;

        assert!(remote.refresh().await.is_err());
        assert_eq!(remote.plugin_setting("filamentreload", "check_freq"), Some(json!(12)));
    }
}
