//! 애플리케이션 설정 구조체.
//!
//! 호스트 서버 주소, API 키, 요청 타임아웃, 푸시 채널, 플러그인 설정을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::settings::CHECK_FREQ_KEY;
use crate::models::status::PLUGIN_ID;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 호스트 서버 연결 설정
    pub server: ServerConfig,
    /// 푸시 채널 설정
    #[serde(default)]
    pub push: PushConfig,
    /// 플러그인별 설정 (`plugins.<id>.<key>`).
    ///
    /// 형식 검증 없이 그대로 보관하고, 조회 시점에 해석한다.
    #[serde(default)]
    pub plugins: serde_json::Map<String, serde_json::Value>,
}

/// 호스트 서버 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 호스트 기본 URL (예: "http://octopi.local")
    pub base_url: String,
    /// `X-Api-Key` 헤더로 보낼 API 키
    #[serde(default)]
    pub api_key: Option<String>,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 푸시 재연결 최대 지연 (초)
    #[serde(default = "default_push_max_retry_secs")]
    pub push_max_retry_secs: u64,
}

/// 푸시 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// 웹소켓 푸시 수신 활성화
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        let mut plugin = serde_json::Map::new();
        plugin.insert(CHECK_FREQ_KEY.to_string(), serde_json::json!(5));

        let mut plugins = serde_json::Map::new();
        plugins.insert(PLUGIN_ID.to_string(), serde_json::Value::Object(plugin));

        Self {
            server: ServerConfig {
                base_url: "http://localhost:5000".to_string(),
                api_key: None,
                request_timeout_ms: default_request_timeout_ms(),
                push_max_retry_secs: default_push_max_retry_secs(),
            },
            push: PushConfig::default(),
            plugins,
        }
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// REST API 기본 경로 (`{base_url}/api`)
    pub fn api_base_url(&self) -> String {
        format!("{}/api", self.server.base_url.trim_end_matches('/'))
    }

    /// `plugins.<plugin_id>.<key>` 조회
    pub fn plugin_setting(&self, plugin_id: &str, key: &str) -> Option<&serde_json::Value> {
        self.plugins.get(plugin_id)?.get(key)
    }

}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_push_max_retry_secs() -> u64 {
    30
}
