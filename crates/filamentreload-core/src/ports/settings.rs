//! 설정/로그인 상태 포트.

use tokio::sync::watch;

/// 플러그인 설정 조회.
///
/// 경로가 없으면 `None`. 값의 형식 검증은 호출자가 한다.
pub trait SettingsProvider: Send + Sync {
    /// `plugins.<plugin_id>.<key>` 값 조회
    fn plugin_setting(&self, plugin_id: &str, key: &str) -> Option<serde_json::Value>;
}

/// 호스트 로그인 상태
pub trait LoginStateProvider: Send + Sync {
    /// 현재 로그인 여부
    fn is_logged_in(&self) -> bool;

    /// 로그인 상태 변경 수신기
    fn subscribe(&self) -> watch::Receiver<bool>;
}
