//! 상태 소스 포트.
//!
//! 구현: `filamentreload-network` crate (reqwest, tokio-tungstenite)

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::models::message::{PluginMessage, StatusReport};

/// 상태 조회 (pull)
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// 현재 센서 상태 조회
    ///
    /// 전송 실패, 비정상 HTTP 상태, JSON 파싱 실패는 `Err`.
    async fn fetch_status(&self) -> Result<StatusReport, CoreError>;
}

/// 플러그인 푸시 메시지 수신 (push)
#[async_trait]
pub trait PushClient: Send + Sync {
    /// 푸시 채널에 연결하고 수신한 플러그인 메시지를 `tx`로 전달한다.
    ///
    /// 연결이 끊기면 재연결을 시도하며, `tx`가 닫히면 `Ok(())`로 반환한다.
    async fn connect(&self, tx: mpsc::Sender<PluginMessage>) -> Result<(), CoreError>;
}
