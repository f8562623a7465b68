//! 내부 이벤트 버스.
//!
//! `tokio::broadcast` 기반 내부 이벤트 라우팅.
//! 호스트 라이프사이클 훅과 푸시 메시지를 하나의 순서로 디스패처에 전달한다.

use filamentreload_core::models::message::PluginMessage;
use tokio::sync::broadcast;
use tracing::debug;

use crate::host::HostHook;

/// 내부 앱 이벤트
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// 호스트 라이프사이클 훅
    Host(HostHook),
    /// 푸시 채널 플러그인 메시지
    PushMessage(PluginMessage),
}

/// 내부 이벤트 버스
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행
    pub fn publish(&self, event: AppEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
