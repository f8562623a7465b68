//! 호스트 라이프사이클 디스패처.
//!
//! 호스트 이벤트(바인딩 직전, 시작 완료, 설정 표시/숨김, 로그아웃)와
//! 푸시 메시지를 뷰모델 훅으로 연결한다.

use filamentreload_core::models::message::PluginMessage;
use filamentreload_core::ports::settings::LoginStateProvider;
use filamentreload_network::settings_client::RemoteSettings;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::event_bus::{AppEvent, EventBus};
use crate::view_model::StatusViewModel;

/// 호스트 라이프사이클 훅
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostHook {
    BeforeBinding,
    StartupComplete,
    SettingsShown,
    SettingsHidden,
    UserLoggedOut,
}

/// 훅 → 뷰모델 디스패처
pub struct HostDispatcher {
    view_model: Arc<StatusViewModel>,
    remote_settings: Option<Arc<RemoteSettings>>,
}

impl HostDispatcher {
    pub fn new(view_model: Arc<StatusViewModel>) -> Self {
        Self {
            view_model,
            remote_settings: None,
        }
    }

    /// 설정 숨김 시 먼저 갱신할 원격 설정
    pub fn with_remote_settings(mut self, remote_settings: Arc<RemoteSettings>) -> Self {
        self.remote_settings = Some(remote_settings);
        self
    }

    /// 훅 하나 처리
    pub async fn dispatch(&self, hook: HostHook) {
        debug!("호스트 훅: {hook:?}");
        match hook {
            HostHook::BeforeBinding => self.view_model.on_before_binding().await,
            HostHook::StartupComplete => self.view_model.on_startup_complete().await,
            HostHook::SettingsShown => self.view_model.on_settings_shown().await,
            HostHook::SettingsHidden => {
                if let Some(remote) = &self.remote_settings {
                    if let Err(e) = remote.refresh().await {
                        warn!("원격 설정 갱신 실패, 캐시된 값 사용: {e}");
                    }
                }
                self.view_model.on_settings_hidden();
            }
            HostHook::UserLoggedOut => self.view_model.on_user_logged_out(),
        }
    }

    /// 푸시 메시지 처리
    pub fn handle_push(&self, message: &PluginMessage) -> bool {
        self.view_model
            .on_push_message(&message.source, &message.payload)
    }

    /// 이벤트 루프. 종료 신호 또는 버스 닫힘까지 실행.
    pub async fn run(
        &self,
        mut rx: broadcast::Receiver<AppEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("호스트 디스패처 시작");

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Ok(AppEvent::Host(hook)) => self.dispatch(hook).await,
                    Ok(AppEvent::PushMessage(message)) => {
                        self.handle_push(&message);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("이벤트 {n}개 유실");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("호스트 디스패처 종료");
    }
}

/// 로그인 → 로그아웃 전환을 `UserLoggedOut` 훅으로 발행하는 태스크
pub fn spawn_login_watcher(
    login: Arc<dyn LoginStateProvider>,
    bus: Arc<EventBus>,
) -> JoinHandle<()> {
    let mut rx = login.subscribe();
    let mut logged_in = *rx.borrow_and_update();

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let now = *rx.borrow_and_update();
            if logged_in && !now {
                info!("사용자 로그아웃 감지");
                bus.publish(AppEvent::Host(HostHook::UserLoggedOut));
            }
            logged_in = now;
        }
    })
}
