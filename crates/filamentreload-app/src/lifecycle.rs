//! 라이프사이클 관리.
//!
//! 종료 신호 전파, OS 시그널 핸들링 (SIGINT/SIGTERM → 종료, SIGHUP → 설정 재적용).

use std::io;
use tokio::sync::watch;
use tracing::info;

/// 수신한 OS 시그널의 의미
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// 종료 요청
    Shutdown,
    /// 설정 재적용 요청
    Reload,
}

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// OS 시그널 수신기 생성. 루프 밖에서 한 번 만들고 재사용한다.
    pub fn signals(&self) -> io::Result<SignalListener> {
        SignalListener::new()
    }
}

/// SIGINT/SIGTERM → 종료, SIGHUP → 설정 재적용.
///
/// 스트림을 한 번만 등록하므로 처리 중에 들어온 시그널도 다음 `recv`에서 받는다.
#[cfg(unix)]
pub struct SignalListener {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sighup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    /// 다음 시그널 대기
    pub async fn recv(&mut self) -> LifecycleSignal {
        tokio::select! {
            _ = self.sigint.recv() => {
                info!("SIGINT 수신");
                LifecycleSignal::Shutdown
            }
            _ = self.sigterm.recv() => {
                info!("SIGTERM 수신");
                LifecycleSignal::Shutdown
            }
            _ = self.sighup.recv() => {
                info!("SIGHUP 수신");
                LifecycleSignal::Reload
            }
        }
    }
}

/// Ctrl+C만 지원
#[cfg(not(unix))]
pub struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    fn new() -> io::Result<Self> {
        Ok(Self)
    }

    /// 다음 시그널 대기
    pub async fn recv(&mut self) -> LifecycleSignal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl+C 핸들러 에러: {e}");
        }
        info!("Ctrl+C 수신");
        LifecycleSignal::Shutdown
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
