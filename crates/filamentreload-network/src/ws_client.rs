//! 웹소켓 푸시 클라이언트.
//!
//! `PushClient` 포트 구현. 호스트의 raw 웹소켓(`/sockjs/websocket`)에 연결해
//! `{"plugin": {"plugin": <id>, "data": {...}}}` 프레임만 골라 전달한다.
//! `UserLoggedOut` 이벤트 프레임은 로컬 세션을 끝낸다.
//! 연결이 끊기면 exponential backoff로 재연결.

use async_trait::async_trait;
use filamentreload_core::error::CoreError;
use filamentreload_core::models::message::PluginMessage;
use filamentreload_core::ports::status_source::PushClient;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::auth::ApiKeyAuth;

/// raw 웹소켓 경로
const SOCKET_PATH: &str = "/sockjs/websocket";

/// 로그아웃 이벤트 이름
const USER_LOGGED_OUT_EVENT: &str = "UserLoggedOut";

/// 관심 있는 수신 프레임
#[derive(Debug, PartialEq)]
enum SocketFrame {
    /// 플러그인 메시지
    Plugin(PluginMessage),
    /// 사용자 로그아웃 이벤트 (페이로드의 사용자 이름)
    UserLoggedOut(Option<String>),
}

/// 웹소켓 푸시 클라이언트: `PushClient` 포트 구현
pub struct WsPushClient {
    socket_url: String,
    auth: Arc<ApiKeyAuth>,
    max_retry_secs: u64,
}

impl WsPushClient {
    /// 새 푸시 클라이언트 생성
    ///
    /// `base_url`은 호스트 기본 URL (`http(s)://...`). 스킴은 `ws(s)`로 바꾼다.
    pub fn new(
        base_url: &str,
        auth: Arc<ApiKeyAuth>,
        max_retry_secs: u64,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            socket_url: Self::socket_url(base_url)?,
            auth,
            max_retry_secs: max_retry_secs.max(1),
        })
    }

    /// 기본 URL에서 웹소켓 URL 생성
    pub fn socket_url(base_url: &str) -> Result<String, CoreError> {
        let mut url = url::Url::parse(base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 서버 URL '{base_url}': {e}")))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(CoreError::Config(format!(
                    "지원하지 않는 URL 스킴: {other}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| CoreError::Config(format!("URL 스킴 변경 실패: {base_url}")))?;

        let path = format!("{}{}", url.path().trim_end_matches('/'), SOCKET_PATH);
        url.set_path(&path);
        url.set_query(None);
        Ok(url.to_string())
    }

    /// 텍스트 프레임 파싱.
    ///
    /// 플러그인 메시지와 `UserLoggedOut` 이벤트 외의 프레임
    /// (connected, current, history, 다른 event 등)은 `None`.
    fn parse_frame(text: &str) -> Option<SocketFrame> {
        let frame: serde_json::Value = serde_json::from_str(text).ok()?;

        if let Some(plugin) = frame.get("plugin") {
            return serde_json::from_value(plugin.clone())
                .ok()
                .map(SocketFrame::Plugin);
        }

        let event = frame.get("event")?;
        if event.get("type")?.as_str()? != USER_LOGGED_OUT_EVENT {
            return None;
        }
        let username = event
            .get("payload")
            .and_then(|p| p.get("username"))
            .and_then(|u| u.as_str())
            .map(str::to_string);
        Some(SocketFrame::UserLoggedOut(username))
    }

    /// 웹소켓 `auth` 메시지에 쓸 세션 값
    async fn socket_auth(&self) -> Option<String> {
        if self.auth.has_api_key() {
            match self.auth.login().await {
                Ok(user) => return Some(user.socket_auth()),
                Err(e) => warn!("웹소켓 세션 로그인 실패: {e}"),
            }
        }
        self.auth.session().map(|user| user.socket_auth())
    }
}

#[async_trait]
impl PushClient for WsPushClient {
    async fn connect(&self, tx: mpsc::Sender<PluginMessage>) -> Result<(), CoreError> {
        info!("푸시 채널 연결 시작: {}", self.socket_url);

        let mut retry_delay = 1u64;

        loop {
            match tokio_tungstenite::connect_async(self.socket_url.as_str()).await {
                Ok((ws_stream, _)) => {
                    debug!("웹소켓 연결 수립됨");
                    retry_delay = 1;

                    let (mut write, mut read) = ws_stream.split();

                    if let Some(auth) = self.socket_auth().await {
                        let msg = serde_json::json!({ "auth": auth }).to_string();
                        if let Err(e) = write.send(Message::Text(msg.into())).await {
                            warn!("웹소켓 인증 메시지 전송 실패: {e}");
                        }
                    }

                    loop {
                        tokio::select! {
                            _ = tx.closed() => {
                                info!("푸시 메시지 채널 닫힘, 연결 종료");
                                let _ = write.send(Message::Close(None)).await;
                                return Ok(());
                            }
                            msg = read.next() => match msg {
                                Some(Ok(Message::Text(text))) => match Self::parse_frame(text.as_str()) {
                                    Some(SocketFrame::Plugin(message)) => {
                                        if tx.send(message).await.is_err() {
                                            info!("푸시 메시지 채널 닫힘, 연결 종료");
                                            return Ok(());
                                        }
                                    }
                                    Some(SocketFrame::UserLoggedOut(user)) => {
                                        if self.auth.invalidate_session(user.as_deref()) {
                                            info!("호스트 로그아웃 이벤트 수신");
                                        }
                                    }
                                    None => {}
                                },
                                Some(Ok(Message::Close(_))) | None => {
                                    info!("웹소켓 스트림 종료");
                                    break;
                                }
                                Some(Ok(_)) => {} // Ping/Pong/Binary 무시
                                Some(Err(e)) => {
                                    warn!("웹소켓 수신 에러: {e}");
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(e) => warn!("웹소켓 연결 실패: {e}"),
            }

            if tx.is_closed() {
                return Ok(());
            }

            // exponential backoff 재연결
            warn!("푸시 채널 재연결 대기: {retry_delay}초");
            tokio::time::sleep(Duration::from_secs(retry_delay)).await;
            retry_delay = (retry_delay * 2).min(self.max_retry_secs);
        }
    }
}
