//! # filamentreload-network
//!
//! HTTP/WebSocket 네트워크 어댑터.
//! 플러그인 상태 REST 조회, 웹소켓 푸시 메시지 수신, API 키 세션 인증,
//! 원격 플러그인 설정 캐시를 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use filamentreload_network::auth::ApiKeyAuth;
//! use filamentreload_network::http_client::HttpStatusClient;
//! use filamentreload_network::ws_client::WsPushClient;
//! ```

pub mod auth;
pub mod http_client;
pub mod settings_client;
pub mod ws_client;
