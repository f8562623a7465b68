//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `filamentreload-network`가 네트워크 포트를 구현하며,
//! `filamentreload-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 모든 async trait은 `async_trait` 매크로를 사용하여
//! object safety를 보장한다.

pub mod presenter;
pub mod settings;
pub mod status_source;
