//! 도메인 모델.

pub mod message;
pub mod settings;
pub mod status;
