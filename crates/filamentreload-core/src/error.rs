//! FilamentReload 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 `Result<_, CoreError>`를 반환한다.
//! 뷰모델은 이 에러를 호스트로 전파하지 않고 진단 정보로만 기록한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 인증 실패 (API 키 오류, 세션 만료 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "API", "Plugin")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 응답 본문이 기대한 형식이 아님
    #[error("잘못된 응답: {0}")]
    MalformedResponse(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_resource() {
        let err = CoreError::NotFound {
            resource_type: "Plugin".to_string(),
            id: "filamentreload".to_string(),
        };
        assert_eq!(err.to_string(), "Plugin 미발견: filamentreload");
    }

    #[test]
    fn serde_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: CoreError = parse.unwrap_err().into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
