//! 상태 표시 포트.
//!
//! 구현: `filamentreload-app` crate (터미널 네비게이션 바)

use crate::models::status::StatusDisplay;

/// 상태 아이콘/툴팁 렌더러.
///
/// 상태 값이 바뀔 때마다 한 번 호출된다. 상태 저장과 같은 잠금 안에서 호출되므로
/// 구현체는 뷰모델 상태를 다시 읽으면 안 된다.
pub trait StatusPresenter: Send + Sync {
    fn present(&self, view: &StatusDisplay);
}
