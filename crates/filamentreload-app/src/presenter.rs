//! 터미널 네비게이션 바 프레젠터.
//!
//! `StatusPresenter` 포트 구현. 상태가 바뀔 때마다 네비게이션 바 요소 한 줄을 출력한다.

use filamentreload_core::models::status::{StatusDisplay, NAVBAR_ELEMENT_ID};
use filamentreload_core::ports::presenter::StatusPresenter;
use parking_lot::Mutex;
use std::io::Write;
use tracing::{info, warn};

/// 네비게이션 바 한 줄 렌더링
pub fn render_navbar(view: &StatusDisplay) -> String {
    format!("{NAVBAR_ELEMENT_ID} [{}] {}", view.icon_class, view.tooltip)
}

/// 터미널 출력 프레젠터
pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalPresenter {
    /// 표준 출력 프레젠터
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl StatusPresenter for TerminalPresenter {
    fn present(&self, view: &StatusDisplay) {
        let line = render_navbar(view);
        info!(
            status = view.status.code(),
            icon = view.icon_class,
            "필라멘트 상태 표시"
        );

        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!("상태 출력 실패: {e}");
        }
    }
}
