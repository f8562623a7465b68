//! 필라멘트 센서 상태 뷰모델.
//!
//! 상태 코드 하나를 보관하고, HTTP 조회(pull)와 플러그인 메시지(push)로 갱신한다.
//! 값이 실제로 바뀔 때만 구독자와 프레젠터에 알린다.
//! 폴링 타이머는 뷰모델이 소유하며 동시에 하나만 존재한다.

use chrono::{DateTime, Utc};
use filamentreload_core::models::message::{status_update_value, StatusReport};
use filamentreload_core::models::settings::{CheckFrequency, CHECK_FREQ_KEY};
use filamentreload_core::models::status::{
    parse_status_value, SensorStatus, StatusDisplay, PLUGIN_ID,
};
use filamentreload_core::ports::presenter::StatusPresenter;
use filamentreload_core::ports::settings::SettingsProvider;
use filamentreload_core::ports::status_source::StatusSource;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 상태 조회 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 새 값으로 갱신됨
    Updated(SensorStatus),
    /// 응답은 정상이지만 값이 같거나 `status` 필드가 없음
    Unchanged,
    /// 전송/파싱 실패: 기존 값 유지
    Failed,
}

/// 조회 실패 진단 정보
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// 누적 실패 횟수
    pub failure_count: u64,
    /// 마지막 실패 사유
    pub last_failure: Option<String>,
    /// 마지막 상태 변경 시각
    pub last_change_at: Option<DateTime<Utc>>,
}

/// 반복 폴링 타이머.
///
/// 첫 조회는 한 주기 뒤에 일어난다. 드롭되면 타이머 태스크를 중단하지만
/// 이미 시작된 조회는 끝까지 진행된다.
pub struct PollingTimer {
    handle: JoinHandle<()>,
    frequency: CheckFrequency,
}

impl PollingTimer {
    fn spawn(view_model: Weak<StatusViewModel>, frequency: CheckFrequency) -> Self {
        let period = frequency.as_duration();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(vm) = view_model.upgrade() else {
                    break;
                };
                // 조회는 fire-and-forget: 이전 조회가 끝나지 않았어도 새로 보낸다
                tokio::spawn(async move {
                    vm.request_status().await;
                });
            }
        });

        Self { handle, frequency }
    }

    pub fn frequency(&self) -> CheckFrequency {
        self.frequency
    }
}

impl Drop for PollingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 필라멘트 센서 상태 뷰모델
pub struct StatusViewModel {
    status_source: Arc<dyn StatusSource>,
    settings: Arc<dyn SettingsProvider>,
    presenter: Arc<dyn StatusPresenter>,
    status_tx: watch::Sender<SensorStatus>,
    timer: Mutex<Option<PollingTimer>>,
    diagnostics: Mutex<Diagnostics>,
}

impl StatusViewModel {
    /// 새 뷰모델 생성. 초기 상태는 [`SensorStatus::DISABLED`].
    pub fn new(
        status_source: Arc<dyn StatusSource>,
        settings: Arc<dyn SettingsProvider>,
        presenter: Arc<dyn StatusPresenter>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SensorStatus::default());
        Self {
            status_source,
            settings,
            presenter,
            status_tx,
            timer: Mutex::new(None),
            diagnostics: Mutex::new(Diagnostics::default()),
        }
    }

    /// 현재 상태
    pub fn status(&self) -> SensorStatus {
        *self.status_tx.borrow()
    }

    /// 상태 변경 수신기 (값이 바뀔 때만 알림)
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<SensorStatus> {
        self.status_tx.subscribe()
    }

    pub fn icon_class(&self) -> &'static str {
        self.status().icon_class()
    }

    pub fn tooltip(&self) -> &'static str {
        self.status().tooltip()
    }

    pub fn display(&self) -> StatusDisplay {
        self.status().display()
    }

    #[cfg(test)]
    pub fn is_polling(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// 활성 타이머의 주기 (폴링 중이 아니면 `None`)
    #[cfg(test)]
    pub fn polling_frequency(&self) -> Option<CheckFrequency> {
        self.timer.lock().as_ref().map(PollingTimer::frequency)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.lock().clone()
    }

    /// 값이 다를 때만 상태를 바꾸고 프레젠터를 한 번 호출한다.
    ///
    /// 저장과 표시가 같은 잠금 안에서 일어나므로 동시에 들어온 갱신도
    /// 저장된 순서대로 표시된다.
    fn apply_status(&self, new_status: SensorStatus, via: &str) -> bool {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == new_status {
                return false;
            }
            *current = new_status;
            self.diagnostics.lock().last_change_at = Some(Utc::now());
            self.presenter.present(&new_status.display());
            true
        });

        if changed {
            info!("필라멘트 상태 갱신 ({via}): {new_status}");
        }
        changed
    }

    fn record_failure(&self, reason: String) {
        let mut diagnostics = self.diagnostics.lock();
        diagnostics.failure_count += 1;
        diagnostics.last_failure = Some(reason);
    }

    /// 푸시 채널로 받은 플러그인 메시지 처리.
    ///
    /// 다른 플러그인의 메시지, `status_update`가 아닌 메시지, 숫자로 읽을 수 없는
    /// 상태 값은 조용히 무시한다. 상태가 바뀌었으면 `true`.
    pub fn on_push_message(&self, source: &str, payload: &serde_json::Value) -> bool {
        if source != PLUGIN_ID {
            return false;
        }

        let Some(raw) = status_update_value(payload) else {
            return false;
        };

        match parse_status_value(raw) {
            Some(status) => self.apply_status(status, "plugin message"),
            None => {
                debug!("숫자가 아닌 상태 값 무시: {raw}");
                false
            }
        }
    }

    /// 상태 API 조회 후 반영.
    ///
    /// 실패해도 에러를 올리지 않는다. 로그와 진단 정보만 남기고 기존 값을 유지한다.
    pub async fn request_status(&self) -> RequestOutcome {
        let report = match self.status_source.fetch_status().await {
            Ok(report) => report,
            Err(e) => {
                warn!("필라멘트 센서 상태 조회 실패: {e}");
                self.record_failure(e.to_string());
                return RequestOutcome::Failed;
            }
        };

        self.apply_report(report)
    }

    fn apply_report(&self, report: StatusReport) -> RequestOutcome {
        let Some(raw) = report.status else {
            debug!("상태 응답에 status 필드 없음");
            return RequestOutcome::Unchanged;
        };

        match parse_status_value(&raw) {
            Some(status) if self.apply_status(status, "API") => RequestOutcome::Updated(status),
            Some(_) => RequestOutcome::Unchanged,
            None => {
                warn!("상태 응답의 status 값이 숫자가 아님: {raw}");
                self.record_failure(format!("잘못된 상태 값: {raw}"));
                RequestOutcome::Failed
            }
        }
    }

    /// 설정에서 폴링 주기를 읽는다. 없거나 잘못됐으면 기본값.
    pub fn check_frequency(&self) -> CheckFrequency {
        match self.settings.plugin_setting(PLUGIN_ID, CHECK_FREQ_KEY) {
            Some(value) => CheckFrequency::parse(&value).unwrap_or_else(|| {
                info!(
                    "check_freq 값을 읽을 수 없음 ({value}), 기본값 {}초 사용",
                    CheckFrequency::DEFAULT.secs()
                );
                CheckFrequency::DEFAULT
            }),
            None => {
                info!(
                    "check_freq 설정 없음, 기본값 {}초 사용",
                    CheckFrequency::DEFAULT.secs()
                );
                CheckFrequency::DEFAULT
            }
        }
    }

    /// 폴링 시작. 이미 폴링 중이면 no-op (`false`).
    pub fn start_polling(self: &Arc<Self>) -> bool {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return false;
        }

        let frequency = self.check_frequency();
        info!("필라멘트 센서 폴링 시작: {}초 간격", frequency.secs());
        *timer = Some(PollingTimer::spawn(Arc::downgrade(self), frequency));
        true
    }

    /// 폴링 중지. 폴링 중이 아니면 no-op (`false`).
    ///
    /// 이미 보낸 조회는 취소하지 않는다.
    pub fn stop_polling(&self) -> bool {
        let stopped = self.timer.lock().take();
        match stopped {
            Some(timer) => {
                info!("필라멘트 센서 폴링 중지 ({}초 간격)", timer.frequency().secs());
                true
            }
            None => false,
        }
    }

    // ── 호스트 라이프사이클 훅 ──

    /// UI 바인딩 직전: 즉시 조회
    pub async fn on_before_binding(&self) {
        info!("FilamentReload 초기화");
        self.request_status().await;
    }

    /// 호스트 시작 완료: 조회 후 폴링 시작
    pub async fn on_startup_complete(self: &Arc<Self>) {
        info!("시작 완료, 폴링 시작");
        self.request_status().await;
        self.start_polling();
    }

    /// 설정 화면 표시: 즉시 조회
    pub async fn on_settings_shown(&self) {
        self.request_status().await;
    }

    /// 설정 저장/닫힘: 새 주기로 폴링 재시작
    pub fn on_settings_hidden(self: &Arc<Self>) {
        self.stop_polling();
        self.start_polling();
    }

    /// 로그아웃: 폴링 중지
    pub fn on_user_logged_out(&self) {
        self.stop_polling();
    }
}
