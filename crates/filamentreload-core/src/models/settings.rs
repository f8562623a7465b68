//! 폴링 주기 설정 모델.

use std::time::Duration;

/// `check_freq` 설정 키
pub const CHECK_FREQ_KEY: &str = "check_freq";

/// 상태 폴링 주기 (초). 항상 양수.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckFrequency(u64);

impl CheckFrequency {
    /// 설정이 없거나 잘못됐을 때 사용하는 기본 주기 (5초)
    pub const DEFAULT: Self = Self(5);

    /// 양수일 때만 생성
    pub fn new(secs: u64) -> Option<Self> {
        (secs > 0).then_some(Self(secs))
    }

    /// 설정 값에서 주기를 해석한다.
    ///
    /// 양의 정수 또는 양의 정수 문자열만 유효. 그 외는 `None`.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(secs) = n.as_u64() {
                    return Self::new(secs);
                }
                let f = n.as_f64()?;
                if f.is_finite() && f >= 1.0 && f < u64::MAX as f64 {
                    Self::new(f.trunc() as u64)
                } else {
                    None
                }
            }
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok().and_then(Self::new),
            _ => None,
        }
    }

    pub fn secs(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for CheckFrequency {
    fn default() -> Self {
        Self::DEFAULT
    }
}
