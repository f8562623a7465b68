//! 필라멘트 센서 상태 모델.
//!
//! 백엔드가 보고하는 정수 상태 코드와, 그것을 네비게이션 바 아이콘으로
//! 표시하기 위한 CSS 클래스/툴팁 매핑을 정의한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 플러그인 식별자 (푸시 채널 스코프, 설정 네임스페이스, API 경로에 공통 사용)
pub const PLUGIN_ID: &str = "filamentreload";

/// 아이콘/툴팁이 마운트되는 네비게이션 바 요소
pub const NAVBAR_ELEMENT_ID: &str = "#navbar_plugin_filamentreload";

/// 센서 비활성 아이콘 클래스
pub const ICON_DISABLED: &str = "icon-disabled";
/// 필라멘트 없음 아이콘 클래스
pub const ICON_NO_FILAMENT: &str = "icon-no-filament";
/// 필라멘트 감지 아이콘 클래스
pub const ICON_FILAMENT_OK: &str = "icon-filament-ok";

/// 센서 상태 코드.
///
/// `-1`은 센서 비활성, `0`은 필라멘트 없음, 그 외 값은 필라멘트 감지로 취급한다.
/// 첫 조회가 성공하기 전까지는 [`SensorStatus::DISABLED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorStatus(i64);

impl SensorStatus {
    pub const DISABLED: Self = Self(-1);
    pub const NO_FILAMENT: Self = Self(0);
    pub const FILAMENT_PRESENT: Self = Self(1);

    pub fn new(code: i64) -> Self {
        Self(code)
    }

    /// 원시 상태 코드
    pub fn code(self) -> i64 {
        self.0
    }

    /// 표시 버킷 (세 가지 중 하나)
    pub fn bucket(self) -> StatusBucket {
        match self.0 {
            -1 => StatusBucket::Disabled,
            0 => StatusBucket::NoFilament,
            _ => StatusBucket::FilamentPresent,
        }
    }

    pub fn icon_class(self) -> &'static str {
        self.bucket().icon_class()
    }

    pub fn tooltip(self) -> &'static str {
        self.bucket().tooltip()
    }

    pub fn display(self) -> StatusDisplay {
        StatusDisplay {
            status: self,
            icon_class: self.icon_class(),
            tooltip: self.tooltip(),
        }
    }
}

impl Default for SensorStatus {
    fn default() -> Self {
        Self::DISABLED
    }
}

impl From<i64> for SensorStatus {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 상태 코드의 표시 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    /// 센서 비활성 (-1)
    Disabled,
    /// 필라멘트 없음 (0)
    NoFilament,
    /// 필라멘트 감지 (그 외)
    FilamentPresent,
}

impl StatusBucket {
    pub fn icon_class(self) -> &'static str {
        match self {
            StatusBucket::Disabled => ICON_DISABLED,
            StatusBucket::NoFilament => ICON_NO_FILAMENT,
            StatusBucket::FilamentPresent => ICON_FILAMENT_OK,
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            StatusBucket::Disabled => "Filament Sensor Disabled",
            StatusBucket::NoFilament => "No Filament Detected",
            StatusBucket::FilamentPresent => "Filament Detected",
        }
    }
}

/// 상태에서 파생된 표시 값 (아이콘 클래스 + 툴팁)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub status: SensorStatus,
    pub icon_class: &'static str,
    pub tooltip: &'static str,
}

/// JSON 값에서 상태 코드를 파싱한다.
///
/// 정수, 실수(소수부 버림), 정수로 시작하는 문자열(`"1"`, `" -1 "`, `"0abc"`)을 허용한다.
/// 숫자로 해석할 수 없으면 `None`.
pub fn parse_status_value(value: &serde_json::Value) -> Option<SensorStatus> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(code) = n.as_i64() {
                return Some(SensorStatus(code));
            }
            let f = n.as_f64()?;
            if f.is_finite() && f.abs() < i64::MAX as f64 {
                Some(SensorStatus(f.trunc() as i64))
            } else {
                None
            }
        }
        serde_json::Value::String(s) => parse_leading_int(s).map(SensorStatus),
        _ => None,
    }
}

/// 앞쪽 공백과 부호를 허용하고, 첫 숫자가 아닌 문자에서 멈춘다.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_disabled() {
        assert_eq!(SensorStatus::default(), SensorStatus::DISABLED);
        assert_eq!(SensorStatus::default().code(), -1);
    }

    #[test]
    fn display_mapping_covers_all_buckets() {
        let cases = [
            (-1, "icon-disabled", "Filament Sensor Disabled"),
            (0, "icon-no-filament", "No Filament Detected"),
            (1, "icon-filament-ok", "Filament Detected"),
            (7, "icon-filament-ok", "Filament Detected"),
            (-5, "icon-filament-ok", "Filament Detected"),
        ];
        for (code, icon, tooltip) in cases {
            let status = SensorStatus::new(code);
            assert_eq!(status.icon_class(), icon, "code {code}");
            assert_eq!(status.tooltip(), tooltip, "code {code}");
            // 같은 입력 → 같은 출력
            assert_eq!(status.display(), SensorStatus::new(code).display());
        }
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_status_value(&json!(0)), Some(SensorStatus::NO_FILAMENT));
        assert_eq!(parse_status_value(&json!(-1)), Some(SensorStatus::DISABLED));
        assert_eq!(parse_status_value(&json!(1.9)), Some(SensorStatus::new(1)));
    }

    #[test]
    fn parse_strings() {
        assert_eq!(parse_status_value(&json!("1")), Some(SensorStatus::new(1)));
        assert_eq!(parse_status_value(&json!("  -1")), Some(SensorStatus::DISABLED));
        assert_eq!(parse_status_value(&json!("+2")), Some(SensorStatus::new(2)));
        assert_eq!(parse_status_value(&json!("0abc")), Some(SensorStatus::NO_FILAMENT));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert_eq!(parse_status_value(&json!("abc")), None);
        assert_eq!(parse_status_value(&json!("")), None);
        assert_eq!(parse_status_value(&json!("-")), None);
        assert_eq!(parse_status_value(&json!(null)), None);
        assert_eq!(parse_status_value(&json!(true)), None);
        assert_eq!(parse_status_value(&json!({"status": 1})), None);
    }

    #[test]
    fn serde_is_transparent() {
        let status: SensorStatus = serde_json::from_str("0").unwrap();
        assert_eq!(status, SensorStatus::NO_FILAMENT);
        assert_eq!(serde_json::to_string(&SensorStatus::DISABLED).unwrap(), "-1");
    }
}
