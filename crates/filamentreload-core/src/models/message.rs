//! 백엔드와 주고받는 메시지 모델.

use serde::{Deserialize, Serialize};

/// 상태 갱신 푸시 메시지의 `type` 값
pub const STATUS_UPDATE_TYPE: &str = "status_update";

/// 푸시 채널로 수신한 플러그인 메시지.
///
/// `source`는 메시지를 보낸 플러그인 식별자, `payload`는 플러그인이 보낸 임의 JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMessage {
    #[serde(rename = "plugin")]
    pub source: String,
    #[serde(rename = "data", default)]
    pub payload: serde_json::Value,
}

impl PluginMessage {
    pub fn new(source: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            source: source.into(),
            payload,
        }
    }
}

/// 플러그인 메시지 본문에서 상태 갱신 값 추출.
///
/// `type == "status_update"`이고 `status` 필드가 있으면 그 값을 반환.
pub fn status_update_value(payload: &serde_json::Value) -> Option<&serde_json::Value> {
    let kind = payload.get("type")?.as_str()?;
    if kind != STATUS_UPDATE_TYPE {
        return None;
    }
    payload.get("status")
}

/// `GET /plugin/<id>/status` 응답 본문.
///
/// `status` 외 필드는 무시한다. 필드가 없으면 `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_update_extracts_status() {
        let msg = PluginMessage::new("filamentreload", json!({"type": "status_update", "status": "1"}));
        assert_eq!(status_update_value(&msg.payload), Some(&json!("1")));
    }

    #[test]
    fn other_types_are_not_status_updates() {
        let msg = PluginMessage::new("filamentreload", json!({"type": "config_changed", "status": 1}));
        assert!(status_update_value(&msg.payload).is_none());

        let msg = PluginMessage::new("filamentreload", json!({"type": "status_update"}));
        assert!(status_update_value(&msg.payload).is_none());

        let msg = PluginMessage::new("filamentreload", json!("status_update"));
        assert!(status_update_value(&msg.payload).is_none());
    }

    #[test]
    fn status_report_ignores_extra_fields() {
        let report: StatusReport =
            serde_json::from_str(r#"{"status": 0, "pin": 17, "enabled": true}"#).unwrap();
        assert_eq!(report.status, Some(json!(0)));

        let report: StatusReport = serde_json::from_str(r#"{"pin": 17}"#).unwrap();
        assert!(report.status.is_none());
    }

    #[test]
    fn plugin_message_wire_names() {
        let msg: PluginMessage =
            serde_json::from_str(r#"{"plugin": "other_plugin", "data": {"type": "status_update"}}"#)
                .unwrap();
        assert_eq!(msg.source, "other_plugin");
    }
}
