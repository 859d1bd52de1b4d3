//! Wire messages exchanged with dashboard clients
//!
//! Every frame is a JSON text frame. Outbound frames carry a `type`
//! discriminator; the only inbound frame the hub understands is
//! `{"type":"request","data":"status"}`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

/// A serialized outbound message, shared between all recipients of a broadcast
pub type Frame = Arc<str>;

/// Reachability of the bot as reported by the status probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Online,
    Offline,
    Error,
}

/// Result of one status probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "status")]
    pub bot: BotStatus,
    #[serde(rename = "webhook")]
    pub webhook_configured: bool,
}

impl StatusRecord {
    /// The uniform record reported whenever any upstream call fails
    pub fn error() -> Self {
        Self {
            bot: BotStatus::Error,
            webhook_configured: false,
        }
    }
}

/// Dashboard counters sent to every client right after it connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_users: u64,
    pub active_today: u64,
    pub searches: u64,
    pub alerts: u64,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            total_users: 1428,
            active_today: 217,
            searches: 5843,
            alerts: 326,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    pub action: String,
    pub details: String,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlertEvent {
    pub product: String,
    /// Minor currency units
    pub old_price: i64,
    /// Minor currency units
    pub new_price: i64,
    /// Percent change, rounded to the nearest integer
    pub difference: i64,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Everything the hub ever sends to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "stats")]
    Stats(StatsSnapshot),
    #[serde(rename = "status")]
    Status(StatusRecord),
    #[serde(rename = "activity")]
    Activity(ActivityEvent),
    #[serde(rename = "priceAlert")]
    PriceAlert(PriceAlertEvent),
}

impl OutboundMessage {
    /// The `type` discriminator as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Stats(_) => "stats",
            OutboundMessage::Status(_) => "status",
            OutboundMessage::Activity(_) => "activity",
            OutboundMessage::PriceAlert(_) => "priceAlert",
        }
    }

    /// Serialize into a frame that can be handed to any number of connections
    pub fn to_frame(&self) -> crate::Result<Frame> {
        Ok(serde_json::to_string(self)?.into())
    }
}

impl From<StatusRecord> for OutboundMessage {
    fn from(record: StatusRecord) -> Self {
        OutboundMessage::Status(record)
    }
}

impl From<ActivityEvent> for OutboundMessage {
    fn from(event: ActivityEvent) -> Self {
        OutboundMessage::Activity(event)
    }
}

impl From<PriceAlertEvent> for OutboundMessage {
    fn from(event: PriceAlertEvent) -> Self {
        OutboundMessage::PriceAlert(event)
    }
}

/// What a client asked for in an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    /// `{"type":"request","data":"status"}`
    Status,
    /// Valid JSON the hub has no answer for
    Unknown,
}

/// Decode an inbound text frame.
///
/// Only invalid JSON is an error; well-formed frames of any other shape map to
/// [`ClientRequest::Unknown`].
pub fn parse_client_message(text: &str) -> Result<ClientRequest, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let kind = value.get("type").and_then(|v| v.as_str());
    let data = value.get("data").and_then(|v| v.as_str());

    Ok(match (kind, data) {
        (Some("request"), Some("status")) => ClientRequest::Status,
        _ => ClientRequest::Unknown,
    })
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn stats_snapshot_wire_shape() {
        let value = serde_json::to_value(OutboundMessage::Stats(StatsSnapshot::default())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "stats",
                "totalUsers": 1428,
                "activeToday": 217,
                "searches": 5843,
                "alerts": 326
            })
        );
    }

    #[test]
    fn status_wire_shape() {
        let record = StatusRecord {
            bot: BotStatus::Online,
            webhook_configured: true,
        };
        let value = serde_json::to_value(OutboundMessage::from(record)).unwrap();
        assert_eq!(value, json!({"type": "status", "status": "online", "webhook": true}));

        let value = serde_json::to_value(OutboundMessage::from(StatusRecord::error())).unwrap();
        assert_eq!(value, json!({"type": "status", "status": "error", "webhook": false}));
    }

    #[test]
    fn price_alert_wire_shape() {
        let event = PriceAlertEvent {
            product: "iPhone 13".to_string(),
            old_price: 69900,
            new_price: 64900,
            difference: -7,
            timestamp: Utc.with_ymd_and_hms(2025, 8, 7, 12, 30, 5).unwrap(),
        };
        let value = serde_json::to_value(OutboundMessage::from(event)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "priceAlert",
                "product": "iPhone 13",
                "oldPrice": 69900,
                "newPrice": 64900,
                "difference": -7,
                "timestamp": "2025-08-07T12:30:05.000Z"
            })
        );
    }

    #[test]
    fn activity_timestamp_has_millis() {
        let event = ActivityEvent {
            action: "Product search".to_string(),
            details: "wireless headphones".to_string(),
            timestamp: Utc.timestamp_millis_opt(1_754_569_805_123).unwrap(),
        };
        let frame = OutboundMessage::from(event).to_frame().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "activity");
        assert_eq!(value["timestamp"], "2025-08-07T12:30:05.123Z");
    }

    #[test]
    fn parses_status_request() {
        assert_eq!(
            parse_client_message(r#"{"type":"request","data":"status"}"#).unwrap(),
            ClientRequest::Status
        );
    }

    #[test]
    fn other_shapes_are_unknown() {
        for text in [
            r#"{"type":"request","data":"stats"}"#,
            r#"{"type":"ping"}"#,
            r#"{"data":"status"}"#,
            r#"[1,2,3]"#,
            r#""status""#,
        ] {
            assert_eq!(parse_client_message(text).unwrap(), ClientRequest::Unknown, "{text}");
        }
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_client_message("{not json").is_err());
        assert!(parse_client_message("").is_err());
    }
}
