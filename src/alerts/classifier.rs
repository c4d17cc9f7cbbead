//! Turns an untyped webhook record into a typed [`Alert`]

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use super::types::{Alert, Signal, SmartVolType};
use crate::common::errors::AlertError;

/// Discriminator field naming the alert type
pub const TYPE_FIELD: &str = "type";
/// Older payloads carry the discriminator under this name
pub const TYPE_FIELD_ALIAS: &str = "alert";

/// Parse a raw request body and classify it
pub fn classify_str(body: &str) -> Result<Alert, AlertError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| AlertError::Malformed(e.to_string()))?;
    classify(&value)
}

/// Classify a JSON record into an alert variant
///
/// Every type needs `symbol` and `price`; `VolumeUp` also needs `volume` and
/// `timeframe`. Pure: no logging, no side effects.
pub fn classify(payload: &Value) -> Result<Alert, AlertError> {
    let record = payload.as_object().ok_or(AlertError::NotAnObject)?;

    let type_name = text_field(record, TYPE_FIELD)
        .or_else(|| text_field(record, TYPE_FIELD_ALIAS))
        .ok_or_else(|| AlertError::UnknownAlertType(String::new()))?;
    let signal = Signal::from_type_name(&type_name)
        .ok_or_else(|| AlertError::UnknownAlertType(type_name.clone()))?;

    let missing = |field: &'static str| AlertError::MissingField {
        alert_type: type_name.clone(),
        field,
    };

    let symbol = text_field(record, "symbol").ok_or_else(|| missing("symbol"))?;
    let price = decimal_field(record, "price")?.ok_or_else(|| missing("price"))?;
    if price <= Decimal::ZERO {
        return Err(AlertError::InvalidField {
            field: "price",
            value: price.to_string(),
        });
    }

    let timeframe = text_field(record, "timeframe");
    let volume = decimal_field(record, "volume")?;

    if signal == Signal::SmartVol(SmartVolType::VolumeUp) {
        if volume.is_none() {
            return Err(missing("volume"));
        }
        if timeframe.is_none() {
            return Err(missing("timeframe"));
        }
    }

    Ok(Alert {
        signal,
        symbol,
        price,
        timeframe,
        volume,
    })
}

/// Non-empty trimmed text; numbers are accepted and rendered as text
fn text_field(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal_field(
    record: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Decimal>, AlertError> {
    let raw = match record.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(AlertError::InvalidField {
                field,
                value: other.to_string(),
            })
        }
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map(Some)
        .map_err(|_| AlertError::InvalidField { field, value: raw })
}
