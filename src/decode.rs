//! Conversion of raw protocol values into domain values.
//!
//! The server encodes a few types as tagged objects (`{"$reql_type$": ...}`).
//! [`PseudoTypeDecoder`] turns them into plain JSON that is convenient to
//! consume; [`RawDecoder`] leaves every value untouched.

use base64::Engine;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value};

use crate::config::Format;
use crate::{Error, Result};

const REQL_TYPE: &str = "$reql_type$";

/// Decoder applied to every raw row before it reaches the cursor buffer.
pub trait ValueDecoder: Send + Sync {
    /// Convert one raw protocol value.
    fn decode(&self, raw: Value) -> Result<Value>;
}

/// Decoder that returns values exactly as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl ValueDecoder for RawDecoder {
    fn decode(&self, raw: Value) -> Result<Value> {
        Ok(raw)
    }
}

/// Decoder for the server's pseudo-types.
///
/// - `TIME` becomes an RFC 3339 string in the value's own offset.
/// - `GROUPED_DATA` becomes an array of `{"group", "reduction"}` objects.
/// - `BINARY` becomes an array of byte values.
///
/// Each conversion can be switched off with [`Format::Raw`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoTypeDecoder {
    time: Format,
    group: Format,
    binary: Format,
}

impl PseudoTypeDecoder {
    /// Create a decoder with the given formats.
    pub fn new(time: Format, group: Format, binary: Format) -> Self {
        Self {
            time,
            group,
            binary,
        }
    }

    fn convert_object(&self, mut object: Map<String, Value>) -> Result<Value> {
        let kind = object.get(REQL_TYPE).and_then(Value::as_str).map(str::to_owned);
        match kind.as_deref() {
            Some("TIME") if self.time == Format::Native => convert_time(&object),
            Some("GROUPED_DATA") if self.group == Format::Native => {
                let data = object.remove("data").unwrap_or(Value::Null);
                self.convert_grouped(data)
            }
            Some("BINARY") if self.binary == Format::Native => convert_binary(&object),
            _ => {
                let mut decoded = Map::with_capacity(object.len());
                for (key, value) in object {
                    decoded.insert(key, self.decode(value)?);
                }
                Ok(Value::Object(decoded))
            }
        }
    }

    fn convert_grouped(&self, data: Value) -> Result<Value> {
        let Value::Array(pairs) = data else {
            return Err(Error::Decode("GROUPED_DATA without a data array".into()));
        };

        let mut groups = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let Value::Array(mut pair) = pair else {
                return Err(Error::Decode("GROUPED_DATA entry is not a pair".into()));
            };
            if pair.len() != 2 {
                return Err(Error::Decode(format!(
                    "GROUPED_DATA entry has {} elements, expected 2",
                    pair.len()
                )));
            }
            let reduction = self.decode(pair.pop().unwrap_or(Value::Null))?;
            let group = self.decode(pair.pop().unwrap_or(Value::Null))?;
            let mut entry = Map::with_capacity(2);
            entry.insert("group".into(), group);
            entry.insert("reduction".into(), reduction);
            groups.push(Value::Object(entry));
        }
        Ok(Value::Array(groups))
    }
}

impl ValueDecoder for PseudoTypeDecoder {
    fn decode(&self, raw: Value) -> Result<Value> {
        match raw {
            Value::Object(object) => self.convert_object(object),
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.decode(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            scalar => Ok(scalar),
        }
    }
}

fn convert_time(object: &Map<String, Value>) -> Result<Value> {
    let epoch = object
        .get("epoch_time")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Decode("TIME without a numeric epoch_time".into()))?;
    let offset: FixedOffset = object
        .get("timezone")
        .and_then(Value::as_str)
        .unwrap_or("+00:00")
        .parse()
        .map_err(|e| Error::Decode(format!("TIME with invalid timezone: {e}")))?;

    let millis = (epoch * 1000.0).round() as i64;
    let utc = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Decode(format!("TIME out of range: {epoch}")))?;
    Ok(Value::String(utc.with_timezone(&offset).to_rfc3339()))
}

fn convert_binary(object: &Map<String, Value>) -> Result<Value> {
    let data = object
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Decode("BINARY without base64 data".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| Error::Decode(format!("BINARY with invalid base64: {e}")))?;
    Ok(Value::Array(bytes.into_iter().map(Value::from).collect()))
}
