//! Tagged attribute values and their canonical text rendering.
//!
//! Values arrive already decoded from the transport's JSON form:
//! `{"TimelineId": ..}`, `{"BigInt": ..}`, `{"Timestamp": ..}`,
//! `{"EventCoordinate": {"timeline_id": .., "id": [..]}}`, or a bare
//! string/number/bool.

use crate::{Error, Result, TimelineId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

const TAG_TIMELINE_ID: &str = "TimelineId";
const TAG_BIG_INT: &str = "BigInt";
const TAG_TIMESTAMP: &str = "Timestamp";
const TAG_EVENT_COORDINATE: &str = "EventCoordinate";

/// The declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    String,
    Integer,
    BigInt,
    Float,
    Bool,
    Timestamp,
    TimelineId,
    EventCoordinate,
    Any,
}

impl AttrType {
    /// The name used for this type in description attributes.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::BigInt => "BigInteger",
            Self::Float => "Float",
            Self::Bool => "Bool",
            Self::Timestamp => "Nanoseconds",
            Self::TimelineId => "TimelineId",
            Self::EventCoordinate => "Coordinate",
            Self::Any => "Any",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A specific event instance on a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventCoordinate {
    pub timeline_id: TimelineId,
    pub id: Vec<u8>,
}

impl EventCoordinate {
    pub fn new(timeline_id: TimelineId, id: impl Into<Vec<u8>>) -> Self {
        Self {
            timeline_id,
            id: id.into(),
        }
    }
}

/// Renders as `<uuid hex without hyphens>:<id hex without leading zero bytes>`.
///
/// An id with no non-zero byte renders as `0`. Zero bytes after the first
/// non-zero byte are kept.
impl fmt::Display for EventCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.timeline_id.as_uuid().simple())?;
        match self.id.iter().position(|b| *b != 0) {
            Some(first) => f.write_str(&hex::encode(&self.id[first..])),
            None => f.write_str("0"),
        }
    }
}

/// A tagged, variant-typed attribute value.
///
/// `BigInt` and `Timestamp` carry decimal text so values beyond the native
/// integer range survive untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    BigInt(String),
    Timestamp(String),
    TimelineId(TimelineId),
    EventCoordinate(EventCoordinate),
    Boolean(bool),
    Number(Number),
}

impl AttrValue {
    /// Returns the type tag of this value.
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::Text(_) => AttrType::String,
            Self::BigInt(_) => AttrType::BigInt,
            Self::Timestamp(_) => AttrType::Timestamp,
            Self::TimelineId(_) => AttrType::TimelineId,
            Self::EventCoordinate(_) => AttrType::EventCoordinate,
            Self::Boolean(_) => AttrType::Bool,
            Self::Number(n) if n.is_f64() => AttrType::Float,
            Self::Number(_) => AttrType::Integer,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::BigInt(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Decodes the JSON wire form.
    pub fn from_wire(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Bool(b) => Ok(Self::Boolean(*b)),
            Value::Number(n) => Ok(Self::Number(n.clone())),
            Value::Object(map) if map.len() == 1 => {
                let Some((tag, inner)) = map.iter().next() else {
                    return Err(invalid(value));
                };
                match tag.as_str() {
                    TAG_TIMELINE_ID => {
                        let text = inner.as_str().ok_or_else(|| invalid(value))?;
                        Ok(Self::TimelineId(TimelineId::parse(text)?))
                    }
                    TAG_BIG_INT => decimal_text(inner, true)
                        .map(Self::BigInt)
                        .ok_or_else(|| invalid(value)),
                    TAG_TIMESTAMP => decimal_text(inner, false)
                        .map(Self::Timestamp)
                        .ok_or_else(|| invalid(value)),
                    TAG_EVENT_COORDINATE => decode_coordinate(inner)
                        .map(Self::EventCoordinate)
                        .ok_or_else(|| invalid(value)),
                    _ => Err(invalid(value)),
                }
            }
            _ => Err(invalid(value)),
        }
    }

    /// Encodes to the JSON wire form accepted by [`AttrValue::from_wire`].
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::BigInt(s) => tagged(TAG_BIG_INT, Value::String(s.clone())),
            Self::Timestamp(s) => tagged(TAG_TIMESTAMP, Value::String(s.clone())),
            Self::TimelineId(id) => tagged(TAG_TIMELINE_ID, Value::String(id.to_string())),
            Self::EventCoordinate(ec) => {
                let mut inner = Map::new();
                inner.insert(
                    "timeline_id".to_owned(),
                    Value::String(ec.timeline_id.to_string()),
                );
                inner.insert(
                    "id".to_owned(),
                    Value::Array(ec.id.iter().map(|b| Value::from(*b)).collect()),
                );
                tagged(TAG_EVENT_COORDINATE, Value::Object(inner))
            }
        }
    }

    /// Infers a value from literal text, as written in `key = value` pairs.
    ///
    /// Booleans (case-insensitive), then integers, then floats, then UUIDs;
    /// anything else is text with surrounding quotes trimmed.
    pub fn infer(s: &str) -> Self {
        if let Ok(b) = s.to_lowercase().parse::<bool>() {
            b.into()
        } else if let Ok(i) = s.parse::<i64>() {
            i.into()
        } else if is_decimal(s, true) {
            Self::BigInt(s.trim_start_matches('+').to_owned())
        } else if let Some(f) = s.parse::<f64>().ok().filter(|f| f.is_finite()) {
            f.into()
        } else if let Ok(id) = TimelineId::parse(s) {
            id.into()
        } else {
            Self::Text(s.trim_matches(|c| c == '"' || c == '\'').to_owned())
        }
    }
}

/// Booleans render capitalized (`True`/`False`); downstream consumers rely
/// on that spelling.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::BigInt(s) | Self::Timestamp(s) => f.write_str(s),
            Self::TimelineId(id) => id.fmt(f),
            Self::EventCoordinate(ec) => ec.fmt(f),
            Self::Boolean(true) => f.write_str("True"),
            Self::Boolean(false) => f.write_str("False"),
            Self::Number(n) => n.fmt(f),
        }
    }
}

impl FromStr for AttrValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::infer(s))
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_wire(&value).map_err(serde::de::Error::custom)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Number(i.into())
    }
}

impl From<u64> for AttrValue {
    fn from(u: u64) -> Self {
        Self::Number(u.into())
    }
}

impl From<i128> for AttrValue {
    fn from(i: i128) -> Self {
        match i64::try_from(i) {
            Ok(small) => small.into(),
            Err(_) => Self::BigInt(i.to_string()),
        }
    }
}

/// Non-finite floats have no JSON number form and become text.
impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        match Number::from_f64(f) {
            Some(n) => Self::Number(n),
            None => Self::Text(f.to_string()),
        }
    }
}

impl From<TimelineId> for AttrValue {
    fn from(id: TimelineId) -> Self {
        Self::TimelineId(id)
    }
}

impl From<EventCoordinate> for AttrValue {
    fn from(ec: EventCoordinate) -> Self {
        Self::EventCoordinate(ec)
    }
}

/// Canonical display string for a value.
pub fn format_attr_val(value: &AttrValue) -> String {
    value.to_string()
}

/// Human-readable rendering of an attribute value in its JSON wire form.
///
/// String payloads of `TimelineId`, `BigInt` and `Timestamp` are returned
/// exactly as sent. Otherwise total over any JSON value: anything that does
/// not decode as an [`AttrValue`] falls back to its compact JSON text.
pub fn format_json_attr_val(value: &Value) -> String {
    if let Some(text) = verbatim_payload(value) {
        return text.to_owned();
    }
    match AttrValue::from_wire(value) {
        Ok(v) => v.to_string(),
        Err(_) => value.to_string(),
    }
}

fn verbatim_payload(value: &Value) -> Option<&str> {
    let map = value.as_object().filter(|m| m.len() == 1)?;
    let (tag, inner) = map.iter().next()?;
    match tag.as_str() {
        TAG_TIMELINE_ID | TAG_BIG_INT | TAG_TIMESTAMP => inner.as_str(),
        _ => None,
    }
}

fn invalid(value: &Value) -> Error {
    Error::InvalidAttrValue(value.to_string())
}

fn tagged(tag: &str, inner: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_owned(), inner);
    Value::Object(map)
}

fn decimal_text(inner: &Value, allow_sign: bool) -> Option<String> {
    match inner {
        Value::String(s) if is_decimal(s, allow_sign) => Some(s.clone()),
        Value::Number(n) if n.is_u64() || (allow_sign && n.is_i64()) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_coordinate(inner: &Value) -> Option<EventCoordinate> {
    let timeline_id = TimelineId::parse(inner.get("timeline_id")?.as_str()?).ok()?;
    let id = inner
        .get("id")?
        .as_array()?
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect::<Option<Vec<u8>>>()?;
    Some(EventCoordinate { timeline_id, id })
}

fn is_decimal(s: &str, allow_sign: bool) -> bool {
    let digits = if allow_sign {
        s.strip_prefix(['-', '+']).unwrap_or(s)
    } else {
        s
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
