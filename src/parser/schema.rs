//! Record definitions and their JSON shape.
//!
//! Every record is built from exactly one trace line and written out as a
//! single JSON object whose first key is `event`. All values stay text: the
//! converter never interprets addresses or sizes.

use crate::utils::config::{
    ACCESS_EVENT, ALLOCATION_EVENT, FREE_EVENT, FUNCTION_BEGIN_PREFIX, FUNCTION_END_PREFIX,
    PLACEHOLDER,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single textual field of a record
///
/// A field is either a token copied verbatim from the trace line or missing.
/// Missing fields render as [`PLACEHOLDER`] only when written out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Field(Option<String>);

impl Field {
    /// Field with no source token
    pub fn missing() -> Self {
        Self(None)
    }

    /// Field holding a token from the trace line
    pub fn present(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_none()
    }

    /// Raw token, `None` if the line was too short
    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Text written to the output (token or placeholder)
    pub fn render(&self) -> &str {
        self.0.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Append an overflow token, space separated
    pub(crate) fn push_tail(&mut self, token: &str) {
        match &mut self.0 {
            Some(value) => {
                value.push(' ');
                value.push_str(token);
            }
            None => self.0 = Some(token.to_string()),
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::present(value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.render())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == PLACEHOLDER {
            Ok(Self::missing())
        } else {
            Ok(Self::present(value))
        }
    }
}

/// Heap allocation (`alloc:` lines)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    #[serde(rename = "thread-id")]
    pub thread_id: Field,
    #[serde(rename = "alloc-base")]
    pub base: Field,
    /// Allocating routine, e.g. `malloc`
    #[serde(rename = "type")]
    pub type_name: Field,
    #[serde(rename = "alloc-size")]
    pub size: Field,
    #[serde(rename = "num-items")]
    pub num_items: Field,
    #[serde(rename = "source-location")]
    pub source_location: Field,
    #[serde(rename = "var-name")]
    pub var_name: Field,
    #[serde(rename = "var-type")]
    pub var_type: Field,
}

/// Implicit deallocation (`implicit-free` lines)
///
/// The base address is mandatory; lines without it never become records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Free {
    pub base: String,
}

/// Memory read or write (`read:` / `write:` lines)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    /// `read` or `write`
    #[serde(rename = "type")]
    pub kind: Field,
    #[serde(rename = "thread-id")]
    pub thread_id: Field,
    pub address: Field,
    pub size: Field,
    pub function: Field,
    #[serde(rename = "source-location")]
    pub source_location: Field,
    #[serde(rename = "alloc-location")]
    pub alloc_location: Field,
    #[serde(rename = "var-name")]
    pub var_name: Field,
    /// Open-ended: absorbs every token past the last positional field
    #[serde(rename = "var-type")]
    pub var_type: Field,
}

/// Function boundary (`function-begin` / `function-end` lines)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEvent {
    /// Keyword of the line with colons trimmed; written as the `event` key
    #[serde(skip)]
    pub event: String,
    #[serde(rename = "thread-id")]
    pub thread_id: Field,
    pub name: Field,
}

/// One converted trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Allocation(Allocation),
    Free(Free),
    Access(Access),
    Function(FunctionEvent),
}

impl Record {
    /// Value of the leading `event` key
    pub fn event(&self) -> &str {
        match self {
            Record::Allocation(_) => ALLOCATION_EVENT,
            Record::Free(_) => FREE_EVENT,
            Record::Access(_) => ACCESS_EVENT,
            Record::Function(f) => &f.event,
        }
    }
}

/// `event` followed by the record's own keys, in declaration order
#[derive(Serialize)]
struct Tagged<'a, T> {
    event: &'a str,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let event = self.event();
        match self {
            Record::Allocation(body) => Tagged { event, body }.serialize(serializer),
            Record::Free(body) => Tagged { event, body }.serialize(serializer),
            Record::Access(body) => Tagged { event, body }.serialize(serializer),
            Record::Function(body) => Tagged { event, body }.serialize(serializer),
        }
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde::de::Error;

        let event = value
            .get("event")
            .and_then(|e| e.as_str())
            .ok_or_else(|| serde_json::Error::custom("missing `event` key"))?
            .to_string();

        match event.as_str() {
            ALLOCATION_EVENT => Ok(Record::Allocation(serde_json::from_value(value)?)),
            FREE_EVENT => Ok(Record::Free(serde_json::from_value(value)?)),
            ACCESS_EVENT => Ok(Record::Access(serde_json::from_value(value)?)),
            e @ (FUNCTION_BEGIN_PREFIX | FUNCTION_END_PREFIX) => {
                let mut function: FunctionEvent = serde_json::from_value(value)?;
                function.event = e.to_string();
                Ok(Record::Function(function))
            }
            other => Err(serde_json::Error::custom(format!(
                "unknown event `{}`",
                other
            ))),
        }
    }
}

/// Normalized trace-line form, placeholders filled in
///
/// Feeding this text back through the line parser yields the same JSON output.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Allocation(a) => write!(
                f,
                "alloc: {} {} {} {} {} {} {} {}",
                a.thread_id,
                a.base,
                a.type_name,
                a.size,
                a.num_items,
                a.source_location,
                a.var_name,
                a.var_type
            ),
            Record::Free(r) => write!(f, "implicit-free: {}", r.base),
            Record::Access(a) => write!(
                f,
                "{}: {} {} {} {} {} {} {} {}",
                a.kind,
                a.thread_id,
                a.address,
                a.size,
                a.function,
                a.source_location,
                a.alloc_location,
                a.var_name,
                a.var_type
            ),
            Record::Function(e) => write!(f, "{}: {} {}", e.event, e.thread_id, e.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_access() -> Access {
        Access {
            kind: "read".into(),
            thread_id: "0".into(),
            address: "0x10".into(),
            size: "4".into(),
            function: "main".into(),
            source_location: "a.c:3".into(),
            alloc_location: Field::missing(),
            var_name: Field::missing(),
            var_type: Field::missing(),
        }
    }

    #[test]
    fn test_event_key_comes_first() {
        let json = serde_json::to_string(&Record::Access(sample_access())).unwrap();
        assert!(json.starts_with(r#"{"event":"memory-access","type":"read""#));
    }

    #[test]
    fn test_missing_fields_render_placeholder() {
        let json = serde_json::to_string(&Record::Access(sample_access())).unwrap();
        assert!(json.ends_with(r#""alloc-location":"-","var-name":"-","var-type":"-"}"#));
    }

    #[test]
    fn test_function_event_uses_keyword_as_event() {
        let record = Record::Function(FunctionEvent {
            event: "function-end".to_string(),
            thread_id: "3".into(),
            name: "foo".into(),
        });
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"event":"function-end","thread-id":"3","name":"foo"}"#);
    }

    #[test]
    fn test_quotes_are_escaped() {
        let mut access = sample_access();
        access.var_type = Field::present(r#"std::map<"k", v>"#);
        let json = serde_json::to_string(&Record::Access(access)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["var-type"], r#"std::map<"k", v>"#);
    }

    #[test]
    fn test_record_from_json_value() {
        let value = serde_json::json!({
            "event": "function-begin",
            "thread-id": "1",
            "name": "-"
        });
        let record = Record::try_from(value).unwrap();
        assert_eq!(
            record,
            Record::Function(FunctionEvent {
                event: "function-begin".to_string(),
                thread_id: "1".into(),
                name: Field::missing(),
            })
        );
    }

    #[test]
    fn test_record_from_json_rejects_unknown_event() {
        let value = serde_json::json!({ "event": "realloc", "base": "0x1" });
        assert!(Record::try_from(value).is_err());
    }

    #[test]
    fn test_record_from_json_rejects_unknown_function_event() {
        let value = serde_json::json!({
            "event": "function-foo",
            "thread-id": "1",
            "name": "main"
        });
        assert!(Record::try_from(value).is_err());

        let value = serde_json::json!({
            "event": "function-end",
            "thread-id": "1",
            "name": "main"
        });
        assert!(Record::try_from(value).is_ok());
    }

    #[test]
    fn test_record_from_json_rejects_missing_key() {
        let value = serde_json::json!({ "event": "allocation", "thread-id": "1" });
        assert!(Record::try_from(value).is_err());
    }

    #[test]
    fn test_display_trace_form() {
        let record = Record::Free(Free {
            base: "0xdead".to_string(),
        });
        assert_eq!(record.to_string(), "implicit-free: 0xdead");
        assert_eq!(
            Record::Access(sample_access()).to_string(),
            "read: 0 0x10 4 main a.c:3 - - -"
        );
    }
}
