//! Positional field extraction.
//!
//! Each record kind is described by a [`FieldLayout`]: the ordered list of
//! output keys, the token position each key is read from, and which key (if
//! any) absorbs tokens past the last position. One generic routine,
//! [`extract`], applies a layout to a line; the typed extractors below only
//! destructure its result.

use super::schema::{Access, Allocation, Field, Free, FunctionEvent};
use crate::utils::error::ParseError;

/// Where a field's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Token 0 (the line keyword) with surrounding colons trimmed
    Keyword,
    /// Token at the given position
    Token(usize),
}

/// One named slot in a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub source: Source,
}

const fn keyword(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        source: Source::Keyword,
    }
}

const fn token(name: &'static str, position: usize) -> FieldSpec {
    FieldSpec {
        name,
        source: Source::Token(position),
    }
}

/// Declarative description of one record kind's line grammar
#[derive(Debug, Clone, Copy)]
pub struct FieldLayout<const N: usize> {
    /// Record kind, used in diagnostics
    pub kind: &'static str,

    /// Output keys in serialization order
    pub fields: [FieldSpec; N],

    /// Index into `fields` of the open-ended tail field
    pub tail: Option<usize>,

    /// Number of leading fields that must be present for the line to be accepted
    pub required: usize,
}

impl<const N: usize> FieldLayout<N> {
    /// Highest token position read by this layout
    pub fn last_position(&self) -> usize {
        self.fields
            .iter()
            .map(|spec| match spec.source {
                Source::Keyword => 0,
                Source::Token(position) => position,
            })
            .max()
            .unwrap_or(0)
    }

    /// Output keys in order
    pub fn names(&self) -> [&'static str; N] {
        self.fields.map(|spec| spec.name)
    }
}

pub const ALLOCATION_LAYOUT: FieldLayout<8> = FieldLayout {
    kind: "allocation",
    fields: [
        token("thread-id", 1),
        token("alloc-base", 2),
        token("type", 3),
        token("alloc-size", 4),
        token("num-items", 5),
        token("source-location", 6),
        token("var-name", 7),
        token("var-type", 8),
    ],
    tail: None,
    required: 0,
};

pub const FREE_LAYOUT: FieldLayout<1> = FieldLayout {
    kind: "implicit-free",
    fields: [token("base", 1)],
    tail: None,
    required: 1,
};

pub const ACCESS_LAYOUT: FieldLayout<9> = FieldLayout {
    kind: "memory-access",
    fields: [
        keyword("type"),
        token("thread-id", 1),
        token("address", 2),
        token("size", 3),
        token("function", 4),
        token("source-location", 5),
        token("alloc-location", 6),
        token("var-name", 7),
        token("var-type", 8),
    ],
    tail: Some(8),
    required: 0,
};

pub const FUNCTION_LAYOUT: FieldLayout<3> = FieldLayout {
    kind: "function",
    fields: [keyword("event"), token("thread-id", 1), token("name", 2)],
    tail: None,
    required: 0,
};

/// Apply a layout to one trace line
///
/// **Public** - the single extraction routine shared by every record kind
///
/// The line is split on single spaces, so runs of spaces produce empty
/// tokens. Positions past the end of the line leave their field missing;
/// positions past the layout's last one are dropped unless the layout has a
/// tail field, which receives them space-joined in order.
///
/// # Errors
/// * `ParseError::MissingRequiredField` - one of the layout's required fields has no token
pub fn extract<const N: usize>(
    layout: &FieldLayout<N>,
    line: &str,
) -> Result<[Field; N], ParseError> {
    let tokens: Vec<&str> = line.split(' ').collect();

    let mut fields: [Field; N] = std::array::from_fn(|_| Field::missing());
    for (field, spec) in fields.iter_mut().zip(layout.fields.iter()) {
        let value = match spec.source {
            Source::Keyword => tokens.first().map(|t| t.trim_matches(':')),
            Source::Token(position) => tokens.get(position).copied(),
        };
        if let Some(value) = value {
            *field = Field::present(value);
        }
    }

    if let Some(spec) = layout
        .fields
        .iter()
        .zip(fields.iter())
        .take(layout.required)
        .find_map(|(spec, field)| field.is_missing().then_some(spec))
    {
        return Err(ParseError::MissingRequiredField {
            kind: layout.kind,
            field: spec.name,
        });
    }

    if let Some(tail) = layout.tail {
        for overflow in tokens.iter().skip(layout.last_position() + 1) {
            fields[tail].push_tail(overflow);
        }
    }

    Ok(fields)
}

/// Extract an `alloc:` line
pub fn extract_allocation(line: &str) -> Result<Allocation, ParseError> {
    let [thread_id, base, type_name, size, num_items, source_location, var_name, var_type] =
        extract(&ALLOCATION_LAYOUT, line)?;

    Ok(Allocation {
        thread_id,
        base,
        type_name,
        size,
        num_items,
        source_location,
        var_name,
        var_type,
    })
}

/// Extract an `implicit-free` line
///
/// # Errors
/// * `ParseError::MissingRequiredField` - the line has no base address token
pub fn extract_free(line: &str) -> Result<Free, ParseError> {
    let [base] = extract(&FREE_LAYOUT, line)?;

    Ok(Free {
        base: base.render().to_string(),
    })
}

/// Extract a `read:` or `write:` line
pub fn extract_access(line: &str) -> Result<Access, ParseError> {
    let [kind, thread_id, address, size, function, source_location, alloc_location, var_name, var_type] =
        extract(&ACCESS_LAYOUT, line)?;

    Ok(Access {
        kind,
        thread_id,
        address,
        size,
        function,
        source_location,
        alloc_location,
        var_name,
        var_type,
    })
}

/// Extract a `function-begin` or `function-end` line
pub fn extract_function(line: &str) -> Result<FunctionEvent, ParseError> {
    let [event, thread_id, name] = extract(&FUNCTION_LAYOUT, line)?;

    Ok(FunctionEvent {
        event: event.render().to_string(),
        thread_id,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_last_position() {
        assert_eq!(ALLOCATION_LAYOUT.last_position(), 8);
        assert_eq!(ACCESS_LAYOUT.last_position(), 8);
        assert_eq!(FUNCTION_LAYOUT.last_position(), 2);
        assert_eq!(FREE_LAYOUT.last_position(), 1);
    }

    #[test]
    fn test_extract_full_allocation() {
        let alloc = extract_allocation("alloc: 7 0x1000 malloc 64 1 file.c:10 buf char*").unwrap();
        assert_eq!(alloc.thread_id.value(), Some("7"));
        assert_eq!(alloc.base.value(), Some("0x1000"));
        assert_eq!(alloc.type_name.value(), Some("malloc"));
        assert_eq!(alloc.size.value(), Some("64"));
        assert_eq!(alloc.num_items.value(), Some("1"));
        assert_eq!(alloc.source_location.value(), Some("file.c:10"));
        assert_eq!(alloc.var_name.value(), Some("buf"));
        assert_eq!(alloc.var_type.value(), Some("char*"));
    }

    #[test]
    fn test_extract_truncated_allocation() {
        let alloc = extract_allocation("alloc: 7 0x1000").unwrap();
        assert_eq!(alloc.base.value(), Some("0x1000"));
        assert!(alloc.type_name.is_missing());
        assert!(alloc.var_type.is_missing());
    }

    #[test]
    fn test_allocation_ignores_extra_tokens() {
        let alloc = extract_allocation("alloc: 1 2 3 4 5 6 7 8 9 10").unwrap();
        assert_eq!(alloc.var_type.value(), Some("8"));
    }

    #[test]
    fn test_access_tail_absorbs_overflow() {
        let access =
            extract_access("read: 1 0x20 8 main a.c:5 a.c:2 m std::map<int, std::string>").unwrap();
        assert_eq!(access.kind.value(), Some("read"));
        assert_eq!(access.alloc_location.value(), Some("a.c:2"));
        assert_eq!(access.var_name.value(), Some("m"));
        assert_eq!(access.var_type.value(), Some("std::map<int, std::string>"));
    }

    #[test]
    fn test_access_short_line() {
        let access = extract_access("write: 2 0x30 4 foo bar.c:1").unwrap();
        assert_eq!(access.kind.value(), Some("write"));
        assert_eq!(access.source_location.value(), Some("bar.c:1"));
        assert!(access.alloc_location.is_missing());
        assert!(access.var_name.is_missing());
        assert!(access.var_type.is_missing());
    }

    #[test]
    fn test_consecutive_spaces_yield_empty_tokens() {
        let access = extract_access("read:  0x20").unwrap();
        assert_eq!(access.thread_id.value(), Some(""));
        assert_eq!(access.address.value(), Some("0x20"));
    }

    #[test]
    fn test_function_keyword_colon_trimmed() {
        let event = extract_function("function-begin: 3 compute").unwrap();
        assert_eq!(event.event, "function-begin");
        assert_eq!(event.thread_id.value(), Some("3"));
        assert_eq!(event.name.value(), Some("compute"));

        let bare = extract_function("function-end").unwrap();
        assert_eq!(bare.event, "function-end");
        assert!(bare.thread_id.is_missing());
    }

    #[test]
    fn test_free_requires_base() {
        assert_eq!(extract_free("implicit-free: 0xbeef").unwrap().base, "0xbeef");
        assert_eq!(
            extract_free("implicit-free:"),
            Err(ParseError::MissingRequiredField {
                kind: "implicit-free",
                field: "base",
            })
        );
    }

    #[test]
    fn test_layout_names_match_serialized_keys() {
        use crate::parser::schema::Record;

        let record = Record::Allocation(extract_allocation("alloc:").unwrap());
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected: Vec<&str> = ALLOCATION_LAYOUT.names().to_vec();
        expected.push("event");
        expected.sort_unstable();
        assert_eq!(keys, expected);

        let record = Record::Access(extract_access("read:").unwrap());
        let json = serde_json::to_string(&record).unwrap();
        let mut cursor = 0;
        for name in ACCESS_LAYOUT.names() {
            let key = format!("\"{}\":", name);
            let found = json[cursor..].find(&key).expect("key present in order");
            cursor += found + key.len();
        }
    }
}
