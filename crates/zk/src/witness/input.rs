//! Named circuit inputs.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;

use crate::error::InputError;

/// Ordered map of signal name to its flattened element values.
///
/// Values are arbitrary signed integers; they are reduced into the field
/// only when the witness is assembled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CircuitInput {
    signals: Vec<(String, Vec<BigInt>)>,
}

impl CircuitInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signal. Rejects repeated names and empty element lists.
    pub fn insert<I>(&mut self, name: impl Into<String>, values: I) -> Result<(), InputError>
    where
        I: IntoIterator<Item = BigInt>,
    {
        let name = name.into();
        if self.signals.iter().any(|(existing, _)| *existing == name) {
            return Err(InputError::Duplicate(name));
        }
        let values: Vec<BigInt> = values.into_iter().collect();
        if values.is_empty() {
            return Err(InputError::Malformed {
                signal: name,
                reason: "no elements".to_string(),
            });
        }
        self.signals.push((name, values));
        Ok(())
    }

    /// Chainable form of [`insert`](Self::insert) for a single element.
    pub fn scalar(mut self, name: impl Into<String>, value: impl Into<BigInt>) -> Result<Self, InputError> {
        self.insert(name, [value.into()])?;
        Ok(self)
    }

    pub fn array<I, V>(mut self, name: impl Into<String>, values: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = V>,
        V: Into<BigInt>,
    {
        self.insert(name, values.into_iter().map(Into::into))?;
        Ok(self)
    }

    /// Parses circom-style input JSON.
    ///
    /// Values may be integers, decimal strings, `0x` hex strings, or nested
    /// arrays of those (flattened row-major). Integers wider than 64 bits
    /// must be given as strings.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let entries: OrderedEntries =
            serde_json::from_str(json).map_err(|e| InputError::Malformed {
                signal: "<document>".to_string(),
                reason: e.to_string(),
            })?;

        let mut input = Self::new();
        for (name, value) in entries.0 {
            let mut elements = Vec::new();
            flatten(&name, &value, &mut elements)?;
            input.insert(name, elements)?;
        }
        Ok(input)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BigInt])> {
        self.signals
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&[BigInt]> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Number of named signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Total number of elements across all signals.
    pub fn element_count(&self) -> usize {
        self.signals.iter().map(|(_, v)| v.len()).sum()
    }
}

fn flatten(signal: &str, value: &Value, out: &mut Vec<BigInt>) -> Result<(), InputError> {
    let malformed = |reason: String| InputError::Malformed {
        signal: signal.to_string(),
        reason,
    };

    match value {
        Value::Array(items) => {
            for item in items {
                flatten(signal, item, out)?;
            }
            Ok(())
        }
        Value::Number(n) => {
            let parsed = n
                .as_u64()
                .map(BigInt::from)
                .or_else(|| n.as_i64().map(BigInt::from))
                .ok_or_else(|| {
                    malformed(format!("`{n}` is not an exact integer; pass it as a string"))
                })?;
            out.push(parsed);
            Ok(())
        }
        Value::String(s) => {
            out.push(parse_integer(s).ok_or_else(|| malformed(format!("`{s}` is not an integer")))?);
            Ok(())
        }
        other => Err(malformed(format!("unsupported value `{other}`"))),
    }
}

/// Decimal with optional sign, or `0x`-prefixed hex.
fn parse_integer(text: &str) -> Option<BigInt> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => BigInt::parse_bytes(hex.as_bytes(), 16)?,
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            BigInt::from_str(digits).ok()?
        }
        None => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Top-level JSON object read in document order, keeping repeated keys.
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of signal names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_mixed_value_forms_in_order() {
        let input = CircuitInput::from_json(
            r#"{"secret": "123152419872319823719238712098", "move": 1, "grid": [[1, "0x10"], ["-3"]]}"#,
        )
        .unwrap();

        let names: Vec<&str> = input.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["secret", "move", "grid"]);
        assert_eq!(
            input.get("secret").unwrap()[0],
            BigInt::from(123_152_419_872_319_823_719_238_712_098u128)
        );
        assert_eq!(
            input.get("grid").unwrap(),
            &[BigInt::from(1), BigInt::from(16), BigInt::from(-3)]
        );
        assert_eq!(input.element_count(), 5);
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = CircuitInput::from_json(r#"{"move": 1, "move": 2}"#).unwrap_err();
        assert_eq!(err, InputError::Duplicate("move".to_string()));

        let err = CircuitInput::new()
            .scalar("move", 1)
            .unwrap()
            .scalar("move", 2)
            .unwrap_err();
        assert_eq!(err, InputError::Duplicate("move".to_string()));
    }

    #[test]
    fn test_rejects_lossy_and_non_integer_values() {
        for json in [
            r#"{"secret": 123152419872319823719238712098}"#,
            r#"{"move": 1.5}"#,
            r#"{"move": "paper"}"#,
            r#"{"move": true}"#,
            r#"{"move": []}"#,
            r#"{"move": "0x"}"#,
        ] {
            let err = CircuitInput::from_json(json).unwrap_err();
            assert!(
                matches!(&err, InputError::Malformed { signal, .. } if signal == "move" || signal == "secret"),
                "{json}: {err}"
            );
        }
    }

    #[test]
    fn test_rejects_non_object_documents() {
        assert!(matches!(
            CircuitInput::from_json("[1, 2]"),
            Err(InputError::Malformed { .. })
        ));
    }
}
