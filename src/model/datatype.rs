/*!
UPnP state-variable data types: the full UDA 1.1 enumeration, canonical wire encoding (boolean as
`0`/`1`, ISO-8601 for dates/times, base 10 for integers, base64 for binary), and a typed `Value`
used for argument marshalling and current state-variable values.
*/

use crate::error::{invalid_value_for_type, MessageFormatError};
use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{Display, Formatter};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    Boolean,
    I1,
    I2,
    I4,
    Ui1,
    Ui2,
    Ui4,
    R4,
    R8,
    Number,
    Float,
    Fixed14_4,
    Char,
    String,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    BinHex,
    BinBase64,
    Uri,
    Uuid,
}

/// A value belonging to a [`DataType`]'s value space. Comparisons and eventing policy care about
/// equality of the canonical form, not the Rust representation, so this stays a small closed set.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl DataType {
    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        Ok(match s {
            "boolean" => DataType::Boolean,
            "i1" => DataType::I1,
            "i2" => DataType::I2,
            "i4" => DataType::I4,
            "ui1" => DataType::Ui1,
            "ui2" => DataType::Ui2,
            "ui4" => DataType::Ui4,
            "r4" => DataType::R4,
            "r8" => DataType::R8,
            "number" => DataType::Number,
            "float" => DataType::Float,
            "fixed.14.4" => DataType::Fixed14_4,
            "char" => DataType::Char,
            "string" => DataType::String,
            "date" => DataType::Date,
            "dateTime" => DataType::DateTime,
            "dateTime.tz" => DataType::DateTimeTz,
            "time" => DataType::Time,
            "time.tz" => DataType::TimeTz,
            "bin.hex" => DataType::BinHex,
            "bin.base64" => DataType::BinBase64,
            "uri" => DataType::Uri,
            "uuid" => DataType::Uuid,
            other => return Err(invalid_value_for_type("dataType", other)),
        })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::I1
                | DataType::I2
                | DataType::I4
                | DataType::Ui1
                | DataType::Ui2
                | DataType::Ui4
                | DataType::R4
                | DataType::R8
                | DataType::Number
                | DataType::Float
                | DataType::Fixed14_4
        )
    }

    /// Default `step` for a numeric allowed-value range when the SCPD omits it (§3, StateVariable
    /// invariants): `max/10` when `max < 1` for rationals, else `1`; integers always default to `1`.
    pub fn default_step(&self, max: f64) -> f64 {
        if self.is_integer() {
            1.0
        } else if max < 1.0 {
            max / 10.0
        } else {
            1.0
        }
    }

    fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::I1 | DataType::I2 | DataType::I4 | DataType::Ui1 | DataType::Ui2 | DataType::Ui4
        )
    }

    /// Parses a wire-form string into a [`Value`] belonging to this type's value space.
    pub fn parse_value(&self, s: &str) -> Result<Value, MessageFormatError> {
        match self {
            DataType::Boolean => match s {
                "0" | "false" | "no" => Ok(Value::Boolean(false)),
                "1" | "true" | "yes" => Ok(Value::Boolean(true)),
                _ => Err(invalid_value_for_type("boolean", s)),
            },
            DataType::I1 | DataType::I2 | DataType::I4 => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid_value_for_type("integer", s)),
            DataType::Ui1 | DataType::Ui2 | DataType::Ui4 => s
                .parse::<u64>()
                .map(Value::UInt)
                .map_err(|_| invalid_value_for_type("unsigned integer", s)),
            DataType::R4 | DataType::R8 | DataType::Number | DataType::Float | DataType::Fixed14_4 => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid_value_for_type("float", s)),
            DataType::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|_| Value::String(s.to_string()))
                .map_err(|_| invalid_value_for_type("date", s)),
            DataType::DateTime | DataType::DateTimeTz => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(|_| Value::String(s.to_string()))
                .or_else(|_| {
                    chrono::DateTime::parse_from_rfc3339(s).map(|_| Value::String(s.to_string()))
                })
                .map_err(|_| invalid_value_for_type("dateTime", s)),
            DataType::Time | DataType::TimeTz => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map(|_| Value::String(s.to_string()))
                .map_err(|_| invalid_value_for_type("time", s)),
            DataType::BinHex => {
                if s.len() % 2 != 0 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid_value_for_type("bin.hex", s));
                }
                let bytes = (0..s.len())
                    .step_by(2)
                    .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
                    .collect();
                Ok(Value::Binary(bytes))
            }
            DataType::BinBase64 => base64::engine::general_purpose::STANDARD
                .decode(s)
                .map(Value::Binary)
                .map_err(|_| invalid_value_for_type("bin.base64", s)),
            DataType::Char | DataType::String | DataType::Uri | DataType::Uuid => {
                Ok(Value::String(s.to_string()))
            }
        }
    }

    /// Encodes `value` into its canonical wire form for this type (§4.5).
    pub fn encode_value(&self, value: &Value) -> String {
        match (self, value) {
            (DataType::Boolean, Value::Boolean(b)) => if *b { "1" } else { "0" }.to_string(),
            (DataType::BinBase64, Value::Binary(bytes)) => {
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
            (DataType::BinHex, Value::Binary(bytes)) => {
                bytes.iter().map(|b| format!("{:02x}", b)).collect()
            }
            (_, Value::Int(n)) => n.to_string(),
            (_, Value::UInt(n)) => n.to_string(),
            (_, Value::Float(n)) => n.to_string(),
            (_, Value::String(s)) => s.clone(),
            (_, Value::Boolean(b)) => if *b { "1" } else { "0" }.to_string(),
            (_, Value::Binary(bytes)) => base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DataType::Boolean => "boolean",
                DataType::I1 => "i1",
                DataType::I2 => "i2",
                DataType::I4 => "i4",
                DataType::Ui1 => "ui1",
                DataType::Ui2 => "ui2",
                DataType::Ui4 => "ui4",
                DataType::R4 => "r4",
                DataType::R8 => "r8",
                DataType::Number => "number",
                DataType::Float => "float",
                DataType::Fixed14_4 => "fixed.14.4",
                DataType::Char => "char",
                DataType::String => "string",
                DataType::Date => "date",
                DataType::DateTime => "dateTime",
                DataType::DateTimeTz => "dateTime.tz",
                DataType::Time => "time",
                DataType::TimeTz => "time.tz",
                DataType::BinHex => "bin.hex",
                DataType::BinBase64 => "bin.base64",
                DataType::Uri => "uri",
                DataType::Uuid => "uuid",
            }
        )
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_boolean_canonical_form() {
        let dt = DataType::Boolean;
        let value = dt.parse_value("1").unwrap();
        assert_eq!(dt.encode_value(&value), "1");
    }

    #[test]
    fn accepts_boolean_aliases_but_canonicalizes_on_encode() {
        let dt = DataType::Boolean;
        let value = dt.parse_value("true").unwrap();
        assert_eq!(dt.encode_value(&value), "1");
    }

    #[test]
    fn round_trips_base64_binary() {
        let dt = DataType::BinBase64;
        let value = dt.parse_value("aGVsbG8=").unwrap();
        assert_eq!(dt.encode_value(&value), "aGVsbG8=");
    }

    #[test]
    fn integer_default_step_is_one() {
        assert_eq!(DataType::I4.default_step(100.0), 1.0);
    }

    #[test]
    fn rational_default_step_depends_on_max() {
        assert_eq!(DataType::R4.default_step(0.5), 0.05);
        assert_eq!(DataType::R4.default_step(100.0), 1.0);
    }
}
