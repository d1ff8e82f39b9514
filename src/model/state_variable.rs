/*!
State variables: the named, typed values that make up a service's state table, optionally
constrained to an allowed-value list or numeric range, and optionally evented over GENA.
*/

use crate::error::{invalid_argument, Error};
use crate::model::datatype::{DataType, Value};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub enum AllowedValue {
    List(Vec<String>),
    Range {
        minimum: f64,
        maximum: f64,
        step: f64,
    },
}

#[derive(Clone, Debug)]
pub struct StateVariable {
    pub name: String,
    pub data_type: DataType,
    pub send_events: bool,
    pub default_value: Option<Value>,
    pub allowed_values: Option<AllowedValue>,
    current_value: Value,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl StateVariable {
    pub fn new(name: impl Into<String>, data_type: DataType, send_events: bool) -> Self {
        let current_value = default_for(data_type);
        StateVariable {
            name: name.into(),
            data_type,
            send_events,
            default_value: None,
            allowed_values: None,
            current_value,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.current_value = value.clone();
        self.default_value = Some(value);
        self
    }

    pub fn with_allowed_values(mut self, allowed: AllowedValue) -> Self {
        self.allowed_values = Some(allowed);
        self
    }

    pub fn current_value(&self) -> &Value {
        &self.current_value
    }

    /// Sets the current value, checking it against an allowed-value list or range if one was
    /// declared (§3, StateVariable invariants: "every value set on a constrained variable lies in
    /// its allowed set").
    pub fn set_value(&mut self, value: Value) -> Result<(), Error> {
        self.check_allowed(&value)?;
        self.current_value = value;
        Ok(())
    }

    fn check_allowed(&self, value: &Value) -> Result<(), Error> {
        match &self.allowed_values {
            None => Ok(()),
            Some(AllowedValue::List(values)) => {
                let encoded = self.data_type.encode_value(value);
                if values.iter().any(|v| v == &encoded) {
                    Ok(())
                } else {
                    Err(invalid_argument(&self.name, "value not in allowed value list"))
                }
            }
            Some(AllowedValue::Range { minimum, maximum, .. }) => {
                let as_f64 = match value {
                    Value::Int(n) => *n as f64,
                    Value::UInt(n) => *n as f64,
                    Value::Float(n) => *n,
                    _ => return Err(invalid_argument(&self.name, "value is not numeric")),
                };
                if as_f64 < *minimum || as_f64 > *maximum {
                    Err(invalid_argument(&self.name, "value outside allowed range"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn default_for(data_type: DataType) -> Value {
    if data_type.is_numeric() {
        Value::Int(0)
    } else {
        match data_type {
            DataType::Boolean => Value::Boolean(false),
            DataType::BinHex | DataType::BinBase64 => Value::Binary(Vec::new()),
            _ => Value::String(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_value_outside_range() {
        let mut var = StateVariable::new("Volume", DataType::Ui2, true).with_allowed_values(
            AllowedValue::Range {
                minimum: 0.0,
                maximum: 100.0,
                step: 1.0,
            },
        );
        assert!(var.set_value(Value::UInt(150)).is_err());
        assert!(var.set_value(Value::UInt(50)).is_ok());
        assert_eq!(var.current_value(), &Value::UInt(50));
    }

    #[test]
    fn rejects_value_not_in_list() {
        let mut var = StateVariable::new("Preset", DataType::String, false)
            .with_allowed_values(AllowedValue::List(vec!["Low".to_string(), "High".to_string()]));
        assert!(var.set_value(Value::String("Medium".to_string())).is_err());
        assert!(var.set_value(Value::String("High".to_string())).is_ok());
    }

    #[test]
    fn unconstrained_variable_accepts_anything() {
        let mut var = StateVariable::new("LastChange", DataType::String, true);
        assert!(var.set_value(Value::String("<Event/>".to_string())).is_ok());
    }
}
