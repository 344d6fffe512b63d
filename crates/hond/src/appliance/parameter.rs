use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::value::render;

/// Command parameters keyed by `<command>.<parameter>`, e.g. `startProgram.delayTime`.
pub type Settings = BTreeMap<String, Parameter>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("value {value} not allowed (min {min}, max {max}, step {step})")]
    OutOfRange {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },

    #[error("value '{value}' not allowed, expected one of {allowed:?}")]
    NotAllowed { value: String, allowed: Vec<String> },

    #[error("value '{0}' is not a number")]
    NotANumber(String),

    #[error("parameter is read-only")]
    ReadOnly,
}

/// A settable command parameter as reported by the appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Parameter {
    Range {
        min: f64,
        max: f64,
        step: f64,
        value: f64,
    },
    Enum {
        values: Vec<String>,
        value: String,
    },
    Fixed {
        value: Value,
    },
}

impl Parameter {
    pub fn value(&self) -> Value {
        match self {
            Parameter::Range { value, .. } => Value::from(*value),
            Parameter::Enum { value, .. } => Value::String(value.clone()),
            Parameter::Fixed { value } => value.clone(),
        }
    }

    /// Numeric view of the current value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parameter::Range { value, .. } => Some(*value),
            Parameter::Enum { value, .. } => value.trim().parse().ok(),
            Parameter::Fixed { value } => match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            },
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Parameter::Range { .. })
    }

    /// Set a range value. The value must lie in `[min, max]` on a step boundary.
    pub fn set_number(&mut self, new: f64) -> Result<(), ParameterError> {
        match self {
            Parameter::Range {
                min,
                max,
                step,
                value,
            } => {
                if !(*min..=*max).contains(&new) || !on_step(new, *min, *step) {
                    return Err(ParameterError::OutOfRange {
                        value: new,
                        min: *min,
                        max: *max,
                        step: *step,
                    });
                }
                *value = new;
                Ok(())
            }
            Parameter::Enum { .. } => self.set_value(&Value::from(new)),
            Parameter::Fixed { .. } => Err(ParameterError::ReadOnly),
        }
    }

    /// Set a value of any parameter kind from its JSON form.
    pub fn set_value(&mut self, new: &Value) -> Result<(), ParameterError> {
        match self {
            Parameter::Range { .. } => {
                let rendered = render(new);
                let number = match new {
                    Value::Number(n) => n.as_f64(),
                    _ => rendered.trim().parse().ok(),
                }
                .ok_or(ParameterError::NotANumber(rendered))?;
                self.set_number(number)
            }
            Parameter::Enum { values, value } => {
                let rendered = render(new);
                // Enum values arrive as strings; 1.0 from a number entity must match "1"
                let candidate = match new.as_f64() {
                    Some(f) if f.fract() == 0.0 => format!("{}", f as i64),
                    _ => rendered,
                };
                if !values.contains(&candidate) {
                    return Err(ParameterError::NotAllowed {
                        value: candidate,
                        allowed: values.clone(),
                    });
                }
                *value = candidate;
                Ok(())
            }
            Parameter::Fixed { .. } => Err(ParameterError::ReadOnly),
        }
    }
}

fn on_step(value: f64, min: f64, step: f64) -> bool {
    if step <= 0.0 {
        return true;
    }
    let steps = (value - min) / step;
    (steps - steps.round()).abs() < 1e-6
}
