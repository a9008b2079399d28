//! The cast matrix between value kinds.
//!
//! Casts are total over the kind enumeration: every (source, target) pair
//! either produces a new value whose kind is exactly the target, or fails
//! with a [`CastError`]. Casting never coerces to a default and never
//! produces an implementation-defined bit pattern.
//!
//! Semantics:
//! - Casting to the value's own kind returns an equal value (all kinds).
//! - Numeric casts use `as` semantics for the width/signedness pair;
//!   floating to integral truncates toward zero.
//! - Boolean interpretation of a numeric scalar is non-zero *after integral
//!   truncation*: `0.9` is false, `1.0` and `-1.5` are true.
//! - String casts of scalars produce the canonical literal text; parsing a
//!   string into a scalar kind fails on anything that is not a valid
//!   literal for that kind.
//! - Everything across categories (compound to numeric, opaque to string,
//!   and so on) fails.

use crate::error::CastError;
use crate::value::{Value, ValueKind};

/// Numeric view of a scalar source, preserving integral/floating identity
/// so target conversions keep exact `as` semantics.
enum Scalar {
    Int(i64),
    Float(f64),
}

fn scalar_view(value: &Value) -> Option<Scalar> {
    match value {
        Value::Bool(b) => Some(Scalar::Int(*b as i64)),
        Value::I8(v) => Some(Scalar::Int(*v as i64)),
        Value::I16(v) => Some(Scalar::Int(*v as i64)),
        Value::I32(v) => Some(Scalar::Int(*v as i64)),
        Value::I64(v) => Some(Scalar::Int(*v)),
        // f32 to f64 is exact, so the f64 view loses nothing.
        Value::F32(v) => Some(Scalar::Float(*v as f64)),
        Value::F64(v) => Some(Scalar::Float(*v)),
        _ => None,
    }
}

fn cast_scalar(scalar: Scalar, target: ValueKind) -> Option<Value> {
    let value = match target {
        ValueKind::Bool => match scalar {
            Scalar::Int(i) => Value::Bool(i != 0),
            // Truncate first: a magnitude below one is false.
            Scalar::Float(f) => Value::Bool((f as i64) != 0),
        },
        ValueKind::I8 => match scalar {
            Scalar::Int(i) => Value::I8(i as i8),
            Scalar::Float(f) => Value::I8(f as i8),
        },
        ValueKind::I16 => match scalar {
            Scalar::Int(i) => Value::I16(i as i16),
            Scalar::Float(f) => Value::I16(f as i16),
        },
        ValueKind::I32 => match scalar {
            Scalar::Int(i) => Value::I32(i as i32),
            Scalar::Float(f) => Value::I32(f as i32),
        },
        ValueKind::I64 => match scalar {
            Scalar::Int(i) => Value::I64(i),
            Scalar::Float(f) => Value::I64(f as i64),
        },
        ValueKind::F32 => match scalar {
            Scalar::Int(i) => Value::F32(i as f32),
            Scalar::Float(f) => Value::F32(f as f32),
        },
        ValueKind::F64 => match scalar {
            Scalar::Int(i) => Value::F64(i as f64),
            Scalar::Float(f) => Value::F64(f),
        },
        _ => return None,
    };

    Some(value)
}

fn parse_literal(text: &str, target: ValueKind) -> Result<Value, CastError> {
    let invalid = || CastError::InvalidLiteral {
        literal: text.to_string(),
        target,
    };

    match target {
        ValueKind::Bool => text.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        ValueKind::I8 => text.parse::<i8>().map(Value::I8).map_err(|_| invalid()),
        ValueKind::I16 => text.parse::<i16>().map(Value::I16).map_err(|_| invalid()),
        ValueKind::I32 => text.parse::<i32>().map(Value::I32).map_err(|_| invalid()),
        ValueKind::I64 => text.parse::<i64>().map(Value::I64).map_err(|_| invalid()),
        ValueKind::F32 => text.parse::<f32>().map(Value::F32).map_err(|_| invalid()),
        ValueKind::F64 => text.parse::<f64>().map(Value::F64).map_err(|_| invalid()),
        _ => Err(CastError::Incompatible {
            from: ValueKind::Str,
            to: target,
        }),
    }
}

impl Value {
    /// Cast this value to the target kind, consuming it.
    ///
    /// On success the result's kind is exactly `target`; on failure the
    /// source is gone and the error describes why the pair is undefined.
    pub fn cast(self, target: ValueKind) -> Result<Value, CastError> {
        let from = self.kind();

        // Idempotence: a value already of the target kind is returned as is.
        if from == target {
            return Ok(self);
        }

        // Scalar to string uses the canonical literal text.
        if target == ValueKind::Str && from.is_scalar() {
            return Ok(Value::Str(self.to_string()));
        }

        // String to scalar parses strictly.
        if let Value::Str(text) = &self {
            return parse_literal(text, target);
        }

        // Scalar to scalar.
        if let Some(scalar) = scalar_view(&self) {
            if let Some(value) = cast_scalar(scalar, target) {
                return Ok(value);
            }
        }

        Err(CastError::Incompatible { from, to: target })
    }
}
