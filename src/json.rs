//! Helpers shared by every primitive's JSON fragment reader/writer:
//! the `nan`/`inf`/`-inf` numeric convention and small `Value` accessors.

use serde_json::{Map, Value};

use crate::error::Error;

/// Encode an `f64`, using the `"nan"`/`"inf"`/`"-inf"` string convention for
/// non-finite values so the document stays valid JSON.
pub fn num_to_json(x: f64) -> Value {
    if x.is_nan() {
        Value::String("nan".to_string())
    } else if x == f64::INFINITY {
        Value::String("inf".to_string())
    } else if x == f64::NEG_INFINITY {
        Value::String("-inf".to_string())
    } else {
        serde_json::Number::from_f64(x)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String("nan".to_string()))
    }
}

/// Decode an `f64` written by [`num_to_json`]. Accepts both the bare number
/// form and the quoted non-finite sentinels.
pub fn num_from_json(v: &Value) -> Result<f64, Error> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::JsonFormat(format!("not a finite JSON number: {n}"))),
        Value::String(s) => match s.as_str() {
            "nan" => Ok(f64::NAN),
            "inf" | "+inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => other
                .parse::<f64>()
                .map_err(|_| Error::JsonFormat(format!("not a number: {other:?}"))),
        },
        other => Err(Error::JsonFormat(format!(
            "expected a number or nan/inf string, got {other}"
        ))),
    }
}

pub fn obj(v: &Value) -> Result<&Map<String, Value>, Error> {
    v.as_object()
        .ok_or_else(|| Error::JsonFormat(format!("expected a JSON object, got {v}")))
}

pub fn field<'a>(m: &'a Map<String, Value>, key: &str) -> Result<&'a Value, Error> {
    m.get(key)
        .ok_or_else(|| Error::JsonFormat(format!("missing required field {key:?}")))
}

pub fn field_f64(m: &Map<String, Value>, key: &str) -> Result<f64, Error> {
    num_from_json(field(m, key)?)
}

pub fn field_str<'a>(m: &'a Map<String, Value>, key: &str) -> Result<&'a str, Error> {
    field(m, key)?
        .as_str()
        .ok_or_else(|| Error::JsonFormat(format!("field {key:?} is not a string")))
}

pub fn field_i64(m: &Map<String, Value>, key: &str) -> Result<i64, Error> {
    field(m, key)?
        .as_i64()
        .ok_or_else(|| Error::JsonFormat(format!("field {key:?} is not an integer")))
}

pub fn opt_name(m: &Map<String, Value>, name_from_parent: Option<String>) -> Result<Option<String>, Error> {
    match m.get("name") {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(name_from_parent),
        Some(other) => Err(Error::JsonFormat(format!("field \"name\" is not a string: {other}"))),
    }
}

pub fn with_name(mut map: Map<String, Value>, name: &Option<String>, suppress_name: bool) -> Value {
    if let (false, Some(n)) = (suppress_name, name) {
        map.insert("name".to_string(), Value::String(n.clone()));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_inf_round_trip() {
        for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -3.5] {
            let v = num_to_json(x);
            let back = num_from_json(&v).unwrap();
            if x.is_nan() {
                assert!(back.is_nan());
            } else {
                assert_eq!(back, x);
            }
        }
    }

    #[test]
    fn accepts_quoted_and_bare_finite_numbers() {
        assert_eq!(num_from_json(&serde_json::json!(3.5)).unwrap(), 3.5);
        assert_eq!(num_from_json(&serde_json::json!("3.5")).unwrap(), 3.5);
    }
}
