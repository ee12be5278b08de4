//! State codec
//!
//! Turns opaque engine state into the JSON text carried by `StateUpdate`.
//! Numeric arrays become (nested) sequences of plain numbers; integer
//! element types stay integers and float element types stay floats.

use crate::state::{ArrayData, NumericArray, StateValue};
use serde_json::Value;

/// Encode a state value into a transport-safe JSON string
pub fn encode(value: &StateValue) -> String {
    to_json(value).to_string()
}

/// Convert a state value into plain JSON.
///
/// Map keys come out sorted. Non-finite floats have no JSON form and become `null`.
pub fn to_json(value: &StateValue) -> Value {
    match value {
        StateValue::Null => Value::Null,
        StateValue::Bool(b) => Value::Bool(*b),
        StateValue::Int(i) => Value::from(*i),
        StateValue::UInt(u) => Value::from(*u),
        StateValue::Float(f) => Value::from(*f),
        StateValue::Str(s) => Value::String(s.clone()),
        StateValue::Seq(items) => Value::Array(items.iter().map(to_json).collect()),
        StateValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        StateValue::Array(array) => array_to_json(array),
    }
}

fn array_to_json(array: &NumericArray) -> Value {
    let flat = flatten(array.data());
    nest(&flat, array.shape())
}

fn flatten(data: &ArrayData) -> Vec<Value> {
    fn ints<T: Copy + Into<i64>>(v: &[T]) -> Vec<Value> {
        v.iter().map(|x| Value::from((*x).into())).collect()
    }

    match data {
        ArrayData::I8(v) => ints(v),
        ArrayData::I16(v) => ints(v),
        ArrayData::I32(v) => ints(v),
        ArrayData::I64(v) => ints(v),
        ArrayData::U8(v) => ints(v),
        ArrayData::U16(v) => ints(v),
        ArrayData::U32(v) => ints(v),
        ArrayData::U64(v) => v.iter().map(|x| Value::from(*x)).collect(),
        ArrayData::F32(v) => v.iter().map(|x| Value::from(f64::from(*x))).collect(),
        ArrayData::F64(v) => v.iter().map(|x| Value::from(*x)).collect(),
    }
}

fn nest(flat: &[Value], shape: &[usize]) -> Value {
    match shape {
        // Zero-dimensional: a single scalar
        [] => flat.first().cloned().unwrap_or(Value::Null),
        [_] => Value::Array(flat.to_vec()),
        [rows, inner @ ..] => {
            let stride: usize = inner.iter().product();
            Value::Array(
                (0..*rows)
                    .map(|i| nest(&flat[i * stride..(i + 1) * stride], inner))
                    .collect(),
            )
        }
    }
}
