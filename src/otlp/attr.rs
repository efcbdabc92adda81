use std::collections::BTreeMap;

use opentelemetry_proto::tonic::common::v1::any_value::Value as PbValue;
use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue};
use ottl::Value;

/// Converts an OTLP attribute value into a dynamic expression value. An
/// attribute with no inner value maps to nil.
pub fn to_value(value: &AnyValue) -> Value {
    match &value.value {
        None => Value::Nil,
        Some(PbValue::StringValue(s)) => Value::String(s.clone()),
        Some(PbValue::BoolValue(b)) => Value::Bool(*b),
        Some(PbValue::IntValue(i)) => Value::Int(*i),
        Some(PbValue::DoubleValue(d)) => Value::Float(*d),
        Some(PbValue::ArrayValue(a)) => Value::List(a.values.iter().map(to_value).collect()),
        Some(PbValue::KvlistValue(kv)) => Value::Map(
            kv.values
                .iter()
                .map(|entry| {
                    let value = entry.value.as_ref().map(to_value).unwrap_or(Value::Nil);
                    (entry.key.clone(), value)
                })
                .collect::<BTreeMap<String, Value>>(),
        ),
        Some(PbValue::BytesValue(b)) => Value::Bytes(b.clone()),
    }
}

/// Looks up an attribute by key. Presence is a single linear scan; the
/// attribute lists flowing through the pipeline are small.
pub fn find_attribute<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a KeyValue> {
    attributes.iter().find(|kv| kv.key == key)
}

pub fn has_attribute(attributes: &[KeyValue], key: &str) -> bool {
    find_attribute(attributes, key).is_some()
}

/// The attribute's dynamic value, or nil when the key is absent.
pub fn get_attribute_value(attributes: &[KeyValue], key: &str) -> Value {
    match find_attribute(attributes, key) {
        Some(kv) => kv.value.as_ref().map(to_value).unwrap_or(Value::Nil),
        None => Value::Nil,
    }
}

/// The whole attribute list as a map value.
pub fn attributes_to_map(attributes: &[KeyValue]) -> Value {
    Value::Map(
        attributes
            .iter()
            .map(|kv| {
                let value = kv.value.as_ref().map(to_value).unwrap_or(Value::Nil);
                (kv.key.clone(), value)
            })
            .collect::<BTreeMap<String, Value>>(),
    )
}

pub fn string_attribute(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(PbValue::StringValue(value.to_string())),
        }),
    }
}

/// Sets a string attribute, overwriting an existing key in place so the
/// list order is retained, appending otherwise.
pub fn put_string_attribute(attributes: &mut Vec<KeyValue>, key: &str, value: &str) {
    let new_value = Some(AnyValue {
        value: Some(PbValue::StringValue(value.to_string())),
    });
    match attributes.iter_mut().find(|kv| kv.key == key) {
        Some(existing) => existing.value = new_value,
        None => attributes.push(KeyValue {
            key: key.to_string(),
            value: new_value,
        }),
    }
}
