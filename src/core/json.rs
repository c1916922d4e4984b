use crate::utils::error::{Result, SosError};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

/// Decodes an API response body.
pub fn json_decode(rsp: &str) -> Result<Value> {
    serde_json::from_str(rsp).map_err(|_| {
        SosError::value(format!("Failed to recognize JSON payload:\n[{}]", rsp))
    })
}

/// Encodes `value` as the single attribute `name` of a JSON object.
pub fn json_encode<T: Serialize + ?Sized>(name: &str, value: &T) -> Result<String> {
    let mut body = Map::new();
    body.insert(name.to_string(), serde_json::to_value(value)?);
    Ok(serde_json::to_string(&Value::Object(body))?)
}

/// 以排序後的鍵、三個空白縮排輸出 JSON
pub fn format_json_object(obj: &Value) -> Result<String> {
    let sorted = sort_keys(obj);
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    sorted.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| SosError::failure(e.to_string()))
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn is_empty_object(obj: &Value) -> bool {
    match obj {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn required<'a>(obj: &'a Value, field: &str) -> Result<&'a Value> {
    obj.get(field)
        .ok_or_else(|| SosError::value(format!("Missing field '{}' in response", field)))
}

/// Items under `parent` (or each item's `child`); a non-list node yields one element.
pub fn get_list(obj: &Value, parent: &str, child: Option<&str>) -> Result<Vec<Value>> {
    if is_empty_object(obj) {
        return Ok(Vec::new());
    }

    let node = required(obj, parent)?;
    let pick = |detail: &Value| -> Result<Value> {
        match child {
            Some(child) => required(detail, child).cloned(),
            None => Ok(detail.clone()),
        }
    };

    match node {
        Value::Array(items) => items.iter().map(pick).collect(),
        single => Ok(vec![pick(single)?]),
    }
}

/// Value of `parent` (or `parent.child`); `None` when anything along the way is absent.
pub fn get_node_value<'a>(obj: &'a Value, parent: &str, child: Option<&str>) -> Option<&'a Value> {
    if is_empty_object(obj) || parent.is_empty() {
        return None;
    }

    let detail = obj.get(parent)?;
    match child {
        Some(child) => detail.get(child),
        None => Some(detail),
    }
}

/// The `id` field as a list of ids.
pub fn get_object_id(obj: &Value) -> Result<Vec<String>> {
    if is_empty_object(obj) {
        return Ok(Vec::new());
    }

    match required(obj, "id")? {
        Value::String(id) => Ok(vec![id.clone()]),
        Value::Array(ids) => ids
            .iter()
            .map(|id| {
                id.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SosError::value(format!("Unexpected id value: {}", id)))
            })
            .collect(),
        other => Err(SosError::value(format!("Unexpected id value: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_decode_error_message() {
        let err = json_decode("not json").unwrap_err();
        assert_eq!(err.code(), 4);
        assert_eq!(err.to_string(), "Failed to recognize JSON payload:\n[not json]");

        let value = json_decode(r#"{"name": "volé"}"#).unwrap();
        assert_eq!(value["name"], "volé");
    }

    #[test]
    fn test_json_encode() {
        assert_eq!(
            json_encode("name", "vol1").unwrap(),
            r#"{"name":"vol1"}"#
        );
        assert_eq!(
            json_encode("ids", &vec![1, 2]).unwrap(),
            r#"{"ids":[1,2]}"#
        );
    }

    #[test]
    fn test_format_json_object_sorts_and_indents() {
        let formatted = format_json_object(&json!({"b": 1, "a": {"d": 2, "c": 3}})).unwrap();
        assert_eq!(
            formatted,
            "{\n   \"a\": {\n      \"c\": 3,\n      \"d\": 2\n   },\n   \"b\": 1\n}"
        );
    }

    #[test]
    fn test_get_list() {
        let obj = json!({"volume": [{"id": "1"}, {"id": "2"}], "single": {"id": "3"}});
        assert_eq!(
            get_list(&obj, "volume", Some("id")).unwrap(),
            vec![json!("1"), json!("2")]
        );
        assert_eq!(get_list(&obj, "single", None).unwrap(), vec![json!({"id": "3"})]);
        assert!(get_list(&json!({}), "volume", None).unwrap().is_empty());
        assert!(get_list(&obj, "missing", None).is_err());
    }

    #[test]
    fn test_get_node_value() {
        let obj = json!({"vpool": {"name": "gold"}});
        assert_eq!(get_node_value(&obj, "vpool", Some("name")), Some(&json!("gold")));
        assert_eq!(get_node_value(&obj, "vpool", Some("size")), None);
        assert_eq!(get_node_value(&obj, "", None), None);
        assert_eq!(get_node_value(&json!(null), "vpool", None), None);
    }

    #[test]
    fn test_get_object_id() {
        assert_eq!(get_object_id(&json!({"id": "urn:1"})).unwrap(), vec!["urn:1"]);
        assert_eq!(
            get_object_id(&json!({"id": ["a", "b"]})).unwrap(),
            vec!["a", "b"]
        );
        assert!(get_object_id(&json!({})).unwrap().is_empty());
        assert!(get_object_id(&json!({"id": 5})).is_err());
    }
}
