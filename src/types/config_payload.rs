use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One cargo type entry, in the order the API returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoType {
    pub id: String,
    pub name: String,
    pub value: String,
}

/// Envelope returned by `GET <base>/config?type=all&lang=<code>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEnvelope {
    pub success: bool,
    #[serde(default)]
    pub translations: Option<Value>,
    #[serde(default)]
    pub cargo_types: Option<Vec<CargoType>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Translations and cargo types for one language. Replaced wholesale on each fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    /// Flattened dotted key path -> text.
    pub translations: BTreeMap<String, String>,
    pub cargo_types: Vec<CargoType>,
}

impl ConfigPayload {
    pub fn from_parts(translations: Option<&Value>, cargo_types: Vec<CargoType>) -> Self {
        let mut flat = BTreeMap::new();
        if let Some(value) = translations {
            flatten_into(&mut flat, String::new(), value);
        }
        Self {
            translations: flat,
            cargo_types,
        }
    }

    pub fn translation(&self, key_path: &str) -> Option<&str> {
        self.translations.get(key_path).map(String::as_str)
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, path, child);
            }
        }
        Value::String(text) if !prefix.is_empty() => {
            out.insert(prefix, text.clone());
        }
        Value::Number(n) if !prefix.is_empty() => {
            out.insert(prefix, n.to_string());
        }
        Value::Bool(b) if !prefix.is_empty() => {
            out.insert(prefix, b.to_string());
        }
        // arrays and nulls carry no addressable text
        _ => {}
    }
}
