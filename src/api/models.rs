use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandKit {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub fonts: Option<Vec<String>>,
    pub industry: Option<String>,
}

#[derive(Serialize)]
pub struct RootMessage {
    pub message: &'static str,
}

impl BrandKit {
    /// Maps extracted keys onto the kit. Missing keys and values of the wrong type become `None`.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        BrandKit {
            name: text_field(fields, "name"),
            domain: text_field(fields, "domain"),
            logo_url: text_field(fields, "logo_url"),
            primary_color: text_field(fields, "primary_color"),
            secondary_color: text_field(fields, "secondary_color"),
            accent_color: text_field(fields, "accent_color"),
            fonts: list_field(fields, "fonts"),
            industry: text_field(fields, "industry"),
        }
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => {
            tracing::warn!(key, value = %other, "Dropping brand kit field with unexpected type");
            None
        }
    }
}

fn list_field(fields: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match fields.get(key)? {
        Value::Null => None,
        Value::Array(items) => {
            let names: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            if names.len() < items.len() {
                tracing::warn!(
                    key,
                    dropped = items.len() - names.len(),
                    "Dropping non-string entries from brand kit list"
                );
            }
            Some(names)
        }
        other => {
            tracing::warn!(key, value = %other, "Dropping brand kit field with unexpected type");
            None
        }
    }
}
