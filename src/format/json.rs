use super::registry::Formatter;
use crate::error::Result;
use serde_json::Value;

/// `application/json` via `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Formatter for JsonFormatter {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn format(&self, _root: &str, value: &Value) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_and_pretty() {
        let value = json!({"a": 1});
        assert_eq!(JsonFormatter::default().format("x", &value).unwrap(), br#"{"a":1}"#);
        let pretty = String::from_utf8(JsonFormatter::pretty().format("x", &value).unwrap()).unwrap();
        assert!(pretty.contains('\n'));
    }
}
