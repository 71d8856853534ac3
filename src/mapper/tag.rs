use super::models::{BackendTag, TagContext, DEFAULT_TAG_CATEGORY, DEFAULT_TAG_COLOR};
use super::registry::TypedMapper;
use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct TagMapper;

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TypedMapper for TagMapper {
    const NAME: &'static str = "tag";
    const BACKEND_IDENTITY: &'static [&'static str] = &["name"];
    const CONTEXT_IDENTITY: &'static [&'static str] = &["name"];

    type Backend = BackendTag;
    type Context = TagContext;

    fn to_context(&self, backend: BackendTag) -> Result<TagContext> {
        let color = non_empty(backend.color).unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string());
        if !is_hex_color(&color) {
            return Err(GatewayError::invalid_field(
                "color",
                format!("tag '{}' has invalid color '{color}'", backend.name),
                "format",
            ));
        }
        Ok(TagContext {
            name: backend.name,
            description: non_empty(backend.comment),
            definition: non_empty(backend.definition),
            kernel_opts: non_empty(backend.kernel_opts),
            category: non_empty(backend.category)
                .unwrap_or_else(|| DEFAULT_TAG_CATEGORY.to_string()),
            color,
        })
    }

    fn to_backend(&self, context: TagContext) -> Result<BackendTag> {
        if !is_hex_color(&context.color) {
            return Err(GatewayError::invalid_field(
                "color",
                format!("tag '{}' has invalid color '{}'", context.name, context.color),
                "format",
            ));
        }
        Ok(BackendTag {
            name: context.name,
            comment: context.description,
            definition: context.definition,
            kernel_opts: context.kernel_opts,
            category: Some(context.category),
            color: Some(context.color),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mapper::ResourceMapper;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let ctx = TagMapper
            .map_to_context(&json!({"name": "gpu", "comment": ""}))
            .unwrap();
        assert_eq!(ctx["category"], DEFAULT_TAG_CATEGORY);
        assert_eq!(ctx["color"], DEFAULT_TAG_COLOR);
        assert!(ctx.get("description").is_none());
    }

    #[test]
    fn test_explicit_values_kept() {
        let ctx = TagMapper
            .map_to_context(&json!({"name": "db", "category": "role", "color": "#FF0000"}))
            .unwrap();
        assert_eq!(ctx["category"], "role");
        assert_eq!(ctx["color"], "#FF0000");
    }

    #[test]
    fn test_invalid_color_rejected() {
        let err = TagMapper
            .map_to_context(&json!({"name": "db", "color": "red"}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_missing_name_rejected() {
        let err = TagMapper.map_to_backend(&json!({"name": "  "})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
