use super::*;
use crate::error::ErrorKind;
use proptest::prelude::*;

#[test]
fn test_parse_full_uri() {
    let parsed = parse("maas://machine/abc123/interfaces/eth0?limit=10&filter=name%20eq%20x").unwrap();
    assert_eq!(parsed.scheme, "maas");
    assert_eq!(parsed.resource_type, "machine");
    assert_eq!(parsed.resource_id.as_deref(), Some("abc123"));
    assert_eq!(parsed.sub_resource_type.as_deref(), Some("interfaces"));
    assert_eq!(parsed.sub_resource_id.as_deref(), Some("eth0"));
    assert_eq!(parsed.get_query_param("limit"), Some("10"));
    assert_eq!(parsed.get_query_param("filter"), Some("name eq x"));
    assert_eq!(parsed.path_uri(), "maas://machine/abc123/interfaces/eth0");
}

#[test]
fn test_parse_collection_uri() {
    let parsed = parse("maas://machine").unwrap();
    assert_eq!(parsed.resource_type, "machine");
    assert!(parsed.resource_id.is_none());
    assert!(parsed.query_params.is_empty());
}

#[test]
fn test_parse_rejects_malformed() {
    for uri in ["machine/abc", "://machine", "maas://", "maas:///"] {
        let err = parse(uri).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{uri}");
        assert_eq!(err.field_errors()[0].field, "uri");
    }
}

#[test]
fn test_power_action_enum() {
    let pattern = UriPattern::compile("maas://machine/{system_id}/power/{action:on|off}").unwrap();
    let m = pattern.match_uri("maas://machine/abc123/power/on").unwrap();
    assert_eq!(m.get_param("system_id"), Some("abc123"));
    assert_eq!(m.get_param("action"), Some("on"));
    assert_eq!(m.parsed.resource_id.as_deref(), Some("abc123"));

    let err = pattern.match_uri("maas://machine/abc123/power/restart").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_optional_segment() {
    let pattern = UriPattern::compile("maas://machine/{system_id?}").unwrap();
    let collection = pattern.match_uri("maas://machine").unwrap();
    assert_eq!(collection.get_param("system_id"), None);
    assert_eq!(collection.parameters.len(), 1);
    assert_eq!(collection.parameters[0].1, "");

    let single = pattern.match_uri("maas://machine/abc").unwrap();
    assert_eq!(single.get_param("system_id"), Some("abc"));
    assert!(pattern.match_uri("maas://machine/abc/extra").is_err());
}

#[test]
fn test_optional_after_enumerated_segment() {
    let pattern = UriPattern::compile("maas://machine/{a:x|y}/{id?}").unwrap();
    assert_eq!(pattern.resource_type, "machine");
    assert!(!pattern.params()[0].optional);
    assert!(pattern.params()[1].optional);

    let present = pattern.match_uri("maas://machine/x/abc").unwrap();
    assert_eq!(present.get_param("a"), Some("x"));
    assert_eq!(present.get_param("id"), Some("abc"));

    let absent = pattern.match_uri("maas://machine/y").unwrap();
    assert_eq!(absent.get_param("id"), None);
    assert!(pattern.match_uri("maas://machine/z").is_err());
}

#[test]
fn test_pattern_query_string_is_dropped() {
    let pattern = UriPattern::compile("maas://machine/{id?}?limit=5").unwrap();
    assert_eq!(pattern.params().len(), 1);
    assert!(pattern.is_match("maas://machine"));
    assert!(pattern.is_match("maas://machine/abc?limit=1"));
}

#[test]
fn test_query_and_trailing_slash_ignored() {
    let pattern = UriPattern::compile("maas://machine/{id}").unwrap();
    assert!(pattern.is_match("maas://machine/abc?limit=5"));
    assert!(pattern.is_match("maas://machine/abc/"));
    let m = pattern.match_uri("maas://machine/abc?limit=5").unwrap();
    assert_eq!(m.parsed.get_query_param("limit"), Some("5"));
}

#[test]
fn test_scheme_and_type_must_match() {
    let pattern = UriPattern::compile("maas://machine/{id}").unwrap();
    assert!(!pattern.is_match("other://machine/abc"));
    assert!(!pattern.is_match("maas://subnet/abc"));
}

#[test]
fn test_literal_text_is_escaped() {
    let pattern = UriPattern::compile("maas://machine.v2/{id}").unwrap();
    assert!(pattern.is_match("maas://machine.v2/a"));
    assert!(!pattern.is_match("maas://machineXv2/a"));
}

#[test]
fn test_percent_encoded_values_are_decoded() {
    let m = match_uri("maas://tag/gpu%20nodes", "maas://tag/{name}").unwrap();
    assert_eq!(m.get_param("name"), Some("gpu nodes"));
}

#[test]
fn test_compile_errors() {
    for pattern in [
        "maas://machine/{id}/x/{id}",
        "maas://machine/{id",
        "maas://machine/{action:}",
        "machine/{id}",
    ] {
        assert_eq!(
            UriPattern::compile(pattern).unwrap_err().kind(),
            ErrorKind::Validation,
            "{pattern}"
        );
    }
}

#[test]
fn test_pattern_metadata() {
    let pattern = UriPattern::compile("maas://machine/{system_id}/power/{action:on|off}").unwrap();
    assert_eq!(pattern.scheme, "maas");
    assert_eq!(pattern.resource_type, "machine");
    assert_eq!(pattern.params().len(), 2);
    assert_eq!(
        pattern.params()[1].allowed_values,
        Some(vec!["on".to_string(), "off".to_string()])
    );
    assert!(pattern.regex_source().starts_with('^'));
    assert!(pattern.regex_source().ends_with("/?$"));
}

#[test]
fn test_expand() {
    let pattern = UriPattern::compile("maas://machine/{system_id}/power/{action:on|off}").unwrap();
    assert_eq!(
        pattern
            .expand([("system_id", "abc"), ("action", "off")])
            .unwrap(),
        "maas://machine/abc/power/off"
    );
    assert_eq!(
        pattern
            .expand([("system_id", "abc"), ("action", "reboot")])
            .unwrap_err()
            .kind(),
        ErrorKind::Validation
    );
    assert!(pattern.expand([("action", "on")]).is_err());

    let optional = UriPattern::compile("maas://machine/{system_id?}").unwrap();
    assert_eq!(optional.expand(Vec::<(&str, &str)>::new()).unwrap(), "maas://machine");
}

#[test]
fn test_validate_helper() {
    assert!(validate("maas://machine/a", "maas://machine/{id}").is_ok());
    assert!(validate("maas://machine", "maas://machine/{id}").is_err());
}

proptest! {
    #[test]
    fn prop_expand_then_match_round_trips(
        id in "[A-Za-z0-9 ._-]{1,12}",
        sub in proptest::option::of("[a-z0-9]{1,8}"),
        action in prop_oneof![Just("on"), Just("off")],
    ) {
        let pattern = UriPattern::compile(
            "maas://machine/{system_id}/power/{action:on|off}/{note?}",
        ).unwrap();
        let mut values = vec![("system_id", id.as_str()), ("action", action)];
        if let Some(sub) = &sub {
            values.push(("note", sub.as_str()));
        }
        let uri = pattern.expand(values).unwrap();
        let m = pattern.match_uri(&uri).unwrap();
        prop_assert_eq!(m.get_param("system_id"), Some(id.as_str()));
        prop_assert_eq!(m.get_param("action"), Some(action));
        prop_assert_eq!(m.get_param("note"), sub.as_deref());
    }
}
