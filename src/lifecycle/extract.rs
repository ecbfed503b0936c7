// Identifier extraction
//
// Create responses differ in shape between API versions, so the identifier is
// looked up with an ordered rule list. The first rule that finds a string wins.
//
// Example:
//   {"consent_id": "abc123"}          -> "abc123"   (TopLevel("consent_id"))
//   {"data": {"consentId": "xyz"}}    -> "xyz"      (Nested { "data", "consentId" })
//   {}                                -> None

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    /// Field of the top-level object
    TopLevel(&'static str),
    /// Field of an object stored under `wrapper`
    Nested { wrapper: &'static str, field: &'static str },
}

impl IdRule {
    pub fn apply<'v>(&self, response: &'v Value) -> Option<&'v str> {
        let found = match self {
            IdRule::TopLevel(field) => response.get(field),
            IdRule::Nested { wrapper, field } => response.get(wrapper).and_then(|w| w.get(field)),
        };
        found.and_then(Value::as_str)
    }
}

pub const DEFAULT_ID_RULES: &[IdRule] = &[
    IdRule::TopLevel("consent_id"),
    IdRule::TopLevel("consentId"),
    IdRule::Nested {
        wrapper: "data",
        field: "consentId",
    },
];

pub fn extract_identifier(response: &Value, rules: &[IdRule]) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(response)).map(str::to_string)
}

/// Same as [`extract_identifier`] for a raw body; bodies that are not JSON yield None.
pub fn extract_identifier_from_body(body: &str, rules: &[IdRule]) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    extract_identifier(&json, rules)
}
