// Endpoint input specs (endpoint-data.json)
//
// One entry per endpoint id. Each parameter is a literal, a reference into a
// source endpoint's captured response, or a reference to a run-context value.
//
// {
//   "/auth/bank-token": { "method": "POST", "source": true,
//                         "query": { "client_id": { "value": "team1" } } },
//   "/accounts/{account_id}": {
//     "pathParams": { "account_id": { "from": "/accounts", "pointer": "/data/0/id" } },
//     "headers": { "X-Consent-Id": { "context": "resourceId" } }
//   }
// }

use crate::error::ConfigError;
use crate::models::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Typed slots published by the source executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKey {
    AccessToken,
    ResourceId,
}

/// Declaration of a single parameter value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawParamSpec")]
pub enum ParamSpec {
    Reference {
        from: String,
        pointer: String,
    },
    Context {
        context: ContextKey,
    },
    Literal {
        value: Value,
    },
    /// Nothing usable was declared (e.g. `from` without a pointer); resolves to absent
    Incomplete,
}

/// Wire shape of a parameter entry; every field optional
#[derive(Deserialize)]
struct RawParamSpec {
    #[serde(default, deserialize_with = "present")]
    value: Option<Value>,
    from: Option<String>,
    #[serde(alias = "jsonPointer")]
    pointer: Option<String>,
    context: Option<ContextKey>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`
fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl From<RawParamSpec> for ParamSpec {
    fn from(raw: RawParamSpec) -> Self {
        // a non-null value wins over any reference next to it
        match (raw.value, raw.from, raw.pointer, raw.context) {
            (Some(value), _, _, _) if !value.is_null() => ParamSpec::Literal { value },
            (_, Some(from), Some(pointer), _) => ParamSpec::Reference { from, pointer },
            (_, _, _, Some(context)) => ParamSpec::Context { context },
            (Some(value), _, _, _) => ParamSpec::Literal { value },
            _ => ParamSpec::Incomplete,
        }
    }
}

impl ParamSpec {
    pub fn literal(value: impl Into<Value>) -> Self {
        ParamSpec::Literal { value: value.into() }
    }

    pub fn reference(from: impl Into<String>, pointer: impl Into<String>) -> Self {
        ParamSpec::Reference {
            from: from.into(),
            pointer: pointer.into(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, ParamSpec::Literal { .. })
    }
}

pub type ParamMap = BTreeMap<String, ParamSpec>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub method: Option<Method>,
    #[serde(default)]
    pub headers: ParamMap,
    #[serde(default)]
    pub path_params: ParamMap,
    #[serde(default)]
    pub query: ParamMap,
    #[serde(default)]
    pub body: ParamMap,
    #[serde(default)]
    pub source: bool,
    /// Legacy source marker; only its presence matters
    #[serde(default)]
    pub save_response: Option<Value>,
}

impl EndpointSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn method(&self) -> Method {
        self.method.unwrap_or(Method::GET)
    }

    pub fn is_source(&self) -> bool {
        let legacy_marker = match &self.save_response {
            Some(Value::Object(map)) => !map.is_empty(),
            _ => false,
        };
        self.source || legacy_marker
    }
}

/// All endpoint specs of a run, in declaration order
#[derive(Debug, Clone, Default)]
pub struct SpecStore {
    specs: Vec<EndpointSpec>,
}

impl SpecStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data, path)
    }

    /// `origin` only labels errors.
    pub fn from_json_str(data: &str, origin: &Path) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(data).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        let Value::Object(entries) = root else {
            return Err(ConfigError::NotAnObject {
                path: origin.to_path_buf(),
            });
        };

        let mut specs = Vec::with_capacity(entries.len());
        for (endpoint, raw) in entries {
            let mut spec: EndpointSpec =
                serde_json::from_value(raw).map_err(|source| ConfigError::InvalidEntry {
                    path: origin.to_path_buf(),
                    endpoint: endpoint.clone(),
                    source,
                })?;
            spec.id = endpoint;
            specs.push(spec);
        }
        tracing::info!(endpoints = specs.len(), path = %origin.display(), "loaded endpoint specs");
        Ok(Self { specs })
    }

    pub fn from_specs(specs: Vec<EndpointSpec>) -> Self {
        Self { specs }
    }

    pub fn get(&self, endpoint: &str) -> Option<&EndpointSpec> {
        self.specs.iter().find(|s| s.id == endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointSpec> {
        self.specs.iter()
    }

    pub fn sources(&self) -> impl Iterator<Item = &EndpointSpec> {
        self.specs.iter().filter(|s| s.is_source())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(doc: &str) -> Result<SpecStore, ConfigError> {
        SpecStore::from_json_str(doc, Path::new("inline.json"))
    }

    #[test]
    fn parses_all_param_shapes() {
        let store = parse(
            r#"{
                "/accounts/{id}": {
                    "method": "get",
                    "pathParams": { "id": { "from": "/accounts", "jsonPointer": "/data/0/id" } },
                    "headers": { "X-Consent": { "context": "resourceId" } },
                    "query": { "limit": { "value": 10 } }
                }
            }"#,
        )
        .unwrap();

        let spec = store.get("/accounts/{id}").unwrap();
        assert_eq!(spec.method(), Method::GET);
        assert_eq!(spec.path_params["id"], ParamSpec::reference("/accounts", "/data/0/id"));
        assert_eq!(
            spec.headers["X-Consent"],
            ParamSpec::Context { context: ContextKey::ResourceId }
        );
        assert_eq!(spec.query["limit"], ParamSpec::literal(json!(10)));
        assert!(!spec.is_source());
    }

    #[test]
    fn source_markers() {
        let store = parse(
            r#"{
                "/a": { "source": true },
                "/b": { "saveResponse": { "token": { "jsonPointer": "/access_token" } } },
                "/c": { "saveResponse": {} }
            }"#,
        )
        .unwrap();
        let sources: Vec<&str> = store.sources().map(|s| s.id.as_str()).collect();
        assert_eq!(sources, vec!["/a", "/b"]);
    }

    #[test]
    fn keeps_declaration_order() {
        let store = parse(r#"{ "/z": {}, "/a": {}, "/m": {} }"#).unwrap();
        let ids: Vec<&str> = store.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(parse("not json"), Err(ConfigError::Parse { .. })));
        assert!(matches!(parse("[1, 2]"), Err(ConfigError::NotAnObject { .. })));
        assert!(matches!(
            parse(r#"{ "/x": { "method": "BREW" } }"#),
            Err(ConfigError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn literal_value_wins_over_reference() {
        let store = parse(
            r#"{ "/x": { "query": {
                "a": { "value": "lit", "from": "/src", "jsonPointer": "/id" },
                "b": { "value": null, "from": "/src", "pointer": "/id" },
                "c": { "value": null }
            } } }"#,
        )
        .unwrap();
        let query = &store.get("/x").unwrap().query;
        assert_eq!(query["a"], ParamSpec::literal("lit"));
        assert_eq!(query["b"], ParamSpec::reference("/src", "/id"));
        assert_eq!(query["c"], ParamSpec::literal(Value::Null));
    }

    #[test]
    fn incomplete_references_load_as_absent() {
        let store = parse(
            r#"{ "/x": {
                "query": { "a": { "from": "/src" }, "b": { "jsonPointer": "/id" } },
                "headers": { "c": {} }
            } }"#,
        )
        .unwrap();
        let spec = store.get("/x").unwrap();
        assert_eq!(spec.query["a"], ParamSpec::Incomplete);
        assert_eq!(spec.query["b"], ParamSpec::Incomplete);
        assert_eq!(spec.headers["c"], ParamSpec::Incomplete);
    }
}
