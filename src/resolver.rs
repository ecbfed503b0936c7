// Parameter resolution
//
// ValueResolver turns one ParamSpec into a string against a capture snapshot.
// ParameterResolver applies it to every declared parameter of every endpoint
// and produces the ResolvedParameterSet consumed by the probe engine.
//
// Resolution never fails: anything that cannot be resolved is omitted.

use crate::capture::CaptureSet;
use crate::spec::{EndpointSpec, ParamSpec, SpecStore};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Textual JSON values come back unquoted, everything else as JSON text.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves single parameter specs against an immutable capture snapshot
#[derive(Debug, Clone, Copy)]
pub struct ValueResolver<'a> {
    captures: &'a CaptureSet,
}

impl<'a> ValueResolver<'a> {
    pub fn new(captures: &'a CaptureSet) -> Self {
        Self { captures }
    }

    pub fn resolve(&self, spec: &ParamSpec) -> Option<String> {
        match spec {
            ParamSpec::Literal { value: Value::Null } => None,
            ParamSpec::Literal { value } => Some(value_to_text(value)),
            ParamSpec::Reference { from, pointer } => {
                let source = self.captures.get(from)?;
                source.pointer(pointer).map(value_to_text)
            }
            ParamSpec::Context { context } => self.captures.context().get(*context).map(str::to_string),
            ParamSpec::Incomplete => None,
        }
    }
}

/// Namespaced parameter name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Path(String),
    Query(String),
    Header(String),
    Body,
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Path(name) => f.write_str(name),
            ParamKey::Query(name) => write!(f, "query:{}", name),
            ParamKey::Header(name) => write!(f, "header:{}", name),
            ParamKey::Body => f.write_str("body"),
        }
    }
}

/// Resolved parameters of one endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedParams {
    values: BTreeMap<ParamKey, String>,
}

impl ResolvedParams {
    pub fn insert(&mut self, key: ParamKey, value: String) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &ParamKey) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn path_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(k, v)| match k {
            ParamKey::Path(name) => Some((name.as_str(), v.as_str())),
            _ => None,
        })
    }

    pub fn query(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(k, v)| match k {
            ParamKey::Query(name) => Some((name.as_str(), v.as_str())),
            _ => None,
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(k, v)| match k {
            ParamKey::Header(name) => Some((name.as_str(), v.as_str())),
            _ => None,
        })
    }

    /// Serialized JSON body, if the endpoint declares body fields
    pub fn body(&self) -> Option<&str> {
        self.get(&ParamKey::Body)
    }

    /// Flat view keyed by namespaced names (`header:X`, `query:y`, `id`, `body`)
    pub fn to_namespaced(&self) -> BTreeMap<String, String> {
        self.values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Endpoint id -> resolved parameters
#[derive(Debug, Clone, Default)]
pub struct ResolvedParameterSet {
    endpoints: HashMap<String, ResolvedParams>,
}

impl ResolvedParameterSet {
    pub fn get(&self, endpoint: &str) -> Option<&ResolvedParams> {
        self.endpoints.get(endpoint)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

pub struct ParameterResolver<'a> {
    values: ValueResolver<'a>,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(captures: &'a CaptureSet) -> Self {
        Self {
            values: ValueResolver::new(captures),
        }
    }

    pub fn resolve_endpoint(&self, spec: &EndpointSpec) -> ResolvedParams {
        let mut resolved = ResolvedParams::default();

        for (name, param) in &spec.path_params {
            if let Some(value) = self.values.resolve(param) {
                resolved.insert(ParamKey::Path(name.clone()), value);
            }
        }
        for (name, param) in &spec.headers {
            if let Some(value) = self.values.resolve(param) {
                resolved.insert(ParamKey::Header(name.clone()), value);
            }
        }
        for (name, param) in &spec.query {
            if let Some(value) = self.values.resolve(param) {
                resolved.insert(ParamKey::Query(name.clone()), value);
            }
        }
        if let Some(body) = self.build_body(spec) {
            resolved.insert(ParamKey::Body, body.to_string());
        }

        let declared = spec.path_params.len() + spec.headers.len() + spec.query.len();
        let scalars = resolved.len() - usize::from(resolved.body().is_some());
        let omitted = declared.saturating_sub(scalars);
        if omitted > 0 {
            tracing::debug!(endpoint = %spec.id, omitted, "some parameters did not resolve and are omitted");
        }
        resolved
    }

    /// Literals pass through as raw JSON, other specs are resolved to text.
    fn build_body(&self, spec: &EndpointSpec) -> Option<Value> {
        if spec.body.is_empty() {
            return None;
        }
        let mut fields = Map::new();
        for (name, param) in &spec.body {
            match param {
                ParamSpec::Literal { value } => {
                    fields.insert(name.clone(), value.clone());
                }
                other => {
                    if let Some(text) = self.values.resolve(other) {
                        fields.insert(name.clone(), Value::String(text));
                    }
                }
            }
        }
        Some(Value::Object(fields))
    }

    pub fn resolve_all(&self, specs: &SpecStore) -> ResolvedParameterSet {
        let endpoints = specs
            .iter()
            .map(|spec| (spec.id.clone(), self.resolve_endpoint(spec)))
            .collect();
        ResolvedParameterSet { endpoints }
    }
}
