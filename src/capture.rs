// Run-scoped capture set
//
// Source responses keyed by endpoint id, plus the typed run context that holds
// values derived from them. Every slot is write-once: the first write wins and
// later writes are refused.

use crate::spec::ContextKey;
use serde_json::Value;
use std::collections::HashMap;

/// Well-known values derived from source responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    access_token: Option<String>,
    resource_id: Option<String>,
}

impl RunContext {
    pub fn get(&self, key: ContextKey) -> Option<&str> {
        match key {
            ContextKey::AccessToken => self.access_token.as_deref(),
            ContextKey::ResourceId => self.resource_id.as_deref(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// Returns false if the slot was already filled.
    pub fn publish(&mut self, key: ContextKey, value: String) -> bool {
        let slot = match key {
            ContextKey::AccessToken => &mut self.access_token,
            ContextKey::ResourceId => &mut self.resource_id,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptureSet {
    responses: HashMap<String, Value>,
    context: RunContext,
}

impl CaptureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `endpoint` was already captured; the stored tree is kept.
    pub fn insert(&mut self, endpoint: impl Into<String>, response: Value) -> bool {
        let endpoint = endpoint.into();
        if self.responses.contains_key(&endpoint) {
            tracing::debug!(%endpoint, "capture already present, keeping the first response");
            return false;
        }
        self.responses.insert(endpoint, response);
        true
    }

    pub fn get(&self, endpoint: &str) -> Option<&Value> {
        self.responses.get(endpoint)
    }

    pub fn contains(&self, endpoint: &str) -> bool {
        self.responses.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RunContext {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn captures_are_write_once() {
        let mut captures = CaptureSet::new();
        assert!(captures.insert("/a", json!({"n": 1})));
        assert!(!captures.insert("/a", json!({"n": 2})));
        assert_eq!(captures.get("/a"), Some(&json!({"n": 1})));
        assert_eq!(captures.len(), 1);
    }

    #[test]
    fn context_slots_are_write_once() {
        let mut ctx = RunContext::default();
        assert!(ctx.publish(ContextKey::AccessToken, "first".into()));
        assert!(!ctx.publish(ContextKey::AccessToken, "second".into()));
        assert_eq!(ctx.access_token(), Some("first"));
        assert_eq!(ctx.get(ContextKey::ResourceId), None);
    }
}
