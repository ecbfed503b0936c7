// Authentication strategies for chainprobe
// Bearer tokens for probes and sources; battery cases set Authorization themselves

pub trait AuthStrategy {
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

pub struct BearerAuth {
    pub token: String,
}

impl BearerAuth {
    /// Empty tokens count as no token
    pub fn from_token(token: Option<&str>) -> Option<Self> {
        token.filter(|t| !t.is_empty()).map(|t| BearerAuth { token: t.to_string() })
    }
}

impl AuthStrategy for BearerAuth {
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.token)
    }
}

impl<A: AuthStrategy> AuthStrategy for Option<A> {
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Some(auth) => auth.apply_auth(req),
            None => req,
        }
    }
}

/// Short token preview for logs
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(8).collect();
    if head.len() < token.len() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_no_auth() {
        assert!(BearerAuth::from_token(Some("")).is_none());
        assert!(BearerAuth::from_token(None).is_none());
        assert_eq!(BearerAuth::from_token(Some("abc")).unwrap().token, "abc");
    }

    #[test]
    fn preview_truncates_long_tokens() {
        assert_eq!(token_preview("abcdefghijkl"), "abcdefgh...");
        assert_eq!(token_preview("short"), "short");
    }
}
