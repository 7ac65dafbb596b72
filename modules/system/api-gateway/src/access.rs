use std::collections::HashMap;
use std::sync::Arc;

use access_guard_sdk::{
    AccessGuard, AccessOracleClient, CallerIdentity, PermissionRule, RequestParts,
    ResourceSource, RuleRegistry,
};
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, Method, StatusCode, header};
use http_body_util::LengthLimitError;

use crate::config::ApiGatewayConfig;
use crate::error::{AccessRejection, error_response};

/// Route matcher for a specific HTTP method; values are endpoint identifiers.
#[derive(Clone)]
struct RouteMatcher {
    matcher: matchit::Router<String>,
}

impl RouteMatcher {
    fn new() -> Self {
        Self {
            matcher: matchit::Router::new(),
        }
    }

    fn insert(&mut self, path: &str, endpoint: String) -> Result<(), matchit::InsertError> {
        self.matcher.insert(path, endpoint)
    }
}

/// A request path resolved to its declared route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Endpoint identifier, `"<METHOD> <pattern>"`.
    pub endpoint: String,
    /// Path parameters captured by the pattern.
    pub params: HashMap<String, String>,
}

/// Maps `(method, path)` to an endpoint identifier and its path parameters.
#[derive(Clone, Default)]
pub struct RouteTable {
    matchers: Arc<HashMap<Method, RouteMatcher>>,
}

impl RouteTable {
    /// Build a table from `(method, pattern)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if two patterns conflict.
    pub fn build<I, P>(routes: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (Method, P)>,
        P: AsRef<str>,
    {
        let mut matchers: HashMap<Method, RouteMatcher> = HashMap::new();
        for (method, path) in routes {
            let pattern = convert_axum_path_to_matchit(path.as_ref());
            let endpoint = endpoint_id(&method, &pattern);
            matchers
                .entry(method)
                .or_insert_with(RouteMatcher::new)
                .insert(&pattern, endpoint)
                .map_err(|e| {
                    anyhow::anyhow!("Failed to insert route pattern '{}': {e}", path.as_ref())
                })?;
        }
        Ok(Self {
            matchers: Arc::new(matchers),
        })
    }

    /// Resolve a concrete request path.
    ///
    /// `HEAD` falls back to the `GET` route, the handler axum runs for it.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute> {
        self.resolve_exact(method, path).or_else(|| {
            if method == Method::HEAD {
                self.resolve_exact(&Method::GET, path)
            } else {
                None
            }
        })
    }

    fn resolve_exact(&self, method: &Method, path: &str) -> Option<ResolvedRoute> {
        let matched = self.matchers.get(method)?.matcher.at(path).ok()?;
        Some(ResolvedRoute {
            endpoint: matched.value.clone(),
            params: matched
                .params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        })
    }
}

/// Endpoint identifier used as the rule registry key.
#[must_use]
pub fn endpoint_id(method: &Method, pattern: &str) -> String {
    format!("{method} {pattern}")
}

/// Convert Axum path syntax `:param` to matchit syntax `{param}`.
fn convert_axum_path_to_matchit(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ':' {
            result.push('{');
            while matches!(chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            result.push('}');
        } else {
            result.push(ch);
        }
    }

    result
}

fn parse_method(raw: &str) -> anyhow::Result<Method> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid HTTP method '{raw}': {e}"))
}

/// Shared state for the access middleware.
#[derive(Clone)]
pub struct AccessState {
    pub guard: AccessGuard,
    pub routes: RouteTable,
    pub max_body_bytes: usize,
}

impl AccessState {
    /// Wire the route table, rule registry and guard from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid methods, conflicting patterns or
    /// duplicate route rules.
    pub fn from_config(
        cfg: &ApiGatewayConfig,
        oracle: Arc<dyn AccessOracleClient>,
    ) -> anyhow::Result<Self> {
        let mut routes = Vec::with_capacity(cfg.routes.len());
        let mut registry = RuleRegistry::builder();

        for route in &cfg.routes {
            let method = parse_method(&route.method)?;
            let pattern = convert_axum_path_to_matchit(&route.path);
            registry = registry.rule(endpoint_id(&method, &pattern), route.rule.clone());
            routes.push((method, pattern));
        }

        let registry = registry
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build route rules: {e}"))?;

        Ok(Self {
            guard: AccessGuard::new(oracle, Arc::new(registry)).with_config(cfg.access.clone()),
            routes: RouteTable::build(routes)?,
            max_body_bytes: cfg.max_body_bytes,
        })
    }
}

/// Access middleware that delegates every request to the [`AccessGuard`].
///
/// For each request:
/// 1. Skips CORS preflight requests
/// 2. Resolves the endpoint and path parameters via [`RouteTable`]
/// 3. Collects query parameters, the `Authorization` header and, when the
///    rule reads its resource from the body, the JSON body
/// 4. Runs the guard and inserts the resolved [`CallerIdentity`] on success
pub async fn access_middleware(
    State(state): State<AccessState>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_preflight_request(req.method(), req.headers()) {
        return next.run(req).await;
    }

    let path = req.uri().path().to_owned();
    let (endpoint, params) = match state.routes.resolve(req.method(), &path) {
        Some(route) => (route.endpoint, route.params),
        None => (endpoint_id(req.method(), &path), HashMap::new()),
    };
    tracing::debug!(endpoint = %endpoint, path = %path, "route resolved");

    let rule = state.guard.rules().get(&endpoint);
    let mut parts = RequestParts::new()
        .with_params(params)
        .with_query(query_params(req.uri().query()));
    if let Some(auth) = authorization_header(req.headers()) {
        parts = parts.with_authorization(auth);
    }

    if reads_body(rule) {
        let (head, body) = req.into_parts();
        let bytes = match read_body(body, state.max_body_bytes, &endpoint).await {
            Ok(bytes) => bytes,
            Err(resp) => return resp,
        };
        match serde_json::from_slice(&bytes) {
            Ok(json) => parts = parts.with_body(json),
            Err(e) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "request body is not JSON");
            }
        }
        req = Request::from_parts(head, Body::from(bytes));
    }

    if let Err(e) = state.guard.authorize_rule(&endpoint, rule, &mut parts).await {
        return AccessRejection(e).into_response();
    }

    if let Some(caller) = parts.take_caller() {
        req.extensions_mut().insert::<CallerIdentity>(caller);
    }
    next.run(req).await
}

/// Buffer the body up to `limit` bytes.
///
/// Exceeding the limit is a 413; any other read failure is a 400.
async fn read_body(body: Body, limit: usize, endpoint: &str) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(endpoint = %endpoint, error = %e, "request body not readable");
        if is_length_limit(&e) {
            error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "Request body too large",
            )
        } else {
            error_response(
                StatusCode::BAD_REQUEST,
                "unreadable_body",
                "Request body could not be read",
            )
        }
    })
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn reads_body(rule: Option<&PermissionRule>) -> bool {
    rule.and_then(|r| r.resource.as_ref())
        .is_some_and(|res| res.source == ResourceSource::Body)
}

fn query_params(query: Option<&str>) -> HashMap<String, String> {
    let Some(query) = query else {
        return HashMap::new();
    };
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            tracing::debug!(error = %e, "query string not decodable");
            HashMap::new()
        }
    }
}

/// Raw `Authorization` header; well-formedness is checked by the guard.
fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Preflight requests are OPTIONS requests carrying `Origin` and
/// `Access-Control-Request-Method`.
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use access_guard_sdk::ResourceDescriptor;

    #[test]
    fn converts_axum_params() {
        assert_eq!(convert_axum_path_to_matchit("/users/:id"), "/users/{id}");
        assert_eq!(
            convert_axum_path_to_matchit("/posts/:post_id/comments/:comment_id"),
            "/posts/{post_id}/comments/{comment_id}"
        );
        assert_eq!(convert_axum_path_to_matchit("/orders/{id}"), "/orders/{id}");
        assert_eq!(convert_axum_path_to_matchit("/health"), "/health");
    }

    #[test]
    fn resolves_endpoint_and_params() {
        let table = RouteTable::build([
            (Method::GET, "/orders/:id"),
            (Method::GET, "/orders"),
            (Method::DELETE, "/orders/{id}"),
        ])
        .unwrap();

        let route = table.resolve(&Method::GET, "/orders/42").unwrap();
        assert_eq!(route.endpoint, "GET /orders/{id}");
        assert_eq!(route.params.get("id").map(String::as_str), Some("42"));

        let route = table.resolve(&Method::DELETE, "/orders/7").unwrap();
        assert_eq!(route.endpoint, "DELETE /orders/{id}");

        assert!(table.resolve(&Method::POST, "/orders").is_none());
        assert!(table.resolve(&Method::GET, "/customers").is_none());
    }

    #[test]
    fn head_falls_back_to_get_route() {
        let table = RouteTable::build([
            (Method::GET, "/orders/{id}"),
            (Method::HEAD, "/status"),
            (Method::GET, "/status"),
        ])
        .unwrap();

        let route = table.resolve(&Method::HEAD, "/orders/9").unwrap();
        assert_eq!(route.endpoint, "GET /orders/{id}");
        assert_eq!(route.params.get("id").map(String::as_str), Some("9"));

        let route = table.resolve(&Method::HEAD, "/status").unwrap();
        assert_eq!(route.endpoint, "HEAD /status");

        assert!(table.resolve(&Method::POST, "/orders/9").is_none());
    }

    #[tokio::test]
    async fn body_errors_are_classified() {
        let oversized = axum::body::to_bytes(Body::from(vec![0_u8; 16]), 4)
            .await
            .unwrap_err();
        assert!(is_length_limit(&oversized));

        let broken = axum::Error::new(std::io::Error::other("connection reset"));
        assert!(!is_length_limit(&broken));

        let resp = read_body(Body::from(vec![0_u8; 16]), 4, "POST /orders")
            .await
            .unwrap_err();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = read_body(Body::from("{}"), 4, "POST /orders").await.unwrap();
        assert_eq!(&bytes[..], b"{}");
    }

    #[test]
    fn conflicting_patterns_fail() {
        let err = RouteTable::build([(Method::GET, "/a/{x}"), (Method::GET, "/a/{y}")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("/a/{y}"));
    }

    #[test]
    fn method_parsing() {
        assert_eq!(parse_method(" get ").unwrap(), Method::GET);
        assert!(parse_method("GE T").is_err());
    }

    #[test]
    fn query_decoding() {
        let q = query_params(Some("tenant=t%201&x=1"));
        assert_eq!(q.get("tenant").map(String::as_str), Some("t 1"));
        assert!(query_params(None).is_empty());
    }

    #[test]
    fn body_is_read_only_for_body_sourced_resources() {
        let body_rule =
            PermissionRule::require(["a"]).with_resource(ResourceDescriptor::body("order.id", "order"));
        let param_rule =
            PermissionRule::require(["a"]).with_resource(ResourceDescriptor::param("id", "order"));

        assert!(reads_body(Some(&body_rule)));
        assert!(!reads_body(Some(&param_rule)));
        assert!(!reads_body(None));
    }
}
