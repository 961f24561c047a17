//! Request routing and path matching.
//!
//! Maps method + path to an operation id, extracting `{param}` segments.
//! Routes are checked in registration order; the first match wins, so
//! literal routes must be added before parameterised ones that overlap.
//! Each path segment is percent-decoded before it is compared or captured.
//!
//! # Example
//!
//! ```rust
//! use docstore_server::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/base/delete/{id}", "deleteDocument");
//! router.add_route(Method::GET, "/base/{id}", "getDocument");
//! router.add_any_route("/shutdown", "shutdown");
//!
//! let m = router.match_route(&Method::GET, "/base/delete/abc").unwrap();
//! assert_eq!(m.operation_id(), "deleteDocument");
//! assert_eq!(m.param("id"), Some("abc"));
//!
//! assert!(router.match_route(&Method::PUT, "/shutdown").is_some());
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use http::Method;

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
        }
    }

    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    /// `None` matches every method
    method: Option<Method>,
    segments: Vec<PathSegment>,
    operation_id: String,
}

impl Route {
    fn new(method: Option<Method>, pattern: &str, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            segments: Self::parse_segments(pattern),
            operation_id: operation_id.into(),
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn matches_method(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }

    fn match_path(&self, path_segments: &[Cow<'_, str>]) -> Option<HashMap<String, String>> {
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        Some(params)
    }
}

/// Splits a request path and percent-decodes each segment.
///
/// A segment that does not decode to UTF-8 is kept as sent.
fn decode_segments(path: &str) -> Vec<Cow<'_, str>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::decode(s).unwrap_or(Cow::Borrowed(s)))
        .collect()
}

/// HTTP request router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route for one method.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
    ) {
        self.routes
            .push(Route::new(Some(method), pattern.as_ref(), operation_id));
    }

    /// Adds a route that matches any method.
    pub fn add_any_route(&mut self, pattern: impl AsRef<str>, operation_id: impl Into<String>) {
        self.routes
            .push(Route::new(None, pattern.as_ref(), operation_id));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches an incoming request to a route.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let segments = decode_segments(path);
        self.routes
            .iter()
            .filter(|route| route.matches_method(method))
            .find_map(|route| {
                route
                    .match_path(&segments)
                    .map(|params| RouteMatch::new(&route.operation_id, params))
            })
    }

    /// Returns the methods registered for `path`, in registration order.
    ///
    /// Empty when no route matches the path. Any-method routes are not
    /// listed, since they never leave a method unmatched.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let segments = decode_segments(path);
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if let Some(method) = &route.method {
                if route.match_path(&segments).is_some() && !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    /// Checks if a specific operation ID is registered.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }
}
