//! HTTP client abstraction.
//!
//! The adapters speak to the outside world only through the [`HttpClient`]
//! trait, so the production `ureq` implementation can be swapped for a
//! canned-response mock in tests. Transport failures are `Err`; a response
//! with a non-success status is `Ok` and the adapter decides what to do
//! with it.

use parking_lot::Mutex;
use serde_json::Value;
use std::time::Duration;

/// HTTP method for an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PATCH.
    Patch,
    /// PUT.
    Put,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
        }
    }
}

/// Request body payloads the adapters use.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON body.
    Json(Value),
    /// URL-encoded form body.
    Form(Vec<(String, String)>),
}

/// A single outbound REST request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL without query parameters.
    pub url: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Headers.
    pub headers: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    /// Creates a request with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Creates a PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    /// Creates a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Attaches a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attaches a form body.
    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }
}

/// A received response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, String> {
        serde_json::from_str(&self.body).map_err(|e| format!("invalid json response: {e}"))
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. `Err` is reserved
/// for transport-level failures (connect, timeout, read); an HTTP error
/// status still produces `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends one request and returns the response.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, String>;
}

impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, String> {
        (**self).send(request)
    }
}

/// Production client backed by a blocking `ureq` agent.
///
/// One bounded timeout applies per request, independent of retries, so a
/// single call can never block indefinitely.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Creates a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, String> {
        let mut req = self.agent.request(request.method.as_str(), &request.url);
        for (key, value) in &request.query {
            req = req.query(key, value);
        }
        for (key, value) in &request.headers {
            req = req.set(key, value);
        }

        let result = match &request.body {
            Some(RequestBody::Json(value)) => req.send_json(value.clone()),
            Some(RequestBody::Form(pairs)) => {
                let pairs: Vec<(&str, &str)> = pairs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                req.send_form(&pairs)
            }
            None => req.call(),
        };

        match result {
            Ok(response) => read_response(response),
            // An error status is still a response; the adapter layer owns
            // the success check.
            Err(ureq::Error::Status(_, response)) => read_response(response),
            Err(ureq::Error::Transport(transport)) => Err(transport.to_string()),
        }
    }
}

fn read_response(response: ureq::Response) -> Result<ApiResponse, String> {
    let status = response.status();
    let body = response
        .into_string()
        .map_err(|e| format!("failed to read response body: {e}"))?;
    Ok(ApiResponse { status, body })
}

/// A canned-response client for testing adapters without a network.
///
/// Routes are matched in insertion order by method and URL substring.
/// `on` routes answer any number of times; `on_once` routes are consumed,
/// which lets tests script pagination and retry sequences.
#[derive(Default)]
pub struct MockHttpClient {
    routes: Mutex<Vec<MockRoute>>,
    requests: Mutex<Vec<ApiRequest>>,
}

struct MockRoute {
    method: Method,
    url_fragment: String,
    outcome: Result<ApiResponse, String>,
    once: bool,
    used: bool,
}

impl MockHttpClient {
    /// Creates a client with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent response.
    pub fn on(&self, method: Method, url_fragment: &str, status: u16, body: &str) {
        self.push(method, url_fragment, Ok(ApiResponse { status, body: body.into() }), false);
    }

    /// Registers a response consumed by its first match.
    pub fn on_once(&self, method: Method, url_fragment: &str, status: u16, body: &str) {
        self.push(method, url_fragment, Ok(ApiResponse { status, body: body.into() }), true);
    }

    /// Registers a persistent transport failure.
    pub fn fail(&self, method: Method, url_fragment: &str, cause: &str) {
        self.push(method, url_fragment, Err(cause.to_string()), false);
    }

    /// Registers a transport failure consumed by its first match.
    pub fn fail_once(&self, method: Method, url_fragment: &str, cause: &str) {
        self.push(method, url_fragment, Err(cause.to_string()), true);
    }

    fn push(
        &self,
        method: Method,
        url_fragment: &str,
        outcome: Result<ApiResponse, String>,
        once: bool,
    ) {
        self.routes.lock().push(MockRoute {
            method,
            url_fragment: url_fragment.to_string(),
            outcome,
            once,
            used: false,
        });
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpClient for MockHttpClient {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, String> {
        self.requests.lock().push(request.clone());

        let mut routes = self.routes.lock();
        let route = routes.iter_mut().find(|route| {
            !(route.once && route.used)
                && route.method == request.method
                && request.url.contains(&route.url_fragment)
        });

        match route {
            Some(route) => {
                route.used = true;
                route.outcome.clone()
            }
            None => Err(format!(
                "no mock route for {} {}",
                request.method.as_str(),
                request.url
            )),
        }
    }
}
