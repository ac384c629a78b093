// Test HTTP Client

use cookie::Cookie;
use hello_htmx_core::{
    Application, Error, FORM_URLENCODED, HttpMethod, HttpRequest, HttpResponse, encode_form,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-process HTTP client for an [`Application`]
///
/// Keeps a cookie jar the way a browser would: cookies set by responses are
/// replayed on later requests. Two clients never share cookies.
pub struct TestClient {
    app: Application,
    jar: Mutex<HashMap<String, String>>,
}

impl TestClient {
    pub fn new(app: Application) -> Self {
        Self {
            app,
            jar: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(HttpMethod::GET, path)
    }

    pub fn post(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(HttpMethod::POST, path)
    }

    pub fn put(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(HttpMethod::PUT, path)
    }

    pub fn delete(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(HttpMethod::DELETE, path)
    }

    pub fn options(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(HttpMethod::OPTIONS, path)
    }

    /// Start a request with a custom method
    pub fn request(&self, method: HttpMethod, path: &str) -> TestRequestBuilder<'_> {
        TestRequestBuilder::new(self, method, path)
    }

    /// Value of a cookie currently in the jar
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar.lock().get(name).cloned()
    }

    /// Put a cookie in the jar, as if a response had set it
    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        self.jar.lock().insert(name.into(), value.into());
    }

    async fn execute(&self, mut req: HttpRequest) -> TestResponse {
        {
            let jar = self.jar.lock();
            for (name, value) in jar.iter() {
                req.cookies
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        let response = self.app.dispatch(req).await;
        self.store_cookies(&response);
        TestResponse::new(response)
    }

    fn store_cookies(&self, response: &HttpResponse) {
        let mut jar = self.jar.lock();
        for cookie in &response.cookies {
            let expired = cookie.max_age().is_some_and(|age| age.is_zero());
            if expired || cookie.value().is_empty() {
                jar.remove(cookie.name());
            } else {
                jar.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
    }
}

/// Builder for test requests
pub struct TestRequestBuilder<'a> {
    client: &'a TestClient,
    request: HttpRequest,
}

impl<'a> TestRequestBuilder<'a> {
    fn new(client: &'a TestClient, method: HttpMethod, path: &str) -> Self {
        Self {
            client,
            request: HttpRequest::new(method, path),
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.request.set_header(key, value);
        self
    }

    /// Send a cookie on this request only, overriding the jar
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.request.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.request.body = body;
        self
    }

    /// Set a URL-encoded form body
    pub fn form(mut self, fields: &[(&str, &str)]) -> Result<Self, Error> {
        self.request.body = encode_form(fields)?.into_bytes();
        self.request.set_header("content-type", FORM_URLENCODED);
        Ok(self)
    }

    pub fn json<T: serde::Serialize>(mut self, data: &T) -> Result<Self, Error> {
        self.request.body =
            serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
        self.request.set_header("content-type", "application/json");
        Ok(self)
    }

    /// Mark the request as coming from HTMX
    pub fn htmx(self) -> Self {
        self.header("HX-Request", "true")
    }

    pub fn build(self) -> HttpRequest {
        self.request
    }

    pub async fn send(self) -> TestResponse {
        self.client.execute(self.request).await
    }
}

/// Response from a test request
#[derive(Debug, Clone)]
pub struct TestResponse {
    response: HttpResponse,
}

impl TestResponse {
    pub fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Body as a string
    pub fn text(&self) -> String {
        self.response.text()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.response.body)
    }

    /// Header value, matched case-insensitively
    pub fn header(&self, key: &str) -> Option<&str> {
        self.response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Cookie set by this response
    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.response.cookie(name)
    }

    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| c.value().to_string())
    }

    pub fn inner(&self) -> &HttpResponse {
        &self.response
    }

    pub fn into_inner(self) -> HttpResponse {
        self.response
    }
}
