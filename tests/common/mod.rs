use hello_htmx::{AppConfig, create_app_with_secret};
use hello_htmx_csrf::CsrfSecret;
use hello_htmx_testing::{TestClient, assert_sets_cookie};
use std::path::PathBuf;

pub const SECRET: &str = "route-test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        template_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates"),
        ..AppConfig::default()
    }
}

/// Client for a fresh application with an empty to-do list
pub fn client() -> TestClient {
    let app = create_app_with_secret(&test_config(), CsrfSecret::new(SECRET)).unwrap();
    TestClient::new(app)
}

/// Client that has loaded the index page, and the token it was issued
pub async fn client_with_token() -> (TestClient, String) {
    let client = client();
    let token = assert_sets_cookie(&client.get("/").send().await, "csrf_token");
    (client, token)
}
