//! Mock control plane shared by HTTP-level integration tests.
//!
//! Integration tests are compiled as separate crates, so each test file pulls
//! this module in via:
//!
//! ```rust
//! #[path = "common/mock_api.rs"]
//! mod mock_api;
//! ```

use cloudrift::api::retry::RetryPolicy;
use cloudrift::{ClientConfig, CloudRiftClient};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token accepted by the mock control plane.
pub const TOKEN: &str = "rift-test-token";
/// Identity returned for [`TOKEN`].
pub const EMAIL: &str = "dev@example.com";

/// Client configuration pointing at `server`.
pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(TOKEN).with_base_url(server.uri())
}

/// Recipe listing payload with one VM recipe per name.
pub fn recipes_body(names: &[&str]) -> Value {
    let recipes: Vec<Value> = names
        .iter()
        .map(|name| {
            let slug = name.to_lowercase();
            json!({
                "name": name,
                "details": {"VirtualMachine": {
                    "cloudinit_url": format!("https://recipes.example/{slug}/init.yaml"),
                    "image_url": format!("https://recipes.example/{slug}.img"),
                }}
            })
        })
        .collect();
    json!({"data": {"groups": [{"name": "Linux", "recipes": recipes}]}})
}

/// Accepts [`TOKEN`] on the identity endpoint.
pub async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/me"))
        .and(header("X-API-KEY", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"email": EMAIL}})))
        .mount(server)
        .await;
}

/// Serves a fixed recipe listing.
pub async fn mount_recipes(server: &MockServer, names: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/api/v1/recipes/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(recipes_body(names)))
        .mount(server)
        .await;
}

/// Connects without retries; panics when the handshake fails.
pub async fn connect(server: &MockServer) -> CloudRiftClient {
    CloudRiftClient::connect_with(config(server), RetryPolicy::none())
        .await
        .unwrap_or_else(|err| panic!("client should connect: {err}"))
}

/// Mounts auth plus an `Ubuntu` recipe and connects.
pub async fn connected(server: &MockServer) -> CloudRiftClient {
    mount_auth(server).await;
    mount_recipes(server, &["Ubuntu"]).await;
    connect(server).await
}
