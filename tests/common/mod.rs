use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode},
};
use serde_json::Value;
use subscription_service::{Server, test_utils::TestServerBuilder};
use tower::ServiceExt;

pub const ALICE: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";
pub const BOB: &str = "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed";

/// Response pieces the tests look at
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// App wrapper that drives requests through the full router
pub struct TestHarness {
    #[allow(dead_code)]
    pub server: Server,
    pub app: Router,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::from_builder(TestServerBuilder::new()).await
    }

    pub async fn from_builder(builder: TestServerBuilder) -> Self {
        let server = builder.build().await;
        let app = server.create_app();
        Self { server, app }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    /// Create a subscription over HTTP and return its id
    #[allow(dead_code)]
    pub async fn create(
        &self,
        service_name: &str,
        price: i64,
        user_id: &str,
        start: &str,
        end: Option<&str>,
    ) -> String {
        let mut body = serde_json::json!({
            "service_name": service_name,
            "price": price,
            "user_id": user_id,
            "start_date": start,
        });
        if let Some(end) = end {
            body["end_date"] = Value::String(end.to_string());
        }

        let response = self
            .request(Method::POST, "/subscriptions", Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}
