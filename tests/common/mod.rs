//! Shared test doubles

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use ocapi_tools::catalog::{
    ApiDispatcher, DATA_FAMILY, EndpointDescriptor, EndpointRegistry, HttpTransport, ParameterSpec,
};
use ocapi_tools::{Error, Result};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport that counts and records calls instead of touching the network
pub struct MockTransport {
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedCall>>,
    failure: Option<String>,
    payload: Value,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            failure: None,
            payload: json!({"ok": true}),
        }
    }

    pub fn with_payload(payload: Value) -> Self {
        Self {
            payload,
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.recorded.lock().last().cloned()
    }

    fn record(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        match self.failure {
            Some(ref message) => Err(Error::Transport(message.clone())),
            None => Ok(self.payload.clone()),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, path: &str) -> Result<Value> {
        self.record("GET", path, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.record("POST", path, Some(body))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.record("PUT", path, Some(body))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.record("PATCH", path, Some(body))
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.record("DELETE", path, None)
    }
}

pub fn descriptor(
    tool_name: &str,
    path: &str,
    method: &str,
    parameters: Vec<ParameterSpec>,
    default_body: Option<Value>,
) -> EndpointDescriptor {
    EndpointDescriptor {
        tool_name: tool_name.to_string(),
        path: path.to_string(),
        method: method.to_string(),
        parameters,
        default_body: default_body.and_then(|v| v.as_object().cloned()),
        api_family: DATA_FAMILY.to_string(),
        requires_site_selector: path.contains("{site_id}"),
        description: String::new(),
    }
}

/// Registry with a representative endpoint of each shape
pub fn test_registry() -> Arc<EndpointRegistry> {
    let search_body = json!({"query": {"match_all_query": {}}, "count": 25, "start": 0});
    Arc::new(EndpointRegistry::from_descriptors(vec![
        descriptor(
            "get_catalogs",
            "/catalogs",
            "GET",
            vec![
                ParameterSpec::new("count", "integer", false),
                ParameterSpec::new("empty", "string", false),
                ParameterSpec::new("nullish", "string", false),
            ],
            None,
        ),
        descriptor(
            "get_product",
            "/products/{product_id}",
            "GET",
            vec![
                ParameterSpec::new("site_id", "string", true),
                ParameterSpec::new("product_id", "string", true),
            ],
            None,
        ),
        descriptor(
            "search_products",
            "/product_search",
            "POST",
            vec![
                ParameterSpec::new("site_id", "string", true),
                ParameterSpec::new("query", "string", false),
                ParameterSpec::new("count", "integer", false),
                ParameterSpec::new("start", "integer", false),
            ],
            Some(search_body.clone()),
        ),
        descriptor(
            "search_promotions",
            "/sites/{site_id}/promotion_search",
            "POST",
            vec![
                ParameterSpec::new("site_id", "string", false),
                ParameterSpec::new("query", "string", false),
                ParameterSpec::new("campaign_id", "string", false),
            ],
            Some(search_body),
        ),
        descriptor(
            "delete_coupon",
            "/sites/{site_id}/coupons/{coupon_id}",
            "DELETE",
            vec![
                ParameterSpec::new("site_id", "string", true),
                ParameterSpec::new("coupon_id", "string", true),
            ],
            None,
        ),
        descriptor("purge_cache", "/cache", "TRACE", vec![], None),
    ]))
}

pub fn dispatcher(transport: &Arc<MockTransport>) -> ApiDispatcher {
    ApiDispatcher::new(test_registry(), Arc::clone(transport) as Arc<dyn HttpTransport>)
}
