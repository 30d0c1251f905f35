//! Request builder - classifies tool arguments into path, query and body
//!
//! Classification is driven entirely by the descriptor: a declared parameter
//! whose `{name}` appears in the path template is a path parameter, every
//! other declared parameter is a query parameter. Mutating methods get a
//! body synthesized from the descriptor's default body plus a few
//! structural arguments (`query`, `count`, `start`, `expand`, `body`).

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use super::EndpointDescriptor;
use crate::{Error, Result};

/// Free-text search argument, translated into a text query
pub const QUERY_ARG: &str = "query";
/// Caller-supplied body object
pub const BODY_ARG: &str = "body";
/// Tool whose campaign filter replaces any text query
pub const PROMOTION_SEARCH_TOOL: &str = "search_promotions";
/// Campaign filter argument of the promotion search
pub const CAMPAIGN_ARG: &str = "campaign_id";
/// Site placeholder the dispatcher can fill from its site selector
pub const SITE_ARG: &str = "site_id";

const PAGINATION_ARGS: [&str; 2] = ["count", "start"];
const EXPAND_ARG: &str = "expand";

/// Text-query fields per search tool
const SEARCH_FIELDS: &[(&str, &[&str])] = &[
    ("search_products", &["id", "name"]),
    ("search_customers", &["email", "first_name", "last_name"]),
    ("search_orders", &["order_no", "customer_info.email"]),
    ("search_campaigns", &["campaign_id", "description"]),
    ("search_promotions", &["id", "name"]),
    ("search_coupons", &["coupon_id", "description"]),
];

/// Fields searched by tools without an entry in the table
const DEFAULT_SEARCH_FIELDS: &[&str] = &["id", "name", "description"];

/// Parameters of one outgoing request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    /// Values substituted into `{name}` placeholders
    pub path_params: HashMap<String, String>,
    /// Query-string values in insertion order
    pub query_params: Vec<(String, Value)>,
    /// JSON body (always present for POST/PUT/PATCH)
    pub body: Option<Map<String, Value>>,
}

impl RequestParams {
    /// Look up a query parameter by name
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&Value> {
        self.query_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Stateless builder turning descriptors and arguments into [`RequestParams`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder;

impl RequestBuilder {
    /// Create a builder
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classify `args` according to `descriptor`
    ///
    /// Fails only when a mutating call carries a `body` that is not a JSON
    /// object (or JSON text encoding one).
    pub fn build(&self, descriptor: &EndpointDescriptor, args: &Value) -> Result<RequestParams> {
        let mut params = RequestParams::default();

        for param in &descriptor.parameters {
            let Some(value) = present(args, &param.name) else {
                continue;
            };

            if descriptor.is_path_param(&param.name) {
                params
                    .path_params
                    .insert(param.name.clone(), scalar_to_string(value));
            } else if param.name != QUERY_ARG && param.name != BODY_ARG {
                params.query_params.push((param.name.clone(), value.clone()));
            }
        }

        let mutating = descriptor.http_method().is_ok_and(|m| m.is_mutating());
        if mutating {
            params.body = Some(Self::build_body(descriptor, args)?);
        }

        Ok(params)
    }

    fn build_body(descriptor: &EndpointDescriptor, args: &Value) -> Result<Map<String, Value>> {
        let mut body = descriptor.default_body.clone().unwrap_or_default();

        for key in PAGINATION_ARGS {
            if let Some(value) = present(args, key) {
                body.insert(key.to_string(), value.clone());
            }
        }

        match present(args, EXPAND_ARG) {
            Some(Value::String(expand)) => {
                let parts: Vec<Value> = expand
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect();
                body.insert(EXPAND_ARG.to_string(), Value::Array(parts));
            }
            Some(list @ Value::Array(_)) => {
                body.insert(EXPAND_ARG.to_string(), list.clone());
            }
            _ => {}
        }

        if let Some(caller) = caller_body(args)? {
            body.extend(caller);
        }

        // Structural query overrides come last so callers cannot mask them.
        if let Some(Value::String(phrase)) = present(args, QUERY_ARG) {
            body.insert(
                QUERY_ARG.to_string(),
                text_query(search_fields(&descriptor.tool_name), phrase),
            );
        }

        if descriptor.tool_name == PROMOTION_SEARCH_TOOL {
            if let Some(campaign) = present(args, CAMPAIGN_ARG) {
                body.insert(
                    QUERY_ARG.to_string(),
                    term_query(CAMPAIGN_ARG, &scalar_to_string(campaign)),
                );
            }
        }

        Ok(body)
    }
}

/// Fields a search tool's text query runs against
#[must_use]
pub fn search_fields(tool_name: &str) -> &'static [&'static str] {
    SEARCH_FIELDS
        .iter()
        .find(|(name, _)| *name == tool_name)
        .map_or(DEFAULT_SEARCH_FIELDS, |(_, fields)| fields)
}

/// Free-text phrase search over a field set
#[must_use]
pub fn text_query(fields: &[&str], phrase: &str) -> Value {
    json!({
        "text_query": {
            "fields": fields,
            "search_phrase": phrase,
        }
    })
}

/// Exact-match filter on a single field
#[must_use]
pub fn term_query(field: &str, value: &str) -> Value {
    json!({
        "term_query": {
            "fields": [field],
            "operator": "is",
            "values": [value],
        }
    })
}

/// Argument value, unless absent, null or an empty string
pub(crate) fn present<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
    match args.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Caller body, given either as an object or as a JSON-encoded object
fn caller_body(args: &Value) -> Result<Option<Map<String, Value>>> {
    let Some(value) = present(args, BODY_ARG) else {
        return Ok(None);
    };
    match value {
        Value::Object(map) => Ok(Some(map.clone())),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(other) => Err(invalid_body(&format!("expected a JSON object, got {}", kind(&other)))),
            Err(e) => Err(invalid_body(&e.to_string())),
        },
        other => Err(invalid_body(&format!("expected a JSON object, got {}", kind(other)))),
    }
}

fn invalid_body(reason: &str) -> Error {
    Error::Validation(format!("Invalid body: {reason}"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render a JSON value as a URL component
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Number(_) | Value::Bool(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DATA_FAMILY, ParameterSpec};
    use pretty_assertions::assert_eq;

    fn descriptor(
        name: &str,
        path: &str,
        method: &str,
        params: &[&str],
        default_body: Option<Value>,
    ) -> EndpointDescriptor {
        EndpointDescriptor {
            tool_name: name.to_string(),
            path: path.to_string(),
            method: method.to_string(),
            parameters: params
                .iter()
                .map(|p| ParameterSpec::new(p, "string", false))
                .collect(),
            default_body: default_body.and_then(|b| b.as_object().cloned()),
            api_family: DATA_FAMILY.to_string(),
            requires_site_selector: false,
            description: String::new(),
        }
    }

    #[test]
    fn path_and_query_are_separated() {
        // GIVEN: path /a/{x} with declared x and y
        let d = descriptor("get_a", "/a/{x}", "GET", &["x", "y"], None);

        // WHEN: building with both arguments
        let params = RequestBuilder::new().build(&d, &json!({"x": "v", "y": "q"})).unwrap();

        // THEN: x is a path param only, y a query param
        assert_eq!(params.path_params.get("x").map(String::as_str), Some("v"));
        assert_eq!(params.query("y"), Some(&json!("q")));
        assert!(params.query("x").is_none());
        assert!(params.body.is_none());
    }

    #[test]
    fn absent_null_and_empty_arguments_are_skipped() {
        let d = descriptor("get_a", "/a/{x}", "GET", &["x", "y", "z"], None);
        let params = RequestBuilder::new().build(&d, &json!({"x": "", "y": null})).unwrap();

        assert!(params.path_params.is_empty());
        assert!(params.query_params.is_empty());
    }

    #[test]
    fn undeclared_arguments_are_ignored() {
        let d = descriptor("get_a", "/a", "GET", &["y"], None);
        let params = RequestBuilder::new().build(&d, &json!({"y": 1, "rogue": "x"})).unwrap();
        assert_eq!(params.query_params, vec![("y".to_string(), json!(1))]);
    }

    #[test]
    fn numeric_path_params_are_stringified() {
        let d = descriptor("get_order", "/orders/{order_no}", "GET", &["order_no"], None);
        let params = RequestBuilder::new().build(&d, &json!({"order_no": 1001})).unwrap();
        assert_eq!(params.path_params["order_no"], "1001");
    }

    #[test]
    fn query_keyword_never_reaches_query_string() {
        let d = descriptor(
            "search_products",
            "/product_search",
            "POST",
            &["site_id", "query"],
            Some(json!({"query": {"match_all_query": {}}})),
        );
        let params = RequestBuilder::new().build(&d, &json!({"site_id": "RefArch", "query": "shoes"})).unwrap();

        assert!(params.query("query").is_none());
        assert_eq!(params.query("site_id"), Some(&json!("RefArch")));
    }

    #[test]
    fn text_query_uses_tool_fields() {
        let d = descriptor(
            "search_customers",
            "/customer_lists/{list_id}/customer_search",
            "POST",
            &["list_id", "query"],
            None,
        );
        let params = RequestBuilder::new().build(&d, &json!({"list_id": "main", "query": "smith"})).unwrap();

        assert_eq!(
            params.body.unwrap()["query"],
            json!({"text_query": {
                "fields": ["email", "first_name", "last_name"],
                "search_phrase": "smith"
            }})
        );
    }

    #[test]
    fn unknown_search_tool_uses_default_fields() {
        assert_eq!(search_fields("search_stores"), DEFAULT_SEARCH_FIELDS);
        assert_eq!(search_fields("search_orders"), &["order_no", "customer_info.email"]);
    }

    #[test]
    fn campaign_filter_supersedes_text_query() {
        // GIVEN: promotion search with both a phrase and a campaign id
        let d = descriptor(
            PROMOTION_SEARCH_TOOL,
            "/sites/{site_id}/promotion_search",
            "POST",
            &["site_id", "query", "campaign_id"],
            Some(json!({"query": {"match_all_query": {}}})),
        );

        // WHEN: building the request
        let params = RequestBuilder::new().build(
            &d,
            &json!({"site_id": "RefArch", "query": "sale", "campaign_id": "summer"}),
        ).unwrap();

        // THEN: only the term query remains
        assert_eq!(
            params.body.unwrap()["query"],
            json!({"term_query": {
                "fields": ["campaign_id"],
                "operator": "is",
                "values": ["summer"]
            }})
        );
    }

    #[test]
    fn campaign_arg_is_plain_for_other_tools() {
        let d = descriptor(
            "search_campaigns",
            "/sites/{site_id}/campaign_search",
            "POST",
            &["site_id", "campaign_id"],
            None,
        );
        let params = RequestBuilder::new().build(&d, &json!({"site_id": "s", "campaign_id": "summer"})).unwrap();
        assert!(params.body.unwrap().get("query").is_none());
    }

    #[test]
    fn expand_is_split_and_trimmed() {
        let d = descriptor("search_products", "/product_search", "POST", &["expand"], None);
        let params =
            RequestBuilder::new().build(&d, &json!({"expand": "images, prices ,,variations"})).unwrap();
        assert_eq!(
            params.body.unwrap()["expand"],
            json!(["images", "prices", "variations"])
        );
    }

    #[test]
    fn pagination_passes_through() {
        let d = descriptor(
            "search_orders",
            "/order_search",
            "POST",
            &[],
            Some(json!({"count": 25, "start": 0})),
        );
        let params = RequestBuilder::new().build(&d, &json!({"count": 50, "start": 100})).unwrap();
        let body = params.body.unwrap();
        assert_eq!(body["count"], 50);
        assert_eq!(body["start"], 100);
    }

    #[test]
    fn caller_body_wins_over_defaults_but_not_over_query() {
        // GIVEN: default body with sorts and a caller body overriding both sorts and query
        let d = descriptor(
            "search_products",
            "/product_search",
            "POST",
            &["query"],
            Some(json!({"sorts": [{"field": "id"}], "count": 25})),
        );
        let args = json!({
            "query": "boots",
            "body": {"sorts": [{"field": "name"}], "query": {"match_all_query": {}}}
        });

        // WHEN: building
        let body = RequestBuilder::new().build(&d, &args).unwrap().body.unwrap();

        // THEN: caller sorts win, structural text query wins over caller query
        assert_eq!(body["sorts"], json!([{"field": "name"}]));
        assert_eq!(body["count"], 25);
        assert_eq!(body["query"], text_query(&["id", "name"], "boots"));
    }

    #[test]
    fn caller_body_may_be_json_text() {
        let d = descriptor("update_product", "/products/{product_id}", "PATCH", &["product_id"], None);
        let body = RequestBuilder::new()
            .build(&d, &json!({"product_id": "p1", "body": "{\"online_flag\": true}"}))
            .unwrap()
            .body
            .unwrap();
        assert_eq!(body["online_flag"], true);
    }

    #[test]
    fn malformed_caller_body_is_rejected() {
        // GIVEN: a PATCH endpoint
        let d = descriptor("update_product", "/products/{product_id}", "PATCH", &["product_id"], None);

        // WHEN/THEN: bodies that are not JSON objects are validation errors
        for body in [json!("{not json"), json!("[1, 2]"), json!(42), json!([1, 2])] {
            let err = RequestBuilder::new()
                .build(&d, &json!({"product_id": "p1", "body": body}))
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{body}");
            assert!(err.to_string().starts_with("Invalid body: "), "{err}");
        }
    }

    #[test]
    fn body_is_not_inspected_for_reads() {
        let d = descriptor("get_product", "/products/{product_id}", "GET", &["product_id"], None);
        let params = RequestBuilder::new()
            .build(&d, &json!({"product_id": "p1", "body": "{not json"}))
            .unwrap();
        assert!(params.body.is_none());
    }

    #[test]
    fn mutating_methods_always_get_a_body() {
        let d = descriptor("create_thing", "/things", "PUT", &[], None);
        let params = RequestBuilder::new().build(&d, &json!({})).unwrap();
        assert_eq!(params.body, Some(Map::new()));

        let d = descriptor("delete_thing", "/things/{id}", "DELETE", &["id"], None);
        assert!(RequestBuilder::new().build(&d, &json!({"id": "1"})).unwrap().body.is_none());
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(scalar_to_string(&json!("a b")), "a b");
        assert_eq!(scalar_to_string(&json!(10)), "10");
        assert_eq!(scalar_to_string(&json!(true)), "true");
        assert_eq!(scalar_to_string(&json!(["x", 2])), "x,2");
    }
}
