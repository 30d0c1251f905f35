//! Minimal built-in endpoint set used when the catalog cannot be loaded

use serde_json::json;

use super::{DATA_FAMILY, EndpointDescriptor, ParameterSpec};

fn descriptor(
    tool_name: &str,
    path: &str,
    method: &str,
    parameters: Vec<ParameterSpec>,
    description: &str,
) -> EndpointDescriptor {
    EndpointDescriptor {
        tool_name: tool_name.to_string(),
        path: path.to_string(),
        method: method.to_string(),
        parameters,
        default_body: None,
        api_family: DATA_FAMILY.to_string(),
        requires_site_selector: false,
        description: description.to_string(),
    }
}

/// Fallback descriptors: enough to browse catalogs and look up products.
pub fn builtin_endpoints() -> Vec<EndpointDescriptor> {
    let mut search_products = descriptor(
        "search_products",
        "/product_search",
        "POST",
        vec![
            ParameterSpec::new("site_id", "string", true),
            ParameterSpec::new("query", "string", false),
            ParameterSpec::new("count", "integer", false),
            ParameterSpec::new("start", "integer", false),
            ParameterSpec::new("expand", "string", false),
        ],
        "Search products of a site",
    );
    search_products.default_body = json!({
        "query": {"match_all_query": {}},
        "count": 25,
        "start": 0
    })
    .as_object()
    .cloned();
    search_products.requires_site_selector = true;

    vec![
        descriptor(
            "get_catalogs",
            "/catalogs",
            "GET",
            vec![
                ParameterSpec::new("count", "integer", false),
                ParameterSpec::new("start", "integer", false),
            ],
            "List catalogs",
        ),
        descriptor(
            "get_catalog",
            "/catalogs/{catalog_id}",
            "GET",
            vec![ParameterSpec::new("catalog_id", "string", true)],
            "Get a catalog by id",
        ),
        descriptor(
            "get_product",
            "/products/{product_id}",
            "GET",
            vec![
                ParameterSpec::new("site_id", "string", false),
                ParameterSpec::new("product_id", "string", true),
                ParameterSpec::new("expand", "string", false),
            ],
            "Get a product by id",
        ),
        search_products,
        descriptor(
            "get_sites",
            "/sites",
            "GET",
            vec![],
            "List sites of the instance",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::validate_descriptor;
    use std::collections::HashSet;

    #[test]
    fn builtin_set_is_valid_and_unique() {
        let endpoints = builtin_endpoints();
        let names: HashSet<&str> = endpoints.iter().map(|d| d.tool_name.as_str()).collect();
        assert_eq!(names.len(), endpoints.len());
        for endpoint in &endpoints {
            validate_descriptor(endpoint).unwrap();
            endpoint.http_method().unwrap();
        }
    }
}
