//! Endpoint descriptor types
//!
//! These types map directly to the endpoint catalog format
//! (`{ "endpoints": [ ... ] }`, camelCase field names).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::Error;
use crate::protocol::{Tool, ToolAnnotations};

/// Catalog document wrapping the descriptor list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointCatalog {
    /// Endpoint descriptors in declaration order
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
}

/// A data record describing one REST operation exposed as a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    /// Unique tool name (registry key)
    pub tool_name: String,

    /// Path template with `{param}` placeholders
    pub path: String,

    /// HTTP verb as written in the catalog
    #[serde(default = "default_method")]
    pub method: String,

    /// Declared parameters, in order
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,

    /// Seed body for mutating methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_body: Option<Map<String, Value>>,

    /// Classification tag (`data`, `shop`, ...)
    #[serde(default = "default_family")]
    pub api_family: String,

    /// Advisory flag, not enforced by the engine
    #[serde(default)]
    pub requires_site_selector: bool,

    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_family() -> String {
    DATA_FAMILY.to_string()
}

/// Family tag of Data API endpoints
pub const DATA_FAMILY: &str = "data";

/// One declared parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Argument name
    pub name: String,

    /// JSON type hint (`string`, `number`, `integer`, `boolean`, `array`, `object`)
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,

    /// Whether the tool refuses to run without it
    #[serde(default)]
    pub required: bool,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_param_type() -> String {
    "string".to_string()
}

impl ParameterSpec {
    /// Convenience constructor
    pub fn new(name: &str, param_type: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            param_type: param_type.to_string(),
            required,
            description: None,
        }
    }
}

/// HTTP verbs the dispatcher knows how to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Whether requests with this verb carry a body
    #[must_use]
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Canonical upper-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl EndpointDescriptor {
    /// Parsed HTTP method, if the catalog names a supported verb
    pub fn http_method(&self) -> crate::Result<HttpMethod> {
        self.method.parse()
    }

    /// Whether `{name}` appears in the path template
    #[must_use]
    pub fn is_path_param(&self, name: &str) -> bool {
        self.path.contains(&format!("{{{name}}}"))
    }

    /// Names of required parameters, in declaration order
    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    /// Placeholder names in the path template, in order of appearance
    #[must_use]
    pub fn path_placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            names.push(&after[..end]);
            rest = &after[end + 1..];
        }
        names
    }

    /// Build the input JSON Schema from declared parameters
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type));
            if let Some(ref description) = param.description {
                prop.insert("description".to_string(), json!(description));
            }
            properties.insert(param.name.clone(), Value::Object(prop));
        }

        let required: Vec<&str> = self.required_params().collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Convert to an MCP tool definition
    #[must_use]
    pub fn to_mcp_tool(&self) -> Tool {
        let read_only = matches!(self.http_method(), Ok(HttpMethod::Get))
            || self.tool_name.starts_with("search_");
        let description = if self.description.is_empty() {
            format!("{} {}", self.method.to_ascii_uppercase(), self.path)
        } else {
            self.description.clone()
        };

        Tool {
            name: self.tool_name.clone(),
            title: None,
            description: Some(description),
            input_schema: self.input_schema(),
            output_schema: None,
            annotations: Some(ToolAnnotations {
                title: None,
                read_only_hint: Some(read_only),
                destructive_hint: Some(matches!(self.http_method(), Ok(HttpMethod::Delete))),
                idempotent_hint: None,
                open_world_hint: Some(true),
            }),
        }
    }
}
