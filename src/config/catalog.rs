use config::{Config, File};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Name reported when a catalog carries no `server` block.
pub const DEFAULT_SERVER_NAME: &str = "API Gateway MCP";
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";
pub const DEFAULT_SERVER_DESCRIPTION: &str =
    "Generic API gateway that wraps REST APIs as MCP tools";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load catalog: {0}")]
    Load(#[from] config::ConfigError),
    #[error("duplicate tool name in catalog: {name}")]
    DuplicateTool { name: String },
}

/// A loaded tool catalog: server metadata, an optional auth hint, and the
/// ordered list of tool definitions. Read-only after load; shared by
/// reference between the MCP runtime and the REST control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub server: Option<ServerInfo>,
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

/// Names an environment variable expected to hold a credential. Parsed and
/// surfaced for operators, but not consumed by the invocation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_env_var: String,
}

/// One bridged REST endpoint, described declaratively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub endpoint: String,
    pub method: Option<String>,
    /// Per-call deadline in seconds. Unset means unbounded.
    pub timeout: Option<u64>,
    /// Request-body template, used for non-GET methods only.
    pub template: Option<String>,
    /// Query-parameter name to value template, used for GET only.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// JSON-Schema primitive type name.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

impl Catalog {
    /// Load and validate a catalog file. The format is inferred from the
    /// file extension (YAML in practice; JSON and TOML come free).
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog: Catalog = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Duplicate tool names make lookup ambiguous and are rejected up front.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(CatalogError::DuplicateTool {
                    name: tool.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a tool by exact name.
    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn server_name(&self) -> &str {
        self.server
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(DEFAULT_SERVER_NAME)
    }

    pub fn server_version(&self) -> &str {
        self.server
            .as_ref()
            .map(|s| s.version.as_str())
            .unwrap_or(DEFAULT_SERVER_VERSION)
    }

    pub fn server_description(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.description.as_deref())
            .unwrap_or(DEFAULT_SERVER_DESCRIPTION)
    }
}

impl ToolConfig {
    /// Effective HTTP method: uppercased, GET when unset or empty.
    pub fn resolved_method(&self) -> String {
        match self.method.as_deref() {
            Some(m) if !m.trim().is_empty() => m.to_uppercase(),
            _ => "GET".to_string(),
        }
    }

    /// Synthesize the MCP `inputSchema` object for this tool's parameters.
    /// `default` appears in a property only when one is configured.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (name, spec) in &self.parameters {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(spec.kind));
            property.insert("description".to_string(), json!(spec.description));
            if let Some(default) = &spec.default {
                property.insert("default".to_string(), default.clone());
            }
            properties.insert(name.clone(), Value::Object(property));

            if spec.required {
                required.push(name.clone());
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
