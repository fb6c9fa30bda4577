//! Catalog configuration - the declarative description of bridged tools.

pub mod catalog;

pub use catalog::{
    AuthConfig, Catalog, CatalogError, ParameterSpec, ServerInfo, ToolConfig,
    DEFAULT_SERVER_DESCRIPTION, DEFAULT_SERVER_NAME, DEFAULT_SERVER_VERSION,
};
