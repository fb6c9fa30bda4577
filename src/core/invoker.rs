//! Invocation engine: turns a tool definition plus caller-supplied
//! arguments into exactly one outbound HTTP request, and folds every
//! outcome into a uniform result envelope.

use anyhow::Result;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::{timeout, Duration};

use crate::config::ToolConfig;
use crate::template::substitute;

/// Uniform envelope returned by every invocation. `status` is present only
/// for remote HTTP error statuses; transport failures carry just `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl InvokeResult {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            status: None,
        }
    }

    pub fn http_failure(error: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::failure(error)
        }
    }
}

/// Issues configured tool calls over a shared HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    client: Client,
}

impl Invoker {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Execute one tool call: substitute templates, issue the request, and
    /// normalize the outcome. No retries; exactly one network round trip.
    pub async fn invoke(&self, tool: &ToolConfig, args: &Map<String, Value>) -> InvokeResult {
        let method = tool.resolved_method();
        let url = build_url(tool, args);

        tracing::info!("Invoking tool {} via {} {}", tool.name, method, url);

        let request = match self.build_request(&method, &url, tool, args) {
            Ok(request) => request,
            Err(e) => return InvokeResult::failure(format!("Unexpected error: {}", e)),
        };

        let outcome = match tool.timeout {
            Some(secs) => match timeout(Duration::from_secs(secs), perform(request)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return InvokeResult::failure(format!(
                        "Unexpected error: request timed out after {} seconds",
                        secs
                    ))
                }
            },
            None => perform(request).await,
        };

        match outcome {
            Ok(result) => result,
            Err(e) => InvokeResult::failure(format!("Unexpected error: {}", e)),
        }
    }

    fn build_request(
        &self,
        method: &str,
        url: &str,
        tool: &ToolConfig,
        args: &Map<String, Value>,
    ) -> Result<RequestBuilder> {
        let method = Method::from_bytes(method.as_bytes())?;
        let mut request = self.client.request(method.clone(), url);

        // The body template already produces the final payload; it is sent
        // verbatim with no re-serialization.
        if method != Method::GET {
            if let Some(template) = &tool.template {
                request = request.body(substitute(template, args));
            }
        }

        Ok(request)
    }
}

/// Endpoint plus substituted query string for GET tools. Values are taken
/// as the template engine produced them; no URL-encoding is applied.
pub(crate) fn build_url(tool: &ToolConfig, args: &Map<String, Value>) -> String {
    let mut url = tool.endpoint.clone();

    if tool.resolved_method() == "GET" && !tool.query_params.is_empty() {
        let pairs: Vec<String> = tool
            .query_params
            .iter()
            .map(|(name, template)| format!("{}={}", name, substitute(template, args)))
            .collect();
        url.push('?');
        url.push_str(&pairs.join("&"));
    }

    url
}

async fn perform(request: RequestBuilder) -> Result<InvokeResult> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        return Ok(InvokeResult::http_failure(
            format!("API call failed: {}", status),
            status.as_u16(),
        ));
    }

    // An empty body decodes to null; everything else must be JSON and is
    // passed through structure-preserving.
    let body = response.text().await?;
    let data = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)?
    };

    Ok(InvokeResult::success(data))
}
