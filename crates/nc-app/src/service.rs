//! Code generation through a hosted text-generation provider.
//!
//! [`ServiceGenerator`] checks the provider credential, builds the prompt and
//! hands one [`ServiceCall`] to a transport. The transport owns the network;
//! everything around it is deterministic and testable without one.

use serde_json::{Value, json};
use tracing::debug;

use crate::codegen::{CodeGenerator, GenerateRequest, GenerateResponse, Provider, build_prompt, system_message};
use crate::config::credential_for;
use crate::error::{AppError, AppResult};

const MAX_TOKENS: u32 = 4096;

/// One fully prepared provider request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub provider: Provider,
    pub api_key: String,
    pub model: &'static str,
    pub system: String,
    pub prompt: String,
}

impl ServiceCall {
    /// HTTP endpoint for the call.
    pub fn endpoint(&self) -> String {
        match self.provider {
            Provider::Gemini => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                self.model
            ),
            Provider::Openai => "https://api.openai.com/v1/chat/completions".to_string(),
            Provider::Together => "https://api.together.xyz/v1/chat/completions".to_string(),
            Provider::Openrouter => "https://openrouter.ai/api/v1/chat/completions".to_string(),
            Provider::Mistral => "https://api.mistral.ai/v1/chat/completions".to_string(),
        }
    }

    /// Request headers, including authentication.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = match self.provider {
            Provider::Gemini => vec![("x-goog-api-key", self.api_key.clone())],
            _ => vec![("Authorization", format!("Bearer {}", self.api_key))],
        };
        if self.provider == Provider::Openrouter {
            headers.push(("HTTP-Referer", "https://neuro-canvas.app".to_string()));
            headers.push(("X-Title", "Neuro-Canvas".to_string()));
        }
        headers
    }

    /// JSON request body in the provider's dialect.
    pub fn body(&self) -> Value {
        let messages = json!([
            { "role": "system", "content": self.system },
            { "role": "user", "content": self.prompt },
        ]);
        match self.provider {
            Provider::Gemini => json!({
                "systemInstruction": { "parts": [{ "text": self.system }] },
                "contents": [{ "role": "user", "parts": [{ "text": self.prompt }] }],
            }),
            Provider::Openai => json!({
                "model": self.model,
                "messages": messages,
                "max_completion_tokens": MAX_TOKENS,
            }),
            Provider::Together | Provider::Openrouter => json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": MAX_TOKENS,
                "temperature": 0.7,
            }),
            Provider::Mistral => json!({
                "model": self.model,
                "messages": messages,
            }),
        }
    }

    /// Generated text from a provider reply. A reply without text yields an
    /// empty string.
    pub fn reply_text(&self, reply: &Value) -> String {
        match self.provider {
            Provider::Gemini => reply["candidates"][0]["content"]["parts"]
                .as_array()
                .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
                .unwrap_or_default(),
            _ => reply["choices"][0]["message"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl Provider {
    /// Model requested from the provider.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-flash-latest",
            Provider::Openai => "gpt-4o",
            Provider::Together => "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
            Provider::Openrouter => "anthropic/claude-3.5-sonnet",
            Provider::Mistral => "codestral-latest",
        }
    }
}

/// [`CodeGenerator`] backed by a hosted provider.
///
/// `lookup` resolves credential variables (see [`crate::env_lookup`]);
/// `transport` performs the call and returns the raw reply text.
pub struct ServiceGenerator<L, T> {
    lookup: L,
    transport: T,
}

impl<L, T> ServiceGenerator<L, T>
where
    L: Fn(&str) -> Option<String>,
    T: Fn(&ServiceCall) -> AppResult<String>,
{
    pub fn new(lookup: L, transport: T) -> Self {
        Self { lookup, transport }
    }

    /// Prepare the call for `request`; fails when the credential is missing.
    pub fn prepare(&self, request: &GenerateRequest) -> AppResult<ServiceCall> {
        let api_key = credential_for(request.provider, &self.lookup)?;
        Ok(ServiceCall {
            provider: request.provider,
            api_key,
            model: request.provider.default_model(),
            system: system_message(request.framework),
            prompt: build_prompt(&request.graph, request.framework),
        })
    }
}

impl<L, T> CodeGenerator for ServiceGenerator<L, T>
where
    L: Fn(&str) -> Option<String>,
    T: Fn(&ServiceCall) -> AppResult<String>,
{
    fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        if request.graph.nodes.is_empty() {
            return Err(AppError::EmptyGraph);
        }
        let call = self.prepare(request)?;
        debug!(provider = %call.provider, model = call.model, "sending generation request");
        let raw = (self.transport)(&call)?;
        Ok(GenerateResponse::from_raw(&raw, request.framework, &request.graph.nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Framework;

    fn call(provider: Provider) -> ServiceCall {
        ServiceCall {
            provider,
            api_key: "k".into(),
            model: provider.default_model(),
            system: "sys".into(),
            prompt: "make a model".into(),
        }
    }

    #[test]
    fn chat_providers_share_message_shape() {
        for provider in [Provider::Openai, Provider::Together, Provider::Openrouter, Provider::Mistral] {
            let body = call(provider).body();
            assert_eq!(body["messages"][0]["role"], "system");
            assert_eq!(body["messages"][1]["content"], "make a model");
            assert_eq!(body["model"], provider.default_model());
        }
        assert_eq!(call(Provider::Openai).body()["max_completion_tokens"], 4096);
        assert_eq!(call(Provider::Together).body()["max_tokens"], 4096);
    }

    #[test]
    fn gemini_uses_its_own_dialect() {
        let gemini = call(Provider::Gemini);
        assert!(gemini.endpoint().ends_with("gemini-flash-latest:generateContent"));
        assert_eq!(gemini.body()["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(gemini.headers(), vec![("x-goog-api-key", "k".to_string())]);

        let reply = json!({"candidates": [{"content": {"parts": [{"text": "a"}, {"text": "b"}]}}]});
        assert_eq!(gemini.reply_text(&reply), "ab");
    }

    #[test]
    fn openrouter_adds_attribution_headers() {
        let headers = call(Provider::Openrouter).headers();
        assert_eq!(headers[0], ("Authorization", "Bearer k".to_string()));
        assert!(headers.iter().any(|(name, _)| *name == "X-Title"));
    }

    #[test]
    fn missing_reply_text_is_empty() {
        assert_eq!(call(Provider::Mistral).reply_text(&json!({"choices": []})), "");
    }

    #[test]
    fn prepare_reads_key_for_request_provider() {
        let generator = ServiceGenerator::new(
            |name: &str| (name == "MISTRAL_API_KEY").then(|| "m-key".to_string()),
            |_: &ServiceCall| -> AppResult<String> { Ok(String::new()) },
        );
        let mut request = GenerateRequest {
            graph: nc_project::parse_json(r#"{"nodes": [{"id": "node_1", "type": "relu"}], "edges": []}"#).unwrap(),
            framework: Framework::Jax,
            provider: Provider::Mistral,
        };
        let prepared = generator.prepare(&request).unwrap();
        assert_eq!(prepared.api_key, "m-key");
        assert!(prepared.prompt.starts_with("Generate a JAX neural network model"));

        request.provider = Provider::Openai;
        assert!(matches!(
            generator.prepare(&request),
            Err(AppError::MissingCredential { variable: "OPENAI_API_KEY", .. })
        ));
    }
}
