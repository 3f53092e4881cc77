//! Blocking HTTP transport for provider-backed generation.

use std::time::Duration;

use nc_app::{AppError, AppResult, ServiceCall};
use serde_json::Value;
use tracing::info;

const TIMEOUT: Duration = Duration::from_secs(120);

fn generation_error(message: impl Into<String>) -> AppError {
    AppError::Generation {
        message: message.into(),
    }
}

/// Send `call` and return the generated text.
pub fn send(call: &ServiceCall) -> AppResult<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(|e| generation_error(e.to_string()))?;

    let mut request = client.post(call.endpoint()).json(&call.body());
    for (name, value) in call.headers() {
        request = request.header(name, value);
    }

    info!(provider = %call.provider, model = call.model, "requesting code generation");
    let resp = request.send().map_err(|e| generation_error(e.to_string()))?;

    if !resp.status().is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(generation_error(format!(
            "{} API error: {}",
            call.provider.display_name(),
            body
        )));
    }

    let reply: Value = resp.json().map_err(|e| generation_error(e.to_string()))?;
    Ok(call.reply_text(&reply))
}
