//! Natural-language explanation of a forecast.
//!
//! The explanation comes from a remote chat-completion service. Failures of
//! that service are never fatal: the caller logs them and shows the forecast
//! without text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ErrorContext, ExternalServiceError};
use crate::models::ForecastResult;

/// Values a narrative is written about.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub region: String,
    pub pollutant_label: String,
    pub first_year: i32,
    pub first_value: f64,
    pub last_year: i32,
    pub last_value: f64,
}

impl NarrativeRequest {
    /// First and last forecast points of `result`; `None` when `future` is empty.
    pub fn from_result(result: &ForecastResult) -> Option<Self> {
        let first = result.first_future()?;
        let last = result.last_future()?;
        Some(Self {
            region: result.region().to_string(),
            pollutant_label: result.pollutant().label.clone(),
            first_year: first.year(),
            first_value: first.point_estimate,
            last_year: last.year(),
            last_value: last.point_estimate,
        })
    }

    fn entity(&self) -> String {
        format!("{}/{}", self.region, self.pollutant_label)
    }
}

/// A source of forecast explanations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so the shell can share one instance.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn explain(&self, request: &NarrativeRequest) -> Result<String, ExternalServiceError>;
}

/// Italian prompt describing the forecast direction and magnitude.
pub fn build_prompt(request: &NarrativeRequest) -> String {
    let region = request.region.replace("Region", "");
    let region = region.trim();
    let direction = if request.last_value < request.first_value {
        "diminuito"
    } else {
        "aumentato"
    };
    let percent = if request.first_value == 0.0 {
        0.0
    } else {
        ((request.last_value - request.first_value) / request.first_value).abs() * 100.0
    };
    let plausibility = if request.last_value < 5.0 {
        "Tuttavia, questo valore molto basso nel futuro potrebbe essere ottimistico: \
         raggiungerlo richiederebbe politiche molto rigorose e durature."
    } else {
        ""
    };

    format!(
        "Nella regione {region}, l'inquinante {pollutant} è {direction} dal {first_year} \
         ({first_value:.2} μg/m³) al {last_year} ({last_value:.2} μg/m³), con un cambiamento \
         del {percent:.1}%. {plausibility} Scrivi un testo su questo andamento in italiano, \
         parlando dell'impatto sulla salute, sull'ambiente e su cosa potrebbe causare questa \
         evoluzione. Basandoti solo sui dati forniti dal dataset e da ciò che vedi sul grafico.",
        pollutant = request.pollutant_label,
        first_year = request.first_year,
        first_value = request.first_value,
        last_year = request.last_year,
        last_value = request.last_value,
    )
}

/// Run `service` with a deadline, retrying once on a retryable failure.
pub async fn with_retry(
    service: &dyn NarrativeService,
    request: &NarrativeRequest,
    timeout: Duration,
) -> Result<String, ExternalServiceError> {
    match attempt(service, request, timeout).await {
        Err(e) if e.is_retryable() => {
            warn!(error = %e, "narrative request failed, retrying once");
            attempt(service, request, timeout).await
        }
        other => other,
    }
}

async fn attempt(
    service: &dyn NarrativeService,
    request: &NarrativeRequest,
    timeout: Duration,
) -> Result<String, ExternalServiceError> {
    match tokio::time::timeout(timeout, service.explain(request)).await {
        Ok(result) => result,
        Err(_) => Err(ExternalServiceError::timeout(
            format!("no answer within {:?}", timeout),
            ErrorContext::new("narrate").with_entity(request.entity()),
        )),
    }
}

/// Narrator used when the service is switched off or has no credentials.
#[derive(Debug, Clone, Default)]
pub struct DisabledNarrator {
    reason: String,
}

impl DisabledNarrator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl NarrativeService for DisabledNarrator {
    async fn explain(&self, request: &NarrativeRequest) -> Result<String, ExternalServiceError> {
        Err(ExternalServiceError::unavailable(
            self.reason.clone(),
            ErrorContext::new("narrate").with_entity(request.entity()),
        ))
    }
}

#[cfg(feature = "narrative-http")]
pub use http::ChatCompletionNarrator;

#[cfg(feature = "narrative-http")]
mod http {
    use super::*;
    use crate::config::NarrativeSettings;
    use serde::{Deserialize, Serialize};
    use tracing::debug;

    #[derive(Debug, Serialize)]
    struct ChatMessage<'a> {
        role: &'a str,
        content: &'a str,
    }

    #[derive(Debug, Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        messages: Vec<ChatMessage<'a>>,
        temperature: f64,
    }

    #[derive(Debug, Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatChoice>,
    }

    #[derive(Debug, Deserialize)]
    struct ChatChoice {
        message: ChatReply,
    }

    #[derive(Debug, Deserialize)]
    struct ChatReply {
        content: String,
    }

    /// Client for an OpenAI-compatible chat-completion endpoint.
    #[derive(Debug, Clone)]
    pub struct ChatCompletionNarrator {
        client: reqwest::Client,
        endpoint: String,
        model: String,
        temperature: f64,
        api_key: String,
    }

    impl ChatCompletionNarrator {
        pub fn new(settings: &NarrativeSettings, api_key: String) -> Result<Self, ExternalServiceError> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .map_err(|e| {
                    ExternalServiceError::connection(
                        format!("Failed to build HTTP client: {}", e),
                        ErrorContext::new("narrator_init"),
                    )
                })?;

            Ok(Self {
                client,
                endpoint: settings.endpoint.clone(),
                model: settings.model.clone(),
                temperature: settings.temperature,
                api_key,
            })
        }
    }

    #[async_trait]
    impl NarrativeService for ChatCompletionNarrator {
        async fn explain(&self, request: &NarrativeRequest) -> Result<String, ExternalServiceError> {
            let context = || ErrorContext::new("narrate").with_entity(request.entity());
            let prompt = build_prompt(request);
            let body = ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: &prompt,
                }],
                temperature: self.temperature,
            };

            debug!(endpoint = %self.endpoint, model = %self.model, "requesting narrative");
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ExternalServiceError::timeout(e.to_string(), context())
                    } else {
                        ExternalServiceError::connection(e.to_string(), context())
                    }
                })?;

            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<empty response>".to_string());

            if !status.is_success() {
                let ctx = context().with_details(format!("status={}", status.as_u16()));
                let ctx = if status.is_server_error() || status.as_u16() == 429 {
                    ctx.retryable()
                } else {
                    ctx
                };
                return Err(ExternalServiceError::response(
                    format!("narrative request failed ({}): {}", status, text.trim()),
                    ctx,
                ));
            }

            let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
                ExternalServiceError::response(
                    format!("Failed to parse narrative response: {}", e),
                    context(),
                )
            })?;

            parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content.trim().to_string())
                .filter(|content| !content.is_empty())
                .ok_or_else(|| {
                    ExternalServiceError::response("narrative response had no content", context())
                })
        }
    }
}
