//! Structured extraction.
//!
//! Two [`ExtractionStrategy`] implementations sit behind one interface:
//!
//! - [`LlmStrategy`] - schema-constrained prompt to a [`LanguageModel`],
//!   with code-fence stripping and truncation recovery on the reply.
//! - [`PatternStrategy`] - deterministic regex and keyword rules over the
//!   evidence text. Never fails; trades completeness for availability.
//!
//! [`StructuredExtractor`] prefers the model and falls back to patterns
//! when the model is missing, unreachable, or answers with unparseable
//! text.

pub mod patterns;
pub mod prompts;
pub mod repair;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, ExtractionResult};
use crate::traits::llm::{CompletionRequest, LanguageModel};
use crate::types::config::ExtractionConfig;
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::records::Record;

pub use prompts::format_extraction_prompt;
pub use repair::{parse_json_response, strip_code_fences, ParsedJson};

/// How a record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Model reply parsed as-is.
    Llm,
    /// Model reply parsed after truncation recovery.
    Recovered,
    /// Deterministic pattern rules.
    PatternFallback,
}

/// Inputs to one extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub entity: &'a EntityContext,
    pub evidence: &'a EvidenceContext,
    /// Retry attempt: push for inferred values.
    pub strengthened: bool,
}

/// A record and the method that produced it.
#[derive(Debug, Clone)]
pub struct Extracted<R> {
    pub record: R,
    pub method: ExtractionMethod,
}

/// One way of turning evidence into a record.
#[async_trait]
pub trait ExtractionStrategy<R: Record>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, request: &ExtractionRequest<'_>) -> ExtractionResult<Extracted<R>>;
}

/// Parse a model reply into `R`.
pub fn parse_record<R: Record>(text: &str) -> ExtractionResult<Extracted<R>> {
    let parsed =
        parse_json_response(text).map_err(|reason| ExtractionError::MalformedResponse { reason })?;
    let method = if parsed.was_recovered() {
        ExtractionMethod::Recovered
    } else {
        ExtractionMethod::Llm
    };

    let value = parsed.into_value();
    if !value.is_object() {
        return Err(ExtractionError::MalformedResponse {
            reason: "expected a JSON object".to_string(),
        });
    }
    let record = serde_json::from_value(value).map_err(|e| ExtractionError::MalformedResponse {
        reason: e.to_string(),
    })?;

    Ok(Extracted { record, method })
}

/// Model-backed extraction.
#[derive(Clone)]
pub struct LlmStrategy {
    model: Arc<dyn LanguageModel>,
    config: ExtractionConfig,
}

impl LlmStrategy {
    pub fn new(model: Arc<dyn LanguageModel>, config: ExtractionConfig) -> Self {
        Self { model, config }
    }

    fn request(&self, prompt: String, strengthened: bool) -> CompletionRequest {
        let (tokens, temperature) = if strengthened {
            (self.config.retry_max_output_tokens, self.config.retry_temperature)
        } else {
            (self.config.max_output_tokens, self.config.temperature)
        };
        CompletionRequest::new(prompt)
            .with_max_output_tokens(tokens)
            .with_temperature(temperature)
    }
}

#[async_trait]
impl<R: Record> ExtractionStrategy<R> for LlmStrategy {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn extract(&self, request: &ExtractionRequest<'_>) -> ExtractionResult<Extracted<R>> {
        let prompt =
            format_extraction_prompt::<R>(request.entity, request.evidence, request.strengthened);
        let completion = self.request(prompt, request.strengthened);

        let text = self.model.complete(&completion).await?;
        tracing::debug!(
            model = self.model.name(),
            response_chars = text.len(),
            "Extraction response received"
        );

        parse_record(&text)
    }
}

/// Deterministic extraction from evidence text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternStrategy;

#[async_trait]
impl<R: Record> ExtractionStrategy<R> for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn extract(&self, request: &ExtractionRequest<'_>) -> ExtractionResult<Extracted<R>> {
        Ok(Extracted {
            record: R::from_evidence(request.entity, request.evidence),
            method: ExtractionMethod::PatternFallback,
        })
    }
}

/// Runs the primary strategy and falls back on failure.
pub struct StructuredExtractor<R: Record> {
    primary: Option<Box<dyn ExtractionStrategy<R>>>,
    fallback: Box<dyn ExtractionStrategy<R>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> StructuredExtractor<R> {
    /// Model-first extractor; with no model every call uses patterns.
    pub fn new(model: Option<Arc<dyn LanguageModel>>, config: ExtractionConfig) -> Self {
        let primary = model.map(|m| {
            Box::new(LlmStrategy::new(m, config.clone())) as Box<dyn ExtractionStrategy<R>>
        });
        Self::with_strategies(primary, Box::new(PatternStrategy))
    }

    pub fn with_strategies(
        primary: Option<Box<dyn ExtractionStrategy<R>>>,
        fallback: Box<dyn ExtractionStrategy<R>>,
    ) -> Self {
        Self {
            primary,
            fallback,
            _record: PhantomData,
        }
    }

    /// Always yields a record; failures only change the method.
    pub async fn extract(&self, request: &ExtractionRequest<'_>) -> Extracted<R> {
        if let Some(primary) = &self.primary {
            match primary.extract(request).await {
                Ok(extracted) => return extracted,
                Err(e) => {
                    tracing::warn!(
                        strategy = primary.name(),
                        fallback = self.fallback.name(),
                        error = %e,
                        "Extraction failed, using fallback strategy"
                    );
                }
            }
        }

        match self.fallback.extract(request).await {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!(error = %e, "Fallback extraction failed, returning empty record");
                Extracted {
                    record: R::default(),
                    method: ExtractionMethod::PatternFallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLanguageModel;
    use crate::types::evidence::EvidenceBlock;
    use crate::types::records::{CompanyProfile, ExecutiveRoster};

    fn evidence(body: &str) -> EvidenceContext {
        EvidenceContext::new(vec![EvidenceBlock {
            label: "Source 1".into(),
            title: "Acme Corp 10-K".into(),
            url: Some("https://www.sec.gov/cgi-bin/browse-edgar/data/12345/".into()),
            body: body.into(),
            fetched: false,
        }])
    }

    #[tokio::test]
    async fn test_llm_response_is_parsed() {
        let model = MockLanguageModel::new().with_response(
            r#"```json
{"registered_legal_name": "Acme Corp", "identifiers": {"cik": "0000012345"}}
```"#,
        );
        let extractor = StructuredExtractor::<CompanyProfile>::new(
            Some(Arc::new(model)),
            ExtractionConfig::default(),
        );
        let entity = EntityContext::new("Acme Corp");
        let evidence = evidence("text");

        let out = extractor
            .extract(&ExtractionRequest {
                entity: &entity,
                evidence: &evidence,
                strengthened: false,
            })
            .await;

        assert_eq!(out.method, ExtractionMethod::Llm);
        assert_eq!(out.record.registered_legal_name.value(), Some("Acme Corp"));
        assert_eq!(out.record.identifiers.cik.value(), Some("0000012345"));
        assert!(!out.record.annual_revenue.is_filled());
    }

    #[tokio::test]
    async fn test_truncated_response_is_recovered() {
        let model = MockLanguageModel::new().with_response(
            r#"{"company_name": "Acme", "executives": [{"name": "Jane Roe", "title": "CEO"}, {"name": "Jo"#,
        );
        let extractor = StructuredExtractor::<ExecutiveRoster>::new(
            Some(Arc::new(model)),
            ExtractionConfig::default(),
        );
        let entity = EntityContext::new("Acme");
        let evidence = evidence("text");

        let out = extractor
            .extract(&ExtractionRequest {
                entity: &entity,
                evidence: &evidence,
                strengthened: false,
            })
            .await;

        assert_eq!(out.method, ExtractionMethod::Recovered);
        assert_eq!(out.record.executives.len(), 1);
    }

    #[tokio::test]
    async fn test_garbage_response_falls_back_to_patterns() {
        let model = MockLanguageModel::new().with_response("I cannot help with that.");
        let extractor = StructuredExtractor::<CompanyProfile>::new(
            Some(Arc::new(model)),
            ExtractionConfig::default(),
        );
        let entity = EntityContext::new("Acme Corp");
        let evidence = evidence("Acme Corp had approximately 12,500 employees.");

        let out = extractor
            .extract(&ExtractionRequest {
                entity: &entity,
                evidence: &evidence,
                strengthened: false,
            })
            .await;

        assert_eq!(out.method, ExtractionMethod::PatternFallback);
        assert_eq!(out.record.identifiers.cik.value(), Some("0000012345"));
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back() {
        let model = MockLanguageModel::new().unavailable();
        let extractor = StructuredExtractor::<ExecutiveRoster>::new(
            Some(Arc::new(model)),
            ExtractionConfig::default(),
        );
        let entity = EntityContext::new("Acme");
        let evidence = evidence("");

        let out = extractor
            .extract(&ExtractionRequest {
                entity: &entity,
                evidence: &evidence,
                strengthened: false,
            })
            .await;

        assert_eq!(out.method, ExtractionMethod::PatternFallback);
    }

    #[tokio::test]
    async fn test_retry_uses_retry_sampling() {
        let model = Arc::new(MockLanguageModel::new().with_response("{}"));
        let extractor = StructuredExtractor::<CompanyProfile>::new(
            Some(model.clone()),
            ExtractionConfig::default(),
        );
        let entity = EntityContext::new("Acme");
        let evidence = evidence("");

        extractor
            .extract(&ExtractionRequest {
                entity: &entity,
                evidence: &evidence,
                strengthened: true,
            })
            .await;

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_output_tokens, 6000);
        assert_eq!(requests[0].temperature, 0.5);
        assert!(requests[0].prompt.contains("previous attempt"));
    }

    #[test]
    fn test_parse_record_rejects_arrays() {
        let err = parse_record::<CompanyProfile>("[1, 2]").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse { .. }));
    }
}
