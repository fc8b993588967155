// faultline-core/src/runtime/enrichment.rs
// ============================================================================
// Module: Faultline AI Enrichment
// Description: Hypothesis generation with caching, single-flight, and token
//              accounting.
// Purpose: Produce ranked root-cause hypotheses at most once per incident.
// Dependencies: crate::core, crate::interfaces, crate::runtime::cost
// ============================================================================

//! ## Overview
//! Hypothesis generation is guarded twice: persisted hypotheses act as a
//! result cache (returned directly, marked cached), and a short-TTL
//! single-flight key `ai:generating:{incident_id}` rejects concurrent
//! generation with a conflict instead of queueing. The lock is held by a
//! guard released on every exit path and self-expires after its TTL even on
//! crash. Token usage and derived cost are recorded on both the AI request
//! audit row and the `hypothesis_generated` workflow step; mock responses
//! accrue neither cost nor audit rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::core::event::Channel;
use crate::core::event::EventMessage;
use crate::core::identifiers::AiRequestId;
use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::ProjectId;
use crate::core::incident::AiRequest;
use crate::core::incident::AiRequestKind;
use crate::core::incident::CLAIM_LIMIT;
use crate::core::incident::DESCRIPTION_LIMIT;
use crate::core::incident::EVIDENCE_COUNT_LIMIT;
use crate::core::incident::EVIDENCE_ITEM_LIMIT;
use crate::core::incident::Hypothesis;
use crate::core::incident::Incident;
use crate::core::incident::StepKind;
use crate::core::incident::truncate_chars;
use crate::core::time::Timestamp;
use crate::interfaces::EventBus;
use crate::interfaces::IncidentStore;
use crate::interfaces::KvCache;
use crate::interfaces::ModelClient;
use crate::interfaces::ModelError;
use crate::interfaces::ModelRequest;
use crate::interfaces::ModelUsage;
use crate::interfaces::StoreError;
use crate::runtime::cost::TokenPricing;
use crate::runtime::cost::cost_usd;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Single-flight lock TTL; the lock self-expires after this even on crash.
pub const GENERATION_LOCK_TTL: Duration = Duration::from_secs(60);
/// Maximum incidents accepted per batch call.
pub const MAX_BATCH_SIZE: usize = 10;
/// Maximum hypotheses persisted per incident.
pub const MAX_HYPOTHESES: usize = 5;
/// Completion token ceiling for single-incident generation.
const SINGLE_COMPLETION_TOKENS: u32 = 800;
/// Completion token budget added per incident in a batch.
const BATCH_COMPLETION_TOKENS_PER_INCIDENT: u32 = 1_500;
/// System prompt shared by all generation calls.
const SYSTEM_PROMPT: &str =
    "Expert SRE assistant. Generate root cause hypotheses in JSON format.";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Enrichment errors.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Incident missing within the project scope.
    #[error("incident not found: {0}")]
    NotFound(String),
    /// Another generation holds the single-flight lock.
    #[error("hypothesis generation already in progress for incident {0}")]
    InProgress(String),
    /// Batch size outside `1..=MAX_BATCH_SIZE`.
    #[error("invalid batch size: {0}")]
    BatchSize(usize),
    /// Model provider failure.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Model response could not be parsed.
    #[error("model response parse failure: {0}")]
    Parse(String),
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one incident's hypothesis generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Incident the hypotheses belong to.
    pub incident_id: IncidentId,
    /// Persisted hypotheses in rank order.
    pub hypotheses: Vec<Hypothesis>,
    /// True when the result came from the persisted cache.
    pub cached: bool,
    /// True when the mock generator produced the result.
    pub mock: bool,
    /// Token usage for this generation; zero for cached and mock results.
    pub usage: ModelUsage,
}

/// Result of a batch generation call.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Per-incident outcomes, cached and fresh alike.
    pub results: Vec<GenerationOutcome>,
    /// Number of cache hits in the batch.
    pub cached: usize,
    /// Number of incidents processed through the model.
    pub processed: usize,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Hypothesis generation engine.
pub struct HypothesisEngine {
    /// Incident repository.
    incidents: Arc<dyn IncidentStore>,
    /// Single-flight lock store.
    cache: Arc<dyn KvCache>,
    /// Event publisher for the `hypotheses` channel.
    bus: Arc<dyn EventBus>,
    /// Model provider.
    model: Arc<dyn ModelClient>,
    /// Token pricing for cost derivation.
    pricing: TokenPricing,
}

impl HypothesisEngine {
    /// Builds an engine over the provided seams.
    #[must_use]
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        cache: Arc<dyn KvCache>,
        bus: Arc<dyn EventBus>,
        model: Arc<dyn ModelClient>,
        pricing: TokenPricing,
    ) -> Self {
        Self { incidents, cache, bus, model, pricing }
    }

    /// Generates hypotheses for one incident.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::InProgress`] on a single-flight collision;
    /// the caller must not retry within the lock TTL.
    pub async fn generate(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<GenerationOutcome, EnrichmentError> {
        let incident = self
            .incidents
            .get_incident(project_id, incident_id)?
            .ok_or_else(|| EnrichmentError::NotFound(incident_id.to_string()))?;
        if let Some(outcome) = self.cached_outcome(incident_id)? {
            return Ok(outcome);
        }
        let lock_key = generation_lock_key(incident_id);
        if !self.cache.put_if_absent_ttl(&lock_key, "1", GENERATION_LOCK_TTL) {
            return Err(EnrichmentError::InProgress(incident_id.to_string()));
        }
        // Guard releases the lock on every exit path; the TTL covers crashes.
        let _guard = FlightLock { cache: Arc::clone(&self.cache), key: lock_key };
        self.generate_locked(&incident).await
    }

    /// Generates hypotheses for up to [`MAX_BATCH_SIZE`] incidents in one
    /// model call, partitioning cached incidents out first. On any batch
    /// processing failure, falls back to per-incident generation.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::BatchSize`] when the batch is empty or too
    /// large.
    pub async fn generate_batch(
        &self,
        requests: &[(ProjectId, IncidentId)],
    ) -> Result<BatchOutcome, EnrichmentError> {
        if requests.is_empty() || requests.len() > MAX_BATCH_SIZE {
            return Err(EnrichmentError::BatchSize(requests.len()));
        }
        let mut results = Vec::new();
        let mut pending = Vec::new();
        for (project_id, incident_id) in requests {
            let Some(incident) = self.incidents.get_incident(project_id, incident_id)? else {
                continue;
            };
            if let Some(outcome) = self.cached_outcome(incident_id)? {
                results.push(outcome);
            } else {
                pending.push(incident);
            }
        }
        let cached = results.len();
        if pending.is_empty() {
            return Ok(BatchOutcome { results, cached, processed: 0 });
        }
        match self.generate_batch_locked(&pending).await {
            Ok(mut fresh) => {
                let processed = fresh.len();
                results.append(&mut fresh);
                Ok(BatchOutcome { results, cached, processed })
            }
            Err(_) => {
                // Batch path failed; recover incident-by-incident.
                let mut processed = 0;
                for incident in &pending {
                    if let Ok(outcome) =
                        self.generate(&incident.project_id, &incident.id).await
                    {
                        processed += 1;
                        results.push(outcome);
                    }
                }
                Ok(BatchOutcome { results, cached, processed })
            }
        }
    }

    /// Returns the cached outcome when hypotheses already exist.
    fn cached_outcome(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Option<GenerationOutcome>, EnrichmentError> {
        let existing = self.incidents.hypotheses_for_incident(incident_id)?;
        if existing.is_empty() {
            return Ok(None);
        }
        Ok(Some(GenerationOutcome {
            incident_id: incident_id.clone(),
            hypotheses: existing,
            cached: true,
            mock: self.model.is_mock(),
            usage: ModelUsage::default(),
        }))
    }

    /// Runs generation while holding the single-flight lock.
    async fn generate_locked(
        &self,
        incident: &Incident,
    ) -> Result<GenerationOutcome, EnrichmentError> {
        let now = Timestamp::now();
        let mut step = self.incidents.step_by_kind(&incident.id, StepKind::HypothesisGenerated)?;
        if let Some(step) = step.as_mut() {
            step.start(now);
            step.input = Some(json!({
                "title": incident.title,
                "description": incident.description,
                "service_name": incident.service_name,
            }));
            let _ = self.incidents.update_step(step);
        }

        let request = ModelRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(incident),
            max_completion_tokens: SINGLE_COMPLETION_TOKENS,
        };
        let started = Instant::now();
        let response = match self.model.complete(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.fail_step(step, &err.to_string());
                return Err(err.into());
            }
        };
        let duration_ms = elapsed_millis(started);
        let candidates = match parse_candidates(&response.content) {
            Ok(candidates) => candidates,
            Err(message) => {
                self.fail_step(step, &message);
                return Err(EnrichmentError::Parse(message));
            }
        };

        let hypotheses = self.persist_candidates(incident, candidates)?;
        let usage = response.usage;
        let cost = cost_usd(usage.input_tokens, usage.output_tokens, self.pricing);
        if !self.model.is_mock() {
            let audit = AiRequest {
                id: AiRequestId::generate(),
                incident_id: incident.id.clone(),
                kind: AiRequestKind::Hypothesis,
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                cost_usd: cost,
                duration_ms,
                model: response.model.clone(),
                prompt_summary: format!(
                    "Generate hypotheses for: {}",
                    truncate_chars(&incident.title, 100)
                ),
                response_summary: format!("Generated {} hypotheses", hypotheses.len()),
                created_at: Timestamp::now(),
            };
            self.incidents.insert_ai_request(&audit)?;
        }

        if let Some(step) = step.as_mut() {
            if !self.model.is_mock() {
                step.input_tokens = Some(usage.input_tokens);
                step.output_tokens = Some(usage.output_tokens);
                step.cost_usd = Some(cost);
            }
            step.complete(
                Timestamp::now(),
                Some(json!({
                    "hypotheses_count": hypotheses.len(),
                    "using_mock": self.model.is_mock(),
                })),
            );
            let _ = self.incidents.update_step(step);
        }

        Ok(GenerationOutcome {
            incident_id: incident.id.clone(),
            hypotheses,
            cached: false,
            mock: self.model.is_mock(),
            usage,
        })
    }

    /// Runs one batch model call and persists per-incident results.
    async fn generate_batch_locked(
        &self,
        incidents: &[Incident],
    ) -> Result<Vec<GenerationOutcome>, EnrichmentError> {
        let tokens = BATCH_COMPLETION_TOKENS_PER_INCIDENT
            .saturating_mul(u32::try_from(incidents.len()).unwrap_or(1));
        let request = ModelRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_batch_prompt(incidents),
            max_completion_tokens: tokens,
        };
        let started = Instant::now();
        let response = self.model.complete(&request).await?;
        let duration_ms = elapsed_millis(started);
        let parsed = parse_batch(&response.content).map_err(EnrichmentError::Parse)?;

        let usage = response.usage;
        let per_incident = split_usage(usage, incidents.len());
        let mut outcomes = Vec::with_capacity(incidents.len());
        for incident in incidents {
            let candidates = parsed
                .iter()
                .find(|entry| entry.incident_id == incident.id.as_str())
                .map(|entry| entry.hypotheses.clone())
                .ok_or_else(|| {
                    EnrichmentError::Parse(format!(
                        "batch response missing incident {}",
                        incident.id
                    ))
                })?;
            let hypotheses = self.persist_candidates(incident, candidates)?;
            let cost =
                cost_usd(per_incident.input_tokens, per_incident.output_tokens, self.pricing);
            if !self.model.is_mock() {
                let audit = AiRequest {
                    id: AiRequestId::generate(),
                    incident_id: incident.id.clone(),
                    kind: AiRequestKind::HypothesisBatch,
                    input_tokens: per_incident.input_tokens,
                    output_tokens: per_incident.output_tokens,
                    cost_usd: cost,
                    duration_ms,
                    model: response.model.clone(),
                    prompt_summary: format!(
                        "Batch hypotheses for: {}",
                        truncate_chars(&incident.title, 100)
                    ),
                    response_summary: format!("Generated {} hypotheses", hypotheses.len()),
                    created_at: Timestamp::now(),
                };
                self.incidents.insert_ai_request(&audit)?;
            }
            if let Some(mut step) =
                self.incidents.step_by_kind(&incident.id, StepKind::HypothesisGenerated)?
            {
                if !self.model.is_mock() {
                    step.input_tokens = Some(per_incident.input_tokens);
                    step.output_tokens = Some(per_incident.output_tokens);
                    step.cost_usd = Some(cost);
                }
                step.complete(
                    Timestamp::now(),
                    Some(json!({ "hypotheses_count": hypotheses.len(), "batched": true })),
                );
                let _ = self.incidents.update_step(&step);
            }
            outcomes.push(GenerationOutcome {
                incident_id: incident.id.clone(),
                hypotheses,
                cached: false,
                mock: self.model.is_mock(),
                usage: per_incident,
            });
        }
        Ok(outcomes)
    }

    /// Persists sanitized candidates as ranked hypotheses and publishes one
    /// `hypothesis.generated` event per row.
    fn persist_candidates(
        &self,
        incident: &Incident,
        candidates: Vec<HypothesisCandidate>,
    ) -> Result<Vec<Hypothesis>, EnrichmentError> {
        let now = Timestamp::now();
        let mut hypotheses = Vec::with_capacity(candidates.len().min(MAX_HYPOTHESES));
        for (index, candidate) in candidates.into_iter().take(MAX_HYPOTHESES).enumerate() {
            let rank = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
            let hypothesis = Hypothesis {
                id: HypothesisId::generate(),
                incident_id: incident.id.clone(),
                claim: truncate_chars(&candidate.claim, CLAIM_LIMIT),
                description: truncate_chars(&candidate.description, DESCRIPTION_LIMIT),
                confidence_score: candidate.confidence_score.clamp(0.0, 1.0),
                supporting_evidence: candidate
                    .supporting_evidence
                    .iter()
                    .take(EVIDENCE_COUNT_LIMIT)
                    .map(|item| truncate_chars(item, EVIDENCE_ITEM_LIMIT))
                    .collect(),
                rank,
                created_at: now,
            };
            self.incidents.insert_hypothesis(&hypothesis)?;
            self.publish_hypothesis(incident, &hypothesis);
            hypotheses.push(hypothesis);
        }
        Ok(hypotheses)
    }

    /// Publishes a `hypothesis.generated` event; failures are swallowed.
    fn publish_hypothesis(&self, incident: &Incident, hypothesis: &Hypothesis) {
        let data = json!({
            "id": hypothesis.id.as_str(),
            "incident_id": hypothesis.incident_id.as_str(),
            "claim": hypothesis.claim,
            "description": hypothesis.description,
            "confidence_score": hypothesis.confidence_score,
            "rank": hypothesis.rank,
            "supporting_evidence": hypothesis.supporting_evidence,
        });
        let message =
            EventMessage::new("hypothesis.generated", data, incident.tenant_id.clone());
        let _ = self.bus.publish(Channel::Hypotheses, &message);
    }

    /// Marks the workflow step failed; best-effort.
    fn fail_step(
        &self,
        step: Option<crate::core::incident::AnalysisStep>,
        message: &str,
    ) {
        if let Some(mut step) = step {
            step.fail(Timestamp::now(), message);
            let _ = self.incidents.update_step(&step);
        }
    }
}

// ============================================================================
// SECTION: Single-Flight Guard
// ============================================================================

/// Releases the single-flight lock when dropped.
struct FlightLock {
    /// Lock store.
    cache: Arc<dyn KvCache>,
    /// Lock key.
    key: String,
}

impl Drop for FlightLock {
    fn drop(&mut self) {
        self.cache.remove(&self.key);
    }
}

/// Returns the single-flight lock key for an incident.
#[must_use]
pub fn generation_lock_key(incident_id: &IncidentId) -> String {
    format!("ai:generating:{incident_id}")
}

// ============================================================================
// SECTION: Prompts
// ============================================================================

/// Builds the single-incident prompt.
fn build_prompt(incident: &Incident) -> String {
    format!(
        "Analyze this production incident and return 3-5 root cause hypotheses as JSON.\n\n\
         Incident: {}\nDetails: {}\nService: {}\n\n\
         Format: {{\"hypotheses\":[{{\"claim\":\"one sentence hypothesis\",\
         \"description\":\"brief explanation\",\"confidence_score\":0.85,\
         \"supporting_evidence\":[\"evidence1\",\"evidence2\"]}}]}}\n\n\
         Focus on common SRE issues: resource exhaustion, config errors, dependency \
         failures, deployment issues, external API problems.",
        incident.title, incident.description, incident.service_name
    )
}

/// Builds the batch prompt enumerating every incident explicitly.
fn build_batch_prompt(incidents: &[Incident]) -> String {
    let mut prompt = String::from(
        "Analyze these production incidents and return root cause hypotheses for each as \
         JSON.\n\n",
    );
    for incident in incidents {
        prompt.push_str(&format!(
            "Incident {}:\nTitle: {}\nDetails: {}\nService: {}\n\n",
            incident.id, incident.title, incident.description, incident.service_name
        ));
    }
    prompt.push_str(
        "Format: {\"incidents\":[{\"incident_id\":\"...\",\"hypotheses\":[{\"claim\":\"...\",\
         \"description\":\"...\",\"confidence_score\":0.85,\
         \"supporting_evidence\":[\"...\"]}]}]}\n\
         Return an entry for every incident id listed above.",
    );
    prompt
}

// ============================================================================
// SECTION: Response Parsing
// ============================================================================

/// Hypothesis candidate as returned by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct HypothesisCandidate {
    /// One-sentence claim.
    #[serde(default = "default_claim")]
    pub claim: String,
    /// Longer explanation.
    #[serde(default)]
    pub description: String,
    /// Model confidence; clamped to `[0, 1]` before persistence.
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
    /// Supporting evidence snippets.
    #[serde(default)]
    pub supporting_evidence: Vec<String>,
}

/// Default claim for malformed entries.
fn default_claim() -> String {
    "Unknown hypothesis".to_string()
}

/// Default confidence for malformed entries.
const fn default_confidence() -> f64 {
    0.5
}

/// Single-incident response body.
#[derive(Debug, Deserialize)]
struct CandidatesBody {
    /// Returned candidates in model rank order.
    #[serde(default)]
    hypotheses: Vec<HypothesisCandidate>,
}

/// Batch response entry.
#[derive(Debug, Deserialize)]
struct BatchEntry {
    /// Incident the hypotheses belong to.
    incident_id: String,
    /// Returned candidates in model rank order.
    #[serde(default)]
    hypotheses: Vec<HypothesisCandidate>,
}

/// Batch response body.
#[derive(Debug, Deserialize)]
struct BatchBody {
    /// Per-incident entries.
    #[serde(default)]
    incidents: Vec<BatchEntry>,
}

/// Parses a single-incident response, tolerating fenced code blocks.
///
/// # Errors
///
/// Returns a description of the parse failure.
pub fn parse_candidates(content: &str) -> Result<Vec<HypothesisCandidate>, String> {
    let cleaned = strip_code_fences(content);
    let body: CandidatesBody =
        serde_json::from_str(&cleaned).map_err(|err| err.to_string())?;
    if body.hypotheses.is_empty() {
        return Err("response contained no hypotheses".to_string());
    }
    Ok(body.hypotheses)
}

/// Parses a batch response, tolerating fenced code blocks.
fn parse_batch(content: &str) -> Result<Vec<BatchEntry>, String> {
    let cleaned = strip_code_fences(content);
    let body: BatchBody = serde_json::from_str(&cleaned).map_err(|err| err.to_string())?;
    if body.incidents.is_empty() {
        return Err("batch response contained no incidents".to_string());
    }
    Ok(body.incidents)
}

/// Removes a wrapping Markdown code fence when present.
fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|line| line.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim() == "```") {
        lines.pop();
    }
    lines.join("\n")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits batch usage evenly across processed incidents.
fn split_usage(usage: ModelUsage, count: usize) -> ModelUsage {
    let divisor = u64::try_from(count.max(1)).unwrap_or(1);
    ModelUsage {
        input_tokens: usage.input_tokens / divisor,
        output_tokens: usage.output_tokens / divisor,
    }
}

/// Returns elapsed wall-clock milliseconds since `started`.
fn elapsed_millis(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
