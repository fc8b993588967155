// faultline-core/tests/enrichment.rs
// ============================================================================
// Module: AI Enrichment Tests
// Description: Cache, single-flight, parsing, and accounting tests.
// Purpose: Ensure generation happens at most once per incident with correct
//          bookkeeping.
// Dependencies: faultline-core
// ============================================================================
//! Validates the hypothesis engine: result cache, single-flight lock,
//! fenced-response parsing, rank contiguity, token accounting, and batch
//! partitioning.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::MemIncidentStore;
use common::RecordingBus;
use common::ScriptedModel;
use common::TestCache;
use faultline_core::Channel;
use faultline_core::EnrichmentError;
use faultline_core::HypothesisEngine;
use faultline_core::IncidentStore;
use faultline_core::KvCache;
use faultline_core::StepKind;
use faultline_core::StepStatus;
use faultline_core::Timestamp;
use faultline_core::TokenPricing;
use faultline_core::runtime::enrichment::generation_lock_key;
use faultline_core::runtime::enrichment::parse_candidates;
use faultline_core::runtime::GENERATION_LOCK_TTL;
use faultline_core::seed_workflow;

/// Pricing used across the tests.
const PRICING: TokenPricing = TokenPricing { input_per_million: 0.150, output_per_million: 0.600 };

/// A two-hypothesis model response body.
const RESPONSE: &str = r#"{"hypotheses":[
    {"claim":"Connection pool exhausted","description":"Pool saturation under load",
     "confidence_score":0.9,"supporting_evidence":["pool wait time rising"]},
    {"claim":"Recent deploy regressed queries","description":"Slow query introduced",
     "confidence_score":0.7,"supporting_evidence":["deploy 10m before onset"]}
]}"#;

/// Builds an engine around a scripted model, seeding one incident.
fn engine_with(
    model: ScriptedModel,
) -> (HypothesisEngine, Arc<MemIncidentStore>, Arc<TestCache>, Arc<RecordingBus>, faultline_core::Incident)
{
    let incidents = Arc::new(MemIncidentStore::default());
    let cache = Arc::new(TestCache::default());
    let bus = Arc::new(RecordingBus::default());
    let incident = common::incident("project-1");
    incidents.insert_incident(&incident).unwrap();
    incidents.insert_steps(&seed_workflow(&incident, Timestamp::now())).unwrap();
    let engine = HypothesisEngine::new(
        Arc::clone(&incidents) as Arc<dyn IncidentStore>,
        Arc::clone(&cache) as Arc<dyn KvCache>,
        Arc::clone(&bus) as Arc<dyn faultline_core::EventBus>,
        Arc::new(model),
        PRICING,
    );
    (engine, incidents, cache, bus, incident)
}

/// Fresh generation persists ranked hypotheses, records usage, publishes one
/// event per row, and completes the workflow step with the same attribution.
#[tokio::test]
async fn generation_persists_ranked_hypotheses_with_accounting() {
    let (engine, incidents, _cache, bus, incident) =
        engine_with(ScriptedModel::new(RESPONSE, 1_000, 500));

    let outcome = engine.generate(&incident.project_id, &incident.id).await.unwrap();
    assert!(!outcome.cached);
    assert_eq!(outcome.hypotheses.len(), 2);
    let ranks: Vec<u32> = outcome.hypotheses.iter().map(|h| h.rank).collect();
    assert_eq!(ranks, vec![1, 2]);
    assert!(outcome.hypotheses.iter().all(|h| (0.0..=1.0).contains(&h.confidence_score)));

    let requests = incidents.ai_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].input_tokens, 1_000);
    assert_eq!(requests[0].output_tokens, 500);
    assert!((requests[0].cost_usd - 0.000_45).abs() < 1e-12);
    drop(requests);

    let step =
        incidents.step_by_kind(&incident.id, StepKind::HypothesisGenerated).unwrap().unwrap();
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.input_tokens, Some(1_000));
    assert_eq!(step.output_tokens, Some(500));
    assert!((step.cost_usd.unwrap() - 0.000_45).abs() < 1e-12);

    assert_eq!(
        bus.types_on(Channel::Hypotheses),
        vec!["hypothesis.generated", "hypothesis.generated"]
    );
}

/// A second call returns the persisted rows marked cached without touching
/// the model.
#[tokio::test]
async fn persisted_hypotheses_act_as_cache() {
    let (engine, _incidents, _cache, _bus, incident) =
        engine_with(ScriptedModel::new(RESPONSE, 1_000, 500));

    let first = engine.generate(&incident.project_id, &incident.id).await.unwrap();
    assert!(!first.cached);
    let second = engine.generate(&incident.project_id, &incident.id).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.hypotheses.len(), first.hypotheses.len());
}

/// A held single-flight lock yields a conflict; the caller must not retry
/// within the TTL.
#[tokio::test]
async fn single_flight_collision_conflicts() {
    let (engine, _incidents, cache, _bus, incident) =
        engine_with(ScriptedModel::new(RESPONSE, 1_000, 500));

    let key = generation_lock_key(&incident.id);
    assert!(cache.put_if_absent_ttl(&key, "1", GENERATION_LOCK_TTL));

    let result = engine.generate(&incident.project_id, &incident.id).await;
    assert!(matches!(result, Err(EnrichmentError::InProgress(_))));
}

/// The lock is released after success and after failure.
#[tokio::test]
async fn lock_released_on_every_path() {
    let (engine, _incidents, cache, _bus, incident) =
        engine_with(ScriptedModel::new(RESPONSE, 1_000, 500));
    engine.generate(&incident.project_id, &incident.id).await.unwrap();
    assert!(cache.get(&generation_lock_key(&incident.id)).is_none());

    let (engine, incidents, cache, _bus, incident) =
        engine_with(ScriptedModel::new("not json", 10, 10));
    let result = engine.generate(&incident.project_id, &incident.id).await;
    assert!(matches!(result, Err(EnrichmentError::Parse(_))));
    assert!(cache.get(&generation_lock_key(&incident.id)).is_none());

    // The workflow step records the failure.
    let step =
        incidents.step_by_kind(&incident.id, StepKind::HypothesisGenerated).unwrap().unwrap();
    assert_eq!(step.status, StepStatus::Failed);
    assert!(step.error_message.is_some());
}

/// Mock responses persist hypotheses but accrue no cost and no audit row.
#[tokio::test]
async fn mock_generation_accrues_no_cost() {
    let mut model = ScriptedModel::new(RESPONSE, 0, 0);
    model.mock = true;
    let (engine, incidents, _cache, _bus, incident) = engine_with(model);

    let outcome = engine.generate(&incident.project_id, &incident.id).await.unwrap();
    assert!(outcome.mock);
    assert_eq!(outcome.usage.input_tokens, 0);
    assert!(incidents.ai_requests.lock().unwrap().is_empty());

    let step =
        incidents.step_by_kind(&incident.id, StepKind::HypothesisGenerated).unwrap().unwrap();
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.cost_usd, None);
}

/// Fenced responses parse identically to bare JSON.
#[test]
fn fenced_responses_parse() {
    let fenced = format!("```json\n{RESPONSE}\n```");
    let bare = parse_candidates(RESPONSE).unwrap();
    let from_fence = parse_candidates(&fenced).unwrap();
    assert_eq!(bare.len(), from_fence.len());
    assert_eq!(bare[0].claim, from_fence[0].claim);
}

/// Out-of-range confidence values are clamped on persistence.
#[tokio::test]
async fn confidence_is_clamped() {
    let wild = r#"{"hypotheses":[
        {"claim":"A","description":"","confidence_score":1.7,"supporting_evidence":[]},
        {"claim":"B","description":"","confidence_score":-0.2,"supporting_evidence":[]}
    ]}"#;
    let (engine, _incidents, _cache, _bus, incident) =
        engine_with(ScriptedModel::new(wild, 10, 10));
    let outcome = engine.generate(&incident.project_id, &incident.id).await.unwrap();
    assert!((outcome.hypotheses[0].confidence_score - 1.0).abs() < f64::EPSILON);
    assert!(outcome.hypotheses[1].confidence_score.abs() < f64::EPSILON);
}

/// Batch generation partitions cached incidents out and processes the rest.
#[tokio::test]
async fn batch_partitions_cached_and_uncached() {
    let incidents = Arc::new(MemIncidentStore::default());
    let cache = Arc::new(TestCache::default());
    let bus = Arc::new(RecordingBus::default());

    let cached_incident = common::incident("project-1");
    let fresh_incident = common::incident("project-1");
    incidents.insert_incident(&cached_incident).unwrap();
    incidents.insert_incident(&fresh_incident).unwrap();
    incidents.insert_steps(&seed_workflow(&fresh_incident, Timestamp::now())).unwrap();

    // Pre-populate hypotheses for the cached incident.
    incidents
        .insert_hypothesis(&faultline_core::Hypothesis {
            id: faultline_core::HypothesisId::generate(),
            incident_id: cached_incident.id.clone(),
            claim: "Known cause".to_string(),
            description: String::new(),
            confidence_score: 0.8,
            supporting_evidence: Vec::new(),
            rank: 1,
            created_at: Timestamp::now(),
        })
        .unwrap();

    let batch_response = format!(
        r#"{{"incidents":[{{"incident_id":"{}","hypotheses":[
            {{"claim":"Fresh cause","description":"","confidence_score":0.6,
              "supporting_evidence":[]}}]}}]}}"#,
        fresh_incident.id
    );
    let model = ScriptedModel::new(batch_response, 2_000, 1_000);
    let engine = HypothesisEngine::new(
        Arc::clone(&incidents) as Arc<dyn IncidentStore>,
        Arc::clone(&cache) as Arc<dyn KvCache>,
        Arc::clone(&bus) as Arc<dyn faultline_core::EventBus>,
        Arc::new(model),
        PRICING,
    );

    let outcome = engine
        .generate_batch(&[
            (cached_incident.project_id.clone(), cached_incident.id.clone()),
            (fresh_incident.project_id.clone(), fresh_incident.id.clone()),
        ])
        .await
        .unwrap();
    assert_eq!(outcome.cached, 1);
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.results.len(), 2);
}

/// Oversized batches are rejected up front.
#[tokio::test]
async fn oversized_batches_are_rejected() {
    let (engine, _incidents, _cache, _bus, incident) =
        engine_with(ScriptedModel::new(RESPONSE, 0, 0));
    let requests: Vec<_> = (0..11)
        .map(|_| (incident.project_id.clone(), incident.id.clone()))
        .collect();
    let result = engine.generate_batch(&requests).await;
    assert!(matches!(result, Err(EnrichmentError::BatchSize(11))));
}

/// When the batch path fails, incidents fall back to per-incident generation.
#[tokio::test]
async fn batch_failure_falls_back_per_incident() {
    let incidents = Arc::new(MemIncidentStore::default());
    let cache = Arc::new(TestCache::default());
    let bus = Arc::new(RecordingBus::default());
    let incident = common::incident("project-1");
    incidents.insert_incident(&incident).unwrap();
    incidents.insert_steps(&seed_workflow(&incident, Timestamp::now())).unwrap();

    // The scripted body parses as a single-incident response but NOT as a
    // batch response, so the batch path fails and the fallback succeeds.
    let model = ScriptedModel::new(RESPONSE, 100, 50);
    let engine = HypothesisEngine::new(
        Arc::clone(&incidents) as Arc<dyn IncidentStore>,
        Arc::clone(&cache) as Arc<dyn KvCache>,
        Arc::clone(&bus) as Arc<dyn faultline_core::EventBus>,
        Arc::new(model),
        PRICING,
    );

    let outcome = engine
        .generate_batch(&[(incident.project_id.clone(), incident.id.clone())])
        .await
        .unwrap();
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.results.len(), 1);
    assert!(!outcome.results[0].cached);
}
