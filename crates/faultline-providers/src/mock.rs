// faultline-providers/src/mock.rs
// ============================================================================
// Module: Mock Model Client
// Description: Deterministic generator used when no credentials exist.
// Purpose: Keep the enrichment path exercisable without a hosted model.
// Dependencies: faultline-core, serde_json
// ============================================================================

//! ## Overview
//! Absence of model credentials switches the platform onto this deterministic
//! generator. It answers every completion with a fixed three-hypothesis set
//! templated on the incident's service, reports zero usage, and identifies
//! itself as a mock so no cost or audit rows accrue.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use faultline_core::interfaces::ModelClient;
use faultline_core::interfaces::ModelError;
use faultline_core::interfaces::ModelRequest;
use faultline_core::interfaces::ModelResponse;
use faultline_core::interfaces::ModelUsage;
use serde_json::json;

// ============================================================================
// SECTION: Mock Client
// ============================================================================

/// Deterministic mock generator.
#[derive(Debug, Default)]
pub struct MockModelClient;

impl MockModelClient {
    /// Builds the mock client.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    fn is_mock(&self) -> bool {
        true
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let service = extract_service(&request.prompt);
        let body = json!({
            "hypotheses": [
                {
                    "claim": format!("High CPU usage in {service} due to inefficient query"),
                    "description": "The service is experiencing elevated CPU usage, likely \
                        caused by an inefficient database query introduced in a recent \
                        deployment.",
                    "confidence_score": 0.85,
                    "supporting_evidence": [
                        "CPU metrics show 90% utilization",
                        "Recent deployment detected 10 minutes before symptoms",
                        "Similar pattern observed in a prior incident"
                    ]
                },
                {
                    "claim": format!("Memory leak in {service}"),
                    "description": "Gradual memory increase suggests a memory leak, \
                        potentially in the caching layer or connection pooling.",
                    "confidence_score": 0.72,
                    "supporting_evidence": [
                        "Memory usage trending upward since deployment",
                        "Heap dumps show unreleased objects"
                    ]
                },
                {
                    "claim": format!("External API timeout affecting {service}"),
                    "description": "Downstream API calls are timing out, causing request \
                        backlog and resource exhaustion.",
                    "confidence_score": 0.65,
                    "supporting_evidence": [
                        "Increased latency on external API calls",
                        "Timeout errors in application logs"
                    ]
                }
            ]
        });
        Ok(ModelResponse {
            content: body.to_string(),
            usage: ModelUsage::default(),
            model: "mock".to_string(),
        })
    }
}

/// Pulls the service name out of the generation prompt, falling back to a
/// generic label.
fn extract_service(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Service: "))
        .map_or_else(|| "the service".to_string(), str::to_string)
}
