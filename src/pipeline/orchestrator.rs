//! Fallback orchestrator.
//!
//! One request runs strictly in sequence: validate, try the remote
//! classifier, and only if that fails or is not confident enough run the
//! local heuristic pipeline. Either way the outcome is merged with the
//! knowledge base into one `ClassificationResult`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use super::analysis::thresholds::bands;
use super::analysis::{
    rank_alternatives, validate_upload, Alternative, AnalysisError, JitterSeed, LeafAnalysis,
    LocalHeuristicAnalyzer,
};
use super::cancel::CancellationFlag;
use super::remote::{
    HttpRemoteClassifier, RemoteAlternative, RemoteClassifier, RemoteDiagnosisResponse,
    RemoteError,
};
use super::upload::{read_upload, ImageUpload};
use crate::config::DiagnosisConfig;
use crate::knowledge::{DiagnosisKind, Label, Severity, KNOWLEDGE_BASE_VERSION};

const LOCAL_SOURCE_DETAIL: &str = "Local heuristic analysis";
const REMOTE_SOURCE_DETAIL: &str = "Remote disease detection service";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Analysis failed: {0}")]
    AnalysisFailed(#[from] AnalysisError),

    #[error("Classification cancelled")]
    Cancelled,

    #[error("Local analysis task failed: {0}")]
    TaskFailed(String),
}

/// The two analyzers a result can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Analyzer {
    #[serde(rename = "remote")]
    RemoteApi,
    #[serde(rename = "local-heuristic")]
    LocalHeuristic,
}

impl Analyzer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Analyzer::RemoteApi => "remote",
            Analyzer::LocalHeuristic => "local-heuristic",
        }
    }
}

impl std::fmt::Display for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > bands::HIGH {
            ConfidenceBand::High
        } else if confidence > bands::MEDIUM {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Why the remote result was not used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No remote analyzer configured, or offline mode.
    RemoteUnavailable,
    RemoteFailed { error: String },
    LowConfidence { confidence: f32, threshold: f32 },
}

/// Feature details of a local run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAnalysisDetails {
    pub summary: String,
    pub features: LeafAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisDetails {
    Local(LocalAnalysisDetails),
    Remote(serde_json::Value),
}

/// Final, fully populated answer for one image.
///
/// Descriptive fields always come from the knowledge-base entry for `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub request_id: Uuid,
    pub label: Label,
    pub name: String,
    pub description: String,
    pub confidence: f32,
    pub confidence_band: ConfidenceBand,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: DiagnosisKind,
    pub symptoms: Vec<String>,
    pub control_measures: Vec<String>,
    /// Strictly below `confidence`, highest first.
    pub alternatives: Vec<Alternative>,
    pub source: Analyzer,
    pub source_detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisDetails>,
    pub knowledge_base_version: u32,
}

// ═══════════════════════════════════════════════════════════
// Knowledge-base merge
// ═══════════════════════════════════════════════════════════

/// Cap a raw confidence by the label's ceiling and keep it in [0, 1].
pub fn final_confidence(label: Label, raw: f32) -> f32 {
    let raw = if raw.is_nan() { 0.0 } else { raw };
    raw.min(label.entry().confidence_ceiling).clamp(0.0, 1.0)
}

struct Draft {
    label: Label,
    raw_confidence: f32,
    reported_alternatives: Option<Vec<RemoteAlternative>>,
    source: Analyzer,
    source_detail: String,
    fallback_reason: Option<FallbackReason>,
    analysis: Option<AnalysisDetails>,
}

fn merge_with_knowledge(request_id: Uuid, draft: Draft) -> ClassificationResult {
    let entry = draft.label.entry();
    let confidence = final_confidence(draft.label, draft.raw_confidence);

    let alternatives = match draft.reported_alternatives {
        Some(reported) => normalize_reported_alternatives(reported, confidence),
        None => rank_alternatives(draft.label, confidence),
    };

    ClassificationResult {
        request_id,
        label: draft.label,
        name: entry.name.to_string(),
        description: entry.description.to_string(),
        confidence,
        confidence_band: ConfidenceBand::from_confidence(confidence),
        severity: entry.severity,
        kind: entry.kind,
        symptoms: entry.symptoms.iter().map(|s| s.to_string()).collect(),
        control_measures: entry.control_measures.iter().map(|s| s.to_string()).collect(),
        alternatives,
        source: draft.source,
        source_detail: draft.source_detail,
        fallback_reason: draft.fallback_reason,
        analysis: draft.analysis,
        knowledge_base_version: KNOWLEDGE_BASE_VERSION,
    }
}

/// Keep remote-supplied alternatives that rank strictly below the primary.
fn normalize_reported_alternatives(
    reported: Vec<RemoteAlternative>,
    primary: f32,
) -> Vec<Alternative> {
    let mut kept: Vec<Alternative> = reported
        .into_iter()
        .filter(|alt| alt.confidence.is_finite() && alt.confidence < primary)
        .map(|alt| Alternative {
            label: label_for_display_name(&alt.name),
            confidence: alt.confidence.max(0.0),
            name: alt.name,
        })
        .collect();
    kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    kept
}

fn label_for_display_name(name: &str) -> Option<Label> {
    let name = name.trim();
    Label::from_key(name).or_else(|| {
        Label::ALL
            .into_iter()
            .find(|l| l.entry().name.eq_ignore_ascii_case(name))
    })
}

// ═══════════════════════════════════════════════════════════
// Orchestrator
// ═══════════════════════════════════════════════════════════

enum RemoteVerdict {
    Accepted(ClassificationResult),
    Fallback(FallbackReason),
}

/// Remote-first classifier with a local heuristic fallback.
///
/// Holds no per-request state; concurrent calls are independent.
pub struct FallbackOrchestrator<R> {
    remote: Option<R>,
    local: Arc<LocalHeuristicAnalyzer>,
    config: DiagnosisConfig,
}

impl FallbackOrchestrator<HttpRemoteClassifier> {
    /// Build from configuration. `offline` skips the remote analyzer even
    /// when an endpoint is configured.
    pub fn from_config(
        config: DiagnosisConfig,
        local: LocalHeuristicAnalyzer,
        offline: bool,
    ) -> Self {
        let remote = match (&config.remote_url, offline) {
            (Some(url), false) => match HttpRemoteClassifier::new(url, config.remote_timeout) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Remote classifier unavailable, using local analysis only");
                    None
                }
            },
            _ => None,
        };
        Self::new(remote, local, config)
    }
}

impl<R: RemoteClassifier> FallbackOrchestrator<R> {
    pub fn new(remote: Option<R>, local: LocalHeuristicAnalyzer, config: DiagnosisConfig) -> Self {
        Self {
            remote,
            local: Arc::new(local),
            config,
        }
    }

    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    /// Read an image file under the configured timeout, then classify it.
    pub async fn classify_file(
        &self,
        path: &Path,
        seed: JitterSeed,
        cancel: &CancellationFlag,
    ) -> Result<ClassificationResult, DiagnosisError> {
        let upload = read_upload(
            path,
            self.config.max_upload_bytes,
            self.config.read_timeout,
            cancel,
        )
        .await
        .map_err(into_diagnosis_error)?;
        self.classify(upload, seed, cancel).await
    }

    /// Classify one uploaded image.
    pub async fn classify(
        &self,
        upload: ImageUpload,
        seed: JitterSeed,
        cancel: &CancellationFlag,
    ) -> Result<ClassificationResult, DiagnosisError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "classify",
            %request_id,
            file = %upload.file_name,
            size = upload.size()
        );
        self.run(request_id, upload, seed, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        request_id: Uuid,
        upload: ImageUpload,
        seed: JitterSeed,
        cancel: &CancellationFlag,
    ) -> Result<ClassificationResult, DiagnosisError> {
        let start = Instant::now();

        if cancel.is_cancelled() {
            return Err(DiagnosisError::Cancelled);
        }

        // Step 1: Size ceiling, before anything touches the bytes
        validate_upload(&upload, self.config.max_upload_bytes)?;

        // Step 2: Remote classifier, if any
        let fallback_reason = match &self.remote {
            Some(remote) => match self.try_remote(remote, request_id, &upload, cancel).await? {
                RemoteVerdict::Accepted(result) => {
                    info!(
                        label = %result.label,
                        confidence = result.confidence,
                        source = %result.source,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Classification complete"
                    );
                    return Ok(result);
                }
                RemoteVerdict::Fallback(reason) => reason,
            },
            None => FallbackReason::RemoteUnavailable,
        };

        // Step 3: Local heuristic pipeline
        let local = Arc::clone(&self.local);
        let task_cancel = cancel.clone();
        let bytes = upload.bytes;
        let task = tokio::task::spawn_blocking(move || local.analyze(&bytes, seed, &task_cancel));

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DiagnosisError::Cancelled),
            joined = task => joined
                .map_err(|e| DiagnosisError::TaskFailed(e.to_string()))?
                .map_err(into_diagnosis_error)?,
        };

        // Step 4: Knowledge-base merge
        let details = LocalAnalysisDetails {
            summary: outcome.analysis.summary(),
            features: outcome.analysis,
        };
        let result = merge_with_knowledge(
            request_id,
            Draft {
                label: outcome.prediction.label,
                raw_confidence: outcome.prediction.confidence,
                reported_alternatives: None,
                source: Analyzer::LocalHeuristic,
                source_detail: LOCAL_SOURCE_DETAIL.to_string(),
                fallback_reason: Some(fallback_reason),
                analysis: Some(AnalysisDetails::Local(details)),
            },
        );

        info!(
            label = %result.label,
            confidence = result.confidence,
            source = %result.source,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Classification complete"
        );
        Ok(result)
    }

    async fn try_remote(
        &self,
        remote: &R,
        request_id: Uuid,
        upload: &ImageUpload,
        cancel: &CancellationFlag,
    ) -> Result<RemoteVerdict, DiagnosisError> {
        let timeout = self.config.remote_timeout;
        let call = tokio::time::timeout(timeout, remote.classify(upload));

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DiagnosisError::Cancelled),
            outcome = call => outcome.unwrap_or(Err(RemoteError::Timeout(timeout))),
        };

        let accepted = response.and_then(|r| {
            let label = r.label()?;
            let confidence = r.checked_confidence()?;
            Ok((r, label, confidence))
        });

        let (response, label, confidence) = match accepted {
            Ok(parts) => parts,
            Err(e) => {
                warn!(
                    endpoint = remote.endpoint(),
                    error = %e,
                    "Remote classification failed, falling back to local analysis"
                );
                return Ok(RemoteVerdict::Fallback(FallbackReason::RemoteFailed {
                    error: e.to_string(),
                }));
            }
        };

        let threshold = self.config.min_remote_confidence;
        if confidence <= threshold {
            warn!(
                label = %label,
                confidence,
                threshold,
                "Remote confidence too low, falling back to local analysis"
            );
            return Ok(RemoteVerdict::Fallback(FallbackReason::LowConfidence {
                confidence,
                threshold,
            }));
        }

        Ok(RemoteVerdict::Accepted(remote_result(
            request_id, response, label, confidence,
        )))
    }
}

fn remote_result(
    request_id: Uuid,
    response: RemoteDiagnosisResponse,
    label: Label,
    confidence: f32,
) -> ClassificationResult {
    merge_with_knowledge(
        request_id,
        Draft {
            label,
            raw_confidence: confidence,
            reported_alternatives: response.alternatives,
            source: Analyzer::RemoteApi,
            source_detail: response
                .source
                .unwrap_or_else(|| REMOTE_SOURCE_DETAIL.to_string()),
            fallback_reason: None,
            analysis: response.analysis_details.map(AnalysisDetails::Remote),
        },
    )
}

fn into_diagnosis_error(e: AnalysisError) -> DiagnosisError {
    match e {
        AnalysisError::Cancelled => DiagnosisError::Cancelled,
        other => DiagnosisError::AnalysisFailed(other),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

    use super::*;
    use crate::pipeline::remote::MockRemoteClassifier;

    fn png(color: [u8; 3]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 24, Rgb(color)))
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn upload(color: [u8; 3]) -> ImageUpload {
        ImageUpload::from_bytes("leaf.png", png(color))
    }

    fn orchestrator(remote: Option<MockRemoteClassifier>) -> FallbackOrchestrator<MockRemoteClassifier> {
        FallbackOrchestrator::new(remote, LocalHeuristicAnalyzer::default(), DiagnosisConfig::default())
    }

    fn seed() -> JitterSeed {
        JitterSeed::from_text("leaf.png")
    }

    fn assert_fully_populated(result: &ClassificationResult) {
        let entry = result.label.entry();
        assert_eq!(result.name, entry.name);
        assert_eq!(result.description, entry.description);
        assert_eq!(result.severity, entry.severity);
        assert_eq!(result.kind, entry.kind);
        assert_eq!(result.symptoms.len(), entry.symptoms.len());
        assert_eq!(result.control_measures.len(), entry.control_measures.len());
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.confidence <= entry.confidence_ceiling);
        for alt in &result.alternatives {
            assert!(alt.confidence < result.confidence);
        }
    }

    #[tokio::test]
    async fn offline_green_leaf_is_healthy() {
        let result = orchestrator(None)
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(result.label, Label::Healthy);
        assert!(result.confidence >= 0.85 && result.confidence < 0.95);
        assert_eq!(result.source, Analyzer::LocalHeuristic);
        assert_eq!(result.fallback_reason, Some(FallbackReason::RemoteUnavailable));
        assert!(result.alternatives.is_empty());
        assert_fully_populated(&result);
    }

    #[tokio::test]
    async fn offline_dark_leaf_is_leaf_spot() {
        let result = orchestrator(None)
            .classify(upload([30, 30, 30]), JitterSeed::NONE, &CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(result.label, Label::LeafSpot);
        let Some(AnalysisDetails::Local(details)) = &result.analysis else {
            panic!("expected local analysis details");
        };
        assert!((details.features.color.spotting - 1.0).abs() < 1e-6);
        assert!(details.features.indicators.bacterial_signs);
        assert!(details.summary.starts_with("Health score"));
        assert_eq!(result.alternatives.len(), 3);
        assert_fully_populated(&result);
    }

    #[tokio::test]
    async fn oversized_upload_rejected_before_remote_or_decode() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("rust", 0.9));
        let orch = orchestrator(Some(remote));

        // Bytes are not even an image: a decode attempt would fail differently.
        let mut oversized = ImageUpload::from_bytes("huge.jpg", b"garbage".to_vec());
        oversized.declared_size = 10 * 1024 * 1024 + 1;

        let err = orch
            .classify(oversized, seed(), &CancellationFlag::new())
            .await
            .unwrap_err();
        match err {
            DiagnosisError::AnalysisFailed(inner) => {
                assert!(matches!(inner, AnalysisError::FileTooLarge { .. }));
                assert!(inner.is_validation());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(orch.remote.as_ref().unwrap().calls(), 0);
    }

    #[tokio::test]
    async fn remote_http_500_falls_back_to_local() {
        let remote = MockRemoteClassifier::failing(RemoteError::Http {
            status: 500,
            body: "internal error".into(),
        });
        let orch = orchestrator(Some(remote));

        let result = orch
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(result.source, Analyzer::LocalHeuristic);
        assert_eq!(result.label, Label::Healthy);
        assert!(matches!(
            result.fallback_reason,
            Some(FallbackReason::RemoteFailed { .. })
        ));
        assert_eq!(orch.remote.as_ref().unwrap().calls(), 1);
        assert_fully_populated(&result);
    }

    #[tokio::test]
    async fn low_remote_confidence_falls_back() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("rust", 0.55));
        let result = orchestrator(Some(remote))
            .classify(upload([30, 30, 30]), seed(), &CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(result.source, Analyzer::LocalHeuristic);
        assert_eq!(result.label, Label::LeafSpot);
        assert_eq!(
            result.fallback_reason,
            Some(FallbackReason::LowConfidence {
                confidence: 0.55,
                threshold: 0.6
            })
        );
    }

    #[tokio::test]
    async fn confidence_exactly_at_threshold_falls_back() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("rust", 0.6));
        let result = orchestrator(Some(remote))
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();
        assert_eq!(result.source, Analyzer::LocalHeuristic);
    }

    #[tokio::test]
    async fn confident_remote_result_is_merged_with_knowledge() {
        let mut response = RemoteDiagnosisResponse::new("Early rust infection", 0.99);
        response.source = Some("Leaf model v3".into());
        response.description = Some("ignored".into());
        response.analysis_details = Some(serde_json::json!({ "model": "cnn" }));
        let remote = MockRemoteClassifier::responding(response);

        let result = orchestrator(Some(remote))
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(result.source, Analyzer::RemoteApi);
        assert_eq!(result.label, Label::Rust);
        // Capped by the rust ceiling
        assert!((result.confidence - Label::Rust.entry().confidence_ceiling).abs() < 1e-6);
        assert_eq!(result.description, Label::Rust.entry().description);
        assert_eq!(result.source_detail, "Leaf model v3");
        assert!(result.fallback_reason.is_none());
        assert_eq!(
            result.analysis,
            Some(AnalysisDetails::Remote(serde_json::json!({ "model": "cnn" })))
        );
        // Synthesised from the knowledge base
        assert_eq!(result.alternatives.len(), 3);
        assert_eq!(result.alternatives[0].label, Some(Label::LeafSpot));
        assert_fully_populated(&result);
    }

    #[tokio::test]
    async fn reported_alternatives_are_kept_below_primary() {
        let mut response = RemoteDiagnosisResponse::new("aphids", 0.8);
        response.alternatives = Some(vec![
            RemoteAlternative { name: "Thrips".into(), confidence: 0.4 },
            RemoteAlternative { name: "Whiteflies".into(), confidence: 0.95 },
            RemoteAlternative { name: "Spider Mites".into(), confidence: 0.6 },
        ]);
        let remote = MockRemoteClassifier::responding(response);

        let result = orchestrator(Some(remote))
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();

        let names: Vec<_> = result.alternatives.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Spider Mites", "Thrips"]);
        assert_eq!(result.alternatives[0].label, Some(Label::SpiderMites));
        assert_eq!(result.alternatives[1].label, Some(Label::Thrips));
    }

    #[tokio::test]
    async fn unknown_remote_label_falls_back() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("class_17", 0.97));
        let result = orchestrator(Some(remote))
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();
        assert_eq!(result.source, Analyzer::LocalHeuristic);
        assert!(matches!(
            result.fallback_reason,
            Some(FallbackReason::RemoteFailed { .. })
        ));
    }

    #[tokio::test]
    async fn slow_remote_times_out_and_falls_back() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("rust", 0.9))
            .with_delay(Duration::from_secs(30));
        let config = DiagnosisConfig {
            remote_timeout: Duration::from_millis(50),
            ..DiagnosisConfig::default()
        };
        let orch = FallbackOrchestrator::new(Some(remote), LocalHeuristicAnalyzer::default(), config);

        let result = orch
            .classify(upload([50, 200, 50]), seed(), &CancellationFlag::new())
            .await
            .unwrap();
        assert_eq!(result.source, Analyzer::LocalHeuristic);
        assert_eq!(
            result.fallback_reason,
            Some(FallbackReason::RemoteFailed {
                error: RemoteError::Timeout(Duration::from_millis(50)).to_string()
            })
        );
    }

    #[tokio::test]
    async fn cancellation_aborts_remote_wait() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("rust", 0.9))
            .with_delay(Duration::from_secs(30));
        let orch = orchestrator(Some(remote));
        let cancel = CancellationFlag::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = orch
            .classify(upload([50, 200, 50]), seed(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_request_does_nothing() {
        let remote = MockRemoteClassifier::responding(RemoteDiagnosisResponse::new("rust", 0.9));
        let orch = orchestrator(Some(remote));
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let err = orch
            .classify(upload([50, 200, 50]), seed(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::Cancelled));
        assert_eq!(orch.remote.as_ref().unwrap().calls(), 0);
    }

    #[tokio::test]
    async fn corrupt_image_is_terminal_after_fallback() {
        let remote = MockRemoteClassifier::failing(RemoteError::Connection("http://x".into()));
        let err = orchestrator(Some(remote))
            .classify(
                ImageUpload::from_bytes("leaf.png", b"\x89PNG\r\n\x1a\nbroken".to_vec()),
                seed(),
                &CancellationFlag::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::AnalysisFailed(_)));
    }

    #[tokio::test]
    async fn classify_file_reads_and_classifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("green.png");
        std::fs::write(&path, png([50, 200, 50])).unwrap();

        let result = orchestrator(None)
            .classify_file(&path, JitterSeed::from_text("green.png"), &CancellationFlag::new())
            .await
            .unwrap();
        assert_eq!(result.label, Label::Healthy);
    }

    #[tokio::test]
    async fn classify_missing_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = orchestrator(None)
            .classify_file(&dir.path().join("absent.png"), JitterSeed::NONE, &CancellationFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::AnalysisFailed(AnalysisError::Io(_))));
    }

    #[tokio::test]
    async fn identical_requests_give_identical_answers() {
        let orch = orchestrator(None);
        let a = orch
            .classify(upload([140, 60, 30]), seed(), &CancellationFlag::new())
            .await
            .unwrap();
        let b = orch
            .classify(upload([140, 60, 30]), seed(), &CancellationFlag::new())
            .await
            .unwrap();
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.label, b.label);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.alternatives, b.alternatives);
    }

    #[test]
    fn final_confidence_capped_by_ceiling() {
        for label in Label::ALL {
            let ceiling = label.entry().confidence_ceiling;
            assert!((final_confidence(label, 1.0) - ceiling).abs() < 1e-6);
            assert!((final_confidence(label, 0.5) - 0.5).abs() < 1e-6);
            assert_eq!(final_confidence(label, -0.2), 0.0);
            assert_eq!(final_confidence(label, f32::NAN), 0.0);
        }
    }

    #[test]
    fn alternatives_strictly_below_final_confidence_for_every_label() {
        for label in Label::ALL {
            let result = merge_with_knowledge(
                Uuid::nil(),
                Draft {
                    label,
                    raw_confidence: 1.0,
                    reported_alternatives: None,
                    source: Analyzer::LocalHeuristic,
                    source_detail: LOCAL_SOURCE_DETAIL.into(),
                    fallback_reason: None,
                    analysis: None,
                },
            );
            if label != Label::Healthy {
                assert!(!result.alternatives.is_empty());
            }
            for alt in &result.alternatives {
                assert!(alt.confidence < result.confidence, "{label}: {}", alt.name);
            }
        }
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceBand::from_confidence(0.9), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.85), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.71), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.70), ConfidenceBand::Low);
    }

    #[test]
    fn result_serializes_source_tags() {
        assert_eq!(serde_json::to_value(Analyzer::RemoteApi).unwrap(), "remote");
        assert_eq!(
            serde_json::to_value(Analyzer::LocalHeuristic).unwrap(),
            "local-heuristic"
        );
        let reason = serde_json::to_value(FallbackReason::RemoteUnavailable).unwrap();
        assert_eq!(reason["reason"], "remote_unavailable");
    }
}
