use serde::{Deserialize, Serialize};

use super::RemoteError;
use crate::knowledge::Label;

/// JSON body returned by the remote classification endpoint.
///
/// Only `disease` and `confidence` are required. Descriptive fields are
/// accepted but the knowledge base stays authoritative for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDiagnosisResponse {
    /// Label key or free-text disease name.
    pub disease: String,
    pub confidence: f32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub control_measures: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub analysis_details: Option<serde_json::Value>,
    #[serde(default)]
    pub alternatives: Option<Vec<RemoteAlternative>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAlternative {
    pub name: String,
    pub confidence: f32,
}

impl RemoteDiagnosisResponse {
    /// Minimal response, used by the mock client and tests.
    pub fn new(disease: impl Into<String>, confidence: f32) -> Self {
        Self {
            disease: disease.into(),
            confidence,
            name: None,
            description: None,
            severity: None,
            kind: None,
            symptoms: Vec::new(),
            control_measures: Vec::new(),
            source: None,
            analysis_details: None,
            alternatives: None,
        }
    }

    /// Map `disease` onto a knowledge-base label.
    ///
    /// Exact keys are tried first, then keyword resolution; the display
    /// `name` is used as a last resort.
    pub fn label(&self) -> Result<Label, RemoteError> {
        Label::resolve(&self.disease)
            .or_else(|| self.name.as_deref().and_then(Label::resolve))
            .ok_or_else(|| RemoteError::UnknownLabel(self.disease.clone()))
    }

    /// Confidence, rejected if it is not a finite value in [0, 1].
    pub fn checked_confidence(&self) -> Result<f32, RemoteError> {
        if self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence) {
            Ok(self.confidence)
        } else {
            Err(RemoteError::InvalidConfidence(self.confidence))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_response() {
        let json = r#"{
            "name": "Powdery Mildew",
            "description": "White powder",
            "severity": "Moderate",
            "confidence": 0.91,
            "type": "disease",
            "symptoms": ["White spots"],
            "control_measures": ["Sulfur spray"],
            "disease": "powdery_mildew",
            "source": "Leaf model v3",
            "analysis_details": {"model": "cnn", "latency_ms": 120}
        }"#;
        let parsed: RemoteDiagnosisResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind.as_deref(), Some("disease"));
        assert_eq!(parsed.label().unwrap(), Label::PowderyMildew);
        assert_eq!(parsed.source.as_deref(), Some("Leaf model v3"));
        assert_eq!(parsed.analysis_details.unwrap()["model"], "cnn");
        assert!(parsed.alternatives.is_none());
    }

    #[test]
    fn optional_fields_default() {
        let parsed: RemoteDiagnosisResponse =
            serde_json::from_str(r#"{"disease": "rust", "confidence": 0.7}"#).unwrap();
        assert!(parsed.symptoms.is_empty());
        assert!(parsed.control_measures.is_empty());
        assert!(parsed.source.is_none());
    }

    #[test]
    fn missing_confidence_is_an_error() {
        let parsed: Result<RemoteDiagnosisResponse, _> =
            serde_json::from_str(r#"{"disease": "rust"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn free_text_disease_resolves() {
        let resp = RemoteDiagnosisResponse::new("Late Blight (Phytophthora)", 0.8);
        assert_eq!(resp.label().unwrap(), Label::LateBlight);
    }

    #[test]
    fn falls_back_to_display_name() {
        let mut resp = RemoteDiagnosisResponse::new("class_17", 0.8);
        resp.name = Some("Spider Mites".into());
        assert_eq!(resp.label().unwrap(), Label::SpiderMites);
    }

    #[test]
    fn unknown_label_is_reported() {
        let resp = RemoteDiagnosisResponse::new("class_17", 0.8);
        assert_eq!(
            resp.label().unwrap_err(),
            RemoteError::UnknownLabel("class_17".into())
        );
    }

    #[test]
    fn confidence_range_checked() {
        assert!(RemoteDiagnosisResponse::new("rust", 0.0).checked_confidence().is_ok());
        assert!(RemoteDiagnosisResponse::new("rust", 1.0).checked_confidence().is_ok());
        assert!(RemoteDiagnosisResponse::new("rust", 1.2).checked_confidence().is_err());
        assert!(RemoteDiagnosisResponse::new("rust", f32::NAN).checked_confidence().is_err());
    }
}
