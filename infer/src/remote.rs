//! Remote weapon-classifier client.
//!
//! The external inference service receives the raw audio clip and
//! returns a weapon prediction in a shape this system does not fully
//! control. The client normalizes every known shape into one
//! `(label, confidence)` outcome and absorbs transport failures: a
//! remote outage degrades the report, it never aborts the request.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use tracing::warn;

/// Default inference route, mirroring the upstream service's API name.
pub const DEFAULT_ROUTE: &str = "/predict_weapon";

/// Normalized result of one remote classification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    Prediction { label: String, confidence: f64 },
    /// Transport, protocol, or parse failure, with its description.
    Error(String),
}

impl RemoteOutcome {
    /// Converts any failure into an error-tagged outcome.
    pub fn absorb(err: impl std::fmt::Display) -> Self {
        RemoteOutcome::Error(err.to_string())
    }
}

/// Response shapes the service is known to produce, tried in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteResponse {
    /// `{"label": "AKM", "confidences": [{"label": "AKM", "confidence": 0.95}]}`
    LabelWithConfidences {
        label: String,
        #[serde(default)]
        confidences: Vec<ConfidenceEntry>,
    },
    /// `{"AKM": 0.95, "M416": 0.05}`
    BareScoreMap(BTreeMap<String, f64>),
    /// `"AKM"`
    PlainString(String),
}

#[derive(Debug, Deserialize)]
struct ConfidenceEntry {
    #[serde(default)]
    label: Option<String>,
    confidence: f64,
}

fn normalize(resp: RemoteResponse) -> RemoteOutcome {
    match resp {
        RemoteResponse::LabelWithConfidences { label, confidences } => {
            // Prefer the entry for the predicted label; fall back to the
            // top entry; confidence 0.0 when the list is empty.
            let confidence = confidences
                .iter()
                .find(|e| e.label.as_deref() == Some(label.as_str()))
                .or_else(|| confidences.first())
                .map(|e| e.confidence)
                .unwrap_or(0.0);
            RemoteOutcome::Prediction { label, confidence }
        }
        RemoteResponse::BareScoreMap(scores) => {
            let mut best: Option<(&String, f64)> = None;
            for (label, &score) in &scores {
                if best.is_none_or(|(_, b)| score > b) {
                    best = Some((label, score));
                }
            }
            match best {
                Some((label, score)) => RemoteOutcome::Prediction {
                    label: label.clone(),
                    confidence: score,
                },
                None => RemoteOutcome::Error("empty score map".into()),
            }
        }
        RemoteResponse::PlainString(label) => RemoteOutcome::Prediction {
            label,
            confidence: 0.0,
        },
    }
}

/// Parses a raw response body into a normalized outcome.
pub(crate) fn parse_body(body: &[u8]) -> RemoteOutcome {
    match serde_json::from_slice::<RemoteResponse>(body) {
        Ok(resp) => normalize(resp),
        Err(e) => RemoteOutcome::Error(format!("unrecognized response shape: {e}")),
    }
}

/// HTTP client for the remote classifier.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    url: String,
}

impl RemoteClient {
    /// Builds a client with the given endpoint and per-request timeout.
    pub fn new(base_url: &str, route: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), route),
        })
    }

    /// Uploads the raw clip and returns a normalized outcome.
    ///
    /// One attempt per request, no retries. Every failure mode becomes
    /// [`RemoteOutcome::Error`]; this method never returns `Err`.
    pub async fn classify(&self, clip: Vec<u8>, filename: &str) -> RemoteOutcome {
        let part = multipart::Part::bytes(clip).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = match self.http.post(&self.url).multipart(form).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, url = %self.url, "remote classifier unreachable");
                return RemoteOutcome::absorb(e);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "remote classifier returned an error status");
            return RemoteOutcome::Error(format!("remote status {status}"));
        }

        match response.bytes().await {
            Ok(body) => parse_body(&body),
            Err(e) => RemoteOutcome::absorb(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_with_confidences_shape() {
        let body = br#"{"label": "AKM", "confidences": [{"label": "AKM", "confidence": 0.95}]}"#;
        assert_eq!(
            parse_body(body),
            RemoteOutcome::Prediction {
                label: "AKM".into(),
                confidence: 0.95
            }
        );
    }

    #[test]
    fn confidences_prefer_matching_label() {
        let body = br#"{"label": "M416", "confidences": [
            {"label": "AKM", "confidence": 0.4},
            {"label": "M416", "confidence": 0.6}
        ]}"#;
        assert_eq!(
            parse_body(body),
            RemoteOutcome::Prediction {
                label: "M416".into(),
                confidence: 0.6
            }
        );
    }

    #[test]
    fn label_without_confidences_defaults_to_zero() {
        let body = br#"{"label": "AKM"}"#;
        assert_eq!(
            parse_body(body),
            RemoteOutcome::Prediction {
                label: "AKM".into(),
                confidence: 0.0
            }
        );
    }

    #[test]
    fn bare_score_map_takes_argmax() {
        let body = br#"{"AKM": 0.95, "M416": 0.05}"#;
        assert_eq!(
            parse_body(body),
            RemoteOutcome::Prediction {
                label: "AKM".into(),
                confidence: 0.95
            }
        );
    }

    #[test]
    fn plain_string_shape() {
        let body = br#""AKM""#;
        assert_eq!(
            parse_body(body),
            RemoteOutcome::Prediction {
                label: "AKM".into(),
                confidence: 0.0
            }
        );
    }

    #[test]
    fn empty_score_map_is_an_error() {
        assert!(matches!(parse_body(b"{}"), RemoteOutcome::Error(_)));
    }

    #[test]
    fn garbage_body_is_an_error_outcome() {
        assert!(matches!(
            parse_body(b"<html>502 Bad Gateway</html>"),
            RemoteOutcome::Error(_)
        ));
    }

    #[test]
    fn transport_errors_are_absorbed_with_description() {
        let outcome = RemoteOutcome::absorb("Connection Timeout");
        match outcome {
            RemoteOutcome::Error(msg) => assert!(msg.contains("Connection Timeout")),
            other => panic!("expected error outcome, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_endpoint_degrades_not_panics() {
        // Nothing listens on the discard port; the client must return
        // an error outcome instead of propagating the failure.
        let client = RemoteClient::new(
            "http://127.0.0.1:9",
            DEFAULT_ROUTE,
            Duration::from_millis(500),
        )
        .unwrap();
        let outcome = tokio_test::block_on(client.classify(vec![0u8; 16], "clip.mp3"));
        assert!(matches!(outcome, RemoteOutcome::Error(_)));
    }
}
