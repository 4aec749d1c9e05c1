//! End-to-end pipeline tests: synthesized WAV clips, a handcrafted
//! model package on disk, and a mocked remote inference service.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use axum::{routing::post, Json, Router};

use shotsense_audio::feature_names;
use shotsense_infer::{Analyzer, AnalyzerConfig, Measure};

/// Installs a test subscriber so `RUST_LOG` surfaces pipeline logs.
fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Writes a mono 16-bit WAV sine clip into memory.
fn wav_clip(freq_hz: f64, sample_rate: u32, seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let n = (sample_rate as f64 * seconds) as usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..n {
            let t = i as f64 / sample_rate as f64;
            let s = ((freq_hz * 2.0 * std::f64::consts::PI * t).sin() * 16000.0) as i16;
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Writes a three-task package trained on the canonical 16-feature
/// layout. Every forest is a single tree; weapon splits on rms so the
/// walk is exercised, distance/direction are constant leaves.
fn write_package(tag: &str) -> PathBuf {
    let names = feature_names(13);
    let package = serde_json::json!({
        "models": {
            "weapon": {
                "classes": ["akm", "kar98k"],
                "trees": [{"nodes": [
                    {"feature": 1, "threshold": 0.0, "left": 1, "right": 2},
                    {"probs": [0.9, 0.1]},
                    {"probs": [0.3, 0.7]}
                ]}]
            },
            "distance": {
                "classes": ["100m"],
                "trees": [{"nodes": [{"probs": [1.0]}]}]
            },
            "direction": {
                "classes": ["45°"],
                "trees": [{"nodes": [{"probs": [1.0]}]}]
            }
        },
        "feature_names": names,
    });

    let dir = std::env::temp_dir().join(format!("shotsense-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{tag}.json"));
    std::fs::write(&path, serde_json::to_vec_pretty(&package).unwrap()).unwrap();
    path
}

/// Serves the documented success shape on the default route.
async fn mock_remote() -> String {
    let app = Router::new().route(
        "/predict_weapon",
        post(|| async {
            Json(serde_json::json!({
                "label": "AKM",
                "confidences": [{"label": "AKM", "confidence": 0.95}]
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(remote_url: String, model_path: Option<PathBuf>) -> AnalyzerConfig {
    AnalyzerConfig {
        remote_url,
        model_path,
        remote_timeout: Duration::from_secs(5),
        ..AnalyzerConfig::default()
    }
}

#[tokio::test]
async fn full_report_with_remote_and_local() {
    trace_init();
    let pkg = write_package("full");
    let analyzer = Analyzer::new(config(mock_remote().await, Some(pkg))).unwrap();

    let report = analyzer.analyze(wav_clip(440.0, 22050, 2.2)).await.unwrap();

    assert_eq!(report.weapon.label, "AKM");
    assert_eq!(report.weapon.confidence, 0.95);
    assert!(report.weapon.error.is_none());
    assert_eq!(report.distance, Measure::Value(100.0));
    assert_eq!(report.direction, Measure::Value(45.0));
}

#[tokio::test]
async fn remote_outage_degrades_weapon_only() {
    trace_init();
    let pkg = write_package("outage");
    // Discard port: connection fails fast, no service involved.
    let cfg = AnalyzerConfig {
        remote_timeout: Duration::from_millis(500),
        ..config("http://127.0.0.1:9".into(), Some(pkg))
    };
    let analyzer = Analyzer::new(cfg).unwrap();

    // 2.2s source truncates to exactly 2.0s inside the loader; the
    // 16-feature contract still holds and local predictions survive.
    let report = analyzer.analyze(wav_clip(440.0, 22050, 2.2)).await.unwrap();

    assert_eq!(report.weapon.label, "N/A");
    assert_eq!(report.weapon.confidence, 0.0);
    assert!(report.weapon.error.is_some());
    assert_eq!(report.distance, Measure::Value(100.0));
    assert_eq!(report.direction, Measure::Value(45.0));
}

#[tokio::test]
async fn missing_package_degrades_distance_and_direction() {
    let missing = PathBuf::from("/nonexistent/shotsense/classifier.json");
    let analyzer = Analyzer::new(config(mock_remote().await, Some(missing))).unwrap();

    let report = analyzer.analyze(wav_clip(440.0, 22050, 1.0)).await.unwrap();

    assert_eq!(report.weapon.label, "AKM");
    assert_eq!(report.distance, Measure::Label("N/A".into()));
    assert_eq!(report.direction, Measure::Label("N/A".into()));
}

#[tokio::test]
async fn undecodable_input_aborts() {
    let pkg = write_package("garbage");
    let analyzer = Analyzer::new(config(mock_remote().await, Some(pkg))).unwrap();

    let err = analyzer
        .analyze(b"this is not an audio container".to_vec())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("undecodable"));
}

#[tokio::test]
async fn short_clip_is_padded_and_analyzed() {
    let pkg = write_package("short");
    let analyzer = Analyzer::new(config(mock_remote().await, Some(pkg))).unwrap();

    // 0.3s clip: padded to 2.0s, still produces a full report.
    let report = analyzer.analyze(wav_clip(880.0, 22050, 0.3)).await.unwrap();
    assert_eq!(report.weapon.label, "AKM");
    assert_eq!(report.distance, Measure::Value(100.0));
}
