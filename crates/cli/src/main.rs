mod replay_acquirer;
mod scenario;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Serialize;

use capture_trigger_core::capture::domain::engine_state::CapturePhase;
use capture_trigger_core::capture::domain::validation_summary::ValidationSummary;
use capture_trigger_core::capture::infrastructure::log_guidance_sink::LogGuidanceSink;
use capture_trigger_core::pipeline::capture_session_use_case::{
    CaptureSessionUseCase, SessionOptions,
};
use capture_trigger_core::pipeline::capture_target::CaptureTarget;
use capture_trigger_core::pipeline::classification_dispatcher::DispatcherConfig;
use capture_trigger_core::pipeline::session_logger::StdoutSessionLogger;
use capture_trigger_core::shared::constants::{DEFAULT_CLASSIFIER_QUEUE, DEFAULT_DECIMATION};
use capture_trigger_core::shared::frame::Frame;

use replay_acquirer::ReplayAcquirer;
use scenario::{Scenario, ScriptedClassifier};

/// Replays recorded classifier output through the auto-capture engine.
#[derive(Parser)]
#[command(name = "autocapture")]
struct Cli {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Capture target: document-back, document-front or selfie.
    /// Defaults to the scenario's target, then document-back.
    #[arg(long)]
    target: Option<CaptureTarget>,

    /// Consecutive on-target observations needed to capture.
    #[arg(long)]
    ready_threshold: Option<u32>,

    /// Consecutive off-target observations needed to raise guidance.
    #[arg(long)]
    wrong_threshold: Option<u32>,

    /// Minimum confidence for an on-target observation (0.0-1.0).
    #[arg(long)]
    target_threshold: Option<f32>,

    /// Confidence an off-target observation must exceed (0.0-1.0).
    #[arg(long)]
    wrong_floor: Option<f32>,

    /// Suppression window after a wrong-class alert, in milliseconds.
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Classify every Nth frame.
    #[arg(long, default_value_t = DEFAULT_DECIMATION)]
    decimation: usize,

    /// Classifier threads (0 = classify inline, deterministic).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Sampled frames that may wait for a worker before new ones are dropped.
    #[arg(long, default_value_t = DEFAULT_CLASSIFIER_QUEUE)]
    queue: usize,

    /// Make the first capture attempt fail.
    #[arg(long)]
    fail_first_capture: bool,

    /// Dismiss every guidance alert as soon as it is shown.
    #[arg(long)]
    auto_acknowledge: bool,
}

/// Final state of a replay, printed as JSON.
#[derive(Debug, Serialize)]
struct Report {
    target: String,
    phase: CapturePhase,
    artifact: Option<String>,
    has_captured: bool,
    wrong_alert_shown: bool,
    summary: Option<ValidationSummary>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let report = replay(&cli)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn replay(cli: &Cli) -> Result<Report, Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&cli.scenario)?;
    let frames = scenario.expand()?;
    let target = cli
        .target
        .or(scenario.target)
        .unwrap_or(CaptureTarget::DocumentBack);
    let options = session_options(cli, target, &scenario);
    log::info!(
        "Replaying {} frames as {target} with {:?}",
        frames.len(),
        options.trigger
    );

    let mut session = CaptureSessionUseCase::new(
        target,
        options,
        Arc::new(ScriptedClassifier::new(&frames)),
        Box::new(ReplayAcquirer::new(cli.fail_first_capture)),
        Box::new(LogGuidanceSink::new(cli.auto_acknowledge)),
        Box::new(StdoutSessionLogger::new()),
    )?;

    let start = Instant::now();
    for scripted in &frames {
        let at = start
            .checked_add(Duration::from_millis(scripted.at_ms))
            .ok_or_else(|| {
                format!(
                    "Frame {}: at_ms {} out of range",
                    scripted.index, scripted.at_ms
                )
            })?;
        session.push_frame(Frame::empty(scripted.index, at));

        if scripted.manual {
            let outcome = session.manual_capture();
            log::info!("Manual capture after frame {}: {outcome:?}", scripted.index);
        }
        if scripted.retake {
            log::info!("Retake after frame {}", scripted.index);
            session.retake();
        }
    }
    session.shutdown()?;

    let snapshot = session.snapshot();
    Ok(Report {
        target: target.to_string(),
        phase: snapshot.phase,
        artifact: session.artifact().map(|a| a.0),
        has_captured: snapshot.has_captured,
        wrong_alert_shown: snapshot.wrong_alert_shown,
        summary: session.summary(),
    })
}

/// Preset for the target, replaced by the scenario's thresholds if given,
/// then patched with command-line overrides.
fn session_options(cli: &Cli, target: CaptureTarget, scenario: &Scenario) -> SessionOptions {
    let mut trigger = scenario.trigger.clone().unwrap_or_else(|| target.preset());
    if let Some(v) = cli.ready_threshold {
        trigger.ready_threshold = v;
    }
    if let Some(v) = cli.wrong_threshold {
        trigger.wrong_threshold = v;
    }
    if let Some(v) = cli.target_threshold {
        trigger.target_threshold = v;
    }
    if let Some(v) = cli.wrong_floor {
        trigger.wrong_confidence_floor = v;
    }
    if let Some(v) = cli.cooldown_ms {
        trigger.cooldown_duration_ms = v;
    }

    SessionOptions {
        trigger,
        decimation: cli.decimation,
        dispatcher: DispatcherConfig {
            workers: cli.workers,
            queue_capacity: cli.queue,
        },
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.scenario.exists() {
        return Err(format!("Scenario file not found: {}", cli.scenario.display()).into());
    }
    if cli.decimation == 0 {
        return Err("Decimation must be at least 1".into());
    }
    if cli.queue == 0 {
        return Err("Queue capacity must be at least 1".into());
    }
    for (name, value) in [
        ("Target threshold", cli.target_threshold),
        ("Wrong floor", cli.wrong_floor),
    ] {
        if let Some(v) = value {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} must be between 0.0 and 1.0, got {v}").into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use capture_trigger_core::classification::domain::guidance::GuidanceKey;

    const MRZ_BLOCKS: &str = r#"{ "kind": "text", "blocks": [
        { "text": "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<", "confidence": 0.9 },
        { "text": "L898902C36UTO7408122F1204159ZE184226B<<<<<10", "confidence": 0.9 } ] }"#;

    const FRONT_BLOCKS: &str = r#"{ "kind": "text", "blocks": [
        { "text": "IDENTITY CARD", "confidence": 0.8 },
        { "text": "SURNAME ERIKSSON", "confidence": 0.8 } ] }"#;

    fn scenario_file(frames: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "target": "document-back", "frames": [ {frames} ] }}"#).unwrap();
        file
    }

    fn cli(file: &tempfile::NamedTempFile, extra: &[&str]) -> Cli {
        let path = file.path().to_str().unwrap().to_string();
        let mut args = vec!["autocapture".to_string(), path];
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::parse_from(args)
    }

    #[test]
    fn test_mrz_reads_capture_document_back() {
        let file = scenario_file(&format!(
            r#"{{ "repeat": 10 }}, {{ "repeat": 20, "classification": {MRZ_BLOCKS} }}"#
        ));

        let report = replay(&cli(&file, &[])).unwrap();

        assert_eq!(report.phase, CapturePhase::Captured);
        assert_eq!(report.artifact.as_deref(), Some("capture-001-auto.jpg"));
        assert_eq!(report.summary.unwrap().message, GuidanceKey::HoldSteady);
    }

    #[test]
    fn test_front_side_raises_guidance_without_capture() {
        let file = scenario_file(&format!(
            r#"{{ "repeat": 60, "classification": {FRONT_BLOCKS} }}"#
        ));

        let report = replay(&cli(&file, &["--decimation", "1"])).unwrap();

        assert_eq!(report.phase, CapturePhase::Accumulating);
        assert!(report.wrong_alert_shown);
        assert!(!report.has_captured);
        assert_eq!(
            report.summary.unwrap().message,
            GuidanceKey::WrongDocumentSide
        );
    }

    #[test]
    fn test_first_failure_then_retry_succeeds() {
        let file = scenario_file(&format!(
            r#"{{ "repeat": 40, "classification": {MRZ_BLOCKS} }}"#
        ));

        let report = replay(&cli(&file, &["--fail-first-capture"])).unwrap();

        assert_eq!(report.phase, CapturePhase::Captured);
        assert_eq!(report.artifact.as_deref(), Some("capture-001-auto.jpg"));
    }

    #[test]
    fn test_manual_capture_rejected_on_wrong_side() {
        let file = scenario_file(&format!(
            r#"{{ "classification": {FRONT_BLOCKS}, "manual": true }}"#
        ));

        let report = replay(&cli(&file, &["--decimation", "1"])).unwrap();

        assert!(!report.has_captured);
        assert_eq!(report.phase, CapturePhase::Accumulating);
    }

    #[test]
    fn test_retake_resets_session() {
        let file = scenario_file(&format!(
            r#"{{ "repeat": 20, "classification": {MRZ_BLOCKS}, "retake": true }}, {{ "repeat": 2 }}"#
        ));

        let report = replay(&cli(&file, &[])).unwrap();

        assert_eq!(report.phase, CapturePhase::Idle);
        assert!(report.artifact.is_none());
        assert!(report.summary.is_none());
    }

    #[test]
    fn test_cli_overrides_preset() {
        let file = scenario_file(r#"{}"#);
        let cli = cli(
            &file,
            &["--ready-threshold", "7", "--cooldown-ms", "500", "--workers", "3"],
        );
        let scenario = Scenario::load(&cli.scenario).unwrap();

        let options = session_options(&cli, CaptureTarget::Selfie, &scenario);

        assert_eq!(options.trigger.ready_threshold, 7);
        assert_eq!(options.trigger.cooldown_duration_ms, 500);
        assert_eq!(
            options.trigger.target_threshold,
            CaptureTarget::Selfie.preset().target_threshold
        );
        assert_eq!(options.dispatcher.workers, 3);
    }

    #[test]
    fn test_extreme_timestamp_does_not_panic() {
        let file = scenario_file(r#"{ "at_ms": 18446744073709551615 }"#);

        if let Err(e) = replay(&cli(&file, &[])) {
            assert!(e.to_string().contains("out of range"));
        }
    }

    #[test]
    fn test_target_flag_parses() {
        let file = scenario_file(r#"{}"#);
        let cli = cli(&file, &["--target", "selfie"]);
        assert_eq!(cli.target, Some(CaptureTarget::Selfie));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let file = scenario_file(r#"{}"#);
        assert!(validate(&cli(&file, &["--decimation", "0"])).is_err());
        assert!(validate(&cli(&file, &["--target-threshold", "1.5"])).is_err());
        assert!(validate(&cli(&file, &[])).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_scenario() {
        let cli = Cli::parse_from(["autocapture", "/definitely/not/here.json"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
