use crate::infra::InMemorySessionArchive;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Args;
use recruit_ai::config::InterviewConfig;
use recruit_ai::error::AppError;
use recruit_ai::interview::{
    Dispatch, InterviewSessionService, Reply, SessionId, SessionRegistry, SimulatedAnalyzer,
};
use recruit_ai::pipeline::{legacy_to_new, LegacyStatus, PipelineState, StageStatus};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Args, Debug)]
pub(crate) struct LegacyArgs {
    /// Legacy status code, e.g. FIRST_IN_PROGRESS
    pub(crate) code: String,
}

#[derive(Args, Debug)]
pub(crate) struct StagesArgs {
    /// AI interview stage status
    #[arg(long, default_value = "PENDING")]
    pub(crate) ai: String,
    /// Practical (first) interview stage status
    #[arg(long, default_value = "PENDING")]
    pub(crate) practical: String,
    /// Executive (second) interview stage status
    #[arg(long, default_value = "PENDING")]
    pub(crate) executive: String,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Session id used for the simulated interview
    #[arg(long, default_value = "demo-session")]
    pub(crate) session_id: String,
    /// Number of simulated audio chunks to stream
    #[arg(long, default_value_t = 3)]
    pub(crate) chunks: usize,
    /// Skip the status bridge table printed before the interview
    #[arg(long)]
    pub(crate) skip_bridge: bool,
}

#[derive(Debug, Serialize)]
struct StatusConversion {
    legacy_status: String,
    recognized: bool,
    #[serde(flatten)]
    stages: PipelineState,
    collapses_to: LegacyStatus,
}

impl StatusConversion {
    fn from_code(code: &str) -> Self {
        let stages = legacy_to_new(code);
        Self {
            legacy_status: code.to_string(),
            recognized: LegacyStatus::from_code(code).is_some(),
            stages,
            collapses_to: stages.legacy_status(),
        }
    }
}

pub(crate) fn run_status_legacy(args: LegacyArgs) -> Result<(), AppError> {
    let conversion = StatusConversion::from_code(args.code.trim());
    if !conversion.recognized {
        eprintln!(
            "warning: '{}' is not a known legacy code; showing the PENDING default",
            conversion.legacy_status
        );
    }
    print_json(&conversion);
    Ok(())
}

/// Stage tokens are validated here so typos surface to the operator instead of
/// silently collapsing to PENDING.
pub(crate) fn run_status_stages(args: StagesArgs) -> Result<(), AppError> {
    let state = PipelineState::new(
        args.ai.trim().parse::<StageStatus>()?,
        args.practical.trim().parse::<StageStatus>()?,
        args.executive.trim().parse::<StageStatus>()?,
    );
    if !state.is_monotonic() {
        eprintln!("warning: a later stage has started before an earlier stage passed");
    }
    print_json(&json!({
        "stages": state,
        "legacy_status": state.legacy_status(),
    }));
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    if !args.skip_bridge {
        print_bridge_table();
    }

    println!("\nInterview session demo ({})", args.session_id);
    let archive = Arc::new(InMemorySessionArchive::default());
    let service = InterviewSessionService::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(SimulatedAnalyzer),
        archive.clone(),
        InterviewConfig::default(),
    );

    let (tx, mut rx) = mpsc::channel(InterviewConfig::default().outbound_buffer);
    let lease = match service.connect(SessionId(args.session_id.clone()), tx) {
        Ok(lease) => lease,
        Err(err) => {
            println!("  Session rejected: {}", err);
            return Ok(());
        }
    };

    for frame in demo_frames(args.chunks) {
        let kind = frame["type"].as_str().unwrap_or("unknown").to_string();
        println!("\n> {}", kind);
        let outcome = service.dispatch(&lease, &frame.to_string()).await;
        while let Ok(reply) = rx.try_recv() {
            print_reply(&reply);
        }
        if outcome == Dispatch::Ended {
            break;
        }
    }

    let reports = archive.reports();
    println!(
        "\nArchived reports: {} (registry now tracks {} sessions)",
        reports.len(),
        service.registry().len()
    );
    for report in reports {
        println!(
            "  {} started {} ran {:.2}s with {} transcripts",
            report.session_id,
            report.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
            report.duration,
            report.transcripts.len()
        );
    }
    Ok(())
}

fn demo_frames(chunks: usize) -> Vec<serde_json::Value> {
    let mut frames = Vec::with_capacity(chunks + 4);
    for index in 0..chunks {
        let audio = format!("RIFF demo chunk {index}").into_bytes();
        frames.push(json!({
            "type": "audio_chunk",
            "audio_data": BASE64.encode(audio),
            "timestamp": index as f64 * 2.5,
        }));
    }
    frames.push(json!({
        "type": "speaker_note",
        "speaker": "면접관_1",
        "note": "good answer",
    }));
    frames.push(json!({ "type": "speaker_note", "speaker": "면접관_2" }));
    frames.push(json!({ "type": "evaluation_request" }));
    frames.push(json!({ "type": "session_end" }));
    frames
}

fn print_bridge_table() {
    println!("Status bridge");
    println!(
        "  {:<20} {:<12} {:<12} {:<12} {}",
        "legacy", "ai", "practical", "executive", "collapses to"
    );
    for legacy in LegacyStatus::ALL {
        let conversion = StatusConversion::from_code(legacy.as_str());
        println!(
            "  {:<20} {:<12} {:<12} {:<12} {}",
            conversion.legacy_status,
            conversion.stages.ai.as_str(),
            conversion.stages.practical.as_str(),
            conversion.stages.executive.as_str(),
            conversion.collapses_to
        );
    }
}

fn print_reply(reply: &Reply) {
    match serde_json::to_string_pretty(reply) {
        Ok(json) => println!("< {}\n{}", reply.message_type(), json),
        Err(err) => println!("< {} (unprintable: {})", reply.message_type(), err),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("failed to render output: {}", err),
    }
}
