// src/main.rs
//
// Replay driver: feeds recorded tracker output (JSONL, one frame per line)
// through the warning pipeline and logs what the HUD/audio layer would see.
// Stands in for the video/GUI caller, which lives outside this crate.
//
// Input format per line:
//   {"frame_id": 1, "detections": [{"track_id": 3, "bbox": [x1,y1,x2,y2], "class_id": 2}]}

use anyhow::{Context, Result};
use collision_warning::{class_name, Config, FrameRecord, ThreatLevel, WarningPipeline};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collision_warning=info".into()),
        )
        .init();

    info!("🚗 Collision Warning Replay Starting");

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        error!("Usage: collision-warning <detections.jsonl> [config.yaml]");
        std::process::exit(2);
    };
    let config_path = args.next().unwrap_or_else(|| "config.yaml".to_string());

    let config = if Path::new(&config_path).exists() {
        let config = Config::load(&config_path)?;
        info!("✓ Configuration loaded from {}", config_path);
        config
    } else {
        warn!("No config at {} — using defaults", config_path);
        Config::default()
    };

    info!(
        "Calibration: focal={}px | alarm on/off={:.1}s/{:.1}s | fps={}",
        config.calibration.focal_length_px,
        config.alarm.ttc_on_s,
        config.alarm.ttc_off_s,
        config.kinematics.fps
    );

    let mut pipeline = WarningPipeline::with_config(config);

    let file = File::open(&input_path)
        .with_context(|| format!("cannot open detections file {}", input_path))?;
    let reader = BufReader::new(file);

    let mut danger_frames: u64 = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("malformed frame record on line {}", line_no + 1))?;

        let assessment = pipeline.process_frame(&record.detections, record.frame_id);

        if assessment.danger {
            danger_frames += 1;
            if let Some(urgent) = &assessment.most_urgent {
                info!(
                    "⚠️  F{}: {} | {} T{} at {:.1}m, ttc={:.2}s",
                    record.frame_id,
                    assessment.threat_level.as_str(),
                    class_name(urgent.class_id),
                    urgent.track_id,
                    urgent.distance_m,
                    urgent.ttc_s
                );
            }
        }

        if assessment.threat_level == ThreatLevel::Danger {
            // What the audio layer consumes: one JSON line per dangerous frame
            println!("{}", serde_json::to_string(&assessment)?);
        }
    }

    info!(
        "✓ Replay complete: {} frames | {} with warning active | {} flagged dangerous | {} tracks live at end",
        pipeline.frames_processed(),
        pipeline.warning_frames(),
        danger_frames,
        pipeline.tracked_count()
    );

    Ok(())
}
