// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the synthetic pipeline
//! - Evaluating single decisions
//! - Inspecting the configuration

use clap::Subcommand;
use frameflow::Config;
use frameflow::constants::FrameRatePreset;
use frameflow::flow::{
    decide_sab_write_failure, decide_stride_correction_dispatch, decide_worker_inflight_dispatch,
};
use frameflow::pipeline::{SimulationReport, run_simulation};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Subcommand)]
pub enum DecideCommand {
    /// Worker admission for a new frame
    Admission {
        /// Frames currently in flight
        #[arg(long)]
        in_flight: u32,

        /// In-flight limit (must be greater than zero)
        #[arg(long)]
        limit: u32,

        /// A newer frame is already queued
        #[arg(long)]
        queued: bool,
    },

    /// Reaction to a failed shared-buffer write
    Write {
        /// The payload does not fit a buffer slot
        #[arg(long)]
        oversized: bool,

        /// Retries already spent on this frame
        #[arg(long, default_value = "0")]
        retry_count: u32,

        /// Inclusive retry limit
        #[arg(long)]
        retry_limit: u32,
    },

    /// Dispatch of a stride correction request
    Correction {
        /// A correction is already running
        #[arg(long)]
        in_flight: bool,

        /// A correction is already queued
        #[arg(long)]
        pending: bool,
    },
}

/// Run the synthetic pipeline and print its report
pub fn simulate(
    config_path: Option<&Path>,
    duration: Option<u64>,
    fps: Option<u32>,
    limit: Option<u32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(config_path)?;

    if let Some(secs) = duration {
        config.simulation.duration_secs = secs;
    }
    if let Some(fps) = fps {
        config.simulation.frame_rate = FrameRatePreset::from_fps(fps).ok_or_else(|| {
            let supported: Vec<String> = FrameRatePreset::ALL
                .iter()
                .map(|p| p.fps().to_string())
                .collect();
            format!("Unsupported frame rate {} (use {})", fps, supported.join(", "))
        })?;
    }
    if let Some(limit) = limit {
        config.transport.worker_inflight_limit = limit;
    }

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    if !json {
        println!(
            "Simulating {} for {}s (press Ctrl+C to stop early)",
            config.simulation.frame_rate.display_name(),
            config.simulation.duration_secs
        );
    }

    let report = run_simulation(&config, stop_flag, |elapsed, stats| {
        if !json {
            print!(
                "\rElapsed: {:>3}s  dispatched: {:>5}  backpressure: {:>5}",
                elapsed.as_secs(),
                stats.dispatches,
                stats.backpressure_hits
            );
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    let stats = &report.stats;
    println!();
    println!("Session:            {}", report.session_id);
    println!("Started:            {}", report.started_at);
    println!("Elapsed:            {} ms", report.elapsed_ms);
    println!("Frames produced:    {}", report.frames_produced);
    println!("Frames processed:   {}", report.frames_processed);
    println!("Frames dropped:     {}", report.dropped_frames());
    println!("Backpressure hits:  {}", stats.backpressure_hits);
    println!("Peak in flight:     {}", report.peak_in_flight);
    println!(
        "Write retries:      {} (fallbacks: {} oversize, {} retry limit)",
        stats.retries, stats.fallbacks_oversize, stats.fallbacks_retry_limit
    );
    println!("Inline deliveries:  {}", report.frames_inline);
    println!(
        "Corrections:        {} completed, {} dispatched, {} superseded",
        report.corrections_completed, stats.correction_dispatches, stats.correction_superseded
    );
    if let Some(correction) = report.corrected_stride {
        println!(
            "Corrected stride:   {} bytes ({} bytes padding)",
            correction.stride, correction.row_padding
        );
    }
}

/// Evaluate one decision and print it as JSON
pub fn decide(command: DecideCommand) -> Result<(), Box<dyn std::error::Error>> {
    let output = match command {
        DecideCommand::Admission {
            in_flight,
            limit,
            queued,
        } => {
            if limit == 0 {
                return Err("Limit must be greater than zero".into());
            }
            serde_json::to_string_pretty(&decide_worker_inflight_dispatch(in_flight, limit, queued))?
        }
        DecideCommand::Write {
            oversized,
            retry_count,
            retry_limit,
        } => serde_json::to_string_pretty(&decide_sab_write_failure(
            oversized,
            retry_count,
            retry_limit,
        ))?,
        DecideCommand::Correction { in_flight, pending } => {
            serde_json::to_string_pretty(&decide_stride_correction_dispatch(in_flight, pending))?
        }
    };

    println!("{}", output);
    Ok(())
}

/// Print the effective configuration, its default path, or save it
pub fn show_config(
    config_path: Option<&Path>,
    print_path: bool,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => Config::default_path()?,
    };

    if print_path {
        println!("{}", path.display());
        return Ok(());
    }

    let config = Config::load_or_default(Some(&path))?;
    if save {
        config.save(&path)?;
        println!("Config saved: {}", path.display());
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
