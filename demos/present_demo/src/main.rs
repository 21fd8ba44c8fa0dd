// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises the presentation pipeline end to end.
//!
//! Runs 60 frames through a [`SurfaceContext`] over a [`SimulatedGpu`] on
//! the fence path, recording events to both a
//! [`PrettyPrintSink`](prograde_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](prograde_debug::recorder::RecorderSink), feeding
//! submit-to-present latencies into a
//! [`PresentTracker`](prograde_sync_harness::metrics::PresentTracker), then
//! exports a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use prograde_core::context::SurfaceContext;
use prograde_core::controller::{ControllerConfig, FrameReadyFn};
use prograde_core::device::{LoadAction, TargetSize};
use prograde_core::trace::{TraceSink, Tracer};

use prograde_debug::fanout::FanoutSink;
use prograde_debug::pretty::PrettyPrintSink;
use prograde_debug::recorder::RecorderSink;

use prograde_sync_harness::metrics::PresentTracker;
use prograde_sync_harness::sim::{GpuProfile, PathologyToggles, SimulatedGpu, texture_slots};

const FRAME_COUNT: u64 = 60;
/// Latency budget per frame: one 60 Hz refresh interval, in microseconds.
const BUDGET_US: f64 = 16_667.0;

fn main() {
    // -- sinks -------------------------------------------------------------
    let pretty = Arc::new(PrettyPrintSink::new(Box::new(std::io::stdout())));
    let recorder = Arc::new(RecorderSink::new());
    let fanout = FanoutSink::new(vec![
        Arc::clone(&pretty) as Arc<dyn TraceSink>,
        Arc::clone(&recorder) as Arc<dyn TraceSink>,
    ]);
    let tracer = Tracer::new(Arc::new(fanout));

    // -- device and context ------------------------------------------------
    let profile = GpuProfile {
        latency: Duration::from_millis(2),
        toggles: PathologyToggles {
            gpu_stall: true,
            latency_jitter: true,
        },
        ..GpuProfile::default()
    };
    let presented = Arc::new(AtomicU64::new(0));
    let on_frame_ready = {
        let presented = Arc::clone(&presented);
        Arc::new(move || {
            presented.fetch_add(1, Ordering::SeqCst);
        }) as FrameReadyFn
    };
    let mut context = SurfaceContext::new(
        SimulatedGpu::new(profile),
        texture_slots(3),
        TargetSize::new(1280, 720),
        on_frame_ready,
        ControllerConfig::default(),
        tracer,
    )
    .expect("failed to create the surface context");
    println!("completion path: {:?}", context.completion_path());

    // -- frame loop --------------------------------------------------------
    let chain = context.swapchain();
    let mut tracker = PresentTracker::<32>::new(BUDGET_US);
    let mut last_report = None;

    for frame in 1..=FRAME_COUNT {
        let started = Instant::now();
        context.begin_frame(LoadAction::Clear { color: 0xFF101010 });
        context.end_frame();

        // The fence path presents on the background wait thread; block here
        // so each frame's latency is measured in isolation.
        while presented.load(Ordering::SeqCst) < frame {
            thread::sleep(Duration::from_micros(100));
        }
        let latency_us = started.elapsed().as_secs_f64() * 1e6;
        last_report = Some(tracker.observe(latency_us));

        let slot = chain.presenting();
        assert_eq!(slot.frame, frame, "presenting slot lags the frame loop");
    }

    // -- report ------------------------------------------------------------
    if let Some(report) = last_report {
        println!(
            "grade {}  frames={} missed={} miss/1000={:.1}",
            report.grade.as_str(),
            report.total_frames,
            report.missed_frames,
            report.miss_rate_per_1000,
        );
        println!("latency: [{}]", tracker.sparkline_ascii(0.0, 2.0 * BUDGET_US));
    }

    // -- export Chrome trace -----------------------------------------------
    drop(context); // flush the terminate event into the recording
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    prograde_debug::chrome::export(&recorder.bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}
