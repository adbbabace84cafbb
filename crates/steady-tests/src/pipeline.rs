//! End-to-end tests for the stabilization pipeline.
//!
//! Exercises cross-crate interactions between steady-core,
//! steady-tracking, and steady-pipeline over synthetic videos.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use steady_core::{FrameBuffer, FrameRate, Result, RigidMotion, SteadyError};
use steady_media::{OutputSettings, VideoCodec};
use steady_pipeline::{run, FrameSink, FrameSource, StabilizationParams};
use steady_tracking::estimator::{EstimatorParams, MotionEstimator};
use steady_tracking::pyramid::GrayImage;
use steady_tracking::trajectory::{corrective_motions, cumulative_trajectory};

// ── Synthetic source and sink ──────────────────────────────────

/// In-memory frame source with a configurable advertised count and an
/// optional simulated decode failure.
struct SyntheticSource {
    frames: Vec<FrameBuffer>,
    advertised: u64,
    /// Pretend decoding fails after this many frames on every pass.
    fail_after: Option<usize>,
    cursor: usize,
    rewinds: u32,
}

impl SyntheticSource {
    fn new(frames: Vec<FrameBuffer>) -> Self {
        let advertised = frames.len() as u64;
        Self {
            frames,
            advertised,
            fail_after: None,
            cursor: 0,
            rewinds: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn width(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.width())
    }

    fn height(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.height())
    }

    fn frame_rate(&self) -> FrameRate {
        FrameRate::FPS_30
    }

    fn frame_count(&self) -> u64 {
        self.advertised
    }

    fn read_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if let Some(limit) = self.fail_after {
            if self.cursor >= limit {
                return Ok(None);
            }
        }
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        self.rewinds += 1;
        Ok(())
    }
}

/// Sink collecting output frames into shared memory.
struct MemorySink {
    frames: Rc<RefCell<Vec<FrameBuffer>>>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.frames.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<u64> {
        Ok(self.frames.borrow().len() as u64)
    }
}

// ── Frame synthesis ────────────────────────────────────────────

/// Fixed speckle layout: 4x4 bright squares scattered deterministically.
fn speckle_layout(count: usize, width: u32, height: u32) -> Vec<(u32, u32)> {
    let mut seed = 424243u64;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (seed >> 33) as u32
    };
    (0..count)
        .map(|_| {
            let x = 8 + next() % (width - 48);
            let y = 8 + next() % (height - 16);
            (x, y)
        })
        .collect()
}

/// A frame whose scene content is the speckle layout shifted by
/// `(shift_x, 0)` pixels.
fn speckle_frame(width: u32, height: u32, shift_x: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    for (sx, sy) in speckle_layout(50, width, height) {
        for dy in 0..4 {
            for dx in 0..4 {
                frame.set_pixel(sx + shift_x + dx, sy + dy, [230, 230, 230]);
            }
        }
    }
    frame
}

/// A video of `count` frames, each translated `step` pixels right of the
/// previous one.
fn translating_video(count: usize, step: u32) -> Vec<FrameBuffer> {
    (0..count)
        .map(|i| speckle_frame(160, 120, i as u32 * step))
        .collect()
}

fn run_to_memory(
    source: &mut SyntheticSource,
    params: &StabilizationParams,
) -> (
    Result<steady_pipeline::StabilizationReport>,
    Rc<RefCell<Vec<FrameBuffer>>>,
    bool,
) {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink_frames = frames.clone();
    let sink_created = Cell::new(false);
    let report = run(
        source,
        |_| {
            sink_created.set(true);
            Ok(MemorySink {
                frames: sink_frames,
            })
        },
        params,
        None,
    );
    (report, frames, sink_created.get())
}

// ── Motion recovery ────────────────────────────────────────────

#[test]
fn five_frame_translation_recovers_motion() {
    let frames = translating_video(5, 2);
    let mut estimator = MotionEstimator::new(EstimatorParams::default());
    for frame in &frames {
        estimator.process_frame(GrayImage::from_frame(frame));
    }
    let motions = estimator.into_motions();
    assert_eq!(motions.len(), 4);
    for motion in &motions {
        assert!((motion.dx - 2.0).abs() < 0.75, "dx = {}", motion.dx);
        assert!(motion.dy.abs() < 0.75, "dy = {}", motion.dy);
        assert!(motion.da.abs() < 0.05, "da = {}", motion.da);
    }

    let trajectory = cumulative_trajectory(&motions);
    for (i, expected) in [2.0f32, 4.0, 6.0, 8.0].iter().enumerate() {
        assert!(
            (trajectory[i].dx - expected).abs() < 1.5,
            "trajectory[{i}].dx = {}",
            trajectory[i].dx
        );
    }

    // With a window larger than the sequence, corrections redistribute
    // the motion toward its mean.
    let corrective = corrective_motions(&motions, 30);
    let mean = corrective.iter().map(|m| m.dx).sum::<f32>() / corrective.len() as f32;
    assert!((mean - 2.0).abs() < 0.75, "mean corrective dx = {mean}");
}

// ── Full pipeline runs ─────────────────────────────────────────

#[test]
fn pipeline_emits_one_frame_less_than_input() {
    let mut source = SyntheticSource::new(translating_video(6, 2));
    let (report, frames, _) = run_to_memory(&mut source, &StabilizationParams::default());
    let report = report.unwrap();

    assert_eq!(report.frames_decoded, 6);
    assert_eq!(report.motion_pairs, 5);
    assert_eq!(report.frames_written, 5);

    let frames = frames.borrow();
    assert_eq!(frames.len(), 5);
    for frame in frames.iter() {
        assert_eq!(frame.width(), 160);
        assert_eq!(frame.height(), 120);
    }
    assert_eq!(source.rewinds, 1);
}

#[test]
fn static_scene_passes_through_unchanged() {
    let frames: Vec<FrameBuffer> = (0..5).map(|_| speckle_frame(160, 120, 0)).collect();
    let original = frames[0].clone();
    let mut source = SyntheticSource::new(frames);
    let (report, written, _) = run_to_memory(&mut source, &StabilizationParams::default());
    let report = report.unwrap();

    assert_eq!(report.frames_written, 4);
    // Zero estimated motion means a zero corrective transform, which is
    // an exact identity warp.
    for frame in written.borrow().iter() {
        assert_eq!(*frame, original);
    }
}

// ── Boundaries and failure modes ───────────────────────────────

#[test]
fn one_frame_input_produces_empty_output() {
    let mut source = SyntheticSource::new(translating_video(1, 2));
    let (report, frames, sink_created) =
        run_to_memory(&mut source, &StabilizationParams::default());
    let report = report.unwrap();

    assert_eq!(report.frames_decoded, 1);
    assert_eq!(report.motion_pairs, 0);
    assert_eq!(report.frames_written, 0);
    assert!(frames.borrow().is_empty());
    assert!(!sink_created, "no output should be created for a 1-frame input");
}

#[test]
fn empty_input_is_a_first_frame_error() {
    let mut source = SyntheticSource::new(Vec::new());
    let (report, _, sink_created) = run_to_memory(&mut source, &StabilizationParams::default());
    assert!(matches!(report, Err(SteadyError::FirstFrame(_))));
    assert!(!sink_created);
}

#[test]
fn decode_truncation_shortens_both_passes() {
    // 10 advertised frames, but decoding stops after 3.
    let mut source = SyntheticSource::new(translating_video(10, 2));
    source.fail_after = Some(3);

    let params = StabilizationParams {
        output: OutputSettings {
            codec: VideoCodec::Vp9,
            crf: None,
        },
        ..Default::default()
    };
    let (report, frames, _) = run_to_memory(&mut source, &params);
    let report = report.unwrap();

    assert_eq!(report.frames_decoded, 3);
    assert_eq!(report.motion_pairs, 2);
    assert_eq!(report.frames_written, 2);
    assert_eq!(frames.borrow().len(), 2);
}

#[test]
fn advertised_count_caps_the_estimation_pass() {
    // The source advertises fewer frames than it could deliver; the
    // pipeline must stop at the advertised count.
    let mut source = SyntheticSource::new(translating_video(8, 2));
    source.advertised = 4;
    let (report, _, _) = run_to_memory(&mut source, &StabilizationParams::default());
    let report = report.unwrap();
    assert_eq!(report.frames_decoded, 4);
    assert_eq!(report.motion_pairs, 3);
    assert_eq!(report.frames_written, 3);
}

#[test]
fn progress_is_reported_during_resynthesis() {
    let mut source = SyntheticSource::new(translating_video(15, 1));
    let reports = RefCell::new(Vec::new());
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink_frames = frames.clone();
    let report = run(
        &mut source,
        |_| {
            Ok(MemorySink {
                frames: sink_frames,
            })
        },
        &StabilizationParams::default(),
        Some(&|progress| reports.borrow_mut().push(progress)),
    )
    .unwrap();

    assert_eq!(report.frames_written, 14);
    let reports = reports.borrow();
    // Every 10 frames plus the final one: indices 0, 10, 13.
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].current_frame, 0);
    assert_eq!(reports[1].current_frame, 10);
    assert_eq!(reports[2].current_frame, 13);
    for progress in reports.iter() {
        assert_eq!(progress.total_frames, 15);
        assert!(progress.fraction() <= 1.0);
    }
}

// ── Corrective motion sanity ───────────────────────────────────

#[test]
fn corrective_motion_formula_matches_definition() {
    let motions = vec![
        RigidMotion::new(4.0, -1.0, 0.02),
        RigidMotion::new(-2.0, 3.0, -0.01),
        RigidMotion::new(1.0, 1.0, 0.00),
    ];
    let window = 2;
    let trajectory = cumulative_trajectory(&motions);
    let smoothed = steady_tracking::trajectory::smooth_trajectory(&trajectory, window);
    let corrective = corrective_motions(&motions, window);
    for i in 0..motions.len() {
        let expected = motions[i] + (smoothed[i] - trajectory[i]);
        assert!((corrective[i].dx - expected.dx).abs() < 1e-5);
        assert!((corrective[i].dy - expected.dy).abs() < 1e-5);
        assert!((corrective[i].da - expected.da).abs() < 1e-5);
    }
}
