//! The four-stage stabilization pipeline.
//!
//! Stage 1 decodes the input sequentially, stage 2 estimates a rigid
//! motion per consecutive frame pair, stage 3 smooths the accumulated
//! trajectory into corrective motions, and stage 4 replays the input and
//! warps each frame by its correction. Stages run strictly forward;
//! the source is rewound exactly once, between the two passes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use steady_core::{Result, SteadyError};
use steady_media::{OutputSettings, VideoDecoder, VideoWriter};
use steady_tracking::estimator::{EstimatorParams, MotionEstimator};
use steady_tracking::pyramid::GrayImage;
use steady_tracking::trajectory::corrective_motions;
use tracing::{debug, info, warn};

use crate::source::{FrameSink, FrameSource};
use crate::warp::warp_rigid;

/// Stabilization parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizationParams {
    /// Maximum tracked feature count per frame.
    pub max_corners: usize,
    /// Moving-average window length, in frames.
    pub smooth_radius: usize,
    /// Output encoding settings.
    pub output: OutputSettings,
}

impl Default for StabilizationParams {
    fn default() -> Self {
        Self {
            max_corners: 1000,
            smooth_radius: 30,
            output: OutputSettings::default(),
        }
    }
}

/// Progress notification, emitted every 10 frames during resynthesis.
#[derive(Debug, Clone, Copy)]
pub struct StabilizeProgress {
    /// 0-based index of the frame just processed.
    pub current_frame: u64,
    /// Total frame count of the input (after any truncation).
    pub total_frames: u64,
}

impl StabilizeProgress {
    /// Completion fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.current_frame as f64 / self.total_frames as f64
    }
}

/// Optional progress observer. Purely observational; has no effect on
/// control flow.
pub type ProgressFn<'a> = dyn Fn(StabilizeProgress) + 'a;

/// Summary of one stabilization run.
#[derive(Debug, Clone, Copy)]
pub struct StabilizationReport {
    /// Frames successfully decoded in the estimation pass.
    pub frames_decoded: u64,
    /// Frames written to the output.
    pub frames_written: u64,
    /// Number of estimated frame-pair motions.
    pub motion_pairs: usize,
}

/// Pipeline lifecycle. States advance strictly forward and are never
/// re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Idle,
    Opened,
    Estimating,
    Smoothing,
    Resynthesizing,
    Closed,
}

impl Stage {
    fn advance(&mut self, next: Stage) {
        debug_assert!(next > *self, "pipeline stage must move forward");
        debug!("pipeline stage: {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// Run the pipeline over an opened source.
///
/// `make_sink` is called only once estimation has produced at least one
/// corrective motion, so a fatal failure earlier never creates an output
/// resource. A one-frame input therefore completes without producing any
/// output frames.
pub fn run<S, K, F>(
    source: &mut S,
    make_sink: F,
    params: &StabilizationParams,
    on_progress: Option<&ProgressFn<'_>>,
) -> Result<StabilizationReport>
where
    S: FrameSource + ?Sized,
    K: FrameSink,
    F: FnOnce(&S) -> Result<K>,
{
    let mut stage = Stage::Idle;
    stage.advance(Stage::Opened);

    let advertised = source.frame_count();
    info!(
        "stabilizing {}x{} input, {} advertised frames",
        source.width(),
        source.height(),
        advertised
    );

    // Pass 1: motion estimation.
    stage.advance(Stage::Estimating);
    let first = source
        .read_frame()?
        .ok_or_else(|| SteadyError::FirstFrame("could not decode the first frame".into()))?;

    let mut estimator = MotionEstimator::new(EstimatorParams {
        max_corners: params.max_corners,
        ..Default::default()
    });
    estimator.process_frame(GrayImage::from_frame(&first));

    let mut frames_decoded = 1u64;
    while advertised == 0 || frames_decoded < advertised {
        match source.read_frame()? {
            Some(frame) => {
                estimator.process_frame(GrayImage::from_frame(&frame));
                frames_decoded += 1;
            }
            None => break,
        }
    }
    if advertised > frames_decoded {
        warn!(
            "input advertised {} frames but yielded {}, continuing with what decoded",
            advertised, frames_decoded
        );
    }
    let motions = estimator.into_motions();
    debug_assert_eq!(motions.len() as u64, frames_decoded - 1);

    // Trajectory smoothing.
    stage.advance(Stage::Smoothing);
    let corrective = corrective_motions(&motions, params.smooth_radius);

    // Pass 2: resynthesis.
    stage.advance(Stage::Resynthesizing);
    source.rewind()?;

    let mut frames_written = 0u64;
    if corrective.is_empty() {
        info!("input has fewer than two frames; nothing to resynthesize");
    } else {
        let mut sink = make_sink(source)?;
        for (i, &motion) in corrective.iter().enumerate() {
            let Some(frame) = source.read_frame()? else {
                warn!(
                    "input ended after {} of {} frames during resynthesis",
                    i,
                    corrective.len()
                );
                break;
            };
            let stabilized = warp_rigid(&frame, motion);
            sink.write_frame(&stabilized)?;
            if i % 10 == 0 || i == corrective.len() - 1 {
                if let Some(callback) = on_progress {
                    callback(StabilizeProgress {
                        current_frame: i as u64,
                        total_frames: frames_decoded,
                    });
                }
            }
        }
        frames_written = sink.finish()?;
    }

    stage.advance(Stage::Closed);
    info!(
        "stabilization finished: {} frames in, {} frames out",
        frames_decoded, frames_written
    );

    Ok(StabilizationReport {
        frames_decoded,
        frames_written,
        motion_pairs: motions.len(),
    })
}

/// Stabilize a video file into a new output file.
pub fn stabilize_video<P, Q>(
    input: P,
    output: Q,
    params: &StabilizationParams,
    on_progress: Option<&ProgressFn<'_>>,
) -> Result<StabilizationReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut decoder = VideoDecoder::open(input)?;
    let output = output.as_ref().to_path_buf();
    let settings = params.output.clone();
    run(
        &mut decoder,
        move |source: &VideoDecoder| {
            let (width, height) = source.dimensions();
            VideoWriter::create(&output, width, height, source.frame_rate(), &settings)
        },
        params,
        on_progress,
    )
}
