//! End-to-end trend analysis.
//!
//! [`TrendPipeline`] chains the stages in order and reports progress at fixed
//! milestones (see [`crate::constants::progress`]). Every stage error is
//! returned unchanged.

use crate::{
    angles::{compute_hip_angles, subtract_offset, AngleSample},
    calibration::compute_offset,
    constants::{progress, DEFAULT_MAX_ALLOWED_GAP, DEFAULT_MIN_WINDOW_LEN, DEFAULT_ROLE_FRAMES},
    interpolation::interpolate_missing,
    roles::{label_table, RoleAssignment},
    summary::{generate_summary, SummaryTable},
    table::{FrameTable, RoleFrameTable},
    tracker::Tracker,
    trend_io::load_trend,
    validation::validate_detection,
    windowing::{collapse_windows, detect_windows, locate_test_window, TestWindow},
    Error, Result,
};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Tunable parameters of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineParams {
    /// Opening frames inspected for role assignment
    pub n_frames: usize,
    /// Longest tolerated run of missing hip samples
    pub max_allowed_gap: usize,
    /// Undetected reference runs shorter than this are noise
    pub min_window_len: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            n_frames: DEFAULT_ROLE_FRAMES,
            max_allowed_gap: DEFAULT_MAX_ALLOWED_GAP,
            min_window_len: DEFAULT_MIN_WINDOW_LEN,
        }
    }
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Marker chosen for each role
    pub assignment: RoleAssignment,
    /// Baseline tilt in degrees
    pub offset: f64,
    /// Rows of the repaired table covered by the test
    pub window: TestWindow,
    /// Repaired rows inside the test window
    pub segment: RoleFrameTable,
    /// Offset-corrected hip angle trend
    pub series: Vec<AngleSample>,
    /// Max, min, mean and duration of the trend
    pub summary: SummaryTable,
}

/// Sequential hip trend pipeline
#[derive(Debug, Clone, Default)]
pub struct TrendPipeline {
    params: PipelineParams,
}

impl TrendPipeline {
    #[must_use]
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    /// Analyze an already tracked frame table
    ///
    /// `on_progress` receives the milestones from roles assigned (25) up to
    /// done (100).
    ///
    /// # Errors
    ///
    /// Returns the first stage error: [`Error::InsufficientMarkers`],
    /// [`Error::InsufficientDetection`], [`Error::NoTestWindow`],
    /// [`Error::DegenerateGeometry`] or [`Error::InvalidInput`].
    pub fn run(&self, table: &FrameTable, on_progress: &mut dyn FnMut(u8)) -> Result<PipelineOutput> {
        info!("Analyzing {} frames", table.len());

        let (assignment, labelled) = label_table(table, self.params.n_frames)?;
        on_progress(progress::ROLES_ASSIGNED);

        validate_detection(&labelled, self.params.max_allowed_gap)?;
        on_progress(progress::VALIDATED);

        let repaired = interpolate_missing(&labelled);
        debug!("{} of {} rows kept after interpolation", repaired.len(), labelled.len());
        on_progress(progress::INTERPOLATED);

        let offset = compute_offset(&repaired)?;

        let windows = collapse_windows(&detect_windows(&repaired), self.params.min_window_len);
        let window = locate_test_window(&repaired, &windows)?;
        let segment = repaired.slice_inclusive(window.start, window.end);
        info!(
            "Test window: rows {}..={} ({:.2}s to {:.2}s)",
            window.start, window.end, window.start_time, window.end_time
        );
        on_progress(progress::WINDOW_CROPPED);

        let series = subtract_offset(&compute_hip_angles(&segment)?, offset);
        on_progress(progress::ANGLES_COMPUTED);

        let summary = generate_summary(&series)?;
        on_progress(progress::SUMMARY_BUILT);

        info!("Analysis complete: {} samples", series.len());
        on_progress(progress::DONE);

        Ok(PipelineOutput {
            assignment,
            offset,
            window,
            segment,
            series,
            summary,
        })
    }

    /// Track `source` and analyze the result
    ///
    /// Reports tracking started (10) before the tracker runs.
    ///
    /// # Errors
    ///
    /// Returns tracker errors as well as everything [`Self::run`] returns.
    pub fn process(
        &self,
        tracker: &mut dyn Tracker,
        source: &Path,
        dictionary: &str,
        frame_step: usize,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<PipelineOutput> {
        on_progress(progress::TRACKING_STARTED);
        info!("Tracking {} with {}", source.display(), tracker.name());
        let table = tracker.track(source, dictionary, frame_step)?;
        self.run(&table, on_progress)
    }

    /// Reload a saved trend and rebuild its summary
    ///
    /// # Errors
    ///
    /// Returns I/O and parse errors from loading, and
    /// [`Error::InvalidInput`] for an empty file.
    pub fn summarize_saved<P: AsRef<Path>>(path: P) -> Result<(Vec<AngleSample>, SummaryTable)> {
        let series = load_trend(path)?;
        let summary = generate_summary(&series)?;
        Ok((series, summary))
    }
}

/// Run a pipeline on a worker thread
///
/// Progress values arrive on the returned receiver; the handle yields the
/// result once the worker finishes.
pub fn spawn_analysis(
    pipeline: TrendPipeline,
    mut tracker: Box<dyn Tracker>,
    source: PathBuf,
    dictionary: String,
    frame_step: usize,
) -> (JoinHandle<Result<PipelineOutput>>, Receiver<u8>) {
    let (sender, receiver) = mpsc::channel();
    let handle = thread::spawn(move || {
        let mut report = |value: u8| {
            sender.send(value).ok();
        };
        pipeline.process(tracker.as_mut(), &source, &dictionary, frame_step, &mut report)
    });
    (handle, receiver)
}

/// Join a worker started by [`spawn_analysis`]
///
/// # Errors
///
/// Returns the worker's result, or [`Error::Worker`] with the panic message
/// if it panicked.
pub fn join_analysis(handle: JoinHandle<Result<PipelineOutput>>) -> Result<PipelineOutput> {
    handle.join().map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Error::Worker(message)
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::MarkerRole;
    use crate::summary::Metric;
    use crate::table::{Frame, MarkerId};
    use approx::assert_abs_diff_eq;

    const FPS: f64 = 30.0;

    /// 40 frames, tibia hidden for rows 20..30, hip_test rising by 2px per
    /// row inside the window and `tilt` px below level at rest
    fn session(tilt: f64) -> FrameTable {
        let frames = (0..40)
            .map(|i| {
                let index = i * 4;
                let mut frame = Frame::empty(index, index as f64 / FPS);
                if !(20..30).contains(&i) {
                    frame = frame.with(MarkerId(7), 100.0, 400.0);
                }
                let lift = if (20..30).contains(&i) { 2.0 * (i - 19) as f64 } else { 0.0 };
                frame
                    .with(MarkerId(3), 20.0, 200.0)
                    .with(MarkerId(5), 110.0, 200.0 + tilt - lift)
            })
            .collect();
        FrameTable::new(frames).unwrap()
    }

    #[test]
    fn test_full_run() {
        let pipeline = TrendPipeline::default();
        let mut seen = Vec::new();
        let output = pipeline.run(&session(0.0), &mut |p| seen.push(p)).unwrap();

        assert_eq!(seen, vec![25, 40, 55, 70, 85, 95, 100]);
        assert_eq!(output.assignment.marker_for(MarkerRole::Tibia), MarkerId(7));
        assert_eq!(output.assignment.marker_for(MarkerRole::HipTest), MarkerId(5));
        assert_eq!(output.assignment.marker_for(MarkerRole::HipBase), MarkerId(3));
        assert_abs_diff_eq!(output.offset, 0.0, epsilon = 1e-12);
        assert_eq!((output.window.start, output.window.end), (20, 30));
        assert_eq!(output.series.len(), 11);
        assert_eq!(output.segment.len(), output.series.len());

        let duration = output.summary.get(Metric::Duration).value;
        assert_abs_diff_eq!(duration, 40.0 / FPS, epsilon = 1e-9);
        // Image y grows downward, so the highest lift (row 29) is the minimum
        let min = output.summary.get(Metric::Min);
        assert_abs_diff_eq!(min.value, (-20.0f64 / 90.0).atan().to_degrees(), epsilon = 1e-12);
        assert_abs_diff_eq!(min.moment.unwrap(), 116.0 / FPS, epsilon = 1e-9);
        assert_abs_diff_eq!(output.summary.get(Metric::Max).value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_offset_removed_from_every_sample() {
        let output = TrendPipeline::default().run(&session(9.0), &mut |_| {}).unwrap();
        assert_abs_diff_eq!(output.offset, (9.0f64 / 90.0).atan().to_degrees(), epsilon = 1e-12);

        let raw = compute_hip_angles(&output.segment).unwrap();
        for (corrected, raw) in output.series.iter().zip(&raw) {
            assert_eq!(corrected.time, raw.time);
            assert_abs_diff_eq!(corrected.angle, raw.angle - output.offset, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_errors_stop_progress() {
        let frames = (0..10)
            .map(|i| Frame::empty(i, i as f64 / FPS).with(MarkerId(1), 1.0, 2.0))
            .collect();
        let table = FrameTable::new(frames).unwrap();
        let mut seen = Vec::new();
        let result = TrendPipeline::default().run(&table, &mut |p| seen.push(p));
        assert!(matches!(result, Err(Error::InsufficientMarkers { .. })));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_no_window_reported_after_interpolation() {
        let frames = (0..20)
            .map(|i| {
                Frame::empty(i, i as f64 / FPS)
                    .with(MarkerId(0), 100.0, 400.0)
                    .with(MarkerId(1), 20.0, 200.0)
                    .with(MarkerId(2), 110.0, 200.0)
            })
            .collect();
        let table = FrameTable::new(frames).unwrap();
        let mut seen = Vec::new();
        let result = TrendPipeline::default().run(&table, &mut |p| seen.push(p));
        assert!(matches!(result, Err(Error::NoTestWindow)));
        assert_eq!(seen, vec![25, 40, 55]);
    }

    #[test]
    fn test_spawned_worker_reports_progress() {
        let path = std::env::temp_dir().join(format!("trendetect_worker_{}.csv", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        crate::tracker::recorded::write_marker_csv(&session(0.0), file).unwrap();

        let tracker = Box::new(crate::tracker::recorded::RecordedTracker::new(FPS));
        let (handle, progress) = spawn_analysis(
            TrendPipeline::default(),
            tracker,
            path.clone(),
            "DICT_6X6_250".to_string(),
            3,
        );
        let output = join_analysis(handle).unwrap();
        let _ = std::fs::remove_file(&path);

        let seen: Vec<u8> = progress.iter().collect();
        assert_eq!(seen, vec![10, 25, 40, 55, 70, 85, 95, 100]);
        assert_eq!(output.series.len(), 11);
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let handle = thread::spawn(|| -> Result<PipelineOutput> { panic!("tracker crashed") });
        match join_analysis(handle) {
            Err(Error::Worker(message)) => assert!(message.contains("tracker crashed")),
            other => panic!("Expected Worker error, got {other:?}"),
        }
    }
}
