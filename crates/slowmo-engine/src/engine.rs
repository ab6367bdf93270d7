//! Recursive midpoint interpolation.
//!
//! Between every pair of consecutive anchors the engine requests the midpoint,
//! then recurses into the left half and the right half until `depth` levels
//! have been produced. Each pair contributes `2^depth - 1` synthesized frames,
//! so `N` anchors expand to `(N - 1) * (2^depth - 1) + N` output frames, in
//! temporal order, with every anchor appearing exactly once.

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tracing::debug;

use slowmo_models::{FrameBuffer, FrameSequence, MAX_TIMES_TO_INTERPOLATE};

use crate::error::{EngineError, EngineResult};
use crate::interpolator::{FrameInterpolator, MIDPOINT};

/// Receives a tick for every synthesized frame.
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first capability call.
    fn on_start(&self, _total_midpoints: u64) {}

    /// Called after each successful capability call.
    fn on_midpoint(&self);
}

/// Observer that just counts.
#[derive(Debug, Default)]
pub struct CountingObserver {
    expected: AtomicU64,
    completed: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected(&self) -> u64 {
        self.expected.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for CountingObserver {
    fn on_start(&self, total_midpoints: u64) {
        self.expected.store(total_midpoints, Ordering::Relaxed);
    }

    fn on_midpoint(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Number of frames produced from `anchors` input frames.
pub fn expanded_len(anchors: usize, depth: u32) -> usize {
    if anchors == 0 {
        return 0;
    }
    (anchors - 1) * per_pair(depth) + anchors
}

/// Number of capability calls needed for `anchors` input frames.
pub fn synthesized_count(anchors: usize, depth: u32) -> u64 {
    (anchors.saturating_sub(1) * per_pair(depth)) as u64
}

fn per_pair(depth: u32) -> usize {
    (1usize << depth) - 1
}

/// Expands anchor frames by recursive midpoint synthesis.
#[derive(Debug, Clone, Copy)]
pub struct RecursiveInterpolationEngine {
    depth: u32,
}

impl RecursiveInterpolationEngine {
    pub fn new(depth: u32) -> EngineResult<Self> {
        if depth > MAX_TIMES_TO_INTERPOLATE {
            return Err(EngineError::DepthTooLarge {
                requested: depth,
                max: MAX_TIMES_TO_INTERPOLATE,
            });
        }
        Ok(Self { depth })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Expand `anchors` on the calling thread.
    ///
    /// Capability calls happen in depth-first order: the midpoint of a span,
    /// then the whole left half, then the whole right half. The first failing
    /// call aborts the run and nothing partial is returned.
    pub fn interpolate<I>(
        &self,
        interpolator: &I,
        anchors: Vec<FrameBuffer>,
        observer: Option<&dyn ProgressObserver>,
    ) -> EngineResult<FrameSequence>
    where
        I: FrameInterpolator + ?Sized,
    {
        self.start(interpolator, &anchors, observer);

        let mut output = FrameSequence::with_capacity(expanded_len(anchors.len(), self.depth));
        let mut anchors = anchors.into_iter().enumerate().peekable();

        while let Some((pair, left)) = anchors.next() {
            let mut interior = Vec::with_capacity(per_pair(self.depth));
            if let Some((_, right)) = anchors.peek() {
                expand_span(interpolator, &left, right, self.depth, pair, observer, &mut interior)?;
            }
            output.push(left);
            output.extend(interior);
        }

        Ok(output)
    }

    /// Expand `anchors` with one pool task per anchor pair.
    ///
    /// Produces exactly the frames [`interpolate`](Self::interpolate) does, in
    /// the same order. Call order across pairs is unspecified; within a pair it
    /// is depth-first as in the sequential variant.
    pub fn interpolate_parallel<I>(
        &self,
        pool: &rayon::ThreadPool,
        interpolator: &I,
        anchors: Vec<FrameBuffer>,
        observer: Option<&dyn ProgressObserver>,
    ) -> EngineResult<FrameSequence>
    where
        I: FrameInterpolator + ?Sized,
    {
        self.start(interpolator, &anchors, observer);

        let depth = self.depth;
        let pairs = anchors.len().saturating_sub(1);
        let interiors: Vec<Vec<FrameBuffer>> = pool.install(|| {
            (0..pairs)
                .into_par_iter()
                .map(|pair| {
                    let mut interior = Vec::with_capacity(per_pair(depth));
                    expand_span(
                        interpolator,
                        &anchors[pair],
                        &anchors[pair + 1],
                        depth,
                        pair,
                        observer,
                        &mut interior,
                    )?;
                    Ok(interior)
                })
                .collect::<EngineResult<Vec<_>>>()
        })?;

        let mut output = FrameSequence::with_capacity(expanded_len(anchors.len(), depth));
        let mut interiors = interiors.into_iter();
        for anchor in anchors {
            output.push(anchor);
            if let Some(interior) = interiors.next() {
                output.extend(interior);
            }
        }

        Ok(output)
    }

    fn start<I>(
        &self,
        interpolator: &I,
        anchors: &[FrameBuffer],
        observer: Option<&dyn ProgressObserver>,
    ) where
        I: FrameInterpolator + ?Sized,
    {
        let total = synthesized_count(anchors.len(), self.depth);
        debug!(
            interpolator = interpolator.name(),
            anchors = anchors.len(),
            depth = self.depth,
            midpoints = total,
            "Starting recursive interpolation"
        );
        if let Some(observer) = observer {
            observer.on_start(total);
        }
    }
}

/// Append the `2^depth - 1` frames strictly between `a` and `b` to `out`.
fn expand_span<I>(
    interpolator: &I,
    a: &FrameBuffer,
    b: &FrameBuffer,
    depth: u32,
    pair: usize,
    observer: Option<&dyn ProgressObserver>,
    out: &mut Vec<FrameBuffer>,
) -> EngineResult<()>
where
    I: FrameInterpolator + ?Sized,
{
    if depth == 0 {
        return Ok(());
    }

    let mid = interpolator
        .interpolate(a, b, MIDPOINT)
        .map_err(|source| EngineError::Interpolation { pair, source })?;
    if let Some(observer) = observer {
        observer.on_midpoint();
    }

    expand_span(interpolator, a, &mid, depth - 1, pair, observer, out)?;

    let mut right = Vec::with_capacity(per_pair(depth - 1));
    expand_span(interpolator, &mid, b, depth - 1, pair, observer, &mut right)?;

    out.push(mid);
    out.append(&mut right);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::InterpolationError;
    use crate::interpolator::{InterpolatorSettings, LinearBlendInterpolator};

    /// 1x1 frame whose every channel holds `value`.
    fn tick(value: f32) -> FrameBuffer {
        FrameBuffer::filled(1, 1, [value; 3])
    }

    fn value_of(frame: &FrameBuffer) -> f32 {
        frame.data()[0]
    }

    fn anchors(n: usize) -> Vec<FrameBuffer> {
        (0..n).map(|i| tick(i as f32)).collect()
    }

    /// Linear blend that records every call as `(a, b, t)`.
    #[derive(Default)]
    struct Recording {
        inner: LinearBlendInterpolator,
        calls: Mutex<Vec<(f32, f32, f32)>>,
    }

    impl FrameInterpolator for Recording {
        fn interpolate(
            &self,
            a: &FrameBuffer,
            b: &FrameBuffer,
            t: f32,
        ) -> Result<FrameBuffer, InterpolationError> {
            self.calls.lock().unwrap().push((value_of(a), value_of(b), t));
            self.inner.interpolate(a, b, t)
        }

        fn settings(&self) -> &InterpolatorSettings {
            self.inner.settings()
        }

        fn configure(&mut self, settings: InterpolatorSettings) {
            self.inner.configure(settings);
        }
    }

    /// Fails on the `fail_on`-th call (1-based).
    struct FailingAfter {
        fail_on: usize,
        calls: Mutex<usize>,
        settings: InterpolatorSettings,
    }

    impl FailingAfter {
        fn new(fail_on: usize) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(0),
                settings: InterpolatorSettings::default(),
            }
        }
    }

    impl FrameInterpolator for FailingAfter {
        fn interpolate(
            &self,
            a: &FrameBuffer,
            b: &FrameBuffer,
            t: f32,
        ) -> Result<FrameBuffer, InterpolationError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == self.fail_on {
                return Err(InterpolationError::new("model crashed"));
            }
            LinearBlendInterpolator::default().interpolate(a, b, t)
        }

        fn settings(&self) -> &InterpolatorSettings {
            &self.settings
        }

        fn configure(&mut self, _settings: InterpolatorSettings) {}
    }

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap()
    }

    #[test]
    fn test_output_length_matches_formula() {
        let interpolator = LinearBlendInterpolator::default();
        for n in 0..5 {
            for depth in 0..4 {
                let engine = RecursiveInterpolationEngine::new(depth).unwrap();
                let out = engine.interpolate(&interpolator, anchors(n), None).unwrap();
                assert_eq!(out.len(), expanded_len(n, depth), "n={} depth={}", n, depth);
            }
        }
        assert_eq!(expanded_len(2, 3), 9);
        assert_eq!(expanded_len(5, 2), 17);
    }

    #[test]
    fn test_depth_zero_is_identity() {
        let recording = Recording::default();
        let engine = RecursiveInterpolationEngine::new(0).unwrap();

        let out = engine.interpolate(&recording, anchors(4), None).unwrap();
        assert_eq!(out.into_buffers(), anchors(4));
        assert!(recording.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_single_and_empty_input() {
        let recording = Recording::default();
        let engine = RecursiveInterpolationEngine::new(3).unwrap();

        assert!(engine.interpolate(&recording, Vec::new(), None).unwrap().is_empty());

        let out = engine.interpolate(&recording, vec![tick(0.25)], None).unwrap();
        assert_eq!(out.into_buffers(), vec![tick(0.25)]);
        assert!(recording.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_red_blue_single_level() {
        let red = FrameBuffer::filled(4, 4, [1.0, 0.0, 0.0]);
        let blue = FrameBuffer::filled(4, 4, [0.0, 0.0, 1.0]);
        let engine = RecursiveInterpolationEngine::new(1).unwrap();

        let out = engine
            .interpolate(&LinearBlendInterpolator::default(), vec![red.clone(), blue.clone()], None)
            .unwrap()
            .into_buffers();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], red);
        assert_eq!(out[1], FrameBuffer::filled(4, 4, [0.5, 0.0, 0.5]));
        assert_eq!(out[2], blue);
    }

    #[test]
    fn test_frames_are_in_temporal_order() {
        let engine = RecursiveInterpolationEngine::new(3).unwrap();
        let out = engine
            .interpolate(&LinearBlendInterpolator::default(), anchors(3), None)
            .unwrap();

        let values: Vec<f32> = out.iter().map(|frame| value_of(&frame.buffer)).collect();
        let expected: Vec<f32> = (0..=16).map(|i| i as f32 / 8.0).collect();
        assert_eq!(values, expected);

        let indices: Vec<usize> = out.iter().map(|frame| frame.index).collect();
        assert_eq!(indices, (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn test_calls_use_adjacent_frames_at_midpoint() {
        let recording = Recording::default();
        let depth = 3;
        RecursiveInterpolationEngine::new(depth)
            .unwrap()
            .interpolate(&recording, anchors(3), None)
            .unwrap();

        let calls = recording.calls.lock().unwrap();
        assert_eq!(calls.len() as u64, synthesized_count(3, depth));

        // Each call spans one node of the dyadic subdivision of an anchor gap.
        for &(a, b, t) in calls.iter() {
            assert_eq!(t, MIDPOINT);
            let span = b - a;
            assert!(span > 0.0);
            let level = (1.0 / span).log2();
            assert_eq!(level.fract(), 0.0, "span {} is not a dyadic step", span);
            assert!(level < depth as f32);
            assert_eq!((a / span).fract(), 0.0, "call ({}, {}) is not aligned", a, b);
        }

        // Depth-first: the top-level midpoint of the first pair comes first,
        // followed by its left quarter.
        assert_eq!(calls[0], (0.0, 1.0, 0.5));
        assert_eq!(calls[1], (0.0, 0.5, 0.5));
        assert_eq!(calls[2], (0.0, 0.25, 0.5));
    }

    #[test]
    fn test_failure_aborts_run() {
        let failing = FailingAfter::new(3);
        let err = RecursiveInterpolationEngine::new(2)
            .unwrap()
            .interpolate(&failing, anchors(4), None)
            .unwrap_err();

        match err {
            EngineError::Interpolation { pair, source } => {
                assert_eq!(pair, 0);
                assert_eq!(source.message(), "model crashed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(*failing.calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_failure_reports_pair() {
        let failing = FailingAfter::new(5);
        let err = RecursiveInterpolationEngine::new(2)
            .unwrap()
            .interpolate(&failing, anchors(3), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Interpolation { pair: 1, .. }));
        assert!(err.to_string().contains("anchors 1 and 2"));
    }

    #[test]
    fn test_depth_limit() {
        assert!(RecursiveInterpolationEngine::new(MAX_TIMES_TO_INTERPOLATE).is_ok());
        assert!(matches!(
            RecursiveInterpolationEngine::new(MAX_TIMES_TO_INTERPOLATE + 1),
            Err(EngineError::DepthTooLarge { requested: 9, max: 8 })
        ));
    }

    #[test]
    fn test_observer_counts_midpoints() {
        let observer = CountingObserver::new();
        RecursiveInterpolationEngine::new(2)
            .unwrap()
            .interpolate(&LinearBlendInterpolator::default(), anchors(5), Some(&observer))
            .unwrap();

        assert_eq!(observer.expected(), 12);
        assert_eq!(observer.completed(), 12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let interpolator = LinearBlendInterpolator::default();
        let engine = RecursiveInterpolationEngine::new(3).unwrap();
        let observer = CountingObserver::new();

        let sequential = engine.interpolate(&interpolator, anchors(6), None).unwrap();
        let parallel = engine
            .interpolate_parallel(&pool(), &interpolator, anchors(6), Some(&observer))
            .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(observer.completed(), synthesized_count(6, 3));
    }

    #[test]
    fn test_parallel_failure_aborts_run() {
        let failing = FailingAfter::new(4);
        let result = RecursiveInterpolationEngine::new(2)
            .unwrap()
            .interpolate_parallel(&pool(), &failing, anchors(5), None);
        assert!(matches!(result, Err(EngineError::Interpolation { .. })));
    }

    #[test]
    fn test_parallel_edge_cases() {
        let engine = RecursiveInterpolationEngine::new(2).unwrap();
        let interpolator = LinearBlendInterpolator::default();

        assert!(engine
            .interpolate_parallel(&pool(), &interpolator, Vec::new(), None)
            .unwrap()
            .is_empty());
        assert_eq!(
            engine
                .interpolate_parallel(&pool(), &interpolator, vec![tick(1.0)], None)
                .unwrap()
                .len(),
            1
        );
    }
}
