//! Motion blur frame-interval scheduling
//!
//! For every base frame of an animation range the builder lays out the
//! shutter interval `[base + center - duration / 2, base + center + duration / 2]`
//! and subdivides it into the global sample count, plus one independent
//! subdivision per distinct per-object sample count. All sample times are
//! merged into one ordered map keyed by exact frame value.
//!
//! Frame values are offsets from the first frame of the range: the first
//! base frame is `0.0`. [`MotionBlurBuilder::scene_frame`] converts back to
//! scene frames.

use crate::core::{AnimationSettings, MotionBlurSettings};
use crate::foundation::collections::FrameKey;
use crate::scene::{Scene, TrackId};
use log::debug;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

/// Why a time sample is exported
///
/// Ordered by precedence: when two reasons produce the same time, the
/// greater one is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameType {
    /// Produced only by a per-object sample count
    FromObjectSamples,
    /// Produced by the global sample count
    FromGlobalSamples,
    /// A base frame; an image is rendered here
    ForRendering,
}

/// One time sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionBlurFrameData {
    /// Strongest reason this sample exists
    pub frame_type: FrameType,
    /// Objects whose per-object subdivision produced this sample
    pub objects: BTreeSet<TrackId>,
    /// Whether this is the last sample of some frame's interval
    pub last_in_interval: bool,
}

impl MotionBlurFrameData {
    fn new(frame_type: FrameType) -> Self {
        Self {
            frame_type,
            objects: BTreeSet::new(),
            last_in_interval: false,
        }
    }
}

/// Precomputed sample schedule for an animation range
#[derive(Debug, Default)]
pub struct MotionBlurBuilder {
    frames: BTreeMap<FrameKey, MotionBlurFrameData>,
    /// Objects belonging to any override group
    overridden: BTreeSet<TrackId>,
    frame_start: i32,
    current: Cell<Option<FrameKey>>,
}

impl MotionBlurBuilder {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the schedule for the whole animation range
    pub fn initialize(&mut self, blur: &MotionBlurSettings, scene: &Scene, animation: &AnimationSettings) {
        self.frames.clear();
        self.overridden.clear();
        self.current.set(None);
        self.frame_start = animation.frame_start;

        let step = animation.frame_step.max(1);
        let bases: Vec<f64> = (animation.frame_start..=animation.frame_end)
            .step_by(step as usize)
            .map(|frame| f64::from(frame - animation.frame_start))
            .collect();

        if blur.is_degenerate() {
            for base in bases {
                let mut data = MotionBlurFrameData::new(FrameType::ForRendering);
                data.last_in_interval = true;
                self.frames.insert(FrameKey::new(base), data);
            }
            debug!("Motion blur disabled or degenerate, {} render frames", self.frames.len());
            return;
        }

        let global = blur.geom_samples;
        let mut groups: BTreeMap<u32, BTreeSet<TrackId>> = BTreeMap::new();
        for object in scene.objects() {
            match object.mb_samples {
                Some(samples) if samples != 0 && samples != global => {
                    groups.entry(samples).or_default().insert(object.track_id);
                }
                _ => {}
            }
        }
        self.overridden = groups.values().flatten().copied().collect();

        for base in bases {
            let mut interval_end: Option<FrameKey> = None;

            for time in interval_samples(base, blur.interval_center, blur.duration, global) {
                let key = FrameKey::new(time);
                self.merge(key, FrameType::FromGlobalSamples, None);
                interval_end = Some(interval_end.map_or(key, |end| end.max(key)));
            }

            for (samples, objects) in &groups {
                for time in interval_samples(base, blur.interval_center, blur.duration, *samples) {
                    let key = FrameKey::new(time);
                    self.merge(key, FrameType::FromObjectSamples, Some(objects));
                    interval_end = Some(interval_end.map_or(key, |end| end.max(key)));
                }
            }

            self.merge(FrameKey::new(base), FrameType::ForRendering, None);
            // the base frame may lie outside its own interval
            if let Some(data) = interval_end.and_then(|end| self.frames.get_mut(&end)) {
                data.last_in_interval = true;
            }
        }

        debug!(
            "Motion blur schedule: {} samples, {} override groups",
            self.frames.len(),
            groups.len()
        );
    }

    fn merge(&mut self, key: FrameKey, frame_type: FrameType, objects: Option<&BTreeSet<TrackId>>) {
        let data = self
            .frames
            .entry(key)
            .or_insert_with(|| MotionBlurFrameData::new(frame_type));
        data.frame_type = data.frame_type.max(frame_type);
        if let Some(objects) = objects {
            data.objects.extend(objects.iter().copied());
        }
    }

    /// All distinct sample times in ascending order
    ///
    /// Each yielded value becomes the current sample consulted by
    /// [`objects_for_export`](Self::objects_for_export).
    pub fn frames(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.keys().map(move |key| {
            self.current.set(Some(*key));
            key.value()
        })
    }

    /// Record for one sample time
    pub fn frame_data(&self, frame: f64) -> Option<&MotionBlurFrameData> {
        self.frames.get(&FrameKey::new(frame))
    }

    /// The sample last yielded by [`frames`](Self::frames)
    pub fn current_frame(&self) -> Option<f64> {
        self.current.get().map(FrameKey::value)
    }

    /// Record of the current sample
    pub fn current_data(&self) -> Option<&MotionBlurFrameData> {
        self.current.get().and_then(|key| self.frames.get(&key))
    }

    /// Scene frame corresponding to a sample time
    pub fn scene_frame(&self, frame: f64) -> f64 {
        f64::from(self.frame_start) + frame
    }

    /// Filter `all` down to the objects to export at the current sample
    ///
    /// Without a current sample every object is returned.
    pub fn objects_for_export(&self, all: &[TrackId]) -> Vec<TrackId> {
        let data = match self.current_data() {
            Some(data) => data,
            None => return all.to_vec(),
        };

        match data.frame_type {
            FrameType::ForRendering => all.to_vec(),
            FrameType::FromGlobalSamples => all
                .iter()
                .copied()
                .filter(|id| !self.overridden.contains(id) || data.objects.contains(id))
                .collect(),
            FrameType::FromObjectSamples => all
                .iter()
                .copied()
                .filter(|id| data.objects.contains(id))
                .collect(),
        }
    }

    /// Number of distinct samples
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the schedule is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Sample times of one interval subdivided into `samples` steps
///
/// The single place sample times are computed, so that equal logical
/// samples always produce bit-identical keys.
fn interval_samples(base: f64, center: f64, duration: f64, samples: u32) -> impl Iterator<Item = f64> {
    let start = base + center - duration / 2.0;
    let spacing = duration / f64::from(samples);
    (0..=samples).map(move |i| start + f64::from(i) * spacing)
}
