//! Per-message mood classification results and their rolling history.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{MindEaseError, Result};

/// Highest accepted intensity value.
pub const MAX_INTENSITY: u8 = 10;

/// Default number of samples kept by [`MoodHistory`].
pub const DEFAULT_MOOD_WINDOW: usize = 20;

/// The fixed set of labels a message can be classified into.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MoodLabel {
    Calm,
    Happy,
    Sad,
    Anxious,
    Angry,
    Stressed,
    Neutral,
}

/// One classified user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSample {
    label: MoodLabel,
    intensity: u8,
    at: DateTime<Utc>,
}

impl MoodSample {
    /// Creates a sample; intensity must be within `0..=10`.
    pub fn new(label: MoodLabel, intensity: u8, at: DateTime<Utc>) -> Result<Self> {
        if intensity > MAX_INTENSITY {
            return Err(MindEaseError::invalid_input(format!(
                "mood intensity {intensity} exceeds {MAX_INTENSITY}"
            )));
        }
        Ok(Self {
            label,
            intensity,
            at,
        })
    }

    pub fn label(&self) -> MoodLabel {
        self.label
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Rolling window of the most recent mood samples, oldest first.
#[derive(Debug, Clone)]
pub struct MoodHistory {
    samples: VecDeque<MoodSample>,
    capacity: usize,
}

impl MoodHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a sample, evicting the oldest one when the window is full.
    pub fn record(&mut self, sample: MoodSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn samples(&self) -> impl Iterator<Item = &MoodSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&MoodSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most frequent label in the window; ties go to the most recent label.
    pub fn dominant(&self) -> Option<MoodLabel> {
        let mut counts: HashMap<MoodLabel, usize> = HashMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label).or_default() += 1;
        }
        let best = counts.values().copied().max()?;
        self.samples
            .iter()
            .rev()
            .map(|s| s.label)
            .find(|label| counts.get(label) == Some(&best))
    }

    pub fn average_intensity(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let total: u32 = self.samples.iter().map(|s| u32::from(s.intensity)).sum();
        Some(total as f32 / self.samples.len() as f32)
    }
}

impl Default for MoodHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MOOD_WINDOW)
    }
}
