use std::collections::BTreeMap;

use crate::format::Sample;
use crate::{DimensionSummary, LabelCount};

#[derive(Debug, Default)]
pub(crate) struct LabelStats {
    counts: BTreeMap<char, u64>,
}

impl LabelStats {
    pub fn add(&mut self, label: char) {
        *self.counts.entry(label).or_default() += 1;
    }

    pub fn build(self) -> Vec<LabelCount> {
        self.counts
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect()
    }
}

#[derive(Debug, Default)]
pub(crate) struct DimensionStats {
    samples: u64,
    width_min: u16,
    width_max: u16,
    height_min: u16,
    height_max: u16,
    width_sum: u64,
    height_sum: u64,
    pixels_total: u64,
}

impl DimensionStats {
    pub fn add(&mut self, sample: &Sample) {
        if self.samples == 0 {
            self.width_min = sample.width;
            self.height_min = sample.height;
        }
        self.samples += 1;
        self.width_min = self.width_min.min(sample.width);
        self.width_max = self.width_max.max(sample.width);
        self.height_min = self.height_min.min(sample.height);
        self.height_max = self.height_max.max(sample.height);
        self.width_sum += sample.width as u64;
        self.height_sum += sample.height as u64;
        self.pixels_total += sample.pixels.len() as u64;
    }

    pub fn build(self) -> Option<DimensionSummary> {
        if self.samples == 0 {
            return None;
        }
        let n = self.samples as f64;
        Some(DimensionSummary {
            width_min: self.width_min,
            width_max: self.width_max,
            height_min: self.height_min,
            height_max: self.height_max,
            width_mean: self.width_sum as f64 / n,
            height_mean: self.height_sum as f64 / n,
            pixels_total: self.pixels_total,
        })
    }
}
