//! Ordered list of contour values.

use crate::error::{ContourError, ContourResult};

/// Contour values, processed in list order.
///
/// Output for value `i` is appended after the output of every value before
/// it, so callers can map output ranges back to list positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourValues {
    values: Vec<f64>,
}

impl ContourValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set value `index`, growing the list with zeros if needed.
    pub fn set_value(&mut self, index: usize, value: f64) {
        if index >= self.values.len() {
            self.values.resize(index + 1, 0.0);
        }
        self.values[index] = value;
    }

    /// Append a value.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    #[inline]
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Truncate or zero-extend to `count` values.
    pub fn set_number_of_values(&mut self, count: usize) {
        self.values.resize(count, 0.0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Replace the list with `count` evenly spaced values spanning `range`.
    ///
    /// A single value is placed at the start of the range.
    pub fn generate_values(&mut self, count: usize, range: (f64, f64)) -> ContourResult<()> {
        if count == 0 {
            return Err(ContourError::invalid_param(
                "count",
                "at least one contour value must be generated",
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(ContourError::invalid_param(
                "range",
                format!("range ({}, {}) must be finite", range.0, range.1),
            ));
        }

        self.values.clear();
        if count == 1 {
            self.values.push(range.0);
        } else {
            let step = (range.1 - range.0) / (count - 1) as f64;
            self.values
                .extend((0..count).map(|i| range.0 + i as f64 * step));
        }
        Ok(())
    }
}

impl From<Vec<f64>> for ContourValues {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl From<&[f64]> for ContourValues {
    fn from(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }
}

impl FromIterator<f64> for ContourValues {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
