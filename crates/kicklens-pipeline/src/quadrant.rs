//! Mapping of quadrant probabilities onto display intensities for a
//! fixed 2x3 goal grid.
//!
//! Raw probabilities may arrive as fractions or as percentages. They are
//! first brought onto a fractional scale ([`normalize`]), then scaled
//! relative to the largest entry so the most likely quadrant always
//! reaches `floor + spread` and an impossible one sits at `floor`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, ProbabilityVector};

/// Number of grid columns.
pub const COLUMNS: usize = 3;

/// Number of grid rows.
pub const ROWS: usize = 2;

/// One of the six goal regions, in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    TopLeft,
    TopMid,
    TopRight,
    BottomLeft,
    BottomMid,
    BottomRight,
}

impl Quadrant {
    /// All quadrants in probability-vector order.
    pub const ALL: [Self; ProbabilityVector::LEN] = [
        Self::TopLeft,
        Self::TopMid,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomMid,
        Self::BottomRight,
    ];

    /// The quadrant at `index` in probability-vector order.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::ALL.len() {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Position in probability-vector order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Grid row: 0 for the top band, 1 for the bottom band.
    #[must_use]
    pub const fn row(self) -> usize {
        self.index() / COLUMNS
    }

    /// Grid column: 0 left, 1 middle, 2 right.
    #[must_use]
    pub const fn col(self) -> usize {
        self.index() % COLUMNS
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "Top Left",
            Self::TopMid => "Top Middle",
            Self::TopRight => "Top Right",
            Self::BottomLeft => "Bottom Left",
            Self::BottomMid => "Bottom Middle",
            Self::BottomRight => "Bottom Right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Intensity mapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Intensity assigned to a zero-probability quadrant.
    pub floor: f64,
    /// Intensity added on top of `floor` for the most likely quadrant.
    pub spread: f64,
}

impl VisualizerConfig {
    /// Default intensity floor.
    pub const DEFAULT_FLOOR: f64 = 0.2;

    /// Default intensity spread.
    pub const DEFAULT_SPREAD: f64 = 0.4;

    /// Build a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if either value is
    /// negative or not finite, or if `floor + spread` exceeds 1.
    pub fn try_new(floor: f64, spread: f64) -> Result<Self, PipelineError> {
        let config = Self { floor, spread };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants [`try_new`](Self::try_new) enforces.
    ///
    /// Needed for configs that arrive through deserialization.
    ///
    /// # Errors
    ///
    /// Same as [`try_new`](Self::try_new).
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "floor must be a finite non-negative number, got {}",
                self.floor
            )));
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "spread must be a finite non-negative number, got {}",
                self.spread
            )));
        }
        if self.floor + self.spread > 1.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "floor + spread must not exceed 1, got {} + {}",
                self.floor, self.spread
            )));
        }
        Ok(())
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            floor: Self::DEFAULT_FLOOR,
            spread: Self::DEFAULT_SPREAD,
        }
    }
}

/// Bring raw probabilities onto a fractional scale.
///
/// If any entry exceeds 1 the whole vector is read as percentages and
/// divided by 100. An entry of exactly 1 is ambiguous and reads the
/// same either way.
#[must_use]
pub fn normalize(values: &[f64; ProbabilityVector::LEN]) -> [f64; ProbabilityVector::LEN] {
    if values.iter().any(|v| *v > 1.0) {
        values.map(|v| v / 100.0)
    } else {
        *values
    }
}

/// Axis-aligned rectangle for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One rendered grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadrantCell {
    /// Which region this cell represents.
    pub quadrant: Quadrant,
    /// Normalized (fractional) probability.
    pub probability: f64,
    /// Display intensity in `[floor, floor + spread]`.
    pub intensity: f64,
}

impl QuadrantCell {
    /// Normalized probability as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }

    /// Cell geometry inside a `width` x `height` container.
    ///
    /// The grid is scaled to the container; placement never changes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rect(&self, width: f64, height: f64) -> CellRect {
        let cell_width = width / COLUMNS as f64;
        let cell_height = height / ROWS as f64;
        CellRect {
            x: self.quadrant.col() as f64 * cell_width,
            y: self.quadrant.row() as f64 * cell_height,
            width: cell_width,
            height: cell_height,
        }
    }
}

/// A fully rendered grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadrantGrid {
    /// Cells in probability-vector order.
    pub cells: [QuadrantCell; ProbabilityVector::LEN],
    /// The most likely quadrant, or `None` if every probability is zero.
    pub dominant: Option<Quadrant>,
}

impl QuadrantGrid {
    /// The cell for `quadrant`.
    #[must_use]
    pub const fn cell(&self, quadrant: Quadrant) -> &QuadrantCell {
        &self.cells[quadrant.index()]
    }
}

/// Converts probability vectors into display intensities.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadrantVisualizer {
    config: VisualizerConfig,
}

impl QuadrantVisualizer {
    #[must_use]
    pub const fn new(config: VisualizerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// Six intensities in probability-vector order.
    #[must_use]
    pub fn intensities(&self, probs: &ProbabilityVector) -> [f64; ProbabilityVector::LEN] {
        self.intensities_of(&normalize(probs.values()))
    }

    /// Like [`intensities`](Self::intensities) for an unvalidated slice.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedResponse`] unless `values` holds
    /// exactly six finite non-negative entries.
    pub fn intensities_from_slice(
        &self,
        values: &[f64],
    ) -> Result<[f64; ProbabilityVector::LEN], PipelineError> {
        let probs = ProbabilityVector::try_from(values)?;
        Ok(self.intensities(&probs))
    }

    /// Render the full grid for `probs`.
    #[must_use]
    pub fn render(&self, probs: &ProbabilityVector) -> QuadrantGrid {
        let normalized = normalize(probs.values());
        let intensities = self.intensities_of(&normalized);
        let cells = Quadrant::ALL.map(|quadrant| QuadrantCell {
            quadrant,
            probability: normalized[quadrant.index()],
            intensity: intensities[quadrant.index()],
        });
        QuadrantGrid {
            cells,
            dominant: dominant(&normalized),
        }
    }

    fn intensities_of(
        &self,
        normalized: &[f64; ProbabilityVector::LEN],
    ) -> [f64; ProbabilityVector::LEN] {
        let max = normalized.iter().copied().fold(0.0_f64, f64::max);
        if max == 0.0 {
            return [self.config.floor; ProbabilityVector::LEN];
        }
        normalized.map(|v| (v / max).mul_add(self.config.spread, self.config.floor))
    }
}

/// Argmax with the lowest index winning ties; `None` when all are zero.
fn dominant(normalized: &[f64; ProbabilityVector::LEN]) -> Option<Quadrant> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in normalized.iter().copied().enumerate() {
        if value > best.map_or(0.0, |(_, v)| v) {
            best = Some((index, value));
        }
    }
    best.and_then(|(index, _)| Quadrant::from_index(index))
}
