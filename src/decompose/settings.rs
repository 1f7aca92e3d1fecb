/// Absolute tolerances for matching faces against a reference plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Maximum angle, in radians, between a face normal and the reference normal.
    pub angle: f64,
    /// Maximum distance between a face and the reference offset.
    pub distance: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            angle: 1e-3,
            distance: 1e-4,
        }
    }
}

impl Tolerances {
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }
}

/// Whether the "solid with openings" baseline is clipped before differencing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HalfSpacePolicy {
    /// Use the baseline solid as regenerated.
    #[default]
    Disabled,
    /// Keep only the part of the baseline within `depth` behind the
    /// reference face.
    ReferenceSide { depth: f64 },
}

/// Shared decomposition settings for a conversion pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecompositionSettings {
    pub tolerances: Tolerances,
    pub half_space: HalfSpacePolicy,
}

impl DecompositionSettings {
    #[must_use]
    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    #[must_use]
    pub fn with_half_space(mut self, half_space: HalfSpacePolicy) -> Self {
        self.half_space = half_space;
        self
    }
}
