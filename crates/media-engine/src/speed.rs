/// A validated playback rate multiplier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed {
    value: f64,
}

impl Speed {
    pub const MIN: f64 = 0.0625;
    pub const MAX: f64 = 16.0;
    pub const DEFAULT: f64 = 1.0;

    /// Creates a speed value, rejecting anything outside `[MIN, MAX]`
    pub fn new(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("Speed must be a finite number, got {}", value));
        }

        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(format!(
                "Speed must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ));
        }
        Ok(Self { value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_normal(&self) -> bool {
        (self.value - Self::DEFAULT).abs() < f64::EPSILON
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self {
            value: Self::DEFAULT,
        }
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}x", self.value)
    }
}

impl PartialOrd for Speed {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}
