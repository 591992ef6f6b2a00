/// Fixed-timestep accumulator.
///
/// Wall-clock time is accumulated and paid out in whole ticks of `step`
/// seconds. At most `max_ticks` are released per call; any further backlog is
/// discarded so a stall never turns into a burst of catch-up ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStep {
    step: f32,
    max_ticks: u32,
    accumulator: f32,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP)
    }
}

impl FixedStep {
    /// Nominal 60 Hz.
    pub const DEFAULT_STEP: f32 = 1.0 / 60.0;
    pub const DEFAULT_MAX_TICKS: u32 = 8;

    /// `step` must be finite and positive; anything else falls back to
    /// [`DEFAULT_STEP`](Self::DEFAULT_STEP).
    pub fn new(step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            tracing::warn!(step, "invalid fixed step; using 60 Hz");
            Self::DEFAULT_STEP
        };
        Self {
            step,
            max_ticks: Self::DEFAULT_MAX_TICKS,
            accumulator: 0.0,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = max_ticks.max(1);
        self
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add `elapsed` seconds and return how many ticks are due.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed;
        }
        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if self.accumulator >= self.step {
            tracing::debug!(
                backlog = self.accumulator,
                "fixed-step backlog exceeded; dropping"
            );
            self.accumulator = 0.0;
        }
        ticks
    }

    /// Fraction of a tick currently accumulated, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}
