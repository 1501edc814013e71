use std::time::Duration;

/// Per-stage wall-clock timings, owned by the caller.
///
/// Each bootstrap call adds its timings; one value can accumulate over
/// many calls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BootstrapMetrics {
    pub calls: u64,
    pub samples: u64,
    pub allocation: Duration,
    pub modulus_switch: Duration,
    pub blind_rotation: Duration,
    pub extraction: Duration,
    pub key_switch: Duration,
    pub synchronization: Duration,
}

impl BootstrapMetrics {
    pub fn total(&self) -> Duration {
        self.allocation
            + self.modulus_switch
            + self.blind_rotation
            + self.extraction
            + self.key_switch
            + self.synchronization
    }

    pub fn merge(&mut self, other: &Self) {
        self.calls += other.calls;
        self.samples += other.samples;
        self.allocation += other.allocation;
        self.modulus_switch += other.modulus_switch;
        self.blind_rotation += other.blind_rotation;
        self.extraction += other.extraction;
        self.key_switch += other.key_switch;
        self.synchronization += other.synchronization;
    }
}
