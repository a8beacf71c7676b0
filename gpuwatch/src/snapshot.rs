//! Latest-sample holder for instantaneous readouts.

use crate::types::Sample;

#[derive(Debug, Default)]
pub struct SnapshotState {
    current: Sample,
}

impl SnapshotState {
    pub fn new() -> Self {
        Self::default()
    }

    // Whole-value replace; readers never see a mix of two frames.
    pub fn update(&mut self, sample: Sample) {
        self.current = sample;
    }

    pub fn reset(&mut self) {
        self.current = Sample::empty();
    }

    pub fn get(&self) -> &Sample {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::sample_from_payload;
    use crate::types::UNKNOWN_NAME;

    #[test]
    fn starts_empty() {
        let s = SnapshotState::new();
        assert_eq!(s.get().name, UNKNOWN_NAME);
        assert_eq!(s.get().memory_used_bytes, 0);
        assert_eq!(s.get().utilization_pct, 0.0);
    }

    #[test]
    fn update_replaces_and_reset_restores_empty() {
        let mut s = SnapshotState::new();
        let a = sample_from_payload(br#"{"Name": "a", "Utilization": 10}"#).unwrap();
        let b = sample_from_payload(br#"{"Name": "b", "Temperature": 70}"#).unwrap();
        s.update(a);
        s.update(b.clone());
        assert_eq!(s.get(), &b);
        // Nothing from `a` survives.
        assert_eq!(s.get().utilization_pct, 0.0);
        s.reset();
        assert_eq!(s.get(), &Sample::empty());
    }
}
