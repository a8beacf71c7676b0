//! Bounded history buffer feeding the time-series charts.

use std::collections::VecDeque;

use crate::types::WindowPoint;

/// One minute at one frame per second.
pub const DEFAULT_CAPACITY: usize = 60;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    dq.push_back(v);
    while dq.len() > cap {
        dq.pop_front();
    }
}

/// Arrival-ordered points, oldest first, never longer than `cap`.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    points: VecDeque<WindowPoint>,
    cap: usize,
    // arrival counter; not reset by `clear`
    next_seq: u64,
}

/// The window split into parallel per-metric series sharing one key sequence.
/// Keys are arrival sequence numbers, so they advance even when producers
/// omit or repeat timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSeries {
    pub keys: Vec<f64>,
    pub labels: Vec<String>,
    pub memory_gb: Vec<f64>,
    pub utilization_pct: Vec<f64>,
    pub temperature_c: Vec<f64>,
}

impl WindowSeries {
    /// `(key, value)` pairs as chart widgets want them.
    pub fn pairs(&self, values: &[f64]) -> Vec<(f64, f64)> {
        self.keys.iter().copied().zip(values.iter().copied()).collect()
    }
}

impl SlidingWindow {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            points: VecDeque::with_capacity(cap + 1),
            cap,
            next_seq: 0,
        }
    }

    pub fn push(&mut self, mut point: WindowPoint) {
        point.seq = self.next_seq;
        self.next_seq += 1;
        push_capped(&mut self.points, point, self.cap);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&WindowPoint> {
        self.points.back()
    }

    pub fn series(&self) -> WindowSeries {
        let n = self.points.len();
        let mut s = WindowSeries {
            keys: Vec::with_capacity(n),
            labels: Vec::with_capacity(n),
            memory_gb: Vec::with_capacity(n),
            utilization_pct: Vec::with_capacity(n),
            temperature_c: Vec::with_capacity(n),
        };
        for p in &self.points {
            s.keys.push(p.seq as f64);
            s.labels.push(p.time_label.clone());
            s.memory_gb.push(p.memory_used_gb);
            s.utilization_pct.push(p.utilization_pct);
            s.temperature_c.push(p.temperature_c);
        }
        s
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(i: usize) -> WindowPoint {
        WindowPoint {
            seq: 0,
            ts: 1_700_000_000.0 + i as f64,
            time_label: format!("t{i}"),
            memory_used_gb: i as f64,
            utilization_pct: (i % 101) as f64,
            temperature_c: 40.0,
        }
    }

    #[test]
    fn length_is_min_of_pushes_and_capacity() {
        for n in [0usize, 1, 5, 59, 60, 61, 65, 200] {
            let mut w = SlidingWindow::default();
            for i in 1..=n {
                w.push(point(i));
            }
            assert_eq!(w.len(), n.min(60), "after {n} pushes");
        }
    }

    #[test]
    fn keeps_arrival_order() {
        let mut w = SlidingWindow::default();
        for i in 1..=5 {
            w.push(point(i));
        }
        let got: Vec<f64> = w.iter().map(|p| p.memory_used_gb).collect();
        assert_eq!(got, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut w = SlidingWindow::default();
        for i in 1..=65 {
            w.push(point(i));
        }
        assert_eq!(w.len(), 60);
        assert_eq!(w.iter().next().unwrap().time_label, "t6");
        assert_eq!(w.latest().unwrap().time_label, "t65");
        let ids: Vec<usize> = w.iter().map(|p| p.memory_used_gb as usize).collect();
        assert_eq!(ids, (6..=65).collect::<Vec<_>>());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut w = SlidingWindow::new(0);
        w.push(point(1));
        w.push(point(2));
        assert_eq!(w.capacity(), 1);
        assert_eq!(w.latest().unwrap().time_label, "t2");
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn clear_and_series() {
        let mut w = SlidingWindow::new(3);
        for i in 1..=4 {
            w.push(point(i));
        }
        let s = w.series();
        assert_eq!(s.labels, vec!["t2", "t3", "t4"]);
        assert_eq!(s.memory_gb, vec![2.0, 3.0, 4.0]);
        assert_eq!(s.keys, vec![1.0, 2.0, 3.0]);
        assert_eq!(s.pairs(&s.memory_gb)[0], (1.0, 2.0));
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.series(), WindowSeries::default());
        w.push(point(5));
        assert_eq!(w.series().keys, vec![4.0]);
    }

    #[test]
    fn keys_advance_without_timestamps() {
        let mut w = SlidingWindow::new(3);
        for i in 1..=5 {
            w.push(WindowPoint {
                ts: 0.0,
                ..point(i)
            });
        }
        let s = w.series();
        assert_eq!(s.keys, vec![2.0, 3.0, 4.0]);
        assert!(s.keys.windows(2).all(|k| k[0] < k[1]));
        assert_eq!(crate::ui::util::x_bounds(&s.keys), [2.0, 4.0]);
        let ts: Vec<f64> = w.iter().map(|p| p.ts).collect();
        assert_eq!(ts, vec![0.0, 0.0, 0.0]);
    }
}
