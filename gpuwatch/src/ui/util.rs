//! Small UI helpers: truncation and axis bounds.

pub fn truncate_middle(s: &str, max: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = chars[..left].iter().collect();
    let tail: String = chars[chars.len() - right..].iter().collect();
    format!("{head}...{tail}")
}

/// Y-axis bounds covering `values` with a little headroom, never narrower than `min_top`.
pub fn y_bounds(values: &[f64], min_top: f64) -> [f64; 2] {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    [0.0, (max * 1.1).max(min_top)]
}

/// X-axis bounds for a key sequence; a single point gets a one-second span.
pub fn x_bounds(keys: &[f64]) -> [f64; 2] {
    match (keys.first(), keys.last()) {
        (Some(&a), Some(&b)) if b > a => [a, b],
        (Some(&a), _) => [a, a + 1.0],
        _ => [0.0, 1.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_middle("short", 10), "short");
        assert_eq!(truncate_middle("NVIDIA GeForce RTX 4090", 11), "NVID...4090");
        assert_eq!(truncate_middle("°°°°°°°°", 5), "°...°");
        assert_eq!(truncate_middle("abcdef", 2), "...");
    }

    #[test]
    fn bounds() {
        assert_eq!(y_bounds(&[], 100.0), [0.0, 100.0]);
        let [lo, hi] = y_bounds(&[10.0, 200.0, f64::NAN], 100.0);
        assert_eq!(lo, 0.0);
        assert!((hi - 220.0).abs() < 1e-9);
        assert_eq!(x_bounds(&[]), [0.0, 1.0]);
        assert_eq!(x_bounds(&[5.0]), [5.0, 6.0]);
        assert_eq!(x_bounds(&[5.0, 9.0]), [5.0, 9.0]);
    }
}
