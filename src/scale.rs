//! Scale helpers shared by the views
//!
//! These follow the D3 conventions the page is drawn with, so a domain computed
//! here and handed to `d3.scaleLinear()` on the page lands on the same pixels.

/// Minimum and maximum of an iterator, `None` when empty
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Continuous linear mapping from a domain onto a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a range value back to the domain. A zero-width range maps
    /// everything to the middle of the domain.
    pub fn invert(&self, y: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = if r1 == r0 { 0.5 } else { (y - r0) / (r1 - r0) };
        d0 + t * (d1 - d0)
    }
}

fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * 10f64.powf(power)
}

/// Roughly `count` round tick values covering `[lo, hi]`
///
/// A degenerate domain yields the single value, so the axis collapses to one
/// tick instead of failing.
pub fn ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    if lo == hi || count == 0 {
        return vec![lo];
    }

    let (start, stop, reverse) = if lo > hi { (hi, lo, true) } else { (lo, hi, false) };
    let inc = tick_increment(start, stop, count);
    if !(inc > 0.0) {
        return vec![lo];
    }

    let first = (start / inc).ceil() as i64;
    let last = (stop / inc).floor() as i64;
    let mut out: Vec<f64> = (first..=last).map(|i| i as f64 * inc).collect();
    if reverse {
        out.reverse();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent() {
        assert_eq!(extent(vec![3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(extent(vec![2.0]), Some((2.0, 2.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_linear_invert() {
        let s = LinearScale::new((1.0, 21.0), (0.0, 400.0));
        assert_eq!(s.invert(0.0), 1.0);
        assert_eq!(s.invert(200.0), 11.0);
        assert_eq!(s.invert(400.0), 21.0);

        let single = LinearScale::new((5.0, 5.0), (0.0, 100.0));
        assert_eq!(single.invert(70.0), 5.0);
    }

    #[test]
    fn test_degenerate_range_does_not_divide_by_zero() {
        let flat = LinearScale::new((1.0, 3.0), (10.0, 10.0));
        assert_eq!(flat.invert(10.0), 2.0);
    }

    #[test]
    fn test_ticks_round_numbers() {
        let unit = ticks(0.0, 1.0, 5);
        assert_eq!(unit.len(), 6);
        assert!((unit[1] - 0.2).abs() < 1e-9);
        assert!((unit[5] - 1.0).abs() < 1e-9);
        assert_eq!(ticks(0.0, 1000.0, 5), vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0]);
    }

    #[test]
    fn test_ticks_reversed_domain() {
        assert_eq!(ticks(10.0, 0.0, 2), vec![10.0, 5.0, 0.0]);
    }

    #[test]
    fn test_ticks_single_value_domain() {
        assert_eq!(ticks(4.0, 4.0, 5), vec![4.0]);
        assert!(ticks(f64::NAN, 1.0, 5).is_empty());
    }
}
