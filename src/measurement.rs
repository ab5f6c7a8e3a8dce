use std::fmt::{Display, Formatter};

/// Running statistics for one station, all values in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationStats {
    pub minimum: i32,
    pub maximum: i32,
    pub sum: i64,
    pub count: u64,
}

impl StationStats {
    pub fn new(value: i32) -> Self {
        Self { minimum: value, maximum: value, sum: value as i64, count: 1 }
    }

    #[inline]
    pub fn update(&mut self, value: i32) {
        self.minimum = self.minimum.min(value);
        self.maximum = self.maximum.max(value);
        self.sum += value as i64;
        self.count += 1;
    }

    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.minimum = self.minimum.min(other.minimum);
        self.maximum = self.maximum.max(other.maximum);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// `sum / count` in tenths, rounded half away from zero.
    pub fn mean(&self) -> i64 {
        let count = self.count as i128;
        let sum = self.sum as i128;
        let rounded = (2 * sum.abs() + count) / (2 * count);

        match sum < 0 {
            true => -rounded as i64,
            false => rounded as i64,
        }
    }
}

impl Display for StationStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            Tenths(self.minimum as i64),
            Tenths(self.mean()),
            Tenths(self.maximum as i64)
        )
    }
}

/// Renders a scaled integer with exactly one fractional digit. Zero never
/// carries a sign.
struct Tenths(i64);

impl Display for Tenths {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(values: &[i32]) -> StationStats {
        let mut iter = values.iter();
        let mut stats = StationStats::new(*iter.next().unwrap());
        iter.for_each(|&value| stats.update(value));
        stats
    }

    #[test]
    fn update_tracks_extremes_and_totals() {
        let stats = stats(&[125, -30, 40]);
        assert_eq!(stats, StationStats { minimum: -30, maximum: 125, sum: 135, count: 3 });
    }

    #[test]
    fn merge_matches_sequential_updates() {
        let mut left = stats(&[10, 20]);
        left.merge(&stats(&[-5, 30]));
        assert_eq!(left, stats(&[10, 20, -5, 30]));
    }

    #[test]
    fn mean_rounds_half_away_from_zero() {
        assert_eq!(stats(&[125, -30]).mean(), 48);
        assert_eq!(stats(&[-125, 30]).mean(), -48);
        assert_eq!(stats(&[1, 2]).mean(), 2);
        assert_eq!(stats(&[-1, -2]).mean(), -2);
        assert_eq!(stats(&[1, 1, 2]).mean(), 1);
    }

    #[test]
    fn display_uses_one_fractional_digit() {
        assert_eq!(stats(&[125, -30]).to_string(), "-3.0/4.8/12.5");
        assert_eq!(stats(&[82]).to_string(), "8.2/8.2/8.2");
        assert_eq!(stats(&[-999, 999]).to_string(), "-99.9/0.0/99.9");
    }

    #[test]
    fn small_negative_mean_is_not_negative_zero() {
        assert_eq!(stats(&[-1, 0, 0, 0]).to_string(), "-0.1/0.0/0.0");
        assert_eq!(stats(&[-4]).to_string(), "-0.4/-0.4/-0.4");
    }
}
