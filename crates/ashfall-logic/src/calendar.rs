//! Game time: absolute points and spans, both in whole seconds.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A span of game time in seconds. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TimeSpan(pub i64);

impl TimeSpan {
    pub const ZERO: TimeSpan = TimeSpan(0);

    pub const fn seconds(s: i64) -> Self {
        Self(s)
    }
    pub const fn minutes(m: i64) -> Self {
        Self(m * 60)
    }
    pub const fn hours(h: i64) -> Self {
        Self(h * 3600)
    }
    pub const fn days(d: i64) -> Self {
        Self(d * 86_400)
    }

    pub const fn as_seconds(self) -> i64 {
        self.0
    }
    pub const fn whole_minutes(self) -> i64 {
        self.0 / 60
    }
    /// Whole hours, truncated toward zero.
    pub const fn whole_hours(self) -> i64 {
        self.0 / 3600
    }
    pub fn as_hours_f32(self) -> f32 {
        self.0 as f32 / 3600.0
    }

    /// Ratio of two spans; zero when `other` is zero.
    pub fn ratio(self, other: TimeSpan) -> f64 {
        if other.0 == 0 {
            0.0
        } else {
            self.0 as f64 / other.0 as f64
        }
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;
    fn add(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0 + rhs.0)
    }
}

impl AddAssign for TimeSpan {
    fn add_assign(&mut self, rhs: TimeSpan) {
        self.0 += rhs.0;
    }
}

impl Sub for TimeSpan {
    type Output = TimeSpan;
    fn sub(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0 - rhs.0)
    }
}

impl Mul<i64> for TimeSpan {
    type Output = TimeSpan;
    fn mul(self, rhs: i64) -> TimeSpan {
        TimeSpan(self.0 * rhs)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        if s >= 86_400 {
            write!(f, "{}{}d {}h", sign, s / 86_400, (s % 86_400) / 3600)
        } else if s >= 3600 {
            write!(f, "{}{}h {}m", sign, s / 3600, (s % 3600) / 60)
        } else {
            write!(f, "{}{}m", sign, s / 60)
        }
    }
}

/// An absolute moment, seconds since the start of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TimePoint(pub i64);

impl TimePoint {
    pub const START: TimePoint = TimePoint(0);

    /// Season of year, assuming 91-day seasons starting in spring.
    pub fn season(self) -> Season {
        match (self.0.div_euclid(86_400) / 91).rem_euclid(4) {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

impl Add<TimeSpan> for TimePoint {
    type Output = TimePoint;
    fn add(self, rhs: TimeSpan) -> TimePoint {
        TimePoint(self.0 + rhs.0)
    }
}

impl AddAssign<TimeSpan> for TimePoint {
    fn add_assign(&mut self, rhs: TimeSpan) {
        self.0 += rhs.0;
    }
}

impl Sub for TimePoint {
    type Output = TimeSpan;
    fn sub(self, rhs: TimePoint) -> TimeSpan {
        TimeSpan(self.0 - rhs.0)
    }
}

impl Sub<TimeSpan> for TimePoint {
    type Output = TimePoint;
    fn sub(self, rhs: TimeSpan) -> TimePoint {
        TimePoint(self.0 - rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_units() {
        assert_eq!(TimeSpan::hours(3).as_seconds(), 10_800);
        assert_eq!(TimeSpan::minutes(90).whole_hours(), 1);
        assert_eq!(TimeSpan::days(1), TimeSpan::hours(24));
    }

    #[test]
    fn point_arithmetic() {
        let t = TimePoint::START + TimeSpan::hours(5);
        assert_eq!(t - TimePoint::START, TimeSpan::hours(5));
        assert!(t > TimePoint::START);
    }

    #[test]
    fn seasons_cycle() {
        assert_eq!(TimePoint::START.season(), Season::Spring);
        assert_eq!((TimePoint::START + TimeSpan::days(100)).season(), Season::Summer);
        assert_eq!((TimePoint::START + TimeSpan::days(364)).season(), Season::Spring);
    }

    #[test]
    fn display() {
        assert_eq!(TimeSpan::hours(3).to_string(), "3h 0m");
        assert_eq!(TimeSpan::days(2).to_string(), "2d 0h");
    }
}
