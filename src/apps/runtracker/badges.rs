use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Distance milestones. Below 100 km a badge needs one run of that length;
/// from 100 km up it counts lifetime distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeType {
    OneK,
    TwoK,
    FiveK,
    TenK,
    TwentyK,
    FortyK,
    HundredK,
}

const CUMULATIVE_THRESHOLD_KM: f64 = 100.0;

impl BadgeType {
    pub const ALL: [BadgeType; 7] = [
        BadgeType::OneK,
        BadgeType::TwoK,
        BadgeType::FiveK,
        BadgeType::TenK,
        BadgeType::TwentyK,
        BadgeType::FortyK,
        BadgeType::HundredK,
    ];

    pub fn code(self) -> &'static str {
        match self {
            BadgeType::OneK => "1k",
            BadgeType::TwoK => "2k",
            BadgeType::FiveK => "5k",
            BadgeType::TenK => "10k",
            BadgeType::TwentyK => "20k",
            BadgeType::FortyK => "40k",
            BadgeType::HundredK => "100k",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            BadgeType::OneK => "1 Kilometer",
            BadgeType::TwoK => "2 Kilometers",
            BadgeType::FiveK => "5 Kilometers",
            BadgeType::TenK => "10 Kilometers",
            BadgeType::TwentyK => "20 Kilometers",
            BadgeType::FortyK => "40 Kilometers",
            BadgeType::HundredK => "100 Kilometers",
        }
    }

    pub fn criteria_km(self) -> f64 {
        match self {
            BadgeType::OneK => 1.0,
            BadgeType::TwoK => 2.0,
            BadgeType::FiveK => 5.0,
            BadgeType::TenK => 10.0,
            BadgeType::TwentyK => 20.0,
            BadgeType::FortyK => 40.0,
            BadgeType::HundredK => 100.0,
        }
    }

    pub fn name(self) -> String {
        format!("{} Runner", self.display())
    }

    pub fn description(self) -> String {
        let km = self.criteria_km();
        if km >= CUMULATIVE_THRESHOLD_KM {
            format!("Run a total of {km:.1} kilometers")
        } else {
            format!("Complete a single run of at least {km:.1} kilometers")
        }
    }

    pub fn is_earned(self, best_distance_km: f64, total_distance_km: f64) -> bool {
        let km = self.criteria_km();
        if km >= CUMULATIVE_THRESHOLD_KM {
            total_distance_km >= km
        } else {
            best_distance_km >= km
        }
    }

    /// Every badge the given totals qualify for.
    pub fn earned(best_distance_km: f64, total_distance_km: f64) -> Vec<BadgeType> {
        Self::ALL
            .into_iter()
            .filter(|b| b.is_earned(best_distance_km, total_distance_km))
            .collect()
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Badge", self.display())
    }
}

impl FromStr for BadgeType {
    type Err = AppError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.code() == code)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown badge type: {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields() {
        assert_eq!(BadgeType::FiveK.name(), "5 Kilometers Runner");
        assert_eq!(BadgeType::OneK.name(), "1 Kilometer Runner");
        assert_eq!(
            BadgeType::TenK.description(),
            "Complete a single run of at least 10.0 kilometers"
        );
        assert_eq!(BadgeType::HundredK.description(), "Run a total of 100.0 kilometers");
        assert_eq!(BadgeType::FortyK.to_string(), "40 Kilometers Badge");
    }

    #[test]
    fn single_run_badges_use_best_distance() {
        // Many short runs never earn the 5k badge.
        assert!(!BadgeType::FiveK.is_earned(4.9, 250.0));
        assert!(BadgeType::FiveK.is_earned(5.0, 5.0));
    }

    #[test]
    fn hundred_k_uses_total_distance() {
        assert!(!BadgeType::HundredK.is_earned(50.0, 99.9));
        assert!(BadgeType::HundredK.is_earned(10.0, 100.0));
    }

    #[test]
    fn earned_lists_every_qualifying_badge() {
        let earned = BadgeType::earned(12.0, 30.0);
        assert_eq!(
            earned,
            vec![BadgeType::OneK, BadgeType::TwoK, BadgeType::FiveK, BadgeType::TenK]
        );
    }

    #[test]
    fn codes_parse_back() {
        for badge in BadgeType::ALL {
            assert_eq!(badge.code().parse::<BadgeType>().unwrap(), badge);
        }
        assert!("3k".parse::<BadgeType>().is_err());
    }
}
