//! Certificate lifetime usage ("verdancy") measurement and presentation

use std::time::SystemTime;

use tracing::debug;

use crate::cert::Certificate;
use crate::error::VerifyError;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Quantized lifetime-usage severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerdancyLevel {
    Fresh,
    Aging,
    Stale,
    Expired,
}

impl VerdancyLevel {
    /// Stable numeric form for machine-readable output.
    pub fn as_index(self) -> u8 {
        match self {
            VerdancyLevel::Fresh => 0,
            VerdancyLevel::Aging => 1,
            VerdancyLevel::Stale => 2,
            VerdancyLevel::Expired => 3,
        }
    }
}

/// The quantized level plus the raw rounded percentage behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdancyReport {
    pub level: VerdancyLevel,
    pub percent_used: i64,
}

/// How far the certificate has progressed through its validity window.
pub fn lifetime_usage(cert: &Certificate) -> Result<VerdancyReport, VerifyError> {
    lifetime_usage_at(cert.not_before(), cert.not_after(), SystemTime::now())
}

/// Pure core of the calculation, fixed at an explicit `now`.
///
/// The percentage is intentionally not clamped: values above 100 (already
/// expired) and below 0 (clock skew before notBefore) are meaningful.
pub fn lifetime_usage_at(
    not_before: SystemTime,
    not_after: SystemTime,
    now: SystemTime,
) -> Result<VerdancyReport, VerifyError> {
    let total_hours = signed_hours(not_before, not_after);
    if total_hours <= 0.0 {
        return Err(VerifyError::DegenerateValidityWindow);
    }
    let remaining_hours = signed_hours(now, not_after);

    let percent_used = ((1.0 - remaining_hours / total_hours) * 100.0).round() as i64;
    let level = band(percent_used);
    debug!(percent_used, ?level, "computed lifetime usage");
    Ok(VerdancyReport {
        level,
        percent_used,
    })
}

/// Total partition of the percentage range. The historical boundary gaps
/// at exactly 1, 66 and 90 percent fold into the band below them.
fn band(percent_used: i64) -> VerdancyLevel {
    if percent_used >= 100 {
        VerdancyLevel::Expired
    } else if percent_used > 90 {
        VerdancyLevel::Stale
    } else if percent_used > 66 {
        VerdancyLevel::Aging
    } else {
        VerdancyLevel::Fresh
    }
}

/// Bare numeric signal, one integer in 0..=3.
pub fn render_plain(report: &VerdancyReport) -> String {
    report.level.as_index().to_string()
}

/// The numeric signal wrapped in ANSI color, for terminals. Presentation
/// only; the machine-readable form is [`render_plain`].
pub fn render_ansi(report: &VerdancyReport) -> String {
    let color = match report.level {
        VerdancyLevel::Fresh => GREEN,
        VerdancyLevel::Aging => YELLOW,
        VerdancyLevel::Stale | VerdancyLevel::Expired => RED,
    };
    format!("{color} {} {RESET}", report.level.as_index())
}

fn signed_hours(from: SystemTime, to: SystemTime) -> f64 {
    match to.duration_since(from) {
        Ok(d) => d.as_secs_f64() / 3600.0,
        Err(e) => -(e.duration().as_secs_f64() / 3600.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, UNIX_EPOCH};

    fn hours(n: u64) -> Duration {
        Duration::from_secs(n * 3600)
    }

    #[test]
    fn one_hour_left_of_a_thousand_rounds_to_expired() {
        // 99.9 percent used rounds to 100, the top band.
        let t = UNIX_EPOCH + hours(1000);
        let report = lifetime_usage_at(t, t + hours(1000), t + hours(999)).expect("report");
        assert_eq!(report.percent_used, 100);
        assert_eq!(report.level, VerdancyLevel::Expired);
    }

    #[test]
    fn midway_is_fresh() {
        let t = UNIX_EPOCH + hours(1000);
        let report = lifetime_usage_at(t, t + hours(1000), t + hours(500)).expect("report");
        assert_eq!(report.percent_used, 50);
        assert_eq!(report.level, VerdancyLevel::Fresh);
    }

    #[test]
    fn past_expiry_exceeds_one_hundred_percent() {
        let t = UNIX_EPOCH + hours(1000);
        let report = lifetime_usage_at(t, t + hours(1000), t + hours(1001)).expect("report");
        assert!(report.percent_used > 100);
        assert_eq!(report.level, VerdancyLevel::Expired);
    }

    #[test]
    fn clock_before_not_before_is_negative_and_fresh() {
        let t = UNIX_EPOCH + hours(1000);
        let report = lifetime_usage_at(t, t + hours(100), t - hours(100)).expect("report");
        assert!(report.percent_used < 0);
        assert_eq!(report.level, VerdancyLevel::Fresh);
    }

    #[test]
    fn zero_width_window_is_a_defined_error() {
        let t = UNIX_EPOCH + hours(1000);
        let err = lifetime_usage_at(t, t, t).unwrap_err();
        assert!(matches!(err, VerifyError::DegenerateValidityWindow));

        let err = lifetime_usage_at(t + hours(1), t, t).unwrap_err();
        assert!(matches!(err, VerifyError::DegenerateValidityWindow));
    }

    #[test]
    fn boundary_gaps_resolve_to_the_band_below() {
        let t = UNIX_EPOCH + hours(1000);
        let total = hours(100);
        let at = |used: u64| {
            lifetime_usage_at(t, t + total, t + hours(used))
                .expect("report")
                .level
        };
        assert_eq!(at(1), VerdancyLevel::Fresh);
        assert_eq!(at(66), VerdancyLevel::Fresh);
        assert_eq!(at(67), VerdancyLevel::Aging);
        assert_eq!(at(90), VerdancyLevel::Aging);
        assert_eq!(at(91), VerdancyLevel::Stale);
        assert_eq!(at(99), VerdancyLevel::Stale);
        assert_eq!(at(100), VerdancyLevel::Expired);
    }

    #[test]
    fn ansi_rendering_wraps_the_plain_signal() {
        let report = VerdancyReport {
            level: VerdancyLevel::Stale,
            percent_used: 95,
        };
        assert_eq!(render_plain(&report), "2");
        let painted = render_ansi(&report);
        assert!(painted.contains(" 2 "));
        assert!(painted.starts_with("\x1b["));
        assert!(painted.ends_with("\x1b[0m"));
    }
}
