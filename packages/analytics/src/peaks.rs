//! Peak growth timing comparison.

use venue_density_analytics_models::{GrowthSummary, PeakComparison, PeakOrder};

/// Compares the peak growth years of two summaries for the same region.
///
/// `lead_time` is `y.peak_year - x.peak_year`: positive when X peaked first.
#[must_use]
pub fn compare_peaks(x: &GrowthSummary, y: &GrowthSummary) -> PeakComparison {
    if x.region != y.region {
        log::debug!(
            "Comparing peaks of different regions '{}' and '{}'",
            x.region,
            y.region
        );
    }
    let lead_time = y.peak_year - x.peak_year;
    let order = match lead_time {
        t if t > 0 => PeakOrder::XFirst,
        0 => PeakOrder::Simultaneous,
        _ => PeakOrder::YFirst,
    };
    PeakComparison {
        region: x.region.clone(),
        x_peak_year: x.peak_year,
        y_peak_year: y.peak_year,
        lead_time,
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(peak_year: i32) -> GrowthSummary {
        GrowthSummary {
            region: "A".to_string(),
            start_year: 2014,
            end_year: 2024,
            start_value: 1.0,
            end_value: 2.0,
            total_growth: 1.0,
            cagr: 0.07,
            avg_yoy: 0.07,
            volatility: None,
            peak_year,
            peak_rate: 0.2,
        }
    }

    #[test]
    fn x_first() {
        let c = compare_peaks(&summary(2017), &summary(2019));
        assert_eq!(c.lead_time, 2);
        assert_eq!(c.order, PeakOrder::XFirst);
    }

    #[test]
    fn simultaneous_and_y_first() {
        assert_eq!(compare_peaks(&summary(2018), &summary(2018)).order, PeakOrder::Simultaneous);
        let c = compare_peaks(&summary(2020), &summary(2016));
        assert_eq!(c.lead_time, -4);
        assert_eq!(c.order, PeakOrder::YFirst);
    }
}
