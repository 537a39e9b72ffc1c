use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::DecisionError;

// === CONSTANTS ===

/// Candidate rates (percent) a borrowing schedule is sampled at.
pub const RATE_GRID_PERCENT: [f64; 11] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// Two sample rates closer than this are the same rate.
pub const RATE_MATCH_TOLERANCE: f64 = 0.001;

/// Point estimate used when there is no curve to read from.
pub fn fallback_amount(borrowing_limit: f64) -> f64 {
    (0.1 * borrowing_limit).min(10.0)
}

// === DEMAND CURVE ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    /// Percent, e.g. 3.0 for 3%.
    pub interest_rate: f64,
    pub borrowing_amount: f64,
}

/// A young agent's borrowing schedule: how much they would borrow at each
/// candidate rate. Points are kept sorted by rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandCurve {
    points: Vec<CurvePoint>,
}

impl DemandCurve {
    /// Build a curve from client-submitted points.
    ///
    /// Rejects empty curves, non-finite values, negative amounts, amounts
    /// above the borrowing limit, and repeated rates.
    pub fn from_points(
        mut points: Vec<CurvePoint>,
        borrowing_limit: f64,
    ) -> Result<Self, DecisionError> {
        if points.is_empty() {
            return Err(DecisionError::InvalidDemandCurve(
                "at least one point is required".to_string(),
            ));
        }
        for p in &points {
            if !p.interest_rate.is_finite() || !p.borrowing_amount.is_finite() {
                return Err(DecisionError::InvalidDemandCurve(
                    "points must be finite numbers".to_string(),
                ));
            }
            if p.borrowing_amount < 0.0 {
                return Err(DecisionError::InvalidDemandCurve(
                    "borrowing amounts cannot be negative".to_string(),
                ));
            }
            if p.borrowing_amount > borrowing_limit {
                return Err(DecisionError::InvalidDemandCurve(format!(
                    "borrowing amount {} at {}% exceeds the limit of {}",
                    p.borrowing_amount, p.interest_rate, borrowing_limit
                )));
            }
        }

        points.sort_by(|a, b| a.interest_rate.total_cmp(&b.interest_rate));
        let duplicate = points
            .windows(2)
            .any(|w| (w[1].interest_rate - w[0].interest_rate).abs() < RATE_MATCH_TOLERANCE);
        if duplicate {
            return Err(DecisionError::InvalidDemandCurve(
                "each interest rate can only have one borrowing amount".to_string(),
            ));
        }

        Ok(Self { points })
    }

    /// Build from trusted `(rate_percent, amount)` samples, e.g. generated
    /// ones. Sorts but does not validate.
    pub fn from_samples(samples: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut points: Vec<CurvePoint> = samples
            .into_iter()
            .map(|(interest_rate, borrowing_amount)| CurvePoint {
                interest_rate,
                borrowing_amount,
            })
            .collect();
        points.sort_by(|a, b| a.interest_rate.total_cmp(&b.interest_rate));
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Borrowing at `rate_percent`, or `None` for an empty curve.
    ///
    /// Exact sample hits return the sample; between samples the amount is
    /// linearly interpolated; outside the sampled range it is held at the
    /// nearest edge.
    pub fn interpolate(&self, rate_percent: f64) -> Option<f64> {
        if let Some(hit) = self
            .points
            .iter()
            .find(|p| (p.interest_rate - rate_percent).abs() < RATE_MATCH_TOLERANCE)
        {
            return Some(hit.borrowing_amount);
        }

        let lower = self
            .points
            .iter()
            .rev()
            .find(|p| p.interest_rate < rate_percent);
        let upper = self.points.iter().find(|p| p.interest_rate > rate_percent);

        match (lower, upper) {
            (Some(lo), Some(hi)) => {
                let t = (rate_percent - lo.interest_rate) / (hi.interest_rate - lo.interest_rate);
                Some(lo.borrowing_amount + t * (hi.borrowing_amount - lo.borrowing_amount))
            }
            (Some(edge), None) | (None, Some(edge)) => Some(edge.borrowing_amount),
            (None, None) => None,
        }
    }

    /// Like [`interpolate`](Self::interpolate) but never fails: an empty
    /// curve yields `default`.
    pub fn amount_at(&self, rate_percent: f64, default: f64) -> f64 {
        self.interpolate(rate_percent).unwrap_or(default)
    }
}

/// Sum of every curve's borrowing at each grid rate.
pub fn aggregate_demand<'a>(curves: impl IntoIterator<Item = &'a DemandCurve>) -> Vec<CurvePoint> {
    let curves: Vec<&DemandCurve> = curves.into_iter().collect();
    RATE_GRID_PERCENT
        .iter()
        .map(|&rate| CurvePoint {
            interest_rate: rate,
            borrowing_amount: curves
                .iter()
                .filter_map(|curve| curve.interpolate(rate))
                .sum(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(interest_rate: f64, borrowing_amount: f64) -> CurvePoint {
        CurvePoint {
            interest_rate,
            borrowing_amount,
        }
    }

    fn curve(samples: &[(f64, f64)]) -> DemandCurve {
        DemandCurve::from_samples(samples.iter().copied())
    }

    #[test]
    fn exact_sample_is_returned_verbatim() {
        let c = curve(&[(0.0, 100.0), (5.0, 60.0), (10.0, 20.0)]);
        assert_eq!(c.interpolate(5.0), Some(60.0));
        assert_eq!(c.interpolate(5.0004), Some(60.0));
    }

    #[test]
    fn between_samples_is_linear() {
        let c = curve(&[(0.0, 100.0), (10.0, 0.0)]);
        let mid = c.interpolate(2.5).unwrap();
        assert!((mid - 75.0).abs() < 1e-9);
    }

    #[test]
    fn outside_range_clamps_to_edges() {
        let c = curve(&[(2.0, 80.0), (4.0, 40.0)]);
        assert_eq!(c.interpolate(0.0), Some(80.0));
        assert_eq!(c.interpolate(12.0), Some(40.0));
    }

    #[test]
    fn empty_curve_falls_back() {
        let c = DemandCurve::default();
        assert_eq!(c.interpolate(3.0), None);
        assert_eq!(c.amount_at(3.0, fallback_amount(100.0)), 10.0);
        assert_eq!(fallback_amount(40.0), 4.0);
    }

    #[test]
    fn submitted_points_are_validated_and_sorted() {
        let points = vec![
            point(5.0, 50.0),
            point(0.0, 90.0),
        ];
        let c = DemandCurve::from_points(points, 100.0).unwrap();
        assert_eq!(c.points()[0].interest_rate, 0.0);

        let over_limit = vec![point(0.0, 101.0)];
        assert!(DemandCurve::from_points(over_limit, 100.0).is_err());

        let duplicate = vec![
            point(1.0, 10.0),
            point(1.0, 20.0),
        ];
        assert!(DemandCurve::from_points(duplicate, 100.0).is_err());
        assert!(DemandCurve::from_points(Vec::new(), 100.0).is_err());
    }

    #[test]
    fn aggregate_sums_across_curves() {
        let a = curve(&[(0.0, 10.0), (10.0, 0.0)]);
        let b = curve(&[(0.0, 20.0)]);
        let total = aggregate_demand([&a, &b]);
        assert_eq!(total.len(), RATE_GRID_PERCENT.len());
        assert_eq!(total[0].borrowing_amount, 30.0);
        assert!((total[5].borrowing_amount - 25.0).abs() < 1e-9);
    }
}
