//! Recommendation bands from net effective return
//!
//! Boundaries belong to the band on their right:
//!   (-inf, -10) EXIT | [-10, 0) Watch | [0, 20) OK | [20, inf) Strong

use crate::types::PositionBand;

pub const EXIT_BELOW: f64 = -10.0;
pub const WATCH_BELOW: f64 = 0.0;
pub const STRONG_FROM: f64 = 20.0;

pub fn classify(net_effective_pct: Option<f64>) -> PositionBand {
    match net_effective_pct {
        Some(v) if v.is_finite() => {
            if v < EXIT_BELOW {
                PositionBand::Exit
            } else if v < WATCH_BELOW {
                PositionBand::Watch
            } else if v < STRONG_FROM {
                PositionBand::Ok
            } else {
                PositionBand::Strong
            }
        }
        _ => PositionBand::NotAvailable,
    }
}
