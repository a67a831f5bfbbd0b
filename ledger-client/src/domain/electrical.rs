//! Single-phase power conversions used when only two of kW, A and V are known.
//!
//! Each helper returns `None` when an input is zero or not finite.

fn usable(v: f64) -> bool {
    v.is_finite() && v != 0.0
}

/// P(kW) = I(A) × V(V) / 1000
pub fn kw_from_amps_volts(amps: f64, volts: f64) -> Option<f64> {
    (usable(amps) && usable(volts)).then(|| amps * volts / 1000.0)
}

/// I(A) = P(kW) × 1000 / V(V)
pub fn amps_from_kw_volts(kw: f64, volts: f64) -> Option<f64> {
    (usable(kw) && usable(volts)).then(|| kw * 1000.0 / volts)
}

/// V(V) = P(kW) × 1000 / I(A)
pub fn volts_from_kw_amps(kw: f64, amps: f64) -> Option<f64> {
    (usable(kw) && usable(amps)).then(|| kw * 1000.0 / amps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_are_consistent() {
        let kw = kw_from_amps_volts(32.0, 230.0).unwrap();
        assert!((kw - 7.36).abs() < 1e-9);
        assert!((amps_from_kw_volts(kw, 230.0).unwrap() - 32.0).abs() < 1e-9);
        assert!((volts_from_kw_amps(kw, 32.0).unwrap() - 230.0).abs() < 1e-9);
    }

    #[test]
    fn zero_inputs_yield_none() {
        assert_eq!(kw_from_amps_volts(0.0, 230.0), None);
        assert_eq!(amps_from_kw_volts(5.0, 0.0), None);
        assert_eq!(volts_from_kw_amps(f64::NAN, 10.0), None);
    }
}
