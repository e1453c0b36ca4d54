//! Small numeric helpers shared by the strategies.

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.98270, 2), 0.98);
        assert_eq!(round_to(3.899999, 5), 3.9);
        assert_eq!(round_to(-1.005, 0), -1.0);
    }
}
