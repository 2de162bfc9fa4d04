#[cfg(test)]
mod tests;

/// Standard-atmosphere sea level pressure in hPa.
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Barometric altitude in meters for a pressure in hPa, referenced to the
/// standard atmosphere.
pub fn altitude_from_pressure(pressure_hpa: f64) -> f64 {
    altitude_with_sea_level(pressure_hpa, SEA_LEVEL_PRESSURE_HPA)
}

/// Pressure-altitude relation with an explicit sea level reference.
/// Both arguments must be positive; callers validate readings first.
pub fn altitude_with_sea_level(pressure_hpa: f64, sea_level_hpa: f64) -> f64 {
    debug_assert!(pressure_hpa > 0.0 && sea_level_hpa > 0.0);
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(1.0 / 5.255))
}

/// Display rounding used for temperature and the two altitudes.
pub fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
