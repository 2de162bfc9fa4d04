use super::*;

#[test]
fn sea_level_pressure_is_zero_altitude() {
    assert!(altitude_from_pressure(SEA_LEVEL_PRESSURE_HPA).abs() < 1e-9);
}

#[test]
fn lower_pressure_means_higher_altitude() {
    let mut last = altitude_from_pressure(1030.0);
    for pressure in [1020.0, 1013.25, 1000.0, 950.0, 900.0, 700.0] {
        let altitude = altitude_from_pressure(pressure);
        assert!(
            altitude > last,
            "altitude({pressure}) = {altitude} not above {last}"
        );
        last = altitude;
    }
}

#[test]
fn known_altitudes() {
    // ~110.9 m at 1000 hPa, ~988.6 m at 900 hPa
    assert!((altitude_from_pressure(1000.0) - 110.9).abs() < 0.5);
    assert!((altitude_from_pressure(900.0) - 988.6).abs() < 2.0);
}

#[test]
fn custom_sea_level_reference_zeroes_at_itself() {
    assert!(altitude_with_sea_level(950.0, 950.0).abs() < 1e-9);
    assert!(altitude_with_sea_level(940.0, 950.0) > 0.0);
}

#[test]
fn rounds_to_one_decimal() {
    assert_eq!(round_tenth(113.672), 113.7);
    assert_eq!(round_tenth(21.04), 21.0);
    assert_eq!(round_tenth(-3.25), -3.3);
}
