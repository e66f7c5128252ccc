//! Absolute humidity from temperature and relative humidity.
//!
//! Saturation vapor pressure uses the Magnus approximation over water; the
//! vapor density then follows from the ideal gas law for water vapor.

use crate::error::ValidationError;

const MAGNUS_A_HPA: f64 = 6.112;
const MAGNUS_B: f64 = 17.67;
const MAGNUS_C_CELSIUS: f64 = 243.5;
const MOLAR_MASS_WATER: f64 = 18.016;
const GAS_CONSTANT: f64 = 8314.3;
const KELVIN_OFFSET: f64 = 273.15;

/// Absolute humidity in g/m³.
///
/// Monotonically increasing in both `relative_humidity_pct` and
/// `temperature_c` over the physical range.
///
/// # Errors
///
/// Returns [`ValidationError::NotFinite`] for NaN or infinite inputs and
/// [`ValidationError::TemperatureOutOfDomain`] when `temperature_c <= -243.5`,
/// where the formula has a pole.
pub fn absolute_humidity(
    relative_humidity_pct: f64,
    temperature_c: f64,
) -> Result<f64, ValidationError> {
    if !relative_humidity_pct.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "relative_humidity",
        });
    }
    if !temperature_c.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "temperature",
        });
    }
    if temperature_c <= -MAGNUS_C_CELSIUS {
        return Err(ValidationError::TemperatureOutOfDomain(temperature_c));
    }

    let saturation_hpa =
        MAGNUS_A_HPA * (MAGNUS_B * temperature_c / (MAGNUS_C_CELSIUS + temperature_c)).exp();
    let vapor_hpa = relative_humidity_pct / 100.0 * saturation_hpa;
    Ok(1e5 * MOLAR_MASS_WATER / GAS_CONSTANT * vapor_hpa / (temperature_c + KELVIN_OFFSET))
}
