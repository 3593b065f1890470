//! Temperature scale conversions and the heat index.
//!
//! These are plain functions over `f32`, usable without a sensor. NaN inputs
//! propagate through every function.

/// Converts a temperature in degrees Celsius to degrees Fahrenheit
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

/// Converts a temperature in degrees Fahrenheit to degrees Celsius
pub fn fahrenheit_to_celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * (5.0 / 9.0)
}

/// Computes the apparent ("feels like") temperature in degrees Fahrenheit
/// from the air temperature in degrees Fahrenheit and the relative humidity
/// in percent.
///
/// Follows the NOAA Weather Prediction Center procedure:
///
/// - at or below 40 °F the air temperature is returned unchanged;
/// - otherwise the simple estimate `1.1 T + 0.047 RH - 10.3` is used while it
///   stays at or below 79 °F;
/// - above that the Rothfusz regression is used, with the NOAA corrections for
///   very dry (RH < 13 %, 80..=112 °F) and very humid (RH > 85 %, 80..=87 °F)
///   air.
///
/// The regression is within ±1.3 °F of the NOAA table for temperatures of at
/// least 80 °F and humidities of at least 40 %. The result is not rounded.
pub fn heat_index_fahrenheit(temp_fahrenheit: f32, percent_humidity: f32) -> f32 {
    if temp_fahrenheit <= 40.0 {
        return temp_fahrenheit;
    }

    let simple = 1.1 * temp_fahrenheit + 0.047 * percent_humidity - 10.3;
    if simple <= 79.0 {
        return simple;
    }

    let heat_index = rothfusz(temp_fahrenheit, percent_humidity);

    if percent_humidity < 13.0 && (80.0..=112.0).contains(&temp_fahrenheit) {
        let adjustment = (percent_humidity - 13.0) / 4.0
            * libm::sqrtf((17.0 - libm::fabsf(temp_fahrenheit - 95.0)) / 17.0);
        return heat_index + adjustment;
    }

    if percent_humidity > 85.0 && (80.0..=87.0).contains(&temp_fahrenheit) {
        let adjustment = (percent_humidity - 85.0) / 10.0 * ((87.0 - temp_fahrenheit) / 5.0);
        return heat_index + adjustment;
    }

    heat_index
}

/// Computes the heat index in degrees Celsius from a temperature in degrees
/// Celsius and a relative humidity in percent.
///
/// This goes through [`heat_index_fahrenheit`], so it carries the same error
/// (about ±0.72 °C).
pub fn heat_index_celsius(temp_celsius: f32, percent_humidity: f32) -> f32 {
    fahrenheit_to_celsius(heat_index_fahrenheit(
        celsius_to_fahrenheit(temp_celsius),
        percent_humidity,
    ))
}

// Rothfusz, "The Heat Index Equation", NWS Technical Attachment SR 90-23.
#[allow(clippy::excessive_precision)]
fn rothfusz(t: f32, rh: f32) -> f32 {
    let t2 = t * t;
    let rh2 = rh * rh;

    -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 0.006_837_83 * t2
        - 0.054_817_17 * rh2
        + 0.001_228_74 * t2 * rh
        + 0.000_852_82 * t * rh2
        - 0.000_001_99 * t2 * rh2
}
