/// Gaussian scattering layer in linear Sv at `range`.
pub fn scattering_layer(range: f64, centre: f64, width: f64, peak_sv_db: f64) -> f64 {
    let peak = 10f64.powf(peak_sv_db / 10.0);
    peak * (-(range - centre).powi(2) / (2.0 * width.powi(2))).exp()
}

/// Slowly undulating seafloor depth for ping `ping`.
pub fn seafloor_depth(ping: usize, mean_depth: f64, amplitude: f64) -> f64 {
    mean_depth + amplitude * (ping as f64 / 20.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scattering_layer_peaks_at_centre() {
        let peak = scattering_layer(25.0, 25.0, 3.0, -60.0);
        assert!((peak - 1e-6).abs() < 1e-18);
        assert!(scattering_layer(40.0, 25.0, 3.0, -60.0) < peak);
    }
}
