use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type as FilterType, Q_BUTTERWORTH_F32};

use crate::synth::{SRf, SampleBuffer};

fn check_cutoff(cutoff_hz: f32) -> Result<(), String> {
    if cutoff_hz <= 0.0 || cutoff_hz >= SRf / 2.0 {
        return Err(format!(
            "Invalid cutoff frequency: {} Hz. Must be between 0 and Nyquist ({} Hz).",
            cutoff_hz,
            SRf / 2.0
        ));
    }
    Ok(())
}

fn run_filter(samples: &[f32], coeffs: Coefficients<f32>) -> SampleBuffer {
    let mut filter = DirectForm1::<f32>::new(coeffs);
    samples.iter().map(|&sample| filter.run(sample)).collect()
}

/// Applies a second-order high-pass biquad to the input samples.
///
/// Butterworth response at engine rate. Used for crash resonances and the
/// snare-like noise layer of percussive hits.
///
/// # Parameters
/// - `samples`: Input audio samples.
/// - `cutoff_hz`: High-pass cutoff frequency in Hz, in (0, Nyquist).
///
/// # Returns
/// - `Result<Vec<f32>, String>`: Filtered samples or an error message if the
///   cutoff is invalid or coefficient creation fails.
pub fn apply_highpass(samples: &[f32], cutoff_hz: f32) -> Result<SampleBuffer, String> {
    check_cutoff(cutoff_hz)?;
    let coeffs = Coefficients::<f32>::from_params(
        FilterType::HighPass,
        SRf.hz(),
        cutoff_hz.hz(),
        Q_BUTTERWORTH_F32,
    )
    .map_err(|e| format!("Failed to create high-pass filter coefficients: {:?}", e))?;
    Ok(run_filter(samples, coeffs))
}

/// Applies a second-order band-pass biquad centered at `center_hz` with the
/// given bandwidth. Q is derived as center/bandwidth, which keeps narrow
/// formant bands resonant.
pub fn apply_bandpass(samples: &[f32], center_hz: f32, bandwidth_hz: f32) -> Result<SampleBuffer, String> {
    check_cutoff(center_hz)?;
    if bandwidth_hz <= 0.0 {
        return Err(format!("Invalid bandwidth: {} Hz. Must be positive.", bandwidth_hz));
    }
    let coeffs = Coefficients::<f32>::from_params(
        FilterType::BandPass,
        SRf.hz(),
        center_hz.hz(),
        center_hz / bandwidth_hz,
    )
    .map_err(|e| format!("Failed to create band-pass filter coefficients: {:?}", e))?;
    Ok(run_filter(samples, coeffs))
}
