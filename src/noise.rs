use rand::Rng;

use crate::synth::SampleBuffer;

/// Uniform white noise in [-1, 1].
pub fn white<R: Rng>(rng: &mut R, length: usize) -> SampleBuffer {
    (0..length).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Differenced white noise. The first-difference tilts the spectrum toward
/// the high end, which reads as "air" when layered under a sweep.
pub fn violet<R: Rng>(rng: &mut R, length: usize) -> SampleBuffer {
    let w = white(rng, length);
    let mut violet = vec![0.0; length];

    for i in 1..length {
        violet[i] = w[i] - w[i - 1];
    }

    violet
}
