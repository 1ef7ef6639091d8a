//! Randomized effect chain. Every synthesized archetype passes through
//! `apply_random`, which picks 1-3 distinct stages and runs them in order.
//! Each stage draws its own parameters from the injected generator and
//! preserves buffer length exactly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::synth::{pi2, SRf, SRu, SampleBuffer};
use crate::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Chorus,
    Delay,
    Reverb,
    Distortion,
    FilterSweep,
    PitchShift,
    Granular,
    BitCrush,
    Flanger,
    Phaser,
}

pub const EFFECT_BANK: [Effect; 10] = [
    Effect::Chorus,
    Effect::Delay,
    Effect::Reverb,
    Effect::Distortion,
    Effect::FilterSweep,
    Effect::PitchShift,
    Effect::Granular,
    Effect::BitCrush,
    Effect::Flanger,
    Effect::Phaser,
];

/// Apply a random combination of 1-3 distinct effects, in selection order.
pub fn apply_random<R: Rng>(samples: SampleBuffer, rng: &mut R) -> SampleBuffer {
    if samples.is_empty() {
        return samples;
    }
    let num_effects = rng.gen_range(1..=3usize);
    let chosen: Vec<Effect> = EFFECT_BANK.choose_multiple(rng, num_effects).copied().collect();

    let mut processed = samples;
    for effect in chosen {
        processed = apply(effect, &processed, rng);
    }
    processed
}

/// Run a single stage. Output length always equals input length.
pub fn apply<R: Rng>(effect: Effect, samples: &[f32], rng: &mut R) -> SampleBuffer {
    if samples.is_empty() {
        return Vec::new();
    }
    match effect {
        Effect::Chorus => chorus(samples, rng),
        Effect::Delay => delay(samples, rng),
        Effect::Reverb => reverb(samples, rng),
        Effect::Distortion => distortion(samples, rng),
        Effect::FilterSweep => filter_sweep(samples, rng),
        Effect::PitchShift => pitch_shift(samples, rng),
        Effect::Granular => granular(samples, rng),
        Effect::BitCrush => bit_crush(samples, rng),
        Effect::Flanger => flanger(samples, rng),
        Effect::Phaser => phaser(samples, rng),
    }
}

/// One modulated 10-30ms delay line blended 70/30 with the dry signal.
fn chorus<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let lo = time::samples_from_ms(SRu, 10.0);
    let hi = time::samples_from_ms(SRu, 30.0);
    let delay_samples = rng.gen_range(lo..=hi) as f32;
    let depth = rng.gen_range(0.3..0.8);
    let rate = rng.gen_range(1.0..5.0);

    let mut delayed = vec![0f32; samples.len()];
    for i in 0..samples.len() {
        let t = i as f32 / SRf;
        let modulation = depth * (pi2 * rate * t).sin();
        let offset = (delay_samples + modulation * delay_samples * 0.5) as isize;
        let j = i as isize - offset;
        if j >= 0 && (j as usize) < samples.len() {
            delayed[i] = samples[j as usize];
        }
    }

    samples.iter().zip(delayed).map(|(&dry, wet)| 0.7 * dry + 0.3 * wet).collect()
}

/// Single 100-400ms feedback tap mixed back at the original length.
fn delay<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let delay_time = rng.gen_range(0.1..0.4);
    let feedback = rng.gen_range(0.2..0.6);
    let mix = rng.gen_range(0.2..0.5);

    let delay_samples = (delay_time * SRf) as usize;
    if delay_samples == 0 {
        return samples.to_vec();
    }
    let mut tank = vec![0f32; samples.len() + delay_samples];
    tank[..samples.len()].copy_from_slice(samples);
    for i in delay_samples..tank.len() {
        if i - delay_samples < samples.len() {
            let echo = feedback * tank[i - delay_samples];
            tank[i] += echo;
        }
    }

    (0..samples.len())
        .map(|i| (1.0 - mix) * samples[i] + mix * tank[i + delay_samples])
        .collect()
}

/// Four fixed-ratio taps under an exponential decay, blended by wetness.
fn reverb<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let n = samples.len();
    let reverb_time = rng.gen_range(0.5..2.0);
    let wetness = rng.gen_range(0.2..0.6);
    if n < 2 {
        return samples.to_vec();
    }

    let taps = [(0.03 * SRf) as usize, (0.05 * SRf) as usize, (0.08 * SRf) as usize, (0.13 * SRf) as usize];
    let mut wet = vec![0f32; n];
    for tap in taps {
        if n > tap {
            let gain = rng.gen_range(0.1..0.3);
            for i in tap..n {
                wet[i] += samples[i - tap] * gain;
            }
        }
    }

    let span = reverb_time * 3.0;
    for (i, sample) in wet.iter_mut().enumerate() {
        let t = i as f32 / (n - 1) as f32;
        *sample *= (-t * span).exp();
    }

    samples.iter().zip(wet).map(|(&dry, w)| (1.0 - wetness) * dry + wetness * w).collect()
}

/// Normalized tanh soft clip blended with the dry signal.
fn distortion<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let drive: f32 = rng.gen_range(2.0..8.0);
    let mix = rng.gen_range(0.3..0.7);
    let norm = drive.tanh();

    samples
        .iter()
        .map(|&sample| (1.0 - mix) * sample + mix * ((drive * sample).tanh() / norm))
        .collect()
}

/// One-pole low-pass whose cutoff sweeps exponentially across the buffer.
fn filter_sweep<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let start_freq = rng.gen_range(200.0..1000.0);
    let end_freq = rng.gen_range(2000.0..8000.0);
    let n = samples.len();
    if n < 2 {
        return samples.to_vec();
    }

    let mut filtered = samples.to_vec();
    let ratio: f32 = end_freq / start_freq;
    for i in 1..n {
        let progress = i as f32 / (n - 1) as f32;
        let cutoff = start_freq * ratio.powf(progress);
        let alpha = (cutoff / (SRf / 2.0)).min(0.5);
        filtered[i] = alpha * samples[i] + (1.0 - alpha) * filtered[i - 1];
    }
    filtered
}

/// Resample by a 0.7-1.4 ratio, reading back at the original length with
/// linear interpolation.
fn pitch_shift<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let ratio: f32 = rng.gen_range(0.7..1.4);
    let n = samples.len();

    (0..n)
        .map(|i| {
            let position = (i as f32 * ratio).min((n - 1) as f32);
            let idx = position as usize;
            let next = (idx + 1).min(n - 1);
            let fraction = position.fract();
            samples[idx] * (1.0 - fraction) + samples[next] * fraction
        })
        .collect()
}

/// Scatter 10-50ms grains from random source offsets to random destinations.
fn granular<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let lo = time::samples_from_ms(SRu, 10.0);
    let hi = time::samples_from_ms(SRu, 50.0);
    let grain_size = rng.gen_range(lo..=hi);
    let density = rng.gen_range(0.3..0.8);

    let n = samples.len();
    if grain_size == 0 || n <= grain_size {
        return samples.to_vec();
    }

    let mut granular = vec![0f32; n];
    let num_grains = ((n / grain_size) as f32 * density) as usize;
    for _ in 0..num_grains {
        let dst = rng.gen_range(0..n - grain_size);
        let src = rng.gen_range(0..n - grain_size);
        let gain = rng.gen_range(0.3..0.8);
        for k in 0..grain_size {
            granular[dst + k] += samples[src + k] * gain;
        }
    }

    let trim = rng.gen_range(0.5..1.0);
    granular.iter_mut().for_each(|sample| *sample *= trim);
    granular
}

/// Amplitude quantization to 4-12 bits plus an integer-factor
/// downsample/hold pass.
fn bit_crush<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let bits: i32 = rng.gen_range(4..=12);
    let reduction = rng.gen_range(2..=8usize);

    let max_val = 2f32.powi(bits - 1);
    let crushed: SampleBuffer = samples.iter().map(|&sample| (sample * max_val).round() / max_val).collect();

    if reduction <= 1 {
        return crushed;
    }
    let n = crushed.len();
    let mut held = Vec::with_capacity(n);
    for i in (0..n).step_by(reduction) {
        for _ in 0..reduction {
            if held.len() < n {
                held.push(crushed[i]);
            }
        }
    }
    while held.len() < n {
        held.push(*crushed.last().unwrap_or(&0f32));
    }
    held
}

/// Short (1-10ms) modulated feedback delay.
fn flanger<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let rate = rng.gen_range(0.2..2.0);
    let depth = rng.gen_range(0.001..0.01);
    let feedback = rng.gen_range(0.2..0.7);

    let mut flanged = samples.to_vec();
    for i in 0..samples.len() {
        let t = i as f32 / SRf;
        let delay_seconds = depth * (1.0 + (pi2 * rate * t).sin()) / 2.0;
        let delay_samples = (delay_seconds * SRf) as usize;
        if i >= delay_samples {
            flanged[i] += feedback * samples[i - delay_samples];
        }
    }
    flanged
}

/// Multiplicative sinusoidal amplitude modulation blended 70/30. An
/// approximation, not a true all-pass ladder.
fn phaser<R: Rng>(samples: &[f32], rng: &mut R) -> SampleBuffer {
    let rate = rng.gen_range(0.5..3.0);
    let depth = rng.gen_range(0.3..0.8);

    samples
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let t = i as f32 / SRf;
            let phased = sample * (1.0 + depth * (pi2 * rate * t).sin());
            0.7 * sample + 0.3 * phased
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn impulse_train(n: usize) -> SampleBuffer {
        (0..n).map(|i| if i % 1000 == 0 { 0.3 } else { 0.01 }).collect()
    }

    #[test]
    fn test_every_stage_preserves_length() {
        let mut rng = StdRng::seed_from_u64(99);
        for n in [0usize, 1, 3, 100, 44100] {
            let buffer = impulse_train(n);
            for effect in EFFECT_BANK {
                let out = apply(effect, &buffer, &mut rng);
                assert_eq!(out.len(), n, "{:?} changed length at n={}", effect, n);
            }
        }
    }

    #[test]
    fn test_chain_preserves_length_for_any_subset_size() {
        let buffer = impulse_train(22050);
        for seed in 0..24u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = apply_random(buffer.clone(), &mut rng);
            assert_eq!(out.len(), buffer.len());
        }
    }

    #[test]
    fn test_chain_draws_one_to_three_distinct_stages() {
        for seed in 0..50u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let num_effects = rng.gen_range(1..=3usize);
            let chosen: Vec<Effect> = EFFECT_BANK.choose_multiple(&mut rng, num_effects).copied().collect();
            assert!(!chosen.is_empty() && chosen.len() <= 3);
            for (i, a) in chosen.iter().enumerate() {
                assert!(!chosen[i + 1..].contains(a), "stages must be distinct: {:?}", chosen);
            }
        }
    }

    #[test]
    fn test_chain_is_reproducible_for_a_seed() {
        let buffer = impulse_train(8192);
        let mut a = StdRng::seed_from_u64(2024);
        let mut b = StdRng::seed_from_u64(2024);
        assert_eq!(apply_random(buffer.clone(), &mut a), apply_random(buffer.clone(), &mut b));
    }

    #[test]
    fn test_distortion_stays_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let buffer = vec![0.99f32; 4096];
        let out = apply(Effect::Distortion, &buffer, &mut rng);
        assert!(out.iter().all(|x| x.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn test_empty_buffer_passes_every_stage() {
        let mut rng = StdRng::seed_from_u64(8);
        for effect in EFFECT_BANK {
            assert!(apply(effect, &[], &mut rng).is_empty());
        }
        assert!(apply_random(Vec::new(), &mut rng).is_empty());
    }
}
