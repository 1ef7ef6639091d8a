//! Procedural sound bank. Each archetype manufactures a mono clip at the
//! engine rate from a parametric model, caps its raw peak, and passes it
//! through the randomized effect chain before returning.

use itertools::izip;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::effects;
use crate::error::NuanceError;
use crate::filters;
use crate::noise;
use crate::render;
use crate::synth::{pi2, NFf, SRf, SRu, SampleBuffer, RAW_PEAK_CEILING};
use crate::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Crash,
    Click,
    Hit,
}

impl HitKind {
    pub const ALL: [HitKind; 3] = [HitKind::Crash, HitKind::Click, HitKind::Hit];

    pub fn label(&self) -> &'static str {
        match self {
            HitKind::Crash => "crash",
            HitKind::Click => "click",
            HitKind::Hit => "hit",
        }
    }
}

fn n_samples(duration: f32) -> Result<usize, NuanceError> {
    let n = time::samples_from_seconds(SRu, duration);
    if n == 0 {
        return Err(NuanceError::Synthesis(format!("duration {}s renders zero samples", duration)));
    }
    Ok(n)
}

fn finish<R: Rng>(mut samples: SampleBuffer, rng: &mut R) -> SampleBuffer {
    render::cap_peak(&mut samples, RAW_PEAK_CEILING);
    effects::apply_random(samples, rng)
}

pub fn percussive_hit<R: Rng>(rng: &mut R, kind: HitKind) -> Result<SampleBuffer, NuanceError> {
    match kind {
        HitKind::Crash => crash(rng),
        HitKind::Click => click(rng),
        HitKind::Hit => hit(rng),
    }
}

/// Cymbal-like crash: white noise through four high resonant bands, each
/// with a slow FM wobble, under a long exponential decay.
fn crash<R: Rng>(rng: &mut R) -> Result<SampleBuffer, NuanceError> {
    let duration = rng.gen_range(1.5..3.0);
    let n = n_samples(duration)?;
    let source = noise::white(rng, n);

    let resonances = [
        rng.gen_range(3000.0..5000.0),
        rng.gen_range(7000.0..9000.0),
        rng.gen_range(12000.0..15000.0),
        rng.gen_range(18000.0..22000.0f32),
    ];

    let mut crash = vec![0f32; n];
    for freq in resonances {
        let cutoff = freq.min(NFf - 50.0);
        let ringing = filters::apply_highpass(&source, cutoff).map_err(NuanceError::Synthesis)?;
        let mod_rate = rng.gen_range(0.5..2.0);
        let band_gain = rng.gen_range(0.2..0.5);
        for i in 0..n {
            let t = i as f32 / SRf;
            let wobble = 1.0 + 0.01 * (pi2 * mod_rate * t).sin();
            crash[i] += ringing[i] * wobble * band_gain;
        }
    }

    let decay = rng.gen_range(1.5..3.0);
    let level = rng.gen_range(0.15..0.25);
    for (i, sample) in crash.iter_mut().enumerate() {
        let t = i as f32 / SRf;
        *sample *= (-t * decay).exp() * level;
    }

    Ok(finish(crash, rng))
}

/// Sharp transient click: one carrier plus Nyquist-guarded harmonics under a
/// very steep decay.
fn click<R: Rng>(rng: &mut R) -> Result<SampleBuffer, NuanceError> {
    let duration = rng.gen_range(0.05..0.15);
    let n = n_samples(duration)?;

    let click_freq = rng.gen_range(2000.0..8000.0f32);
    let mut click: SampleBuffer = (0..n).map(|i| (pi2 * click_freq * i as f32 / SRf).sin()).collect();

    for harmonic in [2f32, 3f32, 5f32] {
        let h_freq = click_freq * harmonic;
        if h_freq < NFf {
            let gain = rng.gen_range(0.1..0.3);
            for (i, sample) in click.iter_mut().enumerate() {
                *sample += gain * (pi2 * h_freq * i as f32 / SRf).sin();
            }
        }
    }

    let steepness = rng.gen_range(50.0..100.0);
    let level = rng.gen_range(0.3..0.5);
    for (i, sample) in click.iter_mut().enumerate() {
        let t = i as f32 / SRf;
        *sample *= (-t * steepness).exp() * level;
    }

    Ok(finish(click, rng))
}

/// Drum-like hit: low fundamental, three inharmonic overtones, and a
/// high-passed noise layer for snare character.
fn hit<R: Rng>(rng: &mut R) -> Result<SampleBuffer, NuanceError> {
    let duration = rng.gen_range(0.2..0.8);
    let n = n_samples(duration)?;

    let fundamental = rng.gen_range(60.0..200.0f32);
    let overtones = [
        fundamental * rng.gen_range(1.8..2.2),
        fundamental * rng.gen_range(2.8..3.5),
        fundamental * rng.gen_range(4.0..5.5),
    ];

    let mut drum: SampleBuffer = (0..n).map(|i| (pi2 * fundamental * i as f32 / SRf).sin()).collect();
    for overtone in overtones {
        let gain = rng.gen_range(0.2..0.4);
        for (i, sample) in drum.iter_mut().enumerate() {
            *sample += gain * (pi2 * overtone * i as f32 / SRf).sin();
        }
    }

    let noise_level = rng.gen_range(0.1..0.3);
    let mut rattle = noise::white(rng, n);
    render::amp_scale(&mut rattle, noise_level);
    let rattle = filters::apply_highpass(&rattle, 1000.0).map_err(NuanceError::Synthesis)?;
    for (sample, snare) in drum.iter_mut().zip(rattle) {
        *sample += snare;
    }

    let decay = rng.gen_range(8.0..15.0);
    let level = rng.gen_range(0.2..0.4);
    for (i, sample) in drum.iter_mut().enumerate() {
        let t = i as f32 / SRf;
        *sample *= (-t * decay).exp() * level;
    }

    Ok(finish(drum, rng))
}

/// Ambient pad: five-partial additive synthesis with randomized ratios,
/// amplitudes and phases, subtle per-partial FM, and a noise floor.
pub fn texture_pad<R: Rng>(rng: &mut R, duration: f32, base_freq: f32) -> Result<SampleBuffer, NuanceError> {
    let n = n_samples(duration)?;

    let harmonics = [
        1f32,
        rng.gen_range(1.8..2.2),
        rng.gen_range(2.8..3.2),
        rng.gen_range(4.5..5.5),
        rng.gen_range(7.0..8.0),
    ];
    let amplitudes = [
        1f32,
        rng.gen_range(0.3..0.7),
        rng.gen_range(0.1..0.4),
        rng.gen_range(0.05..0.2),
        rng.gen_range(0.02..0.1),
    ];

    let mut pad = vec![0f32; n];
    for (harmonic, amp) in izip!(&harmonics, &amplitudes) {
        let freq = base_freq * harmonic;
        if freq >= NFf {
            continue;
        }
        let phase = rng.gen_range(0.0..pi2);
        let fm_rate = rng.gen_range(0.1..0.5);
        let fm_depth = rng.gen_range(0.01..0.05);
        for (i, sample) in pad.iter_mut().enumerate() {
            let t = i as f32 / SRf;
            let carrier = (pi2 * freq * t + phase + fm_depth * (pi2 * fm_rate * t).sin()).sin();
            *sample += amp * carrier;
        }
    }

    let attack_samples = ((rng.gen_range(0.1..0.5) * SRf) as usize).min(n);
    let release_samples = ((rng.gen_range(0.3..1.0) * SRf) as usize).min(n);
    for i in 0..attack_samples {
        pad[i] *= i as f32 / attack_samples as f32;
    }
    for i in 0..release_samples {
        let j = n - release_samples + i;
        pad[j] *= 1.0 - i as f32 / release_samples as f32;
    }

    let noise_level = rng.gen_range(0.02..0.08);
    let floor = noise::white(rng, n);
    let level = rng.gen_range(0.15..0.35);
    for (sample, airy) in pad.iter_mut().zip(floor) {
        *sample = (*sample + airy * noise_level) * level;
    }

    Ok(finish(pad, rng))
}

/// Rising sweep: three detuned oscillators tracking an exponential frequency
/// curve, a differenced-noise layer, and a quadratic rising envelope.
pub fn riser<R: Rng>(rng: &mut R, duration: f32) -> Result<SampleBuffer, NuanceError> {
    let n = n_samples(duration)?;

    let start_freq = rng.gen_range(100.0..500.0f32);
    let end_freq = rng.gen_range(2000.0..8000.0f32);
    let ratio = end_freq / start_freq;

    let mut sweep = vec![0f32; n];
    for _ in 0..3 {
        let detune = rng.gen_range(0.98..1.02);
        for (i, sample) in sweep.iter_mut().enumerate() {
            let t = i as f32 / SRf;
            let freq = start_freq * ratio.powf(t / duration);
            *sample += (pi2 * freq * detune * t).sin() / 3.0;
        }
    }

    let air = noise::violet(rng, n);
    for (sample, grain) in sweep.iter_mut().zip(air) {
        *sample += grain * 0.3;
    }

    for (i, sample) in sweep.iter_mut().enumerate() {
        let progress = i as f32 / SRf / duration;
        *sample *= progress * progress * 0.4;
    }

    Ok(finish(sweep, rng))
}

/// Vocal-like chop: voiced excitation with breath noise through three
/// formant resonances, vibrato AM, and an attack-sustain-release envelope.
pub fn vocal_chop<R: Rng>(rng: &mut R) -> Result<SampleBuffer, NuanceError> {
    let duration = rng.gen_range(0.3..0.8);
    let n = n_samples(duration)?;

    let f0 = rng.gen_range(120.0..200.0f32);
    let breath_level = rng.gen_range(0.1..0.3);
    let breath = noise::white(rng, n);
    let excitation: SampleBuffer = (0..n)
        .map(|i| (pi2 * f0 * i as f32 / SRf).sin() + breath_level * breath[i])
        .collect();

    // F1 openness, F2 tongue position, F3 lip rounding
    let formants = [
        (rng.gen_range(700.0..900.0), 60.0),
        (rng.gen_range(1200.0..1600.0), 90.0),
        (rng.gen_range(2400.0..3000.0), 120.0),
    ];

    let mut vocal = excitation.clone();
    for (center, bandwidth) in formants {
        let resonance = filters::apply_bandpass(&excitation, center, bandwidth).map_err(NuanceError::Synthesis)?;
        let gain = rng.gen_range(0.3..0.8);
        for (sample, formant) in vocal.iter_mut().zip(resonance) {
            *sample += formant * gain;
        }
    }

    let vibrato_rate = rng.gen_range(4.0..8.0);
    let vibrato_depth = rng.gen_range(0.02..0.05);
    for (i, sample) in vocal.iter_mut().enumerate() {
        let t = i as f32 / SRf;
        *sample *= 1.0 + vibrato_depth * (pi2 * vibrato_rate * t).sin();
    }

    let attack_samples = ((rng.gen_range(0.02..0.1) * SRf) as usize).min(n);
    let sustain_samples = ((rng.gen_range(0.3..0.7) * SRf) as usize).min(n - attack_samples);
    let release_samples = n - attack_samples - sustain_samples;
    let level = rng.gen_range(0.2..0.4);
    for (i, sample) in vocal.iter_mut().enumerate() {
        let envelope = if i < attack_samples {
            i as f32 / attack_samples.max(1) as f32
        } else if i < attack_samples + sustain_samples {
            1.0
        } else {
            1.0 - (i - attack_samples - sustain_samples) as f32 / release_samples.max(1) as f32
        };
        *sample *= envelope * level;
    }

    Ok(finish(vocal, rng))
}

/// Digital glitch: amplitude-quantized tone plus a detuned second tone
/// standing in for an aliasing artifact, under a sharp decay.
pub fn glitch<R: Rng>(rng: &mut R) -> Result<SampleBuffer, NuanceError> {
    let duration = rng.gen_range(0.1..0.4);
    let n = n_samples(duration)?;

    let freq = rng.gen_range(200.0..2000.0f32);
    let levels = rng.gen_range(4..=16) as f32;
    let alias_freq = rng.gen_range(freq * 0.7..freq * 1.3);

    let glitch: SampleBuffer = (0..n)
        .map(|i| {
            let t = i as f32 / SRf;
            let tone = (pi2 * freq * t).sin();
            let quantized = (tone * levels).round() / levels;
            let artifact = 0.3 * (pi2 * alias_freq * t).sin();
            (quantized + artifact) * (-8.0 * t).exp() * 0.35
        })
        .collect();

    Ok(finish(glitch, rng))
}

/// Draw a random percussive flavor, for category-level dispensing.
pub fn random_hit_kind<R: Rng>(rng: &mut R) -> HitKind {
    *HitKind::ALL.choose(rng).unwrap_or(&HitKind::Hit)
}
