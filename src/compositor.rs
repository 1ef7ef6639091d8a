//! Loudness-adaptive compositor. Resolves each scheduled event to a clip,
//! ducks it against the local loudness of the progressively mixed output,
//! folds it in additively, and finishes with a single global peak cap.
//!
//! Events are processed strictly in scheduling order: the adaptive gain
//! reads the output buffer as it fills, so order is part of the semantics.

use rand::Rng;

use crate::catalog::SampleCatalog;
use crate::error::NuanceError;
use crate::render;
use crate::sampler;
use crate::synth::{pi2, SampleBuffer, MASTER_PEAK_CEILING};
use crate::time;
use crate::types::{
    AnalysisSummary, AudioBuffer, ClipOrigin, FeatureDigest, NuanceEvent, NuanceMap, NuanceType,
    Parameters,
};
use crate::volume;

/// Local-RMS thresholds above which nuances are ducked.
const LOUD_RMS: f32 = 0.3;
const BUSY_RMS: f32 = 0.2;

/// Extra attenuation for synthesized clips, which run hotter than curated
/// library files.
const PROCEDURAL_TRIM: f32 = 0.7;

/// Mix every event into a copy of `original` and assemble the run's map.
///
/// The returned `NuanceMap` records every scheduled event regardless of
/// audible effect; input/output refs are stamped by the pipeline.
pub fn render<R: Rng>(
    original: &AudioBuffer,
    sample_rate: u32,
    digest: &FeatureDigest,
    events: &[NuanceEvent],
    catalog: &mut SampleCatalog,
    params: &Parameters,
    rng: &mut R,
) -> Result<(AudioBuffer, NuanceMap), NuanceError> {
    let mut output = original.clone();
    let n_samples = output.n_samples();
    let half_window = time::samples_from_ms(sample_rate, 100.0);

    for event in events {
        let clip = catalog.get_sample(event.kind, rng)?;

        let mut channels = clip.audio.channels.clone();
        if clip.sample_rate != sample_rate {
            channels = sampler::resample_channels(&channels, clip.sample_rate, sample_rate)?;
        }

        let mut gain = event.volume_scale * params.intensity;
        if clip.origin == ClipOrigin::Procedural {
            gain *= PROCEDURAL_TRIM;
        }

        // jitter can pull beat zero slightly negative
        let start = (event.time * sample_rate as f32).max(0.0) as usize;
        if start >= n_samples {
            continue;
        }

        let local = volume::local_rms(&output.channels, start, half_window);
        if local > LOUD_RMS {
            gain *= 0.5;
        } else if local > BUSY_RMS {
            gain *= 0.7;
        }

        for channel in channels.iter_mut() {
            render::amp_scale(channel, gain);
        }

        if event.kind == NuanceType::Texture && rng.gen_range(0.0..1.0) < 0.3 {
            let cutoff = rng.gen_range(3000.0..8000.0);
            for channel in channels.iter_mut() {
                one_pole_smooth(channel, cutoff, sample_rate);
            }
        }

        mix_at(&mut output, &channels, start);
    }

    render::cap_peak_channels(&mut output.channels, MASTER_PEAK_CEILING);

    let map = NuanceMap {
        input_file: String::new(),
        output_file: String::new(),
        analysis: AnalysisSummary {
            tempo: digest.tempo,
            duration: digest.duration,
            num_beats: digest.beats.len(),
            num_sections: digest.sections.len(),
        },
        events: events.to_vec(),
    };

    Ok((output, map))
}

/// Additive mix of `clip` into `output` starting at `start`, truncated at
/// buffer end. Channel-count mismatches reconcile by averaging the clip
/// down or duplicating it up.
fn mix_at(output: &mut AudioBuffer, clip: &[SampleBuffer], start: usize) {
    let clip_len = clip.first().map(|ch| ch.len()).unwrap_or(0);
    if clip_len == 0 {
        return;
    }
    let n_out = output.n_samples();
    let end = (start + clip_len).min(n_out);

    if output.is_mono() && clip.len() > 1 {
        let folded = AudioBuffer { channels: clip.to_vec() }.downmix();
        for i in start..end {
            output.channels[0][i] += folded[i - start];
        }
        return;
    }

    if clip.len() == 1 {
        for channel in output.channels.iter_mut() {
            for i in start..end {
                channel[i] += clip[0][i - start];
            }
        }
        return;
    }

    for (channel, clip_channel) in output.channels.iter_mut().zip(clip.iter()) {
        for i in start..end {
            channel[i] += clip_channel[i - start];
        }
    }
}

/// One-pole low-pass used to tuck textures behind the mix.
fn one_pole_smooth(channel: &mut SampleBuffer, cutoff_hz: f32, sample_rate: u32) {
    if channel.len() < 2 {
        return;
    }
    let omega = pi2 * cutoff_hz / sample_rate as f32;
    let alpha = omega / (1.0 + omega);
    for i in 1..channel.len() {
        channel[i] = alpha * channel[i] + (1.0 - alpha) * channel[i - 1];
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::EventContext;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;

    fn empty_catalog(label: &str) -> SampleCatalog {
        let root = std::env::temp_dir().join(format!("nuance-compositor-{}", label));
        let _ = std::fs::remove_dir_all(&root);
        SampleCatalog::load(Path::new(&root))
    }

    fn forced_event(kind: NuanceType, time: f32) -> NuanceEvent {
        NuanceEvent {
            time,
            kind,
            beat_index: 0,
            bar_number: 0,
            volume_scale: 0.3,
            context: EventContext { beat_in_bar: 0, section_boundary: false, tempo: 120.0 },
        }
    }

    fn silent_digest(duration: f32) -> FeatureDigest {
        FeatureDigest { tempo: 120.0, beats: vec![0.0], downbeats: vec![0], sections: Vec::new(), duration }
    }

    #[test]
    fn test_forced_event_into_silence_leaves_length_and_adds_signal() {
        let original = AudioBuffer::silence(1, 44100);
        let digest = silent_digest(1.0);
        let events = vec![forced_event(NuanceType::Percussion, 0.5)];
        let mut catalog = empty_catalog("silence");
        let params = Parameters::default();
        let mut rng = StdRng::seed_from_u64(9);

        let (enhanced, map) = render(&original, 44100, &digest, &events, &mut catalog, &params, &mut rng)
            .expect("render must succeed");

        assert_eq!(enhanced.n_samples(), 44100, "output length must match the input");
        assert_eq!(enhanced.n_channels(), 1);
        assert_eq!(map.events.len(), 1, "the map records every scheduled event");

        let window = &enhanced.channels[0][22050..];
        assert!(window.iter().any(|x| x.abs() > 0.0), "insertion window should carry signal");
        let head = &enhanced.channels[0][..22000];
        assert!(head.iter().all(|x| *x == 0.0), "audio before the event stays silent");
    }

    #[test]
    fn test_peak_never_exceeds_master_ceiling() {
        let loud: SampleBuffer = (0..44100).map(|i| ((i as f32) * 0.05).sin() * 0.94).collect();
        let original = AudioBuffer::mono(loud);
        let digest = silent_digest(1.0);
        let events: Vec<NuanceEvent> = (0..8)
            .map(|i| forced_event(NuanceType::Percussion, i as f32 * 0.12))
            .collect();
        let mut catalog = empty_catalog("ceiling");
        let params = Parameters { intensity: 1.0, ..Parameters::default() };
        let mut rng = StdRng::seed_from_u64(17);

        let (enhanced, _) = render(&original, 44100, &digest, &events, &mut catalog, &params, &mut rng)
            .expect("render must succeed");
        assert!(enhanced.peak() <= MASTER_PEAK_CEILING + 1e-4, "peak {} over ceiling", enhanced.peak());
    }

    #[test]
    fn test_normalization_never_amplifies_quiet_tracks() {
        let quiet = AudioBuffer::mono(vec![0.01f32; 44100]);
        let digest = silent_digest(1.0);
        let mut catalog = empty_catalog("quiet");
        let params = Parameters::default();
        let mut rng = StdRng::seed_from_u64(2);
        let (enhanced, _) =
            render(&quiet, 44100, &digest, &[], &mut catalog, &params, &mut rng).unwrap();
        assert_eq!(enhanced, quiet, "no events and low peak must leave the track untouched");
    }

    #[test]
    fn test_mono_clip_upmixes_into_stereo_track() {
        let original = AudioBuffer::silence(2, 44100);
        let digest = silent_digest(1.0);
        let events = vec![forced_event(NuanceType::Fx, 0.25)];
        let mut catalog = empty_catalog("stereo");
        let params = Parameters::default();
        let mut rng = StdRng::seed_from_u64(33);

        let (enhanced, _) = render(&original, 44100, &digest, &events, &mut catalog, &params, &mut rng)
            .expect("render must succeed");
        assert_eq!(enhanced.n_channels(), 2);
        for channel in &enhanced.channels {
            assert!(channel.iter().any(|x| x.abs() > 0.0), "both channels receive the mono clip");
        }
        assert_eq!(enhanced.channels[0], enhanced.channels[1], "duplicated clip is identical per channel");
    }

    #[test]
    fn test_negative_jitter_clamps_to_track_start() {
        let original = AudioBuffer::silence(1, 44100);
        let digest = silent_digest(1.0);
        let events = vec![forced_event(NuanceType::Percussion, -0.03)];
        let mut catalog = empty_catalog("negative");
        let params = Parameters::default();
        let mut rng = StdRng::seed_from_u64(12);

        let (enhanced, _) = render(&original, 44100, &digest, &events, &mut catalog, &params, &mut rng)
            .expect("render must succeed");
        assert!(enhanced.channels[0][..100].iter().any(|x| x.abs() > 0.0), "clip lands at sample zero");
    }

    #[test]
    fn test_event_past_buffer_end_is_recorded_but_inaudible() {
        let original = AudioBuffer::silence(1, 4410);
        let digest = silent_digest(0.1);
        let events = vec![forced_event(NuanceType::Riser, 5.0)];
        let mut catalog = empty_catalog("late");
        let params = Parameters::default();
        let mut rng = StdRng::seed_from_u64(8);

        let (enhanced, map) = render(&original, 44100, &digest, &events, &mut catalog, &params, &mut rng)
            .expect("render must succeed");
        assert_eq!(map.events.len(), 1);
        assert!(enhanced.channels[0].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_render_is_reproducible_for_a_seed() {
        let original = AudioBuffer::silence(1, 88200);
        let digest = silent_digest(2.0);
        let events = vec![
            forced_event(NuanceType::Texture, 0.2),
            forced_event(NuanceType::Fx, 0.9),
            forced_event(NuanceType::Percussion, 1.5),
        ];
        let params = Parameters::default();

        let mut catalog_a = empty_catalog("repro-a");
        let mut rng_a = StdRng::seed_from_u64(555);
        let (out_a, _) =
            render(&original, 44100, &digest, &events, &mut catalog_a, &params, &mut rng_a).unwrap();

        let mut catalog_b = empty_catalog("repro-b");
        let mut rng_b = StdRng::seed_from_u64(555);
        let (out_b, _) =
            render(&original, 44100, &digest, &events, &mut catalog_b, &params, &mut rng_b).unwrap();

        assert_eq!(out_a, out_b, "identical seeds and inputs must reproduce the mix exactly");
    }
}
