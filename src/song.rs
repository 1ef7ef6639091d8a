//! Batch pipeline for one track: load the digest and audio, schedule the
//! nuances, composite them in, and persist the enhanced WAV plus its map.

use std::fs;
use std::path::Path;

use rand::Rng;

use crate::arg_parse;
use crate::catalog::SampleCatalog;
use crate::compositor;
use crate::error::NuanceError;
use crate::render;
use crate::sampler;
use crate::scheduler;
use crate::types::{AudioBuffer, NuanceMap, Parameters};

/// Sidecar path for the persisted map, next to the enhanced audio.
pub fn map_path_for(output_path: &str) -> String {
    match output_path.strip_suffix(".wav") {
        Some(stem) => format!("{}_nuance_map.json", stem),
        None => format!("{}_nuance_map.json", output_path),
    }
}

/// Process one track start to finish. Synchronous and single-threaded; the
/// catalog instance lives and dies with this call, so a failure cannot leak
/// state into subsequent tracks.
pub fn process_track<R: Rng>(
    digest_path: &str,
    input_path: &str,
    output_path: &str,
    samples_dir: &str,
    params: &Parameters,
    rng: &mut R,
) -> Result<NuanceMap, NuanceError> {
    println!("Processing {} -> {}", input_path, output_path);

    let digest = arg_parse::load_digest_from_file(digest_path)?;
    let (channels, sample_rate) = sampler::read_audio_file(Path::new(input_path))?;
    let original = AudioBuffer { channels };

    let mut catalog = SampleCatalog::load(Path::new(samples_dir));
    catalog.set_generation_rate(params.creativity_level);

    let events = scheduler::schedule(&digest, params, rng);
    let (enhanced, mut map) =
        compositor::render(&original, sample_rate, &digest, &events, &mut catalog, params, rng)?;
    map.input_file = input_path.to_string();
    map.output_file = output_path.to_string();

    render::write_audio_file(output_path, &enhanced.channels, sample_rate)?;

    let map_path = map_path_for(output_path);
    let encoded = serde_json::to_string_pretty(&map)
        .map_err(|e| NuanceError::OutputWrite(format!("cannot encode nuance map: {}", e)))?;
    fs::write(&map_path, encoded)
        .map_err(|e| NuanceError::OutputWrite(format!("{}: {}", map_path, e)))?;

    println!("Processing complete! Added {} nuances.", map.events.len());
    println!("Nuance map saved to: {}", map_path);
    Ok(map)
}

/// Schedule against the digest and report, without touching any audio.
pub fn dry_run<R: Rng>(digest_path: &str, params: &Parameters, rng: &mut R) -> Result<(), NuanceError> {
    let digest = arg_parse::load_digest_from_file(digest_path)?;
    let events = scheduler::schedule(&digest, params, rng);

    println!("Analysis Results:");
    println!("  Tempo: {:.1} BPM", digest.tempo);
    println!("  Duration: {:.1} seconds", digest.duration);
    println!("  Beats: {}", digest.beats.len());
    println!("  Nuances scheduled: {}", events.len());
    for (i, event) in events.iter().take(10).enumerate() {
        println!("  Event {}: {:?} at {:.2}s (bar {})", i + 1, event.kind, event.time, event.bar_number);
    }
    if events.len() > 10 {
        println!("  ... and {} more events", events.len() - 10);
    }
    Ok(())
}
