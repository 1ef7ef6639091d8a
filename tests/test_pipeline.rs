//! End-to-end run over a generated track: schedule, composite, persist, and
//! check the persisted artifacts against the run's invariants.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use nuance::sampler;
use nuance::song;
use nuance::synth::pi2;
use nuance::types::{NuanceMap, Parameters};

const TEST_SR: u32 = 44100;

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nuance-pipeline-{}", label));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// A simple 4/4 test song: decaying kick thumps on the beat over a held
/// chord tone.
fn write_test_track(path: &Path, duration_sec: f32, bpm: f32) {
    let n = (duration_sec * TEST_SR as f32) as usize;
    let beat_period = 60.0 / bpm;
    let samples: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / TEST_SR as f32;
            let since_beat = t % beat_period;
            let kick = (-5.0 * since_beat).exp() * (pi2 * 60.0 * t).sin() * 0.6;
            let chord = 0.25 * (pi2 * 261.63 * t).sin();
            kick + chord
        })
        .collect();
    nuance::render::write_audio_file(path.to_str().unwrap(), &[samples], TEST_SR).unwrap();
}

fn write_digest(path: &Path, bpm: f32, n_beats: usize) {
    let period = 60.0 / bpm;
    let beats: Vec<String> = (0..n_beats).map(|i| format!("{:.4}", i as f32 * period)).collect();
    let downbeats: Vec<String> = (0..n_beats).step_by(4).map(|i| i.to_string()).collect();
    let body = format!(
        r#"{{
            "tempo": {bpm},
            "beats": [{}],
            "downbeats": [{}],
            "sections": [{{"start_beat": 0, "start_time": 0.0, "type": "verse"}}],
            "duration": {}
        }}"#,
        beats.join(", "),
        downbeats.join(", "),
        n_beats as f32 * period,
    );
    fs::write(path, body).unwrap();
}

#[test]
fn test_process_track_end_to_end() {
    let dir = scratch_dir("end-to-end");
    let input = dir.join("song.wav");
    let output = dir.join("song_enhanced.wav");
    let digest = dir.join("digest.json");
    let samples_root = dir.join("samples");

    write_test_track(&input, 20.0, 120.0);
    write_digest(&digest, 120.0, 80);

    let params = Parameters { nuance_density: 2.0, ..Parameters::default() };
    let mut rng = StdRng::seed_from_u64(4242);
    let map = song::process_track(
        digest.to_str().unwrap(),
        input.to_str().unwrap(),
        output.to_str().unwrap(),
        samples_root.to_str().unwrap(),
        &params,
        &mut rng,
    )
    .expect("pipeline must succeed");

    // enhanced audio: same shape as the input, peak within the ceiling
    let (channels, sr) = sampler::read_audio_file(&output).expect("output must be readable");
    assert_eq!(sr, TEST_SR);
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].len(), (20.0 * TEST_SR as f32) as usize);
    let peak = channels[0].iter().map(|x| x.abs()).fold(0f32, f32::max);
    assert!(peak <= 0.95 + 1e-4, "peak {} exceeds the master ceiling", peak);

    // the map is stamped and persisted, and round-trips
    assert_eq!(map.input_file, input.to_str().unwrap());
    assert_eq!(map.analysis.num_beats, 80);
    let map_path = song::map_path_for(output.to_str().unwrap());
    let persisted: NuanceMap =
        serde_json::from_str(&fs::read_to_string(&map_path).expect("map must be written")).unwrap();
    assert_eq!(persisted, map);

    for event in &map.events {
        assert!(event.beat_index < 80, "beat index {} out of digest range", event.beat_index);
        assert!(event.volume_scale > 0.0 && event.volume_scale <= 0.4);
    }

    // the bootstrap created the library layout on first use
    assert!(samples_root.join("percussion").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_pipeline_is_reproducible_for_a_seed() {
    let dir = scratch_dir("repro");
    let input = dir.join("song.wav");
    let digest = dir.join("digest.json");
    write_test_track(&input, 10.0, 128.0);
    write_digest(&digest, 128.0, 40);

    let params = Parameters::default();
    let mut outputs = Vec::new();
    for run in 0..2 {
        let output = dir.join(format!("enhanced_{}.wav", run));
        let samples_root = dir.join(format!("samples_{}", run));
        let mut rng = StdRng::seed_from_u64(31337);
        song::process_track(
            digest.to_str().unwrap(),
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            samples_root.to_str().unwrap(),
            &params,
            &mut rng,
        )
        .expect("pipeline must succeed");
        let (channels, _) = sampler::read_audio_file(&output).unwrap();
        outputs.push(channels);
    }
    assert_eq!(outputs[0], outputs[1], "equal seeds over equal inputs must produce identical audio");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_digest_fails_without_partial_output() {
    let dir = scratch_dir("no-digest");
    let input = dir.join("song.wav");
    let output = dir.join("enhanced.wav");
    write_test_track(&input, 2.0, 120.0);

    let params = Parameters::default();
    let mut rng = StdRng::seed_from_u64(1);
    let result = song::process_track(
        dir.join("absent.json").to_str().unwrap(),
        input.to_str().unwrap(),
        output.to_str().unwrap(),
        dir.join("samples").to_str().unwrap(),
        &params,
        &mut rng,
    );
    assert!(result.is_err());
    assert!(!output.exists(), "a failed run must not leave output behind");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_dry_run_only_needs_the_digest() {
    let dir = scratch_dir("dry");
    let digest = dir.join("digest.json");
    write_digest(&digest, 100.0, 64);

    let mut rng = StdRng::seed_from_u64(6);
    song::dry_run(digest.to_str().unwrap(), &Parameters::default(), &mut rng)
        .expect("dry run must succeed");

    let _ = fs::remove_dir_all(&dir);
}
