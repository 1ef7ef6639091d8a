use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::archetypes;
use crate::error::NuanceError;
use crate::sampler;
use crate::synth::{SRf, SRu};
use crate::types::{AudioBuffer, AudioClip, ClipOrigin, NuanceType};

/// How many dispensed names to remember per category before repeats are
/// allowed again.
const RECENCY_LIMIT: usize = 3;

const DEFAULT_GENERATION_RATE: f32 = 0.85;

struct CategoryPool {
    clips: Vec<AudioClip>,
    recent: VecDeque<String>,
}

impl CategoryPool {
    fn empty() -> Self {
        CategoryPool { clips: Vec::new(), recent: VecDeque::new() }
    }
}

/// Per-run library of dispensable sounds: file-backed pools for the four
/// categories plus the synthesis bank as an inexhaustible fallback.
///
/// State (recency queues, generation rate) mutates on every dispense, so a
/// catalog belongs to exactly one run at a time; concurrent runs take their
/// own instance.
pub struct SampleCatalog {
    root: PathBuf,
    pools: [CategoryPool; 4],
    generation_rate: f32,
}

impl SampleCatalog {
    /// Scan `root` for file-backed clips. A missing root is bootstrapped
    /// with empty category directories and is never fatal; unreadable files
    /// are warned about and skipped.
    pub fn load(root: &Path) -> SampleCatalog {
        let mut catalog = SampleCatalog {
            root: root.to_path_buf(),
            pools: [CategoryPool::empty(), CategoryPool::empty(), CategoryPool::empty(), CategoryPool::empty()],
            generation_rate: DEFAULT_GENERATION_RATE,
        };

        if !root.exists() {
            println!("Samples directory {} not found. Creating with example structure...", root.display());
            if let Err(e) = catalog.create_sample_structure() {
                eprintln!("Could not create sample structure under {}: {}", root.display(), e);
            }
            return catalog;
        }

        for kind in NuanceType::ALL {
            let dir = root.join(kind.dir_name());
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let is_wav = path
                    .extension()
                    .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("wav"))
                    .unwrap_or(false);
                if !is_wav {
                    continue;
                }
                match sampler::read_clip(&path, kind) {
                    Ok(clip) => catalog.pools[kind.index()].clips.push(clip),
                    Err(e) => eprintln!("Error loading {}: {}", path.display(), e),
                }
            }
        }

        let counts: Vec<(&str, usize)> = NuanceType::ALL
            .iter()
            .map(|kind| (kind.dir_name(), catalog.pools[kind.index()].clips.len()))
            .collect();
        println!("Loaded samples: {:?}", counts);
        catalog
    }

    /// Create the expected category layout plus a README for users.
    fn create_sample_structure(&self) -> std::io::Result<()> {
        for kind in NuanceType::ALL {
            fs::create_dir_all(self.root.join(kind.dir_name()))?;
        }
        let readme = "\
# Nuance Samples

Place your audio samples (.wav files) in the following directories:

- `percussion/` - Drum hits, crashes, fills
- `texture/` - Ambient sounds, pads, atmospheres
- `riser/` - Build-ups, sweeps, risers
- `fx/` - Vocal chops, glitches, sound effects

All samples should be WAV files and relatively short (< 10 seconds).
Procedurally synthesized sounds fill any gap automatically.
";
        fs::write(self.root.join("README.md"), readme)
    }

    /// Mirror the active run's creativity level. Must be set before
    /// dispensing for a run.
    pub fn set_generation_rate(&mut self, rate: f32) {
        self.generation_rate = rate;
    }

    pub fn pool_size(&self, kind: NuanceType) -> usize {
        self.pools[kind.index()].clips.len()
    }

    /// Dispense a clip for `kind`: synthesize a fresh one when the draw
    /// lands under the generation rate or the file pool is empty, otherwise
    /// pick a file-backed clip while avoiding the recently dispensed names.
    ///
    /// Synthesized clips are never cached and never enter the recency queue.
    pub fn get_sample<R: Rng>(&mut self, kind: NuanceType, rng: &mut R) -> Result<AudioClip, NuanceError> {
        let pool = &mut self.pools[kind.index()];
        let use_synthesis = rng.gen_range(0.0..1.0) < self.generation_rate || pool.clips.is_empty();
        if use_synthesis {
            return synthesize_clip(kind, rng);
        }

        let mut candidates: Vec<usize> = pool
            .clips
            .iter()
            .enumerate()
            .filter(|(_, clip)| !pool.recent.contains(&clip.name))
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            // every clip was recent: forget history and retry the full pool
            pool.recent.clear();
            candidates = (0..pool.clips.len()).collect();
        }

        let index = candidates.choose(rng).copied().unwrap_or(0);
        let clip = pool.clips[index].clone();

        pool.recent.push_back(clip.name.clone());
        if pool.recent.len() > RECENCY_LIMIT {
            pool.recent.pop_front();
        }

        Ok(clip)
    }
}

/// Manufacture a one-off clip for the category. Archetype dispatch follows
/// the category's character: percussion draws a random hit flavor, fx
/// coin-flips between vocal chops and glitches.
fn synthesize_clip<R: Rng>(kind: NuanceType, rng: &mut R) -> Result<AudioClip, NuanceError> {
    let tag = rng.gen_range(10000..100000u32);
    let (samples, label) = match kind {
        NuanceType::Percussion => {
            let flavor = archetypes::random_hit_kind(rng);
            (archetypes::percussive_hit(rng, flavor)?, flavor.label())
        }
        NuanceType::Texture => {
            let duration = rng.gen_range(1.5..3.0);
            let base_freq = rng.gen_range(80.0..300.0);
            (archetypes::texture_pad(rng, duration, base_freq)?, "texture")
        }
        NuanceType::Riser => {
            let duration = rng.gen_range(1.0..2.5);
            (archetypes::riser(rng, duration)?, "riser")
        }
        NuanceType::Fx => {
            if rng.gen_bool(0.5) {
                (archetypes::vocal_chop(rng)?, "vocal_chop")
            } else {
                (archetypes::glitch(rng)?, "glitch")
            }
        }
    };

    let duration = samples.len() as f32 / SRf;
    Ok(AudioClip {
        audio: AudioBuffer::mono(samples),
        sample_rate: SRu,
        duration,
        origin: ClipOrigin::Procedural,
        name: format!("ai_{}_{}", label, tag),
        category: kind,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nuance-catalog-{}", label))
    }

    fn seed_library(root: &Path, category: NuanceType, names: &[&str]) {
        let dir = root.join(category.dir_name());
        fs::create_dir_all(&dir).unwrap();
        for (i, name) in names.iter().enumerate() {
            let tone: Vec<f32> = (0..2205).map(|j| ((j + i) as f32 * 0.01).sin() * 0.2).collect();
            render::write_audio_file(dir.join(format!("{}.wav", name)).to_str().unwrap(), &[tone], 44100)
                .unwrap();
        }
    }

    #[test]
    fn test_missing_root_bootstraps_and_synthesizes() {
        let root = scratch_dir("bootstrap");
        let _ = fs::remove_dir_all(&root);

        let mut catalog = SampleCatalog::load(&root);
        assert!(root.join("percussion").exists());
        assert!(root.join("README.md").exists());

        catalog.set_generation_rate(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        // empty pool forces the synthesis fallback even at rate zero
        let clip = catalog.get_sample(NuanceType::Riser, &mut rng).unwrap();
        assert_eq!(clip.origin, ClipOrigin::Procedural);
        assert_eq!(clip.sample_rate, 44100);
        assert!(clip.name.starts_with("ai_riser_"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_recency_queue_blocks_recent_names() {
        let root = scratch_dir("recency");
        let _ = fs::remove_dir_all(&root);
        seed_library(&root, NuanceType::Percussion, &["a", "b", "c", "d", "e"]);

        let mut catalog = SampleCatalog::load(&root);
        assert_eq!(catalog.pool_size(NuanceType::Percussion), 5);
        catalog.set_generation_rate(0.0);

        let mut rng = StdRng::seed_from_u64(42);
        let mut recent: Vec<String> = Vec::new();
        for _ in 0..40 {
            let clip = catalog.get_sample(NuanceType::Percussion, &mut rng).unwrap();
            assert_eq!(clip.origin, ClipOrigin::File);
            assert!(
                !recent.contains(&clip.name),
                "clip {} was dispensed while still in the recency window {:?}",
                clip.name,
                recent
            );
            recent.push(clip.name);
            if recent.len() > RECENCY_LIMIT {
                recent.remove(0);
            }
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_small_pool_resets_instead_of_starving() {
        let root = scratch_dir("small-pool");
        let _ = fs::remove_dir_all(&root);
        seed_library(&root, NuanceType::Texture, &["only", "other"]);

        let mut catalog = SampleCatalog::load(&root);
        catalog.set_generation_rate(0.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..12 {
            let clip = catalog.get_sample(NuanceType::Texture, &mut rng).unwrap();
            assert_eq!(clip.origin, ClipOrigin::File);
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_full_generation_rate_always_synthesizes() {
        let root = scratch_dir("always-ai");
        let _ = fs::remove_dir_all(&root);
        seed_library(&root, NuanceType::Fx, &["stored"]);

        let mut catalog = SampleCatalog::load(&root);
        catalog.set_generation_rate(1.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..6 {
            let clip = catalog.get_sample(NuanceType::Fx, &mut rng).unwrap();
            assert_eq!(clip.origin, ClipOrigin::Procedural);
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_unreadable_file_is_skipped_not_fatal() {
        let root = scratch_dir("corrupt");
        let _ = fs::remove_dir_all(&root);
        seed_library(&root, NuanceType::Percussion, &["good"]);
        fs::write(root.join("percussion/broken.wav"), b"not a wav at all").unwrap();

        let catalog = SampleCatalog::load(&root);
        assert_eq!(catalog.pool_size(NuanceType::Percussion), 1);

        let _ = fs::remove_dir_all(&root);
    }
}
