use serde::{Deserialize, Serialize};

use crate::synth::SampleBuffer;

/// Planar multi-channel audio. Mono is the one-channel case; all channels
/// hold the same number of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub channels: Vec<SampleBuffer>,
}

impl AudioBuffer {
    pub fn mono(samples: SampleBuffer) -> Self {
        AudioBuffer { channels: vec![samples] }
    }

    pub fn silence(n_channels: usize, n_samples: usize) -> Self {
        AudioBuffer { channels: vec![vec![0f32; n_samples]; n_channels] }
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn n_samples(&self) -> usize {
        self.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    pub fn is_mono(&self) -> bool {
        self.channels.len() == 1
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|sample| sample.abs())
            .fold(0f32, f32::max)
    }

    /// Average the channels down to a single one.
    pub fn downmix(&self) -> SampleBuffer {
        if self.channels.is_empty() {
            return Vec::new();
        }
        if self.is_mono() {
            return self.channels[0].clone();
        }
        let n = self.n_samples();
        let k = 1f32 / self.channels.len() as f32;
        (0..n).map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f32>() * k).collect()
    }
}

/// Musical features for one track, produced by the external analysis
/// collaborator. Consumed as-is; beat times are trusted to be strictly
/// increasing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureDigest {
    pub tempo: f32,
    /// Beat onsets in seconds.
    pub beats: Vec<f32>,
    /// Indices into `beats` marking downbeats (every 4th beat).
    pub downbeats: Vec<usize>,
    pub sections: Vec<Section>,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub start_beat: usize,
    pub start_time: f32,
    #[serde(rename = "type")]
    pub label: SectionLabel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    Verse,
    Chorus,
}

/// Creative controls for one run. The core passes values through unclamped;
/// range validation belongs to the caller.
///
/// `randomness`, `stereo_width` and `vintage_mode` are accepted for payload
/// compatibility but no algorithm currently consumes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Parameters {
    /// Probability of synthesizing a fresh clip instead of reusing a stored one.
    pub creativity_level: f32,
    /// Multiplier on the number of scheduled nuances, nominally [0.1, 3.0].
    pub nuance_density: f32,
    /// Overall volume/energy level, nominally [0.1, 1.0].
    pub intensity: f32,
    /// Balance between percussive and textural types (0 = percussion, 1 = texture).
    pub texture_preference: f32,
    pub randomness: f32,
    pub stereo_width: f32,
    pub vintage_mode: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            creativity_level: 0.85,
            nuance_density: 1.0,
            intensity: 0.7,
            texture_preference: 0.5,
            randomness: 0.5,
            stereo_width: 0.5,
            vintage_mode: false,
        }
    }
}

/// The four nuance categories. Matched exhaustively everywhere; there is no
/// catch-all category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NuanceType {
    Percussion,
    Texture,
    Riser,
    Fx,
}

impl NuanceType {
    pub const ALL: [NuanceType; 4] =
        [NuanceType::Percussion, NuanceType::Texture, NuanceType::Riser, NuanceType::Fx];

    /// Subdirectory name under the sample root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            NuanceType::Percussion => "percussion",
            NuanceType::Texture => "texture",
            NuanceType::Riser => "riser",
            NuanceType::Fx => "fx",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            NuanceType::Percussion => 0,
            NuanceType::Texture => 1,
            NuanceType::Riser => 2,
            NuanceType::Fx => 3,
        }
    }
}

/// One scheduled micro-sound insertion. Produced by the scheduler, read-only
/// downstream. Emission order follows ascending beat index; the jittered
/// `time` is not guaranteed monotonic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NuanceEvent {
    /// Insertion time in seconds, humanizing jitter included.
    pub time: f32,
    #[serde(rename = "type")]
    pub kind: NuanceType,
    pub beat_index: usize,
    pub bar_number: usize,
    /// In (0, 0.4] for any parameter combination.
    pub volume_scale: f32,
    pub context: EventContext,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EventContext {
    pub beat_in_bar: usize,
    pub section_boundary: bool,
    pub tempo: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOrigin {
    /// Loaded from the sample library on disk.
    File,
    /// Manufactured by the synthesis bank for this dispense.
    Procedural,
}

/// A dispensable sound. Immutable once produced.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub audio: AudioBuffer,
    pub sample_rate: u32,
    pub duration: f32,
    pub origin: ClipOrigin,
    pub name: String,
    pub category: NuanceType,
}

/// Write-once summary of a processed track, persisted alongside the
/// enhanced audio. The schema round-trips through JSON unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NuanceMap {
    pub input_file: String,
    pub output_file: String,
    pub analysis: AnalysisSummary,
    pub events: Vec<NuanceEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub tempo: f32,
    pub duration: f32,
    pub num_beats: usize,
    pub num_sections: usize,
}
