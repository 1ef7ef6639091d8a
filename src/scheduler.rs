//! Decision engine: walks the beat grid and decides when, what type, and how
//! loud each nuance should be. Pure function of the digest, the parameters,
//! and the injected generator; it never looks at audio content.

use rand::Rng;

use crate::types::{EventContext, FeatureDigest, NuanceEvent, NuanceType, Parameters};

const BASE_PLACEMENT_CHANCE: f32 = 0.08;

/// Humanizing jitter applied to every emitted timestamp, in seconds.
const JITTER: f32 = 0.05;

/// Schedule nuance events across the track's beats.
///
/// Chances scale with `nuance_density`: higher at bar ends (beat 3), lower
/// on downbeats, and boosted every 8th bar where the type is forced toward
/// risers and fx for a section-boundary feel.
pub fn schedule<R: Rng>(digest: &FeatureDigest, params: &Parameters, rng: &mut R) -> Vec<NuanceEvent> {
    let mut events = Vec::new();
    let base_chance = BASE_PLACEMENT_CHANCE * params.nuance_density;

    for (i, &beat_time) in digest.beats.iter().enumerate() {
        let beat_in_bar = i % 4;
        let bar_number = i / 4;
        let boosted_bar = bar_number % 8 == 7;

        let mut chance = match beat_in_bar {
            3 => base_chance * 1.8,
            0 => base_chance * 0.2,
            _ => base_chance,
        };

        let kind = if boosted_bar {
            chance *= 2.5;
            if rng.gen_range(0.0..1.0) < 0.7 {
                NuanceType::Riser
            } else {
                NuanceType::Fx
            }
        } else {
            draw_type(params.texture_preference, rng)
        };

        if rng.gen_range(0.0..1.0) < chance {
            let jitter = rng.gen_range(-JITTER..JITTER);
            let volume_scale = contextual_volume(kind, beat_in_bar, rng);
            events.push(NuanceEvent {
                time: beat_time + jitter,
                kind,
                beat_index: i,
                bar_number,
                volume_scale,
                context: EventContext {
                    beat_in_bar,
                    section_boundary: boosted_bar,
                    tempo: digest.tempo,
                },
            });
        }
    }

    println!("Scheduled {} nuance events", events.len());
    events
}

/// Draw a type from the preference-weighted distribution. Texture absorbs
/// any residual rounding at the top of the cumulative walk.
fn draw_type<R: Rng>(texture_preference: f32, rng: &mut R) -> NuanceType {
    let weights = [
        (NuanceType::Percussion, (1.0 - texture_preference) * 2.0),
        (NuanceType::Texture, texture_preference * 2.0),
        (NuanceType::Riser, 0.3),
        (NuanceType::Fx, 0.5),
    ];

    let total: f32 = weights.iter().map(|(_, weight)| weight).sum();
    if total <= 0.0 {
        return NuanceType::Texture;
    }

    let draw = rng.gen_range(0.0..1.0);
    let mut cumulative = 0f32;
    for (kind, weight) in weights {
        cumulative += weight / total;
        if draw <= cumulative {
            return kind;
        }
    }
    NuanceType::Texture
}

/// Volume from the type's base range, reduced on downbeats so nuances never
/// compete with the main rhythm, with a humanizing wobble. Capped at 0.4.
fn contextual_volume<R: Rng>(kind: NuanceType, beat_in_bar: usize, rng: &mut R) -> f32 {
    let mut volume: f32 = match kind {
        NuanceType::Texture => rng.gen_range(0.15..0.25),
        NuanceType::Percussion => rng.gen_range(0.20..0.35),
        NuanceType::Fx => rng.gen_range(0.18..0.30),
        NuanceType::Riser => rng.gen_range(0.25..0.40),
    };

    if beat_in_bar == 0 {
        volume *= 0.6;
    }
    volume *= rng.gen_range(0.8..1.2);
    volume.min(0.4)
}
