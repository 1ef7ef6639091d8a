/// Settings for the synthesis engine: sample rate family, Nyquist limits,
/// and convenient aliases for standard constants at f32 precision.
///
/// Every procedurally generated clip is rendered at `SR`; file-backed clips
/// keep their native rate until the compositor reconciles them.

pub const pi: f32 = std::f32::consts::PI;
pub const pi2: f32 = pi * 2f32;

pub type SampleBuffer = Vec<f32>;

pub const SR: usize = 44100;
pub const SRi: i32 = SR as i32;
pub const SRf: f32 = SR as f32;
pub const SRu: u32 = SR as u32;

// Nyquist Frequency: Maximum renderable frequency
pub const NF: usize = SR / 2;
pub const NFf: f32 = SR as f32 / 2f32;

// Minimum Frequency: Minimum supported application frequency
pub const MF: usize = 24;
pub const MFf: f32 = MF as f32;

// Aliases for Time Domain
pub const SECONDS_PER_SAMPLE: f32 = 1.0 / SRf;
pub const SAMPLES_PER_MILLISECOND: f32 = SRf / 1000.0;

/// Peak ceiling for raw archetype output, applied before the effect chain.
pub const RAW_PEAK_CEILING: f32 = 0.4;

/// Peak ceiling for the final composited track.
pub const MASTER_PEAK_CEILING: f32 = 0.95;
