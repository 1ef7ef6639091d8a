use std::path::Path;

use hound::{self, WavReader};
use rubato::{FftFixedInOut, Resampler};

use crate::error::NuanceError;
use crate::synth::SampleBuffer;
use crate::types::{AudioBuffer, AudioClip, ClipOrigin, NuanceType};

fn clip_error(path: &Path, reason: impl std::fmt::Display) -> NuanceError {
    NuanceError::ClipLoad { path: path.display().to_string(), reason: reason.to_string() }
}

/// Reads a WAV file into planar per-channel samples normalized to [-1, 1].
///
/// # Parameters
/// - `path`: Path to the WAV file.
///
/// # Returns
/// A tuple of per-channel sample vectors and the file's sample rate.
///
/// # Errors
/// Returns an error if the file cannot be opened or has an unsupported bit
/// depth or format.
pub fn read_audio_file(path: &Path) -> Result<(Vec<SampleBuffer>, u32), NuanceError> {
    let mut reader = WavReader::open(path).map_err(|e| clip_error(path, e))?;
    let spec = reader.spec();

    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        return Err(clip_error(path, "file declares zero channels"));
    }
    let mut channel_samples: Vec<SampleBuffer> = vec![vec![]; num_channels];

    match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => {
                for (i, sample) in reader.samples::<i16>().enumerate() {
                    let sample = sample.map_err(|e| clip_error(path, e))? as f32 / i16::MAX as f32;
                    channel_samples[i % num_channels].push(sample);
                }
            }
            24 => {
                const MAX_24BIT: f32 = (1 << 23) as f32;
                for (i, sample) in reader.samples::<i32>().enumerate() {
                    let sample = sample.map_err(|e| clip_error(path, e))? as f32 / MAX_24BIT;
                    channel_samples[i % num_channels].push(sample);
                }
            }
            32 => {
                for (i, sample) in reader.samples::<i32>().enumerate() {
                    let sample = sample.map_err(|e| clip_error(path, e))? as f32 / i32::MAX as f32;
                    channel_samples[i % num_channels].push(sample);
                }
            }
            other => return Err(clip_error(path, format!("Unsupported bit depth: {}", other))),
        },
        hound::SampleFormat::Float => {
            for (i, sample) in reader.samples::<f32>().enumerate() {
                let sample = sample.map_err(|e| clip_error(path, e))?;
                channel_samples[i % num_channels].push(sample);
            }
        }
    };

    Ok((channel_samples, spec.sample_rate))
}

/// Load one sample-library file as a dispensable clip. The native sample
/// rate is preserved; rate reconciliation happens at mix time.
pub fn read_clip(path: &Path, category: NuanceType) -> Result<AudioClip, NuanceError> {
    let (channels, sample_rate) = read_audio_file(path)?;
    let n_samples = channels.first().map(|ch| ch.len()).unwrap_or(0);
    if n_samples == 0 {
        return Err(clip_error(path, "file contains no samples"));
    }
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(AudioClip {
        audio: AudioBuffer { channels },
        sample_rate,
        duration: n_samples as f32 / sample_rate as f32,
        origin: ClipOrigin::File,
        name,
        category,
    })
}

/// Resamples planar audio from one rate to another with an FFT resampler.
///
/// The tail chunk is zero-padded to the resampler's frame size, so output may
/// carry a short silent tail; callers truncate at mix time.
pub fn resample_channels(
    channels: &[SampleBuffer],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<SampleBuffer>, NuanceError> {
    if channels.is_empty() || from_rate == to_rate {
        return Ok(channels.to_vec());
    }

    let n_channels = channels.len();
    let len = channels[0].len();
    let mut resampler = FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, 1024, n_channels)
        .map_err(|e| NuanceError::Synthesis(format!("failed to create resampler: {}", e)))?;

    let mut out: Vec<SampleBuffer> = vec![Vec::new(); n_channels];
    let mut pos = 0usize;
    while pos < len {
        let need = resampler.input_frames_next();
        let chunk: Vec<SampleBuffer> = channels
            .iter()
            .map(|ch| {
                let end = (pos + need).min(len);
                let mut frame = ch[pos..end].to_vec();
                frame.resize(need, 0f32);
                frame
            })
            .collect();
        let processed = resampler
            .process(&chunk, None)
            .map_err(|e| NuanceError::Synthesis(format!("resampling failed: {}", e)))?;
        for (channel_out, channel_chunk) in out.iter_mut().zip(processed) {
            channel_out.extend(channel_chunk);
        }
        pos += need;
    }

    Ok(out)
}
