use std::fs;
use std::path::Path;

use crate::error::NuanceError;
use crate::synth::SampleBuffer;

/// Scale a buffer down so its peak does not exceed `ceiling`. Quiet signals
/// are left alone; this never amplifies.
pub fn cap_peak(buffer: &mut SampleBuffer, ceiling: f32) {
    let max_amplitude = buffer.iter().map(|&sample| sample.abs()).fold(0.0, f32::max);

    if max_amplitude > ceiling && max_amplitude != 0.0 {
        let scale = ceiling / max_amplitude;
        buffer.iter_mut().for_each(|sample| *sample *= scale);
    }
}

/// Peak-cap a multi-channel buffer with a single gain so channel balance is
/// preserved.
pub fn cap_peak_channels(channels: &mut [SampleBuffer], ceiling: f32) {
    let max_amplitude = channels
        .iter()
        .flat_map(|ch| ch.iter())
        .map(|&sample| sample.abs())
        .fold(0.0, f32::max);

    if max_amplitude > ceiling && max_amplitude != 0.0 {
        let scale = ceiling / max_amplitude;
        for channel in channels.iter_mut() {
            channel.iter_mut().for_each(|sample| *sample *= scale);
        }
    }
}

pub fn amp_scale(buffer: &mut SampleBuffer, amp: f32) {
    buffer.iter_mut().for_each(|sample| *sample *= amp)
}

/// Ensure the parent directory of `path` exists.
pub fn with_dir(path: &str) {
    let path = Path::new(path);
    let dir = if path.extension().is_some() {
        path.parent().unwrap_or_else(|| Path::new("/"))
    } else {
        path
    };
    if !dir.as_os_str().is_empty() && !dir.exists() {
        let _ = fs::create_dir_all(dir);
    }
}

/// Write a planar multi-channel buffer as a 32-bit float WAV.
///
/// The file is written to a `.part` sibling and renamed into place, so a
/// failed run never leaves a truncated file at the destination.
pub fn write_audio_file(path: &str, channels: &[SampleBuffer], sample_rate: u32) -> Result<(), NuanceError> {
    if channels.is_empty() {
        return Err(NuanceError::OutputWrite(format!("no channels to write to {}", path)));
    }
    with_dir(path);

    let part_path = format!("{}.part", path);
    match write_interleaved(&part_path, channels, sample_rate) {
        Ok(()) => fs::rename(&part_path, path)
            .map_err(|e| NuanceError::OutputWrite(format!("{}: {}", path, e))),
        Err(e) => {
            let _ = fs::remove_file(&part_path);
            Err(e)
        }
    }
}

fn write_interleaved(path: &str, channels: &[SampleBuffer], sample_rate: u32) -> Result<(), NuanceError> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| NuanceError::OutputWrite(format!("{}: {}", path, e)))?;

    let n_samples = channels[0].len();
    for i in 0..n_samples {
        for channel in channels {
            writer
                .write_sample(channel[i])
                .map_err(|e| NuanceError::OutputWrite(format!("{}: {}", path, e)))?;
        }
    }
    writer.finalize().map_err(|e| NuanceError::OutputWrite(format!("{}: {}", path, e)))
}
