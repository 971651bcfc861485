use std::path::Path;

use anyhow::Context;

use super::frame::StereoFrame;

// A fully decoded sample at the device rate.
#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>,
}

impl SampleBuffer {
    pub fn from_frames(data: Vec<StereoFrame>) -> Self {
        Self { data }
    }

    // Load a WAV file from disk, fold it to stereo and resample to `target_rate`.
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames: Vec<StereoFrame> = if channels == 1 {
            samples.into_iter().map(StereoFrame::mono).collect()
        } else {
            // keep the first two channels of anything wider than stereo
            samples
                .chunks_exact(channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        Ok(Self::from_frames(resample_linear(&frames, spec.sample_rate, target_rate)))
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames.len() - 1;

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx >= last {
                return frames[last];
            }
            let frac = (src_pos - idx as f64) as f32;
            let (a, b) = (frames[idx], frames[idx + 1]);
            StereoFrame {
                left: a.left + (b.left - a.left) * frac,
                right: a.right + (b.right - a.right) * frac,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_doubles_length_and_interpolates() {
        let frames = vec![StereoFrame::mono(0.0), StereoFrame::mono(1.0)];
        let out = resample_linear(&frames, 22_050, 44_100);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].left, 0.0);
        assert!((out[1].left - 0.5).abs() < 1e-6);
        assert_eq!(out[3].left, 1.0);
    }

    #[test]
    fn same_rate_is_a_copy() {
        let frames = vec![StereoFrame::mono(0.3); 5];
        assert_eq!(resample_linear(&frames, 48_000, 48_000), frames);
        assert!(resample_linear(&[], 22_050, 44_100).is_empty());
    }

    #[test]
    fn loads_a_written_wav() {
        let path = std::env::temp_dir().join(format!("padseq-test-{}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut w = hound::WavWriter::create(&path, spec).unwrap();
            for _ in 0..100 {
                w.write_sample(i16::MAX / 2).unwrap();
            }
            w.finalize().unwrap();
        }
        let buf = SampleBuffer::load_wav(&path, 48_000).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(buf.data.len(), 100);
        assert!((buf.data[0].left - 0.5).abs() < 1e-3);
        assert_eq!(buf.data[0].left, buf.data[0].right);
    }
}
