use anyhow::Context;
use awarecore::capture::StereoCapture;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{Seek, Write};
use std::path::Path;

fn spec(capture: &StereoCapture) -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate: capture.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// 16-bit stereo PCM, left then right in each frame.
pub fn write_wav<W: Write + Seek>(writer: W, capture: &StereoCapture) -> Result<(), hound::Error> {
    let mut wav = WavWriter::new(writer, spec(capture))?;
    for [left, right] in capture.frames() {
        wav.write_sample(left)?;
        wav.write_sample(right)?;
    }
    wav.finalize()
}

pub fn save_wav(path: &Path, capture: &StereoCapture) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_wav(std::io::BufWriter::new(file), capture)
        .with_context(|| format!("writing WAV {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn wav_round_trips_interleaved_frames() {
        let capture = StereoCapture {
            left: vec![1, -2, 3],
            right: vec![100, 200, -300],
            sample_rate: 48_000,
        };
        let mut cursor = Cursor::new(Vec::new());
        write_wav(&mut cursor, &capture).unwrap();

        cursor.set_position(0);
        let mut reader = hound::WavReader::new(cursor).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48_000);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 100, -2, 200, 3, -300]);
    }
}
