use anyhow::Context;
use awarecore::capture::StereoCapture;
use std::io::Write;
use std::path::Path;

/// `Left,Right` header followed by one row per frame.
pub fn write_csv<W: Write>(writer: W, capture: &StereoCapture) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Left", "Right"])?;
    for [left, right] in capture.frames() {
        csv_writer.serialize((left, right))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_csv(path: &Path, capture: &StereoCapture) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(file, capture).with_context(|| format!("writing CSV {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_one_row_per_frame() {
        let capture = StereoCapture {
            left: vec![0, -32768],
            right: vec![5, 32767],
            sample_rate: 48_000,
        };
        let mut out = Vec::new();
        write_csv(&mut out, &capture).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Left,Right\n0,5\n-32768,32767\n"
        );
    }
}
