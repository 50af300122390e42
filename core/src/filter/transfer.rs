use std::io::Read;
use std::path::Path;

use num_complex::Complex64;

use crate::math::poly::PolyHelper;
use crate::prelude::{ToolError, ToolResult};

/// IIR transfer function with coefficients in ascending powers of z^-1.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

/// Zeros, poles and gain in the z-plane.
///
/// `delay` counts samples of pure delay coming from leading zero numerator
/// coefficients. Those zeros at infinity cannot be represented as roots, so
/// they are carried separately.
#[derive(Debug, Clone, PartialEq)]
pub struct Zpk {
    pub zeros: Vec<Complex64>,
    pub poles: Vec<Complex64>,
    pub gain: f64,
    pub delay: usize,
}

impl TransferFunction {
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Self {
        Self { b, a }
    }

    pub fn load(path: &Path) -> ToolResult<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            ToolError::InvalidInput(format!("opening {}: {}", path.display(), err))
        })?;
        Self::from_csv_reader(file)
    }

    /// Two-column CSV, numerator in the first column and denominator in the
    /// second. The first row is a header and its names are not checked. A
    /// column may end early when the two polynomials differ in length.
    pub fn from_csv_reader<R: Read>(reader: R) -> ToolResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut b = Column::new("b");
        let mut a = Column::new("a");
        for (index, record) in csv_reader.records().enumerate() {
            let fallback_line = index + 2;
            let record = record.map_err(|err| {
                let line = err
                    .position()
                    .map(|pos| pos.line() as usize)
                    .unwrap_or(fallback_line);
                ToolError::parse(line, err.to_string())
            })?;
            let line = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(fallback_line);
            b.push(record.get(0), line)?;
            a.push(record.get(1), line)?;
        }

        if b.values.is_empty() || a.values.is_empty() {
            return Err(ToolError::InvalidInput(
                "coefficient file needs at least one b and one a value".into(),
            ));
        }

        Ok(Self::new(b.values, a.values))
    }

    /// Order of the filter, i.e. the longer polynomial's degree.
    pub fn order(&self) -> usize {
        self.b.len().max(self.a.len()).saturating_sub(1)
    }

    /// Both polynomials padded with trailing zeros to the same length and
    /// divided by `a[0]`.
    pub fn normalized(&self) -> ToolResult<Self> {
        let len = self.b.len().max(self.a.len());
        if len == 0 {
            return Err(ToolError::InvalidInput("empty transfer function".into()));
        }
        let lead = self.a.first().copied().unwrap_or(0.0);
        if lead == 0.0 {
            return Err(ToolError::InvalidInput(
                "leading denominator coefficient a[0] must be nonzero".into(),
            ));
        }

        let scale = |coeffs: &[f64]| {
            let mut padded: Vec<f64> = coeffs.iter().map(|c| c / lead).collect();
            padded.resize(len, 0.0);
            padded
        };
        Ok(Self::new(scale(&self.b), scale(&self.a)))
    }

    pub fn to_zpk(&self) -> ToolResult<Zpk> {
        let normalized = self.normalized()?;
        let delay = normalized
            .b
            .iter()
            .position(|&c| c != 0.0)
            .ok_or_else(|| ToolError::InvalidInput("numerator is all zeros".into()))?;

        let numerator = &normalized.b[delay..];
        let gain = numerator[0];
        // With equal-length polynomials in z^-1, multiplying through by z^N
        // turns both into ordinary polynomials in z with the same coefficients.
        let zeros = PolyHelper::roots(numerator)?;
        let poles = PolyHelper::roots(&normalized.a)?;

        Ok(Zpk {
            zeros,
            poles,
            gain,
            delay,
        })
    }
}

struct Column {
    name: &'static str,
    values: Vec<f64>,
    ended_at: Option<usize>,
}

impl Column {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            values: Vec::new(),
            ended_at: None,
        }
    }

    fn push(&mut self, cell: Option<&str>, line: usize) -> ToolResult<()> {
        match cell.filter(|text| !text.is_empty()) {
            None => {
                self.ended_at.get_or_insert(line);
                Ok(())
            }
            Some(text) => {
                if let Some(ended) = self.ended_at {
                    return Err(ToolError::parse(
                        line,
                        format!("column {} resumes after ending at line {}", self.name, ended),
                    ));
                }
                let value: f64 = text.parse().map_err(|_| {
                    ToolError::parse(line, format!("'{}' is not a number in column {}", text, self.name))
                })?;
                if !value.is_finite() {
                    return Err(ToolError::parse(
                        line,
                        format!("non-finite value in column {}", self.name),
                    ));
                }
                self.values.push(value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn csv_reads_both_columns_and_skips_header() {
        let text = "b,a\n0.25,1.0\n0.5,-0.4\n0.25,0.1\n";
        let tf = TransferFunction::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(tf.b, vec![0.25, 0.5, 0.25]);
        assert_eq!(tf.a, vec![1.0, -0.4, 0.1]);
        assert_eq!(tf.order(), 2);
    }

    #[test]
    fn csv_allows_short_column() {
        let text = "num,den\n1.0,1.0\n,0.5\n";
        let tf = TransferFunction::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(tf.b, vec![1.0]);
        assert_eq!(tf.a, vec![1.0, 0.5]);
    }

    #[test]
    fn csv_reports_line_of_bad_number() {
        let text = "b,a\n1.0,1.0\n0.x,0.5\n";
        match TransferFunction::from_csv_reader(text.as_bytes()) {
            Err(ToolError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn csv_rejects_gap_in_column() {
        let text = "b,a\n1.0,1.0\n,0.5\n2.0,0.1\n";
        assert!(TransferFunction::from_csv_reader(text.as_bytes()).is_err());
    }

    #[test]
    fn csv_rejects_header_only() {
        assert!(TransferFunction::from_csv_reader("b,a\n".as_bytes()).is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"b,a\n1,2\n").unwrap();
        let path = temp.into_temp_path();
        let tf = TransferFunction::load(&path).unwrap();
        assert_eq!(tf.a, vec![2.0]);
    }

    #[test]
    fn normalized_divides_by_a0_and_pads() {
        let tf = TransferFunction::new(vec![2.0], vec![2.0, 1.0]);
        let norm = tf.normalized().unwrap();
        assert_eq!(norm.b, vec![1.0, 0.0]);
        assert_eq!(norm.a, vec![1.0, 0.5]);
    }

    #[test]
    fn zpk_rejects_zero_a0() {
        let tf = TransferFunction::new(vec![1.0], vec![0.0, 1.0]);
        assert!(tf.to_zpk().is_err());
    }

    #[test]
    fn zpk_of_first_order_section() {
        let tf = TransferFunction::new(vec![0.5, 0.5], vec![1.0, -0.2]);
        let zpk = tf.to_zpk().unwrap();
        assert_eq!(zpk.gain, 0.5);
        assert_eq!(zpk.delay, 0);
        assert!((zpk.zeros[0] - Complex64::new(-1.0, 0.0)).norm() < 1e-12);
        assert!((zpk.poles[0] - Complex64::new(0.2, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn zpk_counts_leading_numerator_zeros_as_delay() {
        let tf = TransferFunction::new(vec![0.0, 0.3], vec![1.0, -0.7]);
        let zpk = tf.to_zpk().unwrap();
        assert_eq!(zpk.delay, 1);
        assert_eq!(zpk.gain, 0.3);
        assert!(zpk.zeros.is_empty());
        assert_eq!(zpk.poles.len(), 1);
    }
}
