use num_complex::Complex64;

use crate::filter::transfer::{TransferFunction, Zpk};
use crate::math::poly::PolyHelper;
use crate::prelude::{ToolError, ToolResult};
use crate::telemetry::log::LogManager;

/// Cascade of second-order sections, each `[b0, b1, b2, a0, a1, a2]` with
/// `a0 == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SosMatrix {
    pub sections: Vec<[f64; 6]>,
}

impl SosMatrix {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Multiplies all sections back into a single transfer function.
    pub fn cascade(&self) -> TransferFunction {
        let mut b = vec![1.0];
        let mut a = vec![1.0];
        for section in &self.sections {
            b = PolyHelper::multiply(&b, &section[..3]);
            a = PolyHelper::multiply(&a, &section[3..]);
        }
        TransferFunction::new(b, a)
    }

    /// Largest coefficient difference between the cascade and `reference`,
    /// after normalizing both and ignoring trailing zeros.
    pub fn reconstruction_error(&self, reference: &TransferFunction) -> ToolResult<f64> {
        let expected = reference.normalized()?;
        let actual = self.cascade();
        let diff = |lhs: &[f64], rhs: &[f64]| {
            let len = lhs.len().max(rhs.len());
            (0..len)
                .map(|i| {
                    let l = lhs.get(i).copied().unwrap_or(0.0);
                    let r = rhs.get(i).copied().unwrap_or(0.0);
                    (l - r).abs()
                })
                .fold(0.0, f64::max)
        };
        Ok(diff(&expected.b, &actual.b).max(diff(&expected.a, &actual.a)))
    }
}

pub fn tf_to_sos(tf: &TransferFunction) -> ToolResult<SosMatrix> {
    let zpk = tf.to_zpk()?;
    zpk_to_sos(&zpk)
}

/// Groups poles and zeros into second-order sections.
///
/// Each step takes the remaining pole closest to the unit circle, completes it
/// with its conjugate or the next real pole, and pairs it with the nearest
/// zeros. Sections are filled from the back, so the last section holds the
/// poles closest to the unit circle and the first carries the overall gain.
pub fn zpk_to_sos(zpk: &Zpk) -> ToolResult<SosMatrix> {
    let logger = LogManager::new("biquads");
    let k = zpk.gain;

    if zpk.zeros.is_empty() && zpk.poles.is_empty() {
        let mut section = [k, 0.0, 0.0, 1.0, 0.0, 0.0];
        apply_delay(std::slice::from_mut(&mut section), zpk.delay)?;
        return Ok(SosMatrix {
            sections: vec![section],
        });
    }

    let origin = Complex64::new(0.0, 0.0);
    let mut z = zpk.zeros.clone();
    let mut p = zpk.poles.clone();
    let count = z.len().max(p.len());
    z.resize(count, origin);
    p.resize(count, origin);
    let n_sections = (count + 1) / 2;
    if count % 2 == 1 {
        z.push(origin);
        p.push(origin);
    }

    let mut z = conjugate_representatives(&z)?;
    let mut p = conjugate_representatives(&p)?;

    let mut sections = vec![[0.0; 6]; n_sections];
    for si in (0..n_sections).rev() {
        let p1 = p.remove(worst_pole(&p)?);
        let real_poles_left = p.iter().filter(|v| is_real(v)).count();
        let real_zeros_left = z.iter().filter(|v| is_real(v)).count();

        sections[si] = if is_real(&p1) && real_poles_left == 0 {
            // Last real pole: pair with a real zero and the padded origin.
            let z1 = take_nearest(&mut z, p1, Which::Real)?;
            single_section(&[z1, origin], &[p1, origin])
        } else if p.len() + 1 == z.len()
            && !is_real(&p1)
            && real_poles_left == 1
            && real_zeros_left == 1
        {
            // One real pole and one real zero remain for later; this complex
            // pole has to take a complex zero.
            let z1 = take_nearest(&mut z, p1, Which::Complex)?;
            single_section(&[z1, z1.conj()], &[p1, p1.conj()])
        } else {
            let p2 = if is_real(&p1) {
                let real_idx: Vec<usize> = (0..p.len()).filter(|&i| is_real(&p[i])).collect();
                let reals: Vec<Complex64> = real_idx.iter().map(|&i| p[i]).collect();
                p.remove(real_idx[worst_pole(&reals)?])
            } else {
                p1.conj()
            };

            if z.is_empty() {
                single_section(&[], &[p1, p2])
            } else {
                let z1 = take_nearest(&mut z, p1, Which::Any)?;
                if !is_real(&z1) {
                    single_section(&[z1, z1.conj()], &[p1, p2])
                } else if z.is_empty() {
                    single_section(&[z1], &[p1, p2])
                } else {
                    let z2 = take_nearest(&mut z, p1, Which::Real)?;
                    single_section(&[z1, z2], &[p1, p2])
                }
            }
        };
    }

    if !p.is_empty() || !z.is_empty() {
        return Err(ToolError::Numerical(format!(
            "{} poles and {} zeros left unpaired",
            p.len(),
            z.len()
        )));
    }

    for coeff in &mut sections[0][..3] {
        *coeff *= k;
    }
    apply_delay(&mut sections, zpk.delay)?;

    logger.record(&format!("paired {} sections", sections.len()));
    for (index, section) in sections.iter().enumerate() {
        logger.trace(&format!("section {}: {:?}", index, section));
    }

    Ok(SosMatrix { sections })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Which {
    Any,
    Real,
    Complex,
}

fn is_real(value: &Complex64) -> bool {
    value.im == 0.0
}

/// Index of the value closest to the unit circle; the first one on ties.
fn worst_pole(values: &[Complex64]) -> ToolResult<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        let distance = (1.0 - v.norm()).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| ToolError::Numerical("no pole left to pair".into()))
}

/// Removes and returns the zero nearest to `target` among those of the
/// requested kind. Falls back to any zero when none of that kind is left.
fn take_nearest(zeros: &mut Vec<Complex64>, target: Complex64, which: Which) -> ToolResult<Complex64> {
    let mut order: Vec<usize> = (0..zeros.len()).collect();
    order.sort_by(|&i, &j| (zeros[i] - target).norm().total_cmp(&(zeros[j] - target).norm()));

    let wanted = order.iter().copied().find(|&i| match which {
        Which::Any => true,
        Which::Real => is_real(&zeros[i]),
        Which::Complex => !is_real(&zeros[i]),
    });
    let index = wanted
        .or_else(|| order.first().copied())
        .ok_or_else(|| ToolError::Numerical("no zero left to pair".into()))?;
    Ok(zeros.remove(index))
}

/// Collapses conjugate pairs into one representative with positive imaginary
/// part. Complex representatives come first, ordered by real part, followed
/// by the real values in ascending order.
fn conjugate_representatives(values: &[Complex64]) -> ToolResult<Vec<Complex64>> {
    let tol = 100.0 * f64::EPSILON;
    let mut reals = Vec::new();
    let mut upper = Vec::new();
    let mut lower = Vec::new();
    for &v in values {
        if v.im.abs() <= tol * v.norm() {
            reals.push(v.re);
        } else if v.im > 0.0 {
            upper.push(v);
        } else {
            lower.push(v);
        }
    }

    if upper.len() != lower.len() {
        return Err(ToolError::Numerical(format!(
            "{} complex values have no conjugate",
            upper.len().abs_diff(lower.len())
        )));
    }

    let mut pairs = Vec::with_capacity(upper.len());
    for u in upper {
        let (index, _) = lower
            .iter()
            .enumerate()
            .map(|(i, l)| (i, (u - l.conj()).norm()))
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .ok_or_else(|| ToolError::Numerical("conjugate pairing failed".into()))?;
        let l = lower.swap_remove(index);
        pairs.push((u + l.conj()) / 2.0);
    }

    pairs.sort_by(|x, y| x.re.total_cmp(&y.re).then(x.im.total_cmp(&y.im)));
    reals.sort_by(|x, y| x.total_cmp(y));
    pairs.extend(reals.into_iter().map(|r| Complex64::new(r, 0.0)));
    Ok(pairs)
}

/// `[b0, b1, b2, a0, a1, a2]` for up to two zeros and two poles with unit
/// gain. Shorter polynomials are right-aligned.
fn single_section(zeros: &[Complex64], poles: &[Complex64]) -> [f64; 6] {
    let b = PolyHelper::from_roots(zeros);
    let a = PolyHelper::from_roots(poles);
    let mut section = [0.0; 6];
    for (slot, c) in section[3 - b.len()..3].iter_mut().zip(&b) {
        *slot = c.re;
    }
    for (slot, c) in section[6 - a.len()..6].iter_mut().zip(&a) {
        *slot = c.re;
    }
    section
}

/// Shifts numerators right by `delay` samples in total, using sections whose
/// last numerator tap is zero.
fn apply_delay(sections: &mut [[f64; 6]], mut delay: usize) -> ToolResult<()> {
    for section in sections.iter_mut() {
        while delay > 0 && section[2] == 0.0 {
            section[2] = section[1];
            section[1] = section[0];
            section[0] = 0.0;
            delay -= 1;
        }
    }
    if delay > 0 {
        return Err(ToolError::Numerical(format!(
            "no room for {} samples of numerator delay",
            delay
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn biquad_input_maps_to_single_section() {
        let tf = TransferFunction::new(vec![0.2, 0.4, 0.2], vec![1.0, -0.5, 0.25]);
        let sos = tf_to_sos(&tf).unwrap();
        assert_eq!(sos.len(), 1);
        assert_close(&sos.sections[0], &[0.2, 0.4, 0.2, 1.0, -0.5, 0.25], 1e-12);
    }

    #[test]
    fn first_order_input_pads_with_origin() {
        let tf = TransferFunction::new(vec![0.5, 0.5], vec![1.0, -0.2]);
        let sos = tf_to_sos(&tf).unwrap();
        assert_eq!(sos.len(), 1);
        assert_close(&sos.sections[0], &[0.5, 0.5, 0.0, 1.0, -0.2, 0.0], 1e-12);
    }

    #[test]
    fn constant_gain_is_single_passthrough_section() {
        let tf = TransferFunction::new(vec![0.7], vec![1.0]);
        let sos = tf_to_sos(&tf).unwrap();
        assert_eq!(sos.sections, vec![[0.7, 0.0, 0.0, 1.0, 0.0, 0.0]]);
    }

    #[test]
    fn fourth_order_cascade_reproduces_input() {
        let b = PolyHelper::multiply(&[0.1, 0.2, 0.1], &[1.0, -1.6, 1.0]);
        let a = PolyHelper::multiply(&[1.0, -1.1, 0.5], &[1.0, -1.7, 0.95]);
        let tf = TransferFunction::new(b, a);
        let sos = tf_to_sos(&tf).unwrap();
        assert_eq!(sos.len(), 2);
        assert!(sos.reconstruction_error(&tf).unwrap() < 1e-9);
        for section in &sos.sections {
            assert_eq!(section[3], 1.0);
        }
    }

    #[test]
    fn pole_nearest_unit_circle_lands_last() {
        // Pole radii: sqrt(0.5) and sqrt(0.95).
        let a = PolyHelper::multiply(&[1.0, -1.1, 0.5], &[1.0, -1.7, 0.95]);
        let tf = TransferFunction::new(vec![1.0, 0.0, 0.0, 0.0, 0.0], a);
        let sos = tf_to_sos(&tf).unwrap();
        assert!((sos.sections[1][5] - 0.95).abs() < 1e-9);
        assert!((sos.sections[0][5] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn gain_sits_in_first_section() {
        let b = PolyHelper::multiply(&[1.0, 2.0, 1.0], &[1.0, 2.0, 1.0]);
        let b: Vec<f64> = b.iter().map(|c| c * 0.01).collect();
        let a = PolyHelper::multiply(&[1.0, -0.9, 0.3], &[1.0, -1.2, 0.6]);
        let tf = TransferFunction::new(b, a);
        let sos = tf_to_sos(&tf).unwrap();
        assert!((sos.sections[0][0] - 0.01).abs() < 1e-9);
        assert!((sos.sections[1][0] - 1.0).abs() < 1e-9);
        assert!(sos.reconstruction_error(&tf).unwrap() < 1e-6);
    }

    #[test]
    fn odd_order_cascade_reproduces_input() {
        let b = PolyHelper::multiply(&[1.0, 1.0], &[0.05, 0.1, 0.05]);
        let a = PolyHelper::multiply(&[1.0, -0.3], &[1.0, -1.3, 0.7]);
        let tf = TransferFunction::new(b, a);
        let sos = tf_to_sos(&tf).unwrap();
        assert_eq!(sos.len(), 2);
        assert!(sos.reconstruction_error(&tf).unwrap() < 1e-9);
    }

    #[test]
    fn numerator_delay_is_preserved() {
        let tf = TransferFunction::new(vec![0.0, 0.3], vec![1.0, -0.7]);
        let sos = tf_to_sos(&tf).unwrap();
        assert_close(&sos.sections[0], &[0.0, 0.3, 0.0, 1.0, -0.7, 0.0], 1e-12);
        assert!(sos.reconstruction_error(&tf).unwrap() < 1e-12);
    }

    #[test]
    fn conjugates_collapse_to_upper_half() {
        let values = [
            Complex64::new(0.5, -0.5),
            Complex64::new(-0.2, 0.0),
            Complex64::new(0.5, 0.5),
        ];
        let reps = conjugate_representatives(&values).unwrap();
        assert_eq!(reps, vec![Complex64::new(0.5, 0.5), Complex64::new(-0.2, 0.0)]);
    }

    #[test]
    fn unmatched_complex_value_is_an_error() {
        let values = [Complex64::new(0.5, 0.5), Complex64::new(0.1, 0.0)];
        assert!(conjugate_representatives(&values).is_err());
    }
}
