//! Number formatting and small matrix helpers shared by the exporters.

/// Significant digits used for every float written to the document.
const SIGNIFICANT_DIGITS: i32 = 5;

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Format a float with 5 significant digits, `%g` style: fixed notation for
/// exponents in `[-4, 5)`, scientific otherwise, trailing zeros removed.
pub fn fmt_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round once in scientific form to learn the exponent after rounding.
    let sci = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, v);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= SIGNIFICANT_DIGITS {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exp) as usize;
        trim_fraction(&format!("{v:.decimals$}")).to_string()
    }
}

/// `a,b,c`
pub fn fmt_flat_array(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| fmt_float(*v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Rows joined by `",  "`, entries within a row by `","`.
pub fn fmt_flat_matrix(matrix: &[[f64; 4]; 4]) -> String {
    matrix
        .iter()
        .map(|row| fmt_flat_array(row))
        .collect::<Vec<_>>()
        .join(",  ")
}

pub type Mat4 = [[f64; 4]; 4];

/// Column `c` of the upper 3x3 block.
pub fn mat4_column3(m: &Mat4, c: usize) -> [f64; 3] {
    [m[0][c], m[1][c], m[2][c]]
}

pub fn mat4_translation(m: &Mat4) -> [f64; 3] {
    mat4_column3(m, 3)
}

pub fn vec3_length(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_like_percent_g() {
        assert_eq!(fmt_float(0.8), "0.8");
        assert_eq!(fmt_float(6.0), "6");
        assert_eq!(fmt_float(1.0 / 3.0), "0.33333");
        assert_eq!(fmt_float(123456.0), "1.2346e+05");
        assert_eq!(fmt_float(99999.5), "1e+05");
        assert_eq!(fmt_float(0.0001), "0.0001");
        assert_eq!(fmt_float(0.00001234), "1.234e-05");
        assert_eq!(fmt_float(-90.0), "-90");
        assert_eq!(fmt_float(-0.0), "-0");
        assert_eq!(fmt_float(57.29577951308232), "57.296");
    }

    #[test]
    fn flat_matrix_layout() {
        let m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        assert_eq!(fmt_flat_matrix(&m), "1,0,0,0,  0,0,1,0,  0,-1,0,0,  0,0,0,1");
    }

    proptest! {
        #[test]
        fn never_more_than_five_significant_digits(v in -1.0e9f64..1.0e9f64) {
            let s = fmt_float(v);
            let mantissa = s.split('e').next().unwrap_or("");
            let digits = mantissa
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect::<String>();
            let significant = digits.trim_start_matches('0');
            prop_assert!(significant.len() <= 5, "{v} -> {s}");
            let parsed: f64 = s.parse().unwrap();
            prop_assert!((parsed - v).abs() <= v.abs() * 1e-4 + 1e-12, "{v} -> {s}");
        }
    }
}
