use super::TEXEL_OFFSET_UNIFORM;

const SIGNIFICANT_DIGITS: i32 = 6;

/// Formats `value` as a float literal both GLSL ES 1.00 and WGSL accept.
///
/// Six significant digits, switching to scientific notation for magnitudes
/// below `1e-4` or from `1e6` up. A decimal point is always present, so an
/// integral offset reads `2.0` rather than `2`.
pub(super) fn float_literal(value: f32) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0.0".to_string();
    }

    let exponent = value.abs().log10().floor() as i32;

    if !(-4..SIGNIFICANT_DIGITS).contains(&exponent) {
        let formatted = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{}", trim_fraction(mantissa), exponent),
            None => formatted,
        };
    }

    let decimals = (SIGNIFICANT_DIGITS - 1 - exponent).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value))
}

fn trim_fraction(number: &str) -> String {
    if !number.contains('.') {
        return format!("{number}.0");
    }

    let trimmed = number.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// `base` shifted by `offset` steps of the texel offset uniform.
pub(super) fn offset_expression(base: &str, offset: f32) -> String {
    if offset == 0.0 {
        base.to_string()
    } else if offset > 0.0 {
        format!(
            "{base} + {TEXEL_OFFSET_UNIFORM} * {}",
            float_literal(offset)
        )
    } else {
        format!(
            "{base} - {TEXEL_OFFSET_UNIFORM} * {}",
            float_literal(-offset)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_values_keep_a_decimal_point() {
        assert_eq!(float_literal(0.0), "0.0");
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(3.0), "3.0");
        assert_eq!(float_literal(-10.0), "-10.0");
    }

    #[test]
    fn fractions_use_six_significant_digits() {
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(1.4923456), "1.49235");
        assert_eq!(float_literal(0.0797885), "0.0797885");
        assert_eq!(float_literal(0.123456789), "0.123457");
    }

    #[test]
    fn tiny_and_huge_values_use_exponents() {
        assert_eq!(float_literal(0.00001), "1.0e-5");
        assert_eq!(float_literal(0.000012345), "1.2345e-5");
        assert_eq!(float_literal(2500000.0), "2.5e6");
    }

    #[test]
    fn rounding_up_to_the_next_decade_stays_valid() {
        assert_eq!(float_literal(9.9999999), "10.0");
    }

    #[test]
    fn offset_expressions_pick_the_operator_from_the_sign() {
        assert_eq!(offset_expression("uv", 0.0), "uv");
        assert_eq!(offset_expression("uv", 2.0), "uv + u_texelOffset * 2.0");
        assert_eq!(offset_expression("uv", -1.5), "uv - u_texelOffset * 1.5");
    }
}
