use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Nil,
    Number(f64),
    String(String),
}

impl Value {
    // nil and false are the only falsy values
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Boolean(value) => *value,
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Text used for the right-hand side of a string concatenation.
    ///
    /// Numbers are truncated to their integer part and booleans count as `1`/`0`.
    /// `nil` has no concatenation form.
    pub fn concatenation_text(&self) -> Option<String> {
        match self {
            Self::Number(value) => {
                let truncated = value.trunc();
                // avoid rendering "-0" for values like -0.5
                let truncated = if truncated == 0.0 { 0.0 } else { truncated };
                // fixed precision prints every integer digit, not the shortest round-trip form
                Some(format!("{truncated:.0}"))
            }
            Self::String(value) => Some(value.clone()),
            Self::Boolean(value) => Some(u8::from(*value).to_string()),
            Self::Nil => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Nil => write!(f, "nil"),
            Self::Number(value) => write!(f, "{}", format_number(*value)),
            Self::String(value) => write!(f, "{value}"),
        }
    }
}

/// Shortest round-trip text for a number, without a trailing `.0`.
///
/// Decimal exponents below -4 or from 16 up switch to scientific notation
/// with a signed, two-digit minimum exponent (`1e+23`, `1.5e-07`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let exponent: i32 = match exponent.parse() {
        Ok(exponent) => exponent,
        Err(_) => return value.to_string(),
    };

    if (-4..16).contains(&exponent) {
        // f64's Display already drops a trailing ".0" for integral values
        value.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!("7", Value::Number(7.0).to_string());
        assert_eq!("2.5", Value::Number(2.5).to_string());
        assert_eq!("-3", Value::Number(-3.0).to_string());
        assert_eq!("nil", Value::Nil.to_string());
        assert_eq!("true", Value::Boolean(true).to_string());
    }

    #[test]
    fn concatenation_truncates_numbers() {
        assert_eq!(Some("1".to_string()), Value::Number(1.9).concatenation_text());
        assert_eq!(Some("-2".to_string()), Value::Number(-2.7).concatenation_text());
        assert_eq!(Some("0".to_string()), Value::Number(-0.5).concatenation_text());
        assert_eq!(Some("1".to_string()), Value::Boolean(true).concatenation_text());
        assert_eq!(None, Value::Nil.concatenation_text());
    }

    #[test]
    fn concatenation_prints_every_integer_digit() {
        assert_eq!(Some("99999999999999991611392".to_string()), Value::Number(1e23).concatenation_text());
        assert_eq!(Some("1180591620717411303424".to_string()), Value::Number(2f64.powi(70)).concatenation_text());
        assert_eq!(Some("-12345678901234567168".to_string()), Value::Number(-12345678901234567890.0).concatenation_text());
    }

    #[test]
    fn large_and_small_numbers_print_in_scientific_notation() {
        assert_eq!("1e+23", Value::Number(1e23).to_string());
        assert_eq!("1e-07", Value::Number(1e-7).to_string());
        assert_eq!("1.5e-05", Value::Number(0.000015).to_string());
        assert_eq!("1.2345678901234568e+17", Value::Number(123456789012345678.0).to_string());
        assert_eq!("1e+16", Value::Number(1e16).to_string());
        assert_eq!("1000000000000000", Value::Number(1e15).to_string());
        assert_eq!("0.0001", Value::Number(0.0001).to_string());
        assert_eq!("-2.5e+20", Value::Number(-2.5e20).to_string());
        assert_eq!("inf", Value::Number(f64::INFINITY).to_string());
    }
}
