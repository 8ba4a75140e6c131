use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Coerce a raw feed cell to an integer. Floats truncate, numeric strings
/// parse, everything else (null, NaN, garbage) becomes `None`.
pub fn opt_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(i) = s.parse::<i64>() {
                return Some(i);
            }
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn opt_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

/// Normalize a raw date cell to an ISO-8601 calendar date string
/// (`YYYY-MM-DD`). Accepts date-only, `YYYY-MM-DD HH:MM:SS`, RFC 3339, and
/// US `MM/DD/YYYY` inputs; anything else is `None`.
pub fn opt_date_string(v: &Value) -> Option<String> {
    let raw = match v {
        Value::String(s) => s.trim(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.to_string());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date().to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive().to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(d.to_string());
    }
    None
}

pub fn opt_str(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Absent optional stat columns count as zero before typed cleaning.
pub fn int_or_zero(v: &Value) -> i64 {
    opt_int(v).unwrap_or(0)
}

pub fn float_or_zero(v: &Value) -> f64 {
    opt_float(v).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn opt_int_truncates_and_recovers_from_strings() {
        assert_eq!(opt_int(&json!(7)), Some(7));
        assert_eq!(opt_int(&json!(3.9)), Some(3));
        assert_eq!(opt_int(&json!(-3.9)), Some(-3));
        assert_eq!(opt_int(&json!("12")), Some(12));
        assert_eq!(opt_int(&json!("12.5")), Some(12));
        assert_eq!(opt_int(&json!("")), None);
        assert_eq!(opt_int(&json!("n/a")), None);
        assert_eq!(opt_int(&Value::Null), None);
    }

    #[test]
    fn opt_float_rejects_non_finite() {
        assert_eq!(opt_float(&json!(2.25)), Some(2.25));
        assert_eq!(opt_float(&json!("2.25")), Some(2.25));
        assert_eq!(opt_float(&json!("NaN")), None);
        assert_eq!(opt_float(&Value::Null), None);
    }

    #[test]
    fn opt_date_string_normalizes_formats() {
        assert_eq!(
            opt_date_string(&json!("1998-05-17")).as_deref(),
            Some("1998-05-17")
        );
        assert_eq!(
            opt_date_string(&json!("1998-05-17 13:45:00")).as_deref(),
            Some("1998-05-17")
        );
        assert_eq!(
            opt_date_string(&json!("1998-05-17T13:45:00+00:00")).as_deref(),
            Some("1998-05-17")
        );
        assert_eq!(
            opt_date_string(&json!("05/17/1998")).as_deref(),
            Some("1998-05-17")
        );
        assert_eq!(opt_date_string(&json!("soon")), None);
        assert_eq!(opt_date_string(&Value::Null), None);
    }

    #[test]
    fn zero_defaults_for_absent_columns() {
        assert_eq!(int_or_zero(&Value::Null), 0);
        assert_eq!(float_or_zero(&Value::Null), 0.0);
        assert_eq!(int_or_zero(&json!(4)), 4);
    }
}
