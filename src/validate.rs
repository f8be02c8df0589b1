//! validate
//! --------
//! Field extraction and validation for JSON request bodies. Extractors work on
//! a borrowed `serde_json::Map` and distinguish absent, null, and present
//! values so partial updates keep untouched fields intact. Error messages are
//! keyed by field name and surface through `AppError::UserInput`.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

pub type Fields = serde_json::Map<String, Value>;

/// Tri-state result of looking up one field in a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Missing,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    /// Collapse to an option: absent and explicit null both become `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Missing => None,
            Patch::Null => None,
            Patch::Set(v) => Some(v),
        }
    }

    /// Partial-update application for a nullable slot: absent keeps the
    /// current value, null clears it, a value replaces it.
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Patch::Missing => {}
            Patch::Null => *slot = None,
            Patch::Set(v) => *slot = Some(v),
        }
    }

    /// Partial-update application for a non-nullable slot.
    pub fn apply_required(self, field: &str, slot: &mut T) -> AppResult<()> {
        match self {
            Patch::Missing => Ok(()),
            Patch::Null => Err(field_err(field, "This field may not be null.")),
            Patch::Set(v) => {
                *slot = v;
                Ok(())
            }
        }
    }
}

pub fn field_err(field: &str, msg: impl Into<String>) -> AppError {
    AppError::UserInput { code: field.to_string(), message: msg.into() }
}

/// Request bodies must be JSON objects.
pub fn body_object(body: &Value) -> AppResult<&Fields> {
    body.as_object().ok_or_else(|| {
        field_err("non_field_errors", format!("Invalid data. Expected a dictionary, but got {}.", json_type_name(body)))
    })
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

// ---- string fields ----

pub fn str_field(f: &Fields, field: &str) -> AppResult<Patch<String>> {
    match f.get(field) {
        None => Ok(Patch::Missing),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::String(s)) => Ok(Patch::Set(s.clone())),
        Some(_) => Err(field_err(field, "Not a valid string.")),
    }
}

/// Required, non-blank string (create semantics).
pub fn req_str(f: &Fields, field: &str) -> AppResult<String> {
    match str_field(f, field)? {
        Patch::Missing => Err(field_err(field, "This field is required.")),
        Patch::Null => Err(field_err(field, "This field may not be null.")),
        Patch::Set(s) if s.is_empty() => Err(field_err(field, "This field may not be blank.")),
        Patch::Set(s) => Ok(s),
    }
}

/// Optional nullable string: absent and null both read as none.
pub fn opt_str(f: &Fields, field: &str) -> AppResult<Option<String>> {
    Ok(str_field(f, field)?.into_option())
}

/// Partial-update lookup for a required string: absent keeps the current
/// value, null and blank are rejected.
pub fn patch_str(f: &Fields, field: &str) -> AppResult<Option<String>> {
    match str_field(f, field)? {
        Patch::Missing => Ok(None),
        Patch::Null => Err(field_err(field, "This field may not be null.")),
        Patch::Set(s) if s.is_empty() => Err(field_err(field, "This field may not be blank.")),
        Patch::Set(s) => Ok(Some(s)),
    }
}

pub fn max_len(field: &str, value: &str, limit: usize) -> AppResult<()> {
    if value.chars().count() > limit {
        return Err(field_err(field, format!("Ensure this field has no more than {limit} characters.")));
    }
    Ok(())
}

// ---- integer fields ----

pub fn i64_field(f: &Fields, field: &str) -> AppResult<Patch<i64>> {
    match f.get(field) {
        None => Ok(Patch::Missing),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Patch::Set(i)),
            None => Err(field_err(field, "A valid integer is required.")),
        },
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(Patch::Set(i)),
            Err(_) => Err(field_err(field, "A valid integer is required.")),
        },
        Some(_) => Err(field_err(field, "A valid integer is required.")),
    }
}

pub fn req_i64(f: &Fields, field: &str) -> AppResult<i64> {
    match i64_field(f, field)? {
        Patch::Missing => Err(field_err(field, "This field is required.")),
        Patch::Null => Err(field_err(field, "This field may not be null.")),
        Patch::Set(i) => Ok(i),
    }
}

pub fn opt_i64(f: &Fields, field: &str) -> AppResult<Option<i64>> {
    Ok(i64_field(f, field)?.into_option())
}

// ---- boolean fields ----

pub fn bool_field(f: &Fields, field: &str) -> AppResult<Patch<bool>> {
    match f.get(field) {
        None => Ok(Patch::Missing),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::Bool(b)) => Ok(Patch::Set(*b)),
        Some(_) => Err(field_err(field, "Must be a valid boolean.")),
    }
}

// ---- decimal fields ----

fn parse_decimal(field: &str, raw: &Value) -> AppResult<Decimal> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(field_err(field, "A valid number is required.")),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| field_err(field, "A valid number is required."))
}

/// Bounded-decimal check: total digits, fractional digits, and whole digits
/// against (max_digits, decimal_places). The returned value is rescaled to
/// `decimal_places` so serialized output always carries the full scale.
pub fn check_decimal(field: &str, mut value: Decimal, max_digits: u32, decimal_places: u32) -> AppResult<Decimal> {
    let decimals = value.scale();
    let mantissa = value.mantissa().unsigned_abs();
    let mut digits = if mantissa == 0 { 1 } else { mantissa.to_string().len() as u32 };
    if decimals > digits {
        digits = decimals;
    }
    let whole = digits - decimals;

    if digits > max_digits {
        return Err(field_err(field, format!("Ensure that there are no more than {max_digits} digits in total.")));
    }
    if decimals > decimal_places {
        return Err(field_err(field, format!("Ensure that there are no more than {decimal_places} decimal places.")));
    }
    let max_whole = max_digits - decimal_places;
    if whole > max_whole {
        return Err(field_err(field, format!("Ensure that there are no more than {max_whole} digits before the decimal point.")));
    }

    value.rescale(decimal_places);
    Ok(value)
}

pub fn dec_field(f: &Fields, field: &str, max_digits: u32, decimal_places: u32) -> AppResult<Patch<Decimal>> {
    match f.get(field) {
        None => Ok(Patch::Missing),
        Some(Value::Null) => Ok(Patch::Null),
        Some(raw) => {
            let d = parse_decimal(field, raw)?;
            Ok(Patch::Set(check_decimal(field, d, max_digits, decimal_places)?))
        }
    }
}

pub fn req_dec(f: &Fields, field: &str, max_digits: u32, decimal_places: u32) -> AppResult<Decimal> {
    match dec_field(f, field, max_digits, decimal_places)? {
        Patch::Missing => Err(field_err(field, "This field is required.")),
        Patch::Null => Err(field_err(field, "This field may not be null.")),
        Patch::Set(d) => Ok(d),
    }
}

pub fn opt_dec(f: &Fields, field: &str, max_digits: u32, decimal_places: u32) -> AppResult<Option<Decimal>> {
    Ok(dec_field(f, field, max_digits, decimal_places)?.into_option())
}

// ---- list fields ----

/// Optional list of strings; absent and null read as empty.
pub fn str_list(f: &Fields, field: &str) -> AppResult<Vec<String>> {
    match f.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    _ => return Err(field_err(field, "Not a valid string.")),
                }
            }
            Ok(out)
        }
        Some(other) => Err(field_err(field, format!("Expected a list of items but got type \"{}\".", json_type_name(other)))),
    }
}

/// Optional list of integers; absent and null read as empty.
pub fn int_list(f: &Fields, field: &str) -> AppResult<Vec<i64>> {
    match f.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Number(n) if n.as_i64().is_some() => out.push(n.as_i64().unwrap_or_default()),
                    Value::String(s) if s.trim().parse::<i64>().is_ok() => {
                        out.push(s.trim().parse::<i64>().unwrap_or_default())
                    }
                    _ => return Err(field_err(field, "A valid integer is required.")),
                }
            }
            Ok(out)
        }
        Some(other) => Err(field_err(field, format!("Expected a list of items but got type \"{}\".", json_type_name(other)))),
    }
}

// ---- domain checks ----

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|_| Regex::new(r"@").unwrap())
});

pub fn check_email(field: &str, value: &str) -> AppResult<()> {
    if !EMAIL_RE.is_match(value) {
        return Err(field_err(field, "Enter a valid email address."));
    }
    Ok(())
}

pub fn check_choice(field: &str, value: &str, allowed: &[&str]) -> AppResult<()> {
    if !allowed.contains(&value) {
        return Err(field_err(field, format!("\"{value}\" is not a valid choice.")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn str_field_tristate() {
        let f = fields(json!({"a": "x", "b": null}));
        assert_eq!(str_field(&f, "a").unwrap(), Patch::Set("x".to_string()));
        assert_eq!(str_field(&f, "b").unwrap(), Patch::Null);
        assert_eq!(str_field(&f, "c").unwrap(), Patch::Missing);
    }

    #[test]
    fn req_str_messages() {
        let f = fields(json!({"blank": "", "num": 7}));
        assert_eq!(req_str(&f, "gone").unwrap_err().message(), "This field is required.");
        assert_eq!(req_str(&f, "blank").unwrap_err().message(), "This field may not be blank.");
        assert_eq!(req_str(&f, "num").unwrap_err().message(), "Not a valid string.");
    }

    #[test]
    fn max_len_counts_chars() {
        assert!(max_len("name", "ñandú", 5).is_ok());
        let err = max_len("name", "ñandúes", 5).unwrap_err();
        assert_eq!(err.message(), "Ensure this field has no more than 5 characters.");
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let f = fields(json!({"a": 3, "b": "42", "c": 1.5, "d": true}));
        assert_eq!(req_i64(&f, "a").unwrap(), 3);
        assert_eq!(req_i64(&f, "b").unwrap(), 42);
        assert_eq!(req_i64(&f, "c").unwrap_err().message(), "A valid integer is required.");
        assert_eq!(req_i64(&f, "d").unwrap_err().message(), "A valid integer is required.");
    }

    #[test]
    fn decimal_bounds() {
        let f = fields(json!({"ok": "123.45", "many": "123456789.99", "places": "1.234", "num": 10}));
        assert_eq!(req_dec(&f, "ok", 10, 2).unwrap().to_string(), "123.45");
        assert_eq!(req_dec(&f, "num", 10, 2).unwrap().to_string(), "10.00");
        assert_eq!(
            req_dec(&f, "many", 10, 2).unwrap_err().message(),
            "Ensure that there are no more than 10 digits in total."
        );
        assert_eq!(
            req_dec(&f, "places", 10, 2).unwrap_err().message(),
            "Ensure that there are no more than 2 decimal places."
        );
    }

    #[test]
    fn decimal_whole_digit_bound() {
        let f = fields(json!({"rating": "12.3"}));
        assert_eq!(
            req_dec(&f, "rating", 3, 2).unwrap_err().message(),
            "Ensure that there are no more than 1 digits before the decimal point."
        );
    }

    #[test]
    fn lists_and_types() {
        let f = fields(json!({"imgs": ["a.png", "b.png"], "ids": [1, "2"], "bad": "x"}));
        assert_eq!(str_list(&f, "imgs").unwrap(), vec!["a.png", "b.png"]);
        assert_eq!(int_list(&f, "ids").unwrap(), vec![1, 2]);
        assert_eq!(str_list(&f, "none").unwrap(), Vec::<String>::new());
        assert!(str_list(&f, "bad").unwrap_err().message().starts_with("Expected a list"));
    }

    #[test]
    fn email_and_choice() {
        assert!(check_email("user", "ana@x.com").is_ok());
        assert_eq!(check_email("user", "not-an-email").unwrap_err().message(), "Enter a valid email address.");
        assert!(check_choice("estado", "Pendiente", &["Pendiente", "Completado", "Cancelado"]).is_ok());
        assert_eq!(
            check_choice("estado", "Enviado", &["Pendiente", "Completado", "Cancelado"]).unwrap_err().message(),
            "\"Enviado\" is not a valid choice."
        );
    }

    #[test]
    fn patch_apply_semantics() {
        let f = fields(json!({"phone": null, "address": "Calle 9"}));
        let mut phone = Some("555".to_string());
        let mut address = Some("old".to_string());
        let mut member: Option<String> = None;
        str_field(&f, "phone").unwrap().apply(&mut phone);
        str_field(&f, "address").unwrap().apply(&mut address);
        str_field(&f, "member_since").unwrap().apply(&mut member);
        assert_eq!(phone, None);
        assert_eq!(address.as_deref(), Some("Calle 9"));
        assert_eq!(member, None);
    }
}
