//! Primitive leaf types, coercion, and their text forms.
//!
//! Scalars are `double`, `int`, `string` and `bool`; each has a homogeneous
//! array form written `Array(<scalar>)`. Arrays are spelled `{a,b,c}` in text.

use crate::error::TypeError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Double,
    Int,
    String,
    Bool,
    DoubleArray,
    IntArray,
    StringArray,
    BoolArray,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Double,
        PrimitiveType::Int,
        PrimitiveType::String,
        PrimitiveType::Bool,
        PrimitiveType::DoubleArray,
        PrimitiveType::IntArray,
        PrimitiveType::StringArray,
        PrimitiveType::BoolArray,
    ];

    /// Look up a type by the name used in comment declarations.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name.trim())
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Double => "double",
            PrimitiveType::Int => "int",
            PrimitiveType::String => "string",
            PrimitiveType::Bool => "bool",
            PrimitiveType::DoubleArray => "Array(double)",
            PrimitiveType::IntArray => "Array(int)",
            PrimitiveType::StringArray => "Array(string)",
            PrimitiveType::BoolArray => "Array(bool)",
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            PrimitiveType::DoubleArray
                | PrimitiveType::IntArray
                | PrimitiveType::StringArray
                | PrimitiveType::BoolArray
        )
    }

    /// The scalar element type; scalars return themselves.
    pub fn element(self) -> PrimitiveType {
        match self {
            PrimitiveType::DoubleArray => PrimitiveType::Double,
            PrimitiveType::IntArray => PrimitiveType::Int,
            PrimitiveType::StringArray => PrimitiveType::String,
            PrimitiveType::BoolArray => PrimitiveType::Bool,
            scalar => scalar,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveType::from_name(s).ok_or_else(|| TypeError::UnknownType(s.to_owned()))
    }
}

/// A typed leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Int(i64),
    String(String),
    Bool(bool),
    DoubleArray(Vec<f64>),
    IntArray(Vec<i64>),
    StringArray(Vec<String>),
    BoolArray(Vec<bool>),
}

impl Value {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Value::Double(_) => PrimitiveType::Double,
            Value::Int(_) => PrimitiveType::Int,
            Value::String(_) => PrimitiveType::String,
            Value::Bool(_) => PrimitiveType::Bool,
            Value::DoubleArray(_) => PrimitiveType::DoubleArray,
            Value::IntArray(_) => PrimitiveType::IntArray,
            Value::StringArray(_) => PrimitiveType::StringArray,
            Value::BoolArray(_) => PrimitiveType::BoolArray,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_text(self))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::DoubleArray(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntArray(v)
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::BoolArray(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringArray(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StringArray(v.into_iter().map(str::to_owned).collect())
    }
}

// ──────────────────────────────────────────────
// Coercion
// ──────────────────────────────────────────────

/// Validate `value` against `target`, converting where a lossless
/// interpretation exists (int → double, 0/1 → bool, text → anything).
pub fn coerce(target: PrimitiveType, value: Value) -> Result<Value, TypeError> {
    if value.primitive_type() == target {
        return Ok(value);
    }
    match (target, value) {
        (t, Value::String(s)) => parse_text(t, &s),
        (PrimitiveType::Double, Value::Int(i)) => Ok(Value::Double(i as f64)),
        (PrimitiveType::Bool, Value::Int(0)) => Ok(Value::Bool(false)),
        (PrimitiveType::Bool, Value::Int(1)) => Ok(Value::Bool(true)),
        (PrimitiveType::DoubleArray, Value::IntArray(items)) => Ok(Value::DoubleArray(
            items.into_iter().map(|i| i as f64).collect(),
        )),
        (PrimitiveType::BoolArray, Value::IntArray(items)) => items
            .iter()
            .map(|i| match i {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(TypeError::coerce(i.to_string(), PrimitiveType::Bool)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::BoolArray),
        (t, Value::StringArray(items)) if t.is_array() => {
            let elem = t.element();
            let parsed = items
                .iter()
                .map(|s| parse_text(elem, s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(collect_array(t, parsed))
        }
        (t, v) => Err(TypeError::coerce(to_text(&v), t)),
    }
}

/// Parse the text form of a value of type `target`.
pub fn parse_text(target: PrimitiveType, text: &str) -> Result<Value, TypeError> {
    let err = || TypeError::coerce(text, target);
    match target {
        PrimitiveType::Double => parse_double(text).map(Value::Double).ok_or_else(err),
        PrimitiveType::Int => parse_int(text).map(Value::Int).ok_or_else(err),
        PrimitiveType::String => Ok(Value::String(text.to_owned())),
        PrimitiveType::Bool => parse_bool(text).map(Value::Bool).ok_or_else(err),
        array => {
            let items = split_array(text).ok_or_else(err)?;
            let elem = array.element();
            let parsed = items
                .into_iter()
                .map(|s| parse_text(elem, s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(collect_array(array, parsed))
        }
    }
}

/// Text form: doubles with eight decimals, bools as `true`/`false`,
/// everything else verbatim; arrays as `{a,b,c}`.
///
/// Array items are not escaped. A string item holding `,` or an array of one
/// blank string does not read back through [`parse_text`].
pub fn to_text(value: &Value) -> String {
    fn join<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
        let inner: Vec<String> = items.iter().map(f).collect();
        format!("{{{}}}", inner.join(","))
    }
    match value {
        Value::Double(d) => format_double(*d),
        Value::Int(i) => i.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::DoubleArray(items) => join(items, |d| format_double(*d)),
        Value::IntArray(items) => join(items, |i| i.to_string()),
        Value::StringArray(items) => join(items, |s| s.clone()),
        Value::BoolArray(items) => join(items, |b| b.to_string()),
    }
}

fn format_double(d: f64) -> String {
    format!("{:2.8}", d)
}

fn collect_array(array: PrimitiveType, items: Vec<Value>) -> Value {
    match array {
        PrimitiveType::DoubleArray => {
            Value::DoubleArray(items.iter().filter_map(Value::as_f64).collect())
        }
        PrimitiveType::IntArray => Value::IntArray(items.iter().filter_map(Value::as_i64).collect()),
        PrimitiveType::BoolArray => {
            Value::BoolArray(items.iter().filter_map(Value::as_bool).collect())
        }
        _ => Value::StringArray(
            items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => s,
                    other => to_text(&other),
                })
                .collect(),
        ),
    }
}

fn split_array(text: &str) -> Option<Vec<&str>> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').collect())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "True" | "TRUE" | "1" => Some(true),
        "false" | "False" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

fn parse_double(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Integers accept `<mantissa>e<exponent>`, each half parsed recursively,
/// and otherwise fall back to truncating a float parse.
fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.contains('e') {
        let parts: Vec<&str> = text.split('e').collect();
        if parts.len() != 2 {
            return None;
        }
        let mantissa = parse_int(parts[0])?;
        let exponent = parse_int(parts[1])?;
        if exponent < 0 {
            return truncate(parse_double(text)?);
        }
        let exponent = u32::try_from(exponent).ok()?;
        return 10i64.checked_pow(exponent)?.checked_mul(mantissa);
    }
    match text.parse::<i64>() {
        Ok(i) => Some(i),
        Err(_) => truncate(parse_double(text)?),
    }
}

fn truncate(d: f64) -> Option<i64> {
    if d.is_finite() && d.abs() < i64::MAX as f64 {
        Some(d.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for t in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(t.name()), Some(t));
        }
        assert_eq!(PrimitiveType::from_name("region"), None);
        assert!("Array(int)".parse::<PrimitiveType>().is_ok());
    }

    #[test]
    fn bool_accepts_words_and_digits() {
        for t in ["true", "True", "TRUE", "1"] {
            assert_eq!(parse_text(PrimitiveType::Bool, t).unwrap(), Value::Bool(true));
        }
        for f in ["false", "False", "FALSE", "0"] {
            assert_eq!(parse_text(PrimitiveType::Bool, f).unwrap(), Value::Bool(false));
        }
        assert!(parse_text(PrimitiveType::Bool, "yes").is_err());
        assert_eq!(coerce(PrimitiveType::Bool, Value::Int(1)).unwrap(), Value::Bool(true));
        assert!(coerce(PrimitiveType::Bool, Value::Int(2)).is_err());
    }

    #[test]
    fn int_exponent_form() {
        assert_eq!(parse_text(PrimitiveType::Int, "3e4").unwrap(), Value::Int(30000));
        assert_eq!(parse_text(PrimitiveType::Int, "12").unwrap(), Value::Int(12));
        assert_eq!(parse_text(PrimitiveType::Int, "7.9").unwrap(), Value::Int(7));
        assert!(parse_text(PrimitiveType::Int, "1e2e3").is_err());
        assert!(parse_text(PrimitiveType::Int, "ten").is_err());
    }

    #[test]
    fn double_widens_int_and_parses_text() {
        assert_eq!(coerce(PrimitiveType::Double, Value::Int(3)).unwrap(), Value::Double(3.0));
        assert_eq!(coerce(PrimitiveType::Double, "1.5".into()).unwrap(), Value::Double(1.5));
        assert!(coerce(PrimitiveType::Int, Value::Double(1.5)).is_err());
    }

    #[test]
    fn arrays_need_braces() {
        assert_eq!(
            parse_text(PrimitiveType::DoubleArray, "{1.0,2.5}").unwrap(),
            Value::DoubleArray(vec![1.0, 2.5])
        );
        assert!(parse_text(PrimitiveType::IntArray, "1,2").is_err());
        assert!(parse_text(PrimitiveType::IntArray, "{1,x}").is_err());
        assert_eq!(
            parse_text(PrimitiveType::StringArray, "{a,b}").unwrap(),
            Value::StringArray(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn unescaped_string_items_do_not_read_back() {
        let lone_empty = Value::StringArray(vec![String::new()]);
        assert_eq!(to_text(&lone_empty), "{}");
        assert_eq!(
            parse_text(PrimitiveType::StringArray, "{}").unwrap(),
            Value::StringArray(Vec::new())
        );
        let comma = Value::StringArray(vec!["a,b".into()]);
        assert_eq!(
            parse_text(PrimitiveType::StringArray, &to_text(&comma)).unwrap(),
            Value::StringArray(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn array_coercion_is_elementwise() {
        assert_eq!(
            coerce(PrimitiveType::DoubleArray, Value::IntArray(vec![1, 2])).unwrap(),
            Value::DoubleArray(vec![1.0, 2.0])
        );
        assert!(coerce(PrimitiveType::IntArray, Value::DoubleArray(vec![1.0])).is_err());
    }

    #[test]
    fn serialization_forms() {
        assert_eq!(to_text(&Value::Double(1.0)), "1.00000000");
        assert_eq!(to_text(&Value::Bool(false)), "false");
        assert_eq!(to_text(&Value::Int(-4)), "-4");
        assert_eq!(to_text(&Value::IntArray(vec![1, 2, 3])), "{1,2,3}");
        assert_eq!(to_text(&Value::DoubleArray(vec![0.5])), "{0.50000000}");
    }

    #[test]
    fn coercion_error_carries_value_and_target() {
        let err = coerce(PrimitiveType::Int, Value::Bool(true)).unwrap_err();
        assert_eq!(err, TypeError::coerce("true", PrimitiveType::Int));
        assert_eq!(err.to_string(), "cannot interpret \"true\" as int");
    }
}
