use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ReportingMonth;

/// One circuit's averaged reading for one month.
///
/// Entries do not know which datacenter they belong to; the store keys them by
/// datacenter name. Numeric fields that are absent, non-numeric, negative or
/// non-finite decode as `0`, and absent text fields decode as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerEntry {
    pub date: ReportingMonth,
    #[serde(default, deserialize_with = "lenient_text")]
    pub supplier: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cabinet_rack: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub circuit: String,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub primary_kw: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub primary_a: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub redundant_kw: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub redundant_a: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: String,
}

impl PowerEntry {
    pub fn blank(date: ReportingMonth) -> Self {
        Self {
            date,
            supplier: String::new(),
            cabinet_rack: String::new(),
            circuit: String::new(),
            primary_kw: 0.0,
            primary_a: 0.0,
            redundant_kw: 0.0,
            redundant_a: 0.0,
            notes: String::new(),
        }
    }
}

/// An entry paired with the datacenter it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaggedEntry<'a> {
    pub datacenter: &'a str,
    pub entry: &'a PowerEntry,
}

/// Parse a kW/A reading, falling back to `0` for anything that is not a
/// finite, non-negative number.
pub fn parse_reading(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(sanitize_reading).unwrap_or(0.0)
}

pub(crate) fn sanitize_reading(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn lenient_reading<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().map(sanitize_reading).unwrap_or(0.0),
        Some(Value::String(s)) => parse_reading(&s),
        _ => 0.0,
    };
    Ok(value)
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let text = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_fields() {
        let entry: PowerEntry = serde_json::from_str(
            r#"{"date":"Jan-24","supplier":"Acme","cabinetRack":"R1","circuit":"C1",
                "primaryKw":10,"primaryA":43.5,"redundantKw":5,"redundantA":21.7,"notes":"ok"}"#,
        )
        .unwrap();

        assert_eq!(entry.date.to_string(), "Jan-24");
        assert_eq!(entry.cabinet_rack, "R1");
        assert_eq!(entry.primary_kw, 10.0);
        assert_eq!(entry.redundant_a, 21.7);
        assert_eq!(entry.notes, "ok");
    }

    #[test]
    fn missing_and_garbage_readings_default_to_zero() {
        let entry: PowerEntry = serde_json::from_str(
            r#"{"date":"Feb-24","primaryKw":null,"primaryA":"abc","redundantKw":"7.5","redundantA":-3}"#,
        )
        .unwrap();

        assert_eq!(entry.primary_kw, 0.0);
        assert_eq!(entry.primary_a, 0.0);
        assert_eq!(entry.redundant_kw, 7.5);
        assert_eq!(entry.redundant_a, 0.0);
        assert_eq!(entry.supplier, "");
        assert_eq!(entry.notes, "");
    }

    #[test]
    fn entry_without_valid_date_is_rejected() {
        assert!(serde_json::from_str::<PowerEntry>(r#"{"supplier":"Acme"}"#).is_err());
        assert!(serde_json::from_str::<PowerEntry>(r#"{"date":"2024-01"}"#).is_err());
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let mut entry = PowerEntry::blank("Jan-24".parse().unwrap());
        entry.cabinet_rack = "R9".to_string();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["cabinetRack"], "R9");
        assert_eq!(json["date"], "Jan-24");
        assert_eq!(json["redundantKw"], 0.0);
    }

    #[test]
    fn parse_reading_falls_back_to_zero() {
        assert_eq!(parse_reading(" 12.5 "), 12.5);
        assert_eq!(parse_reading(""), 0.0);
        assert_eq!(parse_reading("NaN"), 0.0);
        assert_eq!(parse_reading("inf"), 0.0);
        assert_eq!(parse_reading("-4"), 0.0);
    }
}
