//! Parameter readings and unit scaling

use std::collections::BTreeMap;

use serde_json::Value;
use uplinkbridge_domain::{CodecError, ParameterId, ReadingValue, Readings};

/// Parameters the device reports in tenths
const TENTHS: [ParameterId; 14] = [
    40004, 40067, 40013, 40014, 43136, 40050, 40032, 43009, 40047, 40048, 43008, 40007, 40129,
    43005,
];

/// Parameters the device reports in hundredths
const HUNDREDTHS: [ParameterId; 1] = [43084];

/// Map a parameter read response to `parameterId -> rawValue`
///
/// Entries lacking either field are skipped.
///
/// # Errors
/// Returns `CodecError::Parse` when the response is not an array.
pub fn parse_readings(raw: &Value) -> Result<Readings, CodecError> {
    let items = raw
        .as_array()
        .ok_or_else(|| CodecError::Parse("parameter response is not an array".into()))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item.get("parameterId")?.as_u64()?;
            let id = ParameterId::try_from(id).ok()?;
            let value = ReadingValue::from_json(item.get("rawValue")?)?;
            Some((id, value))
        })
        .collect())
}

/// Per-parameter divisors turning raw integers into engineering units
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTable {
    divisors: BTreeMap<ParameterId, f64>,
}

impl Default for ScaleTable {
    fn default() -> Self {
        let divisors = TENTHS
            .iter()
            .map(|id| (*id, 10.0))
            .chain(HUNDREDTHS.iter().map(|id| (*id, 100.0)))
            .collect();
        Self { divisors }
    }
}

impl ScaleTable {
    /// Default table with `overrides` added or replacing entries
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<ParameterId, f64>) -> Self {
        let mut table = Self::default();
        table.divisors.extend(overrides.iter().map(|(id, divisor)| (*id, *divisor)));
        table
    }

    #[must_use]
    pub fn divisor(&self, id: ParameterId) -> Option<f64> {
        self.divisors.get(&id).copied()
    }

    /// Scale one value; ids without a divisor and text values pass through
    #[must_use]
    pub fn scale_value(&self, id: ParameterId, value: ReadingValue) -> ReadingValue {
        match (self.divisor(id), value.as_f64()) {
            (Some(divisor), Some(number)) => ReadingValue::Float(number / divisor),
            _ => value,
        }
    }

    #[must_use]
    pub fn scale(&self, readings: Readings) -> Readings {
        readings.into_iter().map(|(id, value)| (id, self.scale_value(id, value))).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn readings(pairs: &[(ParameterId, ReadingValue)]) -> Readings {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn parses_id_to_raw_value() {
        let raw = json!([
            {"parameterId": 40004, "rawValue": 205, "title": "outdoor temp."},
            {"parameterId": 43084, "rawValue": 4500},
            {"parameterId": 47011, "displayValue": "1"},
            {"rawValue": 3},
        ]);

        let parsed = parse_readings(&raw).unwrap();

        assert_eq!(
            parsed,
            readings(&[(40004, ReadingValue::Integer(205)), (43084, ReadingValue::Integer(4500))])
        );
    }

    #[test]
    fn non_array_is_a_parse_error() {
        assert!(matches!(parse_readings(&json!({"error": "x"})), Err(CodecError::Parse(_))));
    }

    #[test]
    fn default_table_scales_known_ids() {
        let table = ScaleTable::default();
        let scaled = table.scale(readings(&[
            (40004, ReadingValue::Integer(205)),
            (43084, ReadingValue::Integer(4500)),
            (12345, ReadingValue::Integer(7)),
        ]));

        assert_eq!(scaled[&40004], ReadingValue::Float(20.5));
        assert_eq!(scaled[&43084], ReadingValue::Float(45.0));
        assert_eq!(scaled[&12345], ReadingValue::Integer(7));
        assert_eq!(scaled[&43084].to_string(), "45.0");
    }

    #[test]
    fn text_values_pass_through() {
        let table = ScaleTable::default();
        let value = table.scale_value(40004, ReadingValue::from("--"));
        assert_eq!(value, ReadingValue::from("--"));
    }

    #[test]
    fn overrides_add_and_replace() {
        let overrides = BTreeMap::from([(40004, 100.0), (47011, 2.0)]);
        let table = ScaleTable::with_overrides(&overrides);

        assert_eq!(table.divisor(40004), Some(100.0));
        assert_eq!(table.divisor(47011), Some(2.0));
        assert_eq!(table.divisor(43084), Some(100.0));
        assert_eq!(table.scale_value(47011, ReadingValue::Integer(9)), ReadingValue::Float(4.5));
    }
}
