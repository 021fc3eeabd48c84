//! Record reshaping for list views.
//!
//! The daemon returns collections as a mapping of identifier to record. Views
//! want an ordered list with the identifier kept on each record, plus a couple
//! of display strings derived from timestamps.

use std::cmp::Ordering;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single JSON record.
pub type Record = Map<String, Value>;

/// Field that receives the mapping key it came from.
pub const ID_FIELD: &str = "_id";
/// Field that receives the formatted date.
pub const DATE_FIELD: &str = "date_string";
/// Field that receives the formatted time of day.
pub const TIME_FIELD: &str = "time_string";

/// Sort direction for [`sort_records`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Turn a keyed mapping into a list, copying each key into `_id`.
///
/// Output order follows the mapping's iteration order. A value that is not an
/// object is wrapped as `{"_id": key, "value": value}` so nothing is dropped.
pub fn mk_array(mapping: &Map<String, Value>) -> Vec<Record> {
    mapping
        .iter()
        .map(|(key, value)| {
            let mut record = match value {
                Value::Object(fields) => fields.clone(),
                other => {
                    let mut wrapped = Record::new();
                    wrapped.insert("value".to_string(), other.clone());
                    wrapped
                }
            };
            record.insert(ID_FIELD.to_string(), Value::String(key.clone()));
            record
        })
        .collect()
}

/// Stable sort by `field`.
///
/// Numbers compare numerically and strings lexically. Records without the
/// field always end up after the ones that have it, in their incoming order.
pub fn sort_records(records: &mut [Record], field: &str, order: SortOrder) {
    records.sort_by(|a, b| match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(0.0);
    let b = y.as_f64().unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Add `date_string` and `time_string` to every record, in local time.
///
/// See [`parse_dates_in`].
pub fn parse_dates<'a>(records: &'a mut [Record], field: &str) -> &'a mut [Record] {
    parse_dates_in(records, field, &Local)
}

/// Add `date_string` (`Wed Oct 19 2016`) and `time_string`
/// (`13:49:00 GMT-0400`) computed from the epoch-seconds value in `field`.
///
/// Records whose field is missing or not a number are left as they are. The
/// source field is never modified.
pub fn parse_dates_in<'a, Tz>(records: &'a mut [Record], field: &str, tz: &Tz) -> &'a mut [Record]
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    for record in records.iter_mut() {
        let Some(epoch) = record.get(field).and_then(Value::as_f64) else {
            continue;
        };
        let secs = epoch.floor();
        let nanos = ((epoch - secs) * 1e9) as u32;
        let Some(when) = tz.timestamp_opt(secs as i64, nanos).single() else {
            continue;
        };

        record.insert(
            DATE_FIELD.to_string(),
            Value::String(when.format("%a %b %d %Y").to_string()),
        );
        record.insert(
            TIME_FIELD.to_string(),
            Value::String(when.format("%H:%M:%S GMT%z").to_string()),
        );
    }
    records
}
