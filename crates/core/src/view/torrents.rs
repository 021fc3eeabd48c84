use serde_json::Value;

use crate::reshape::{mk_array, parse_dates, sort_records, Record, SortOrder};

use super::{Controller, ViewError};

/// Field the list is dated and, by default, sorted on.
pub const TIME_ADDED: &str = "time_added";

/// Torrent list: the daemon's id-keyed mapping, flattened, sorted and dated.
#[derive(Debug, Clone)]
pub struct TorrentListController {
    sort_field: String,
    order: SortOrder,
}

impl Default for TorrentListController {
    fn default() -> Self {
        Self {
            sort_field: TIME_ADDED.to_string(),
            order: SortOrder::Descending,
        }
    }
}

impl TorrentListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = field.into();
        self.order = order;
        self
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

impl Controller for TorrentListController {
    type Model = Vec<Record>;

    fn route(&self) -> &'static str {
        "/api/torrent/list"
    }

    fn bind(&self, payload: Value) -> Result<Vec<Record>, ViewError> {
        let mut records = match payload {
            Value::Object(mapping) => mk_array(&mapping),
            // Nothing to list.
            Value::Null => Vec::new(),
            other => {
                return Err(ViewError::Bind(format!(
                    "expected an object keyed by torrent id, got {}",
                    type_name(&other)
                )))
            }
        };
        sort_records(&mut records, &self.sort_field, self.order);
        parse_dates(&mut records, TIME_ADDED);
        Ok(records)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
