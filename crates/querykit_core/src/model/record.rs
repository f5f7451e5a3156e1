//! Plain map shapes shared by the query and store layers.

use serde_json::{Map, Value};

/// Primary key value of a stored record.
pub type RecordId = String;

/// Partial predicate map. Keys are column names; values are scalars, arrays
/// (membership) or operator maps such as `{"gte": 18}`.
pub type Filter = Map<String, Value>;

/// Plain key-value snapshot of a fetched record. Included relations appear
/// as nested keys named after the relation alias.
pub type Record = Map<String, Value>;
