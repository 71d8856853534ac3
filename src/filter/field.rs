use serde_json::Value;

/// Runtime value of a record field as seen by the filter engine
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Convert a JSON value; objects have no scalar form and yield `None`
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(FieldValue::Int(i))
                } else {
                    n.as_f64().map(FieldValue::Float)
                }
            }
            Value::String(s) => Some(FieldValue::Str(s.clone())),
            Value::Array(items) => Some(FieldValue::List(
                items.iter().filter_map(FieldValue::from_json).collect(),
            )),
            Value::Object(_) => None,
        }
    }

    /// Textual form used by the string operators
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Str(s) => Some(s.clone()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Null | FieldValue::List(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Str(v.clone())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(FieldValue::Float(v as f64), FieldValue::Int)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&[String]> for FieldValue {
    fn from(v: &[String]) -> Self {
        FieldValue::List(v.iter().map(FieldValue::from).collect())
    }
}

impl From<&Vec<String>> for FieldValue {
    fn from(v: &Vec<String>) -> Self {
        FieldValue::from(v.as_slice())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// A record the filter engine can read fields from
pub trait Filterable {
    /// Look up a field by name; `None` when the record has no such field
    fn field_value(&self, name: &str) -> Option<FieldValue>;
}

fn lookup_key<'a>(map: &'a serde_json::Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

/// JSON objects: exact key, then case-insensitive key, then a dotted path
/// (`zone.name`) through nested objects.
impl Filterable for Value {
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        let map = self.as_object()?;
        if let Some(v) = lookup_key(map, name) {
            return FieldValue::from_json(v);
        }
        if !name.contains('.') {
            return None;
        }
        let mut current = self;
        for part in name.split('.') {
            current = lookup_key(current.as_object()?, part)?;
        }
        FieldValue::from_json(current)
    }
}

type Accessor<T> = fn(&T) -> FieldValue;

struct FieldEntry<T> {
    name: &'static str,
    aliases: &'static [&'static str],
    get: Accessor<T>,
}

/// Explicit field-name → accessor table for a typed record
///
/// ```rust
/// use resource_gateway::filter::{FieldTable, FieldValue, Filterable};
///
/// struct Host { hostname: String, cpus: u32 }
///
/// let table = FieldTable::new()
///     .field("hostname", &["name"], |h: &Host| FieldValue::from(&h.hostname))
///     .field("cpu_count", &["cpus"], |h: &Host| FieldValue::from(h.cpus));
/// let host = Host { hostname: "node-1".into(), cpus: 8 };
/// assert_eq!(table.lookup(&host, "NAME"), Some(FieldValue::Str("node-1".into())));
/// assert_eq!(table.lookup(&host, "cpus"), Some(FieldValue::Int(8)));
/// ```
pub struct FieldTable<T> {
    entries: Vec<FieldEntry<T>>,
}

impl<T> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FieldTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a field with its serialization aliases
    #[must_use]
    pub fn field(
        mut self,
        name: &'static str,
        aliases: &'static [&'static str],
        get: Accessor<T>,
    ) -> Self {
        self.entries.push(FieldEntry { name, aliases, get });
        self
    }

    /// Exact name, then case-insensitive name, then alias
    pub fn lookup(&self, record: &T, name: &str) -> Option<FieldValue> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)))
            })?;
        Some((entry.get)(record))
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }
}

/// A record paired with its field table
pub struct Tabled<'a, T> {
    pub table: &'a FieldTable<T>,
    pub record: &'a T,
}

impl<T> Filterable for Tabled<'_, T> {
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.table.lookup(self.record, name)
    }
}
