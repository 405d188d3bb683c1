use serde_json::Value;
use uuid::Uuid;

/// Plaintext record as handed over by the RPC layer (decrypted, schema-less).
pub type Record = Value;

/// Binary form of a record id, attached to every term of a vector.
pub type RecordLink = [u8; 16];

pub fn record_link(id: &Uuid) -> RecordLink {
    *id.as_bytes()
}

/// Look up a dotted path (`"a.b.c"`) through nested objects.
///
/// Returns `None` for missing keys, non-object intermediates and explicit nulls.
pub fn nested_lookup<'r>(record: &'r Record, path: &str) -> Option<&'r Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Walk a record and collect every string leaf with its dotted path.
///
/// Array elements inherit the path of the array itself.
pub fn collect_string_fields(record: &Record) -> Vec<(String, String)> {
    let mut out = Vec::new();
    walk_strings(record, String::new(), &mut out);
    out
}

fn walk_strings(value: &Value, path: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(s) => out.push((path, s.clone())),
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk_strings(child, child_path, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_strings(item, path.clone(), out);
            }
        }
        _ => {}
    }
}
