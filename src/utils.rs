use serde_json::Value;

/// Walks a dot separated path like `query.results.p` through nested JSON.
/// Numeric segments index into arrays.
///
/// Returns `None` as soon as a segment is missing or null, never panics on
/// a payload of the wrong shape.
pub fn value_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if value.is_null() {
        return None;
    }

    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| {
        let next = match current {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => current.get(segment),
        };

        next.filter(|v| !v.is_null())
    })
}
