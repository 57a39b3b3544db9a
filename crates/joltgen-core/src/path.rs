//! Dotted-path access into nested JSON objects.
//!
//! Paths are split on `.`; a segment of the form `name[idx]` addresses element
//! `idx` of the array stored under `name`. Writes auto-vivify every missing
//! container along the way and silently replace values of the wrong kind
//! (last write wins), so a write never fails.
//!
//! Any other bracket form (`name[]`, `name[&1]`) is a plain key. Those are
//! JOLT output markers, not addresses.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// One decoded path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// Plain object key.
    Key(&'a str),
    /// Array element `name[index]`.
    Index(&'a str, usize),
}

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+)\[(\d+)\]$").expect("invariant: index pattern is a valid regex")
    })
}

/// Largest index decoded as an array element. Writes pad the array up to the
/// index, so this bounds the cost of a single write.
pub const MAX_INDEX: usize = 9_999;

/// Decode a single segment, recognising the `name[idx]` array form.
///
/// An index above [`MAX_INDEX`] leaves the segment as a plain key.
pub fn parse_segment(segment: &str) -> PathSegment<'_> {
    if let Some(caps) = index_pattern().captures(segment) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let index = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());
        if let Some(index) = index.filter(|&index| index <= MAX_INDEX) {
            return PathSegment::Index(name, index);
        }
    }
    PathSegment::Key(segment)
}

/// Split a dotted path into decoded segments.
///
/// # Example
/// ```
/// use joltgen_core::path::{split_path, PathSegment};
/// assert_eq!(
///     split_path("items[0].id"),
///     vec![PathSegment::Index("items", 0), PathSegment::Key("id")]
/// );
/// ```
pub fn split_path(path: &str) -> Vec<PathSegment<'_>> {
    path.split('.').map(parse_segment).collect()
}

/// Write `value` at `path` inside `root`, creating intermediate containers.
///
/// # Example
/// ```
/// use joltgen_core::path::set_nested_value;
/// use serde_json::{json, Map};
///
/// let mut root = Map::new();
/// set_nested_value(&mut root, "user.ids[1]", json!("b"));
/// assert_eq!(serde_json::Value::Object(root), json!({"user": {"ids": [{}, "b"]}}));
/// ```
pub fn set_nested_value(root: &mut Map<String, Value>, path: &str, value: Value) {
    let segments = split_path(path);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        current = descend(current, *segment);
    }

    match *last {
        PathSegment::Key(key) => {
            current.insert(key.to_string(), value);
        }
        PathSegment::Index(name, index) => {
            ensure_array(current, name, index)[index] = value;
        }
    }
}

/// Read the value at `path`, or `None` if any step is missing or of the
/// wrong kind.
pub fn get_nested_value<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    lookup(root.as_object()?, path)
}

/// Whether writing at `path` would replace or restructure a value already in
/// `root`: the target itself exists, or a container along the way holds a
/// value of the wrong kind.
pub fn write_would_replace(root: &Map<String, Value>, path: &str) -> bool {
    let segments = split_path(path);
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = root;
    for segment in parents {
        match existing_slot(current, *segment) {
            Ok(None) => return false,
            Ok(Some(Value::Object(map))) => current = map,
            Ok(Some(_)) | Err(()) => return true,
        }
    }
    !matches!(existing_slot(current, *last), Ok(None))
}

/// The value a segment addresses. `Err` when `name[idx]` meets a non-array.
fn existing_slot<'v>(
    map: &'v Map<String, Value>,
    segment: PathSegment<'_>,
) -> Result<Option<&'v Value>, ()> {
    match segment {
        PathSegment::Key(key) => Ok(map.get(key)),
        PathSegment::Index(name, index) => match map.get(name) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(items.get(index)),
            Some(_) => Err(()),
        },
    }
}

fn lookup<'v>(root: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    let mut segments = split_path(path).into_iter();
    let head = step(root, segments.next()?)?;
    segments.try_fold(head, |current, segment| step(current.as_object()?, segment))
}

fn step<'v>(map: &'v Map<String, Value>, segment: PathSegment<'_>) -> Option<&'v Value> {
    match segment {
        PathSegment::Key(key) => map.get(key),
        PathSegment::Index(name, index) => map.get(name)?.as_array()?.get(index),
    }
}

// ---------------------------------------------------------------------------
// Container helpers
// ---------------------------------------------------------------------------

/// The object stored under the literal key `key`, created (or replacing a
/// non-object) on demand. `key` is not split on `.`.
pub(crate) fn child_object<'m>(
    map: &'m mut Map<String, Value>,
    key: &str,
) -> &'m mut Map<String, Value> {
    descend(map, PathSegment::Key(key))
}

fn descend<'m>(
    map: &'m mut Map<String, Value>,
    segment: PathSegment<'_>,
) -> &'m mut Map<String, Value> {
    let slot = match segment {
        PathSegment::Key(key) => map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
        PathSegment::Index(name, index) => &mut ensure_array(map, name, index)[index],
    };
    ensure_object(slot)
}

/// Make `map[name]` an array with at least `index + 1` elements, padding
/// with empty objects.
fn ensure_array<'m>(
    map: &'m mut Map<String, Value>,
    name: &str,
    index: usize,
) -> &'m mut Vec<Value> {
    let slot = map
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    let items = slot
        .as_array_mut()
        .expect("invariant: slot was normalised to an array above");
    while items.len() <= index {
        items.push(Value::Object(Map::new()));
    }
    items
}

fn ensure_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
        .expect("invariant: slot was normalised to an object above")
}
