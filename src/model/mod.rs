pub(crate) mod audio_dna;
pub(crate) mod beat_grid;
pub(crate) mod direction;
pub(crate) mod lyrics;
pub(crate) mod physics_spec;
pub(crate) mod record;

use serde::Deserialize;
use serde::de::DeserializeOwned;

pub(crate) type JsonObject = serde_json::Map<String, serde_json::Value>;

pub(crate) fn decode_field<T: DeserializeOwned>(
    obj: &JsonObject,
    key: &str,
    slot: &mut T,
    dropped: &mut Vec<String>,
) {
    let Some(v) = obj.get(key) else {
        return;
    };
    if v.is_null() {
        return;
    }
    match T::deserialize(v) {
        Ok(x) => *slot = x,
        Err(e) => dropped.push(format!("{key}: {e}")),
    }
}

pub(crate) fn decode_list<T: DeserializeOwned>(
    obj: &JsonObject,
    key: &str,
    slot: &mut Vec<T>,
    dropped: &mut Vec<String>,
    replacement: impl Fn(usize) -> Option<T>,
) {
    let Some(v) = obj.get(key) else {
        return;
    };
    let Some(items) = v.as_array() else {
        if !v.is_null() {
            dropped.push(format!("{key}: expected an array"));
        }
        return;
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(x) => out.push(x),
            Err(e) => {
                dropped.push(format!("{key}[{i}]: {e}"));
                if let Some(r) = replacement(i) {
                    out.push(r);
                }
            }
        }
    }
    *slot = out;
}
