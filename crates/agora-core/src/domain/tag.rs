use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity. Names are unique system-wide and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

/// Reduce requested tag names to the ordered set that gets stored:
/// empty names are dropped and repeats keep their first position.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if name.is_empty() || out.contains(name) {
            continue;
        }
        out.push(name.clone());
    }
    out
}
