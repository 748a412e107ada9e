//! # Query Compiler
//!
//! Translates the loose, optional filter inputs from a request into a
//! normalized [`CompiledQuery`]: an ordered list of typed conditions that a
//! storage adapter can translate to SQL or apply in memory. Absent or
//! malformed inputs always degrade to "no constraint" — compilation never
//! fails.

use serde::Deserialize;

use crate::location::province_label;
use crate::models::Review;

/// Sentinel value of the province selector meaning "no restriction".
const STATE_ALL: &str = "all";

/// The raw, optional filter inputs as they arrive from query parameters.
/// Each field is independently absent/present; nothing here is validated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFilters {
    /// Free-text search across location and content.
    pub filter: Option<String>,
    /// Substring filter on the location composite.
    pub location: Option<String>,
    /// Alias of `location` used by the structured filter form.
    pub address: Option<String>,
    /// Province/territory code, resolved through the static table.
    pub state: Option<String>,
    /// Postal-code fragment; arrives upper-cased from the form.
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    /// Minimum rating threshold, kept raw so unparseable values can
    /// silently degrade to "absent".
    pub rating: Option<String>,
}

/// One match condition. Substring needles are stored lowercased; both sides
/// of every comparison are lowercased so matching stays case-insensitive
/// even when the underlying store's pattern matching is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `lower(location)` contains the needle.
    LocationContains(String),
    /// Free-text OR group: `lower(location)` or `lower(content)` contains
    /// the needle.
    LocationOrContentContains(String),
    /// `rating >= n`.
    RatingAtLeast(i64),
}

/// The compiled predicate. Conditions AND together; an empty query is the
/// identity predicate and matches every review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledQuery {
    conditions: Vec<Condition>,
}

impl CompiledQuery {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Applies the predicate in memory. The stored fields are copied and
    /// lowercased for comparison, never mutated.
    pub fn matches(&self, review: &Review) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::LocationContains(needle) => {
                review.location.to_lowercase().contains(needle)
            }
            Condition::LocationOrContentContains(needle) => {
                review.location.to_lowercase().contains(needle)
                    || review.content.to_lowercase().contains(needle)
            }
            Condition::RatingAtLeast(min) => review.rating >= *min,
        })
    }
}

/// Compiles raw inputs into a [`CompiledQuery`]. See the module docs for the
/// degradation rules; in short, every input is optional and no input is ever
/// fatal.
pub fn compile(raw: &RawFilters) -> CompiledQuery {
    let mut conditions = Vec::new();

    // Province code resolves to its *label*, which then matches the location
    // composite as a substring. Unknown codes and "all" contribute nothing.
    if let Some(code) = present(&raw.state) {
        if code != STATE_ALL {
            if let Some(label) = province_label(code) {
                conditions.push(Condition::LocationContains(label.to_lowercase()));
            }
        }
    }

    if let Some(fragment) = present(&raw.location).or_else(|| present(&raw.address)) {
        conditions.push(Condition::LocationContains(fragment.to_lowercase()));
    }

    if let Some(fragment) = present(&raw.postal_code) {
        conditions.push(Condition::LocationContains(fragment.to_lowercase()));
    }

    if let Some(min) = present(&raw.rating).and_then(|r| r.parse::<i64>().ok()) {
        if min > 0 {
            conditions.push(Condition::RatingAtLeast(min));
        }
    }

    if let Some(text) = present(&raw.filter) {
        conditions.push(Condition::LocationOrContentContains(text.to_lowercase()));
    }

    CompiledQuery { conditions }
}

/// Treats empty and whitespace-only strings the same as absent ones.
fn present(input: &Option<String>) -> Option<&str> {
    input.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
