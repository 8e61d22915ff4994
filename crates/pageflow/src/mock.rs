//! Mock people backend
//!
//! In-memory data set answering `QueryState` requests the way a real server
//! would: filter on `q`, sort by the requested columns, then slice the page.

use std::cmp::Ordering;

use pageflow_core::query::{QueryState, SortRule};
use pageflow_core::view::{Page, Record};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const FIRST_NAMES: &[&str] = &[
    "Ann", "Bob", "Carla", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jamal", "Kira",
    "Luis", "Maya", "Noah", "Olga", "Pedro", "Quinn", "Rosa", "Sven", "Tariq", "Uma", "Victor",
    "Wen", "Yara",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Brennan", "Castillo", "Dubois", "Eriksen", "Fischer", "Gonzalez", "Hansen",
    "Ivanova", "Jensen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov",
    "Quiroga", "Rossi", "Schmidt", "Tanaka",
];

const STATUSES: &[&str] = &["relationship", "complicated", "single"];

/// Generate `count` people from a fixed seed so runs are reproducible.
pub fn make_people(count: usize, seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|_| {
            let person = json!({
                "firstName": FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Ann"),
                "lastName": LAST_NAMES.choose(&mut rng).copied().unwrap_or("Anderson"),
                "age": rng.gen_range(18..80),
                "visits": rng.gen_range(0..1000),
                "progress": rng.gen_range(0..=100),
                "status": STATUSES.choose(&mut rng).copied().unwrap_or("single"),
            });
            match person {
                Value::Object(record) => record,
                _ => Record::new(),
            }
        })
        .collect()
}

/// Answer one query. Returns `None` for a zero page size.
pub fn query_people(people: &[Record], query: &QueryState) -> Option<Page> {
    if query.page_size == 0 {
        return None;
    }

    let needle = query
        .filter
        .get("q")
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();

    let mut rows: Vec<&Record> = people
        .iter()
        .filter(|person| needle.is_empty() || matches_needle(person, &needle))
        .collect();

    if !query.sort_by.is_empty() {
        rows.sort_by(|a, b| compare_records(a, b, &query.sort_by));
    }

    let total = rows.len();
    let start = query.page_index.saturating_mul(query.page_size);

    Some(Page {
        rows: rows
            .into_iter()
            .skip(start)
            .take(query.page_size)
            .cloned()
            .collect(),
        total,
        total_pages: total.div_ceil(query.page_size),
    })
}

/// Case-insensitive substring of first or last name, or exact age.
fn matches_needle(person: &Record, needle: &str) -> bool {
    let contains = |field: &str| {
        person
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|value| value.to_lowercase().contains(needle))
    };
    let age_matches = needle
        .parse::<u64>()
        .is_ok_and(|age| person.get("age").and_then(Value::as_u64) == Some(age));

    contains("firstName") || contains("lastName") || age_matches
}

fn compare_records(a: &Record, b: &Record, sort_by: &[SortRule]) -> Ordering {
    sort_by
        .iter()
        .map(|rule| {
            let ordering = compare_values(a.get(&rule.field), b.get(&rule.field));
            if rule.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

// Missing values sort first; numbers and strings compare naturally.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
