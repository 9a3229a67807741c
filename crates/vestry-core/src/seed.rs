//! Deterministic initial dataset.
//!
//! A store with no persisted state starts from this dataset, and `reset`
//! returns to it. It must not depend on the clock or on randomness.

use serde_json::{json, Value};

use crate::collection::{Collection, CollectionName};
use crate::record::Record;
use crate::state::StoreState;

/// 2024-01-01T00:00:00Z in Unix ms.
const SEED_EPOCH: i64 = 1_704_067_200_000;

/// Build the seed dataset.
pub fn seed_dataset() -> StoreState {
    let mut state = StoreState::empty();

    let keyed = [
        (
            CollectionName::Members,
            vec![json!({
                "id": "mem-admin",
                "name": "Portal Administrator",
                "email": "admin@vestry.local",
                "password": "admin123",
                "role": "admin",
                "department": "dept-admin",
                "joinedAt": SEED_EPOCH,
            })],
        ),
        (
            CollectionName::News,
            vec![
                json!({
                    "id": "news-welcome",
                    "title": "Welcome to our new portal",
                    "body": "Members can now follow news, announcements and events online.",
                    "publishedAt": SEED_EPOCH,
                }),
                json!({
                    "id": "news-outreach",
                    "title": "Community outreach this season",
                    "body": "Volunteers are needed for the food drive.",
                    "publishedAt": SEED_EPOCH - 86_400_000,
                }),
            ],
        ),
        (
            CollectionName::Leaders,
            vec![
                json!({
                    "id": "ldr-senior",
                    "name": "Senior Pastor",
                    "title": "Lead Minister",
                    "order": 1,
                }),
                json!({
                    "id": "ldr-secretary",
                    "name": "General Secretary",
                    "title": "Administration",
                    "order": 2,
                }),
            ],
        ),
        (
            CollectionName::Announcements,
            vec![json!({
                "id": "ann-service-times",
                "title": "Service times",
                "body": "Sunday service begins at 9:00 AM.",
                "priority": "normal",
                "postedAt": SEED_EPOCH,
            })],
        ),
        (
            CollectionName::Departments,
            vec![
                json!({
                    "id": "dept-admin",
                    "name": "Administration",
                    "description": "Records, finance and facilities.",
                }),
                json!({
                    "id": "dept-youth",
                    "name": "Youth Ministry",
                    "description": "Programs for teens and young adults.",
                }),
            ],
        ),
        (CollectionName::Donations, Vec::new()),
        (CollectionName::Contacts, Vec::new()),
    ];

    for (name, values) in keyed {
        state
            .collections
            .insert(name, Collection::from(records(values)));
    }

    state.singletons.insert(
        CollectionName::Home,
        record(json!({
            "heroTitle": "Welcome Home",
            "heroSubtitle": "A community of faith, hope and service",
            "serviceTimes": ["Sunday 9:00 AM", "Wednesday 6:30 PM"],
            "showAnnouncements": true,
        })),
    );
    state.singletons.insert(
        CollectionName::About,
        record(json!({
            "mission": "To serve our neighbours and grow together.",
            "vision": "A welcoming home for every generation.",
            "history": "Founded by a handful of families, our community has grown steadily.",
            "address": "1 Chapel Lane",
        })),
    );

    state
}

fn records(values: Vec<Value>) -> Vec<Record> {
    values.into_iter().map(record).collect()
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => Record::from(map),
        // Every literal above is an object.
        _ => Record::new(),
    }
}
