use std::collections::HashMap;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Serialized envelope of an applied aggregate event.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct DomainEvent {
    pub id: String,
    pub aggregate_type: String,
    pub sequence: usize,
    pub event_type: String,
    pub event_version: String,
    pub payload: String,
    pub metadata: String,
}

impl DomainEvent {
    pub fn wrap<E: cqrs_es::DomainEvent>(
        id: &str,
        aggregate_type: &str,
        sequence: usize,
        event: &E,
        metadata: &HashMap<String, String>,
    ) -> Result<Self, Error> {
        Ok(Self::new(
            id.to_string(),
            aggregate_type.to_string(),
            sequence,
            event.event_type(),
            event.event_version(),
            serde_json::to_string(event)?,
            serde_json::to_string(metadata)?,
        ))
    }

    pub fn metadata_value(&self, key: &str) -> Option<String> {
        serde_json::from_str::<HashMap<String, String>>(&self.metadata)
            .ok()?
            .remove(key)
    }
}
