use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tesla_api::endpoints::{orders::Order, tasks::OrderDetails, ReferenceNumber};
use tesla_api::ApiError;

/// An order together with its task tree, as fetched in one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub order: Order,
    pub details: OrderDetails,
}

impl SnapshotEntry {
    pub fn reference(&self) -> &ReferenceNumber {
        &self.order.reference_number
    }
}

/// All orders of the account at one point in time. Reference numbers are
/// unique; a persisted file that violates this fails to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SnapshotEntry>", into = "Vec<SnapshotEntry>")]
pub struct OrderSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl OrderSnapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Result<Self, ApiError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.reference()) {
                return Err(ApiError::DuplicateReference(entry.reference().clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn get(&self, reference: &ReferenceNumber) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.reference() == reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot as one JSON object keyed by reference number, the shape
    /// the change detector walks.
    pub fn to_keyed_value(&self) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();
        for entry in &self.entries {
            map.insert(entry.reference().to_string(), serde_json::to_value(entry)?);
        }
        Ok(Value::Object(map))
    }
}

impl TryFrom<Vec<SnapshotEntry>> for OrderSnapshot {
    type Error = ApiError;

    fn try_from(entries: Vec<SnapshotEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<OrderSnapshot> for Vec<SnapshotEntry> {
    fn from(snapshot: OrderSnapshot) -> Self {
        snapshot.entries
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::entry;
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_references_are_rejected() {
        let err = OrderSnapshot::new(vec![
            entry("RN1", "BOOKED", json!({})),
            entry("RN1", "BOOKED", json!({})),
        ])
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateReference(r) if r == "RN1"));
    }

    #[test]
    fn persisted_form_is_a_plain_list() {
        let snapshot = OrderSnapshot::new(vec![entry("RN1", "BOOKED", json!({}))]).unwrap();
        let value = serde_json::to_value(&snapshot).unwrap();

        assert!(value.is_array());
        assert_eq!(value[0]["order"]["referenceNumber"], "RN1");

        let back: OrderSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn persisted_duplicates_fail_to_load() {
        let one = serde_json::to_value(entry("RN1", "BOOKED", json!({}))).unwrap();
        let result = serde_json::from_value::<OrderSnapshot>(json!([one.clone(), one]));
        assert!(result.is_err());
    }

    #[test]
    fn keyed_value_uses_reference_numbers() {
        let snapshot = OrderSnapshot::new(vec![
            entry("RN1", "BOOKED", json!({})),
            entry("RN2", "DELIVERED", json!({})),
        ])
        .unwrap();
        let keyed = snapshot.to_keyed_value().unwrap();

        assert_eq!(keyed["RN2"]["order"]["orderStatus"], "DELIVERED");
        assert!(snapshot.get(&"RN1".into()).is_some());
    }
}
