//! Replicated log entries and their wire form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted write.
///
/// Ids are assigned by the coordinator, start at 1 and never skip. A replica
/// may be missing some of them for a while, the coordinator never is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    #[serde(rename = "message")]
    pub payload: String,
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    pub fn new(id: u64, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Body of a replicate call as received by a replica.
///
/// Every field is optional so that a request with missing fields can be
/// told apart from one that is not JSON at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicateRequest {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&Entry> for ReplicateRequest {
    fn from(entry: &Entry) -> Self {
        Self {
            id: Some(entry.id),
            message: Some(entry.payload.clone()),
            timestamp: Some(entry.timestamp),
        }
    }
}

impl TryFrom<ReplicateRequest> for Entry {
    type Error = crate::Error;

    fn try_from(req: ReplicateRequest) -> crate::Result<Self> {
        let id = req
            .id
            .filter(|id| *id > 0)
            .ok_or_else(|| crate::Error::InvalidRequest("missing or zero id".into()))?;
        let payload = req
            .message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| crate::Error::InvalidRequest("missing message".into()))?;
        let timestamp = req
            .timestamp
            .ok_or_else(|| crate::Error::InvalidRequest("missing timestamp".into()))?;

        Ok(Entry {
            id,
            payload,
            timestamp,
        })
    }
}

/// Response body for every "list of entries" read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let entry = Entry::new(7, "hello");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["message"], "hello");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_request_validation() {
        let entry = Entry::new(1, "A");
        let ok = Entry::try_from(ReplicateRequest::from(&entry)).unwrap();
        assert_eq!(ok, entry);

        let missing_message = ReplicateRequest {
            message: None,
            ..ReplicateRequest::from(&entry)
        };
        assert!(Entry::try_from(missing_message).is_err());

        let missing_timestamp = ReplicateRequest {
            timestamp: None,
            ..ReplicateRequest::from(&entry)
        };
        assert!(Entry::try_from(missing_timestamp).is_err());

        let zero_id = ReplicateRequest {
            id: Some(0),
            ..ReplicateRequest::from(&entry)
        };
        assert!(Entry::try_from(zero_id).is_err());
    }
}
