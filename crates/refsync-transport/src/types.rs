use serde::{Deserialize, Serialize};
use refsync_types::Oid;

/// Object counts captured once after a successful download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    pub indexed_objects: u64,
    pub received_objects: u64,
    pub received_bytes: u64,
}

/// A reference the remote advertised during a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedRef {
    pub name: String,
    pub target: Oid,
}

/// A requested update of a local reference after a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipUpdate {
    /// Local reference name, already mapped through a refspec.
    pub name: String,
    pub target: Oid,
    /// Permit a non-fast-forward update.
    pub force: bool,
}

/// The remote's verdict on one pushed reference. `message` is `None` when
/// the update was accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefStatus {
    pub reference: String,
    pub message: Option<String>,
}

impl RefStatus {
    pub fn accepted(reference: impl Into<String>) -> Self {
        Self { reference: reference.into(), message: None }
    }

    pub fn rejected(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self { reference: reference.into(), message: Some(message.into()) }
    }

    pub fn is_accepted(&self) -> bool {
        self.message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_default_to_zero() {
        let s = TransferStats::default();
        assert_eq!(s.indexed_objects, 0);
        assert_eq!(s.received_objects, 0);
        assert_eq!(s.received_bytes, 0);
    }

    #[test]
    fn stats_serialize_with_field_names() {
        let s = TransferStats { indexed_objects: 3, received_objects: 3, received_bytes: 120 };
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["indexed_objects"], 3);
        assert_eq!(json["received_bytes"], 120);
    }

    #[test]
    fn ref_status_constructors() {
        assert!(RefStatus::accepted("refs/heads/main").is_accepted());
        let r = RefStatus::rejected("refs/heads/main", "non-fast-forward");
        assert!(!r.is_accepted());
        assert_eq!(r.message.as_deref(), Some("non-fast-forward"));
    }
}
