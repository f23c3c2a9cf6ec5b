//! DataProduct domain types
//!
//! [`DataProduct`] is the stored record. [`DataProductDto`] is what clients send;
//! it has no timestamp fields, so creation and update times can only ever be
//! assigned by the repository. [`NewDataProduct`] and [`DataProductPatch`] are the
//! repository's create and update inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Entity type name used in errors, audit entries and events
pub const ENTITY_TYPE: &str = "DataProduct";

/// Identifier of a stored DataProduct
///
/// Backed by a UUIDv7 so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataProductId(Uuid);

impl DataProductId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DataProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DataProductId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for DataProductId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for DataProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a DataProduct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataProductStatus {
    /// Visible and in use
    #[default]
    Active,
    /// Retired but retained
    Inactive,
}

impl fmt::Display for DataProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// A stored DataProduct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProduct {
    pub id: DataProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: DataProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every successful write; starts at 1
    pub revision: u64,
}

impl DataProduct {
    /// Build a fresh record from validated create input
    pub fn from_new(id: DataProductId, data: NewDataProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: data.name,
            description: data.description,
            status: data.status,
            created_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    /// Overwrite the fields present in `patch` and bump the revision
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: DataProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        self.revision += 1;
    }
}

/// Client payload for create and update
///
/// Every field is optional at the wire level; which ones are required depends
/// on the operation and is enforced by the validation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProductDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DataProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DataProductStatus>,
    /// Revision the client last read; enables a conditional update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_revision: Option<u64>,
}

impl DataProductDto {
    /// DTO carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: DataProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_expected_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }

    /// True when the DTO carries at least one client-mutable field
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.description.is_some() || self.status.is_some()
    }
}

/// Repository input for creating a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDataProduct {
    pub name: String,
    pub description: Option<String>,
    pub status: DataProductStatus,
}

/// Repository input for updating a record: only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<DataProductStatus>,
    /// When set, the write only succeeds if the stored revision matches
    pub expected_revision: Option<u64>,
}

impl From<&DataProductDto> for DataProductPatch {
    fn from(dto: &DataProductDto) -> Self {
        Self {
            name: dto.name.clone(),
            description: dto.description.clone(),
            status: dto.status,
            expected_revision: dto.expected_revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&DataProductStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
        let parsed: DataProductStatus = serde_json::from_str("\"INACTIVE\"").unwrap();
        assert_eq!(parsed, DataProductStatus::Inactive);
        assert_eq!(DataProductStatus::default(), DataProductStatus::Active);
    }

    #[test]
    fn test_dto_ignores_client_timestamps() {
        let dto: DataProductDto = serde_json::from_str(
            r#"{"name":"Catalog A","createdAt":"2001-01-01T00:00:00Z","updatedAt":"2001-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(dto, DataProductDto::named("Catalog A"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let now = Utc::now();
        let record = DataProduct::from_new(
            DataProductId::new(),
            NewDataProduct {
                name: "Catalog A".to_string(),
                description: None,
                status: DataProductStatus::Active,
            },
            now,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Catalog A");
        assert_eq!(json["status"], "ACTIVE");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("description").is_none());
        assert_eq!(json["revision"], 1);
    }

    #[test]
    fn test_apply_overwrites_present_fields_only() {
        let created = Utc::now();
        let mut record = DataProduct::from_new(
            DataProductId::new(),
            NewDataProduct {
                name: "Catalog A".to_string(),
                description: Some("old".to_string()),
                status: DataProductStatus::Active,
            },
            created,
        );
        let id = record.id;

        let later = created + chrono::Duration::seconds(5);
        record.apply(
            DataProductPatch {
                status: Some(DataProductStatus::Inactive),
                ..Default::default()
            },
            later,
        );

        assert_eq!(record.id, id);
        assert_eq!(record.name, "Catalog A");
        assert_eq!(record.description.as_deref(), Some("old"));
        assert_eq!(record.status, DataProductStatus::Inactive);
        assert_eq!(record.created_at, created);
        assert_eq!(record.updated_at, later);
        assert_eq!(record.revision, 2);
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = DataProductId::new();
        let parsed: DataProductId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DataProductId>().is_err());
    }

    #[test]
    fn test_has_changes() {
        assert!(!DataProductDto::default().has_changes());
        assert!(!DataProductDto::default().with_expected_revision(1).has_changes());
        assert!(DataProductDto::default().with_description("x").has_changes());
    }
}
