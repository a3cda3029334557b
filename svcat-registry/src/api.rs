//! Resource types served by the registry.
//!
//! Every top-level object carries the same envelope: type information,
//! object metadata, a user-owned `spec` (desired state) and a
//! controller-owned `status` (observed state).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// API group and version of the service catalog resources.
pub const API_VERSION: &str = "servicecatalog.k8s.io/v1beta1";

/// Kind of the broker resource.
pub const SERVICE_BROKER_KIND: &str = "ServiceBroker";

// =============================================================================
// Object Envelope
// =============================================================================

/// Type information of an encoded object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

/// Metadata shared by all persisted objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    /// Empty for cluster-scoped objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    /// Opaque version of the stored object, used for optimistic concurrency.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    /// Incremented each time the spec changes.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub generation: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Uniform access to the parts of a resource the registry cares about.
pub trait Object {
    /// Kind name used in errors and logs.
    const KIND: &'static str;

    /// Desired-state payload, compared structurally to detect changes.
    type Spec: PartialEq + Debug;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn spec(&self) -> &Self::Spec;
}

// =============================================================================
// ServiceBroker
// =============================================================================

/// A service broker registered with the catalog. Cluster-scoped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceBroker {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ServiceBrokerSpec,
    #[serde(default)]
    pub status: ServiceBrokerStatus,
}

/// ServiceBrokerSpec - desired state of a broker (user-defined)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBrokerSpec {
    /// Address of the broker's OSB endpoint.
    pub url: String,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    #[serde(default)]
    pub relist_behavior: RelistBehavior,
    /// Bumped by users to force a manual relist of the catalog.
    #[serde(default)]
    pub relist_requests: i64,
}

/// How the controller refreshes the broker's catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelistBehavior {
    /// Relist periodically
    #[default]
    Duration,
    /// Relist only when `relist_requests` changes
    Manual,
}

/// ServiceBrokerStatus - observed state (written by controllers)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBrokerStatus {
    /// `None` means the conditions were never set, which is encoded by
    /// omitting the field. `Some(vec![])` encodes as an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ServiceBrokerCondition>>,
    /// Generation of the spec the controller last acted on.
    #[serde(default)]
    pub reconciled_generation: u64,
}

/// A single typed observation about a broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBrokerCondition {
    #[serde(rename = "type")]
    pub type_: ServiceBrokerConditionType,
    pub status: ConditionStatus,
    pub last_transition_time: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceBrokerConditionType {
    /// The broker's catalog has been fetched and is usable
    Ready,
    /// The broker has failed terminally
    Failed,
}

/// Tri-state value of a condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl ServiceBroker {
    /// Build a broker pointing at `url`, with no conditions set.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            type_meta: TypeMeta {
                api_version: API_VERSION.to_string(),
                kind: SERVICE_BROKER_KIND.to_string(),
            },
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
            spec: ServiceBrokerSpec {
                url: url.into(),
                ..Default::default()
            },
            status: ServiceBrokerStatus::default(),
        }
    }

    /// True when the Ready condition is present and `True`.
    pub fn is_ready(&self) -> bool {
        self.status
            .condition(ServiceBrokerConditionType::Ready)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// True when the spec has moved past what the controller last reconciled.
    pub fn needs_reconcile(&self) -> bool {
        self.metadata.generation > self.status.reconciled_generation
    }
}

impl Object for ServiceBroker {
    const KIND: &'static str = SERVICE_BROKER_KIND;

    type Spec = ServiceBrokerSpec;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn spec(&self) -> &ServiceBrokerSpec {
        &self.spec
    }
}

impl ServiceBrokerStatus {
    /// Get the condition of the given type, if present.
    pub fn condition(
        &self,
        type_: ServiceBrokerConditionType,
    ) -> Option<&ServiceBrokerCondition> {
        self.conditions
            .as_deref()
            .and_then(|conditions| conditions.iter().find(|c| c.type_ == type_))
    }

    /// Record a condition, replacing any existing one of the same type.
    ///
    /// The previous transition time is kept when the tri-state value did
    /// not change, so only real transitions move it forward.
    pub fn set_condition(&mut self, condition: ServiceBrokerCondition) {
        let conditions = self.conditions.get_or_insert_with(Vec::new);
        match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(existing) => {
                let last_transition_time = if existing.status == condition.status {
                    existing.last_transition_time
                } else {
                    condition.last_transition_time
                };
                *existing = ServiceBrokerCondition {
                    last_transition_time,
                    ..condition
                };
            }
            None => conditions.push(condition),
        }
    }
}
