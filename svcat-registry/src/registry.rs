//! Registry hooks around the lifecycle strategies.
//!
//! These are the checks a registry runs before handing an object to its
//! storage backend. They enforce the strategy's scoping and update flags,
//! maintain the system-owned metadata fields, and then call the strategy's
//! prepare hook. Nothing here persists anything.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::api::{Object, ObjectMeta};
use crate::error::{RegistryError, Result};
use crate::strategy::{Context, CreateStrategy, RestStrategy, UpdateStrategy};

/// What the caller must do after [`before_update`] succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAdmission {
    /// The object was prepared as an update of the stored one.
    Update,
    /// Nothing is stored yet and the strategy allows creating on update;
    /// the object must go through the create path instead.
    Create,
}

/// Prepare a new object for its first write.
///
/// Fills `uid` and `creation_timestamp`, clears `resource_version`, and
/// runs the strategy's create hook.
pub fn before_create<S: CreateStrategy>(
    strategy: &S,
    ctx: &Context,
    obj: &mut S::Object,
) -> Result<()> {
    check_scope(strategy, ctx, obj.meta())?;
    if obj.meta().name.is_empty() {
        warn!(
            request_id = %ctx.request_id,
            kind = S::Object::KIND,
            "rejected create without name"
        );
        return Err(RegistryError::MissingName);
    }

    let meta = obj.meta_mut();
    meta.uid = Uuid::new_v4().to_string();
    meta.creation_timestamp = Some(Utc::now());
    meta.resource_version.clear();

    strategy.prepare_for_create(ctx, obj);
    Ok(())
}

/// Prepare `new` to replace the stored object `old`.
///
/// `old` is the last persisted version, or `None` if nothing is stored
/// under that name. System fields (`uid`, `creation_timestamp`,
/// `generation`) are carried forward from `old` before the strategy's
/// update hook runs, so clients cannot set them.
pub fn before_update<S: UpdateStrategy>(
    strategy: &S,
    ctx: &Context,
    new: &mut S::Object,
    old: Option<&S::Object>,
) -> Result<UpdateAdmission> {
    check_scope(strategy, ctx, new.meta())?;

    let Some(old) = old else {
        if strategy.allow_create_on_update() {
            return Ok(UpdateAdmission::Create);
        }
        warn!(
            request_id = %ctx.request_id,
            kind = S::Object::KIND,
            name = %new.meta().name,
            "rejected update of missing object"
        );
        return Err(RegistryError::NotFound(new.meta().name.clone()));
    };

    let version = &new.meta().resource_version;
    if version.is_empty() {
        if !strategy.allow_unconditional_update() {
            warn!(
                request_id = %ctx.request_id,
                kind = S::Object::KIND,
                name = %new.meta().name,
                "rejected unconditional update"
            );
            return Err(RegistryError::PreconditionRequired(new.meta().name.clone()));
        }
    } else if *version != old.meta().resource_version {
        warn!(
            request_id = %ctx.request_id,
            kind = S::Object::KIND,
            name = %new.meta().name,
            expected = %old.meta().resource_version,
            actual = %version,
            "rejected update of stale version"
        );
        return Err(RegistryError::VersionMismatch {
            expected: old.meta().resource_version.clone(),
            actual: version.clone(),
        });
    }

    let meta = new.meta_mut();
    meta.uid = old.meta().uid.clone();
    meta.creation_timestamp = old.meta().creation_timestamp;
    meta.generation = old.meta().generation;

    strategy.prepare_for_update(ctx, new, old);
    Ok(UpdateAdmission::Update)
}

fn check_scope<S: RestStrategy>(strategy: &S, ctx: &Context, meta: &ObjectMeta) -> Result<()> {
    if strategy.namespace_scoped() || meta.namespace.is_empty() {
        return Ok(());
    }
    warn!(
        request_id = %ctx.request_id,
        kind = S::Object::KIND,
        namespace = %meta.namespace,
        "rejected namespace on cluster-scoped object"
    );
    Err(RegistryError::NamespaceNotAllowed {
        kind: S::Object::KIND.to_string(),
        namespace: meta.namespace.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ServiceBroker;
    use crate::strategy::{BROKER_STATUS_STRATEGY, BROKER_STRATEGY};

    fn stored_broker() -> ServiceBroker {
        let mut broker = ServiceBroker::new("ups-broker", "http://ups-broker.svc");
        before_create(&BROKER_STRATEGY, &ctx(), &mut broker).unwrap();
        broker.metadata.resource_version = "10".to_string();
        broker.metadata.generation = 1;
        broker
    }

    fn ctx() -> Context {
        Context::new("req-1").with_user("admin")
    }

    /// Strategy that permits everything the broker strategy forbids.
    struct PermissiveStrategy;

    impl RestStrategy for PermissiveStrategy {
        type Object = ServiceBroker;

        fn namespace_scoped(&self) -> bool {
            true
        }
    }

    impl UpdateStrategy for PermissiveStrategy {
        fn allow_create_on_update(&self) -> bool {
            true
        }

        fn allow_unconditional_update(&self) -> bool {
            true
        }

        fn prepare_for_update(
            &self,
            _ctx: &Context,
            _new: &mut ServiceBroker,
            _old: &ServiceBroker,
        ) {
        }
    }

    #[test]
    fn test_before_create_fills_system_fields() {
        let mut broker = ServiceBroker::new("b", "abcd");
        broker.metadata.resource_version = "99".to_string();

        before_create(&BROKER_STRATEGY, &ctx(), &mut broker).unwrap();

        assert!(Uuid::parse_str(&broker.metadata.uid).is_ok());
        assert!(broker.metadata.creation_timestamp.is_some());
        assert!(broker.metadata.resource_version.is_empty());
        assert_eq!(broker.status.conditions, Some(vec![]));
    }

    #[test]
    fn test_before_create_rejects_namespace() {
        let mut broker = ServiceBroker::new("b", "abcd");
        broker.metadata.namespace = "default".to_string();

        let err = before_create(&BROKER_STRATEGY, &ctx(), &mut broker).unwrap_err();

        assert!(matches!(err, RegistryError::NamespaceNotAllowed { .. }));
        assert!(broker.status.conditions.is_none());
    }

    #[test]
    fn test_before_create_requires_name() {
        let mut broker = ServiceBroker::new("", "abcd");
        let err = before_create(&BROKER_STRATEGY, &ctx(), &mut broker).unwrap_err();
        assert!(matches!(err, RegistryError::MissingName));
    }

    #[test]
    fn test_before_update_missing_object() {
        let mut broker = ServiceBroker::new("b", "abcd");
        broker.metadata.resource_version = "1".to_string();

        let err = before_update(&BROKER_STRATEGY, &ctx(), &mut broker, None).unwrap_err();

        match err {
            RegistryError::NotFound(name) => assert_eq!(name, "b"),
            other => panic!("Expected not found, got: {:?}", other),
        }
    }

    #[test]
    fn test_before_update_missing_object_create_allowed() {
        let mut broker = ServiceBroker::new("b", "abcd");
        let admission = before_update(&PermissiveStrategy, &ctx(), &mut broker, None).unwrap();
        assert_eq!(admission, UpdateAdmission::Create);
    }

    #[test]
    fn test_before_update_requires_resource_version() {
        let old = stored_broker();
        let mut new = old.clone();
        new.metadata.resource_version.clear();

        let err = before_update(&BROKER_STRATEGY, &ctx(), &mut new, Some(&old)).unwrap_err();

        assert!(matches!(err, RegistryError::PreconditionRequired(_)));
    }

    #[test]
    fn test_before_update_unconditional_allowed() {
        let old = stored_broker();
        let mut new = old.clone();
        new.metadata.resource_version.clear();

        let admission = before_update(&PermissiveStrategy, &ctx(), &mut new, Some(&old)).unwrap();

        assert_eq!(admission, UpdateAdmission::Update);
    }

    #[test]
    fn test_before_update_version_mismatch() {
        let old = stored_broker();
        let mut new = old.clone();
        new.metadata.resource_version = "9".to_string();

        let err = before_update(&BROKER_STRATEGY, &ctx(), &mut new, Some(&old)).unwrap_err();

        match err {
            RegistryError::VersionMismatch { expected, actual } => {
                assert_eq!(expected, "10");
                assert_eq!(actual, "9");
            }
            other => panic!("Expected version mismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_before_update_carries_system_fields() {
        let old = stored_broker();
        let mut new = old.clone();
        new.metadata.uid = "forged".to_string();
        new.metadata.creation_timestamp = None;
        new.metadata.generation = 0;

        before_update(&BROKER_STRATEGY, &ctx(), &mut new, Some(&old)).unwrap();

        assert_eq!(new.metadata.uid, old.metadata.uid);
        assert_eq!(new.metadata.creation_timestamp, old.metadata.creation_timestamp);
        assert_eq!(new.metadata.generation, 1);
    }

    #[test]
    fn test_before_update_spec_change_bumps_generation() {
        let old = stored_broker();
        let mut new = old.clone();
        new.spec.url = "http://other.svc".to_string();
        new.metadata.generation = 0;

        before_update(&BROKER_STRATEGY, &ctx(), &mut new, Some(&old)).unwrap();

        assert_eq!(new.metadata.generation, 2);
    }

    #[test]
    fn test_before_update_status_path_keeps_spec() {
        let old = stored_broker();
        let mut new = old.clone();
        new.spec.url = "http://other.svc".to_string();
        new.status.reconciled_generation = 1;

        before_update(&BROKER_STATUS_STRATEGY, &ctx(), &mut new, Some(&old)).unwrap();

        assert_eq!(new.spec, old.spec);
        assert_eq!(new.metadata.generation, 1);
        assert_eq!(new.status.reconciled_generation, 1);
    }
}
