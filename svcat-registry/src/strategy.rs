//! Lifecycle strategies.
//!
//! A strategy is the per-resource policy the registry consults before an
//! object is persisted. It declares how the resource is scoped and which
//! update modes are permitted, and normalizes objects on create and update:
//! - On create, absent status conditions become an empty list.
//! - On update, `generation` is bumped by exactly one when the spec changed.
//! - Spec writes keep the stored status, status writes keep the stored spec.
//!
//! Hooks are synchronous and infallible. They only mutate the object they
//! are handed; the stored ("old") object is never touched.

use tracing::{debug, trace};

use crate::api::{Object, ServiceBroker};

/// Strategy for the main broker endpoint. Writes here own the spec.
pub const BROKER_STRATEGY: BrokerStrategy = BrokerStrategy;

/// Strategy for the broker status subresource.
pub const BROKER_STATUS_STRATEGY: BrokerStatusStrategy = BrokerStatusStrategy;

/// Per-request context handed to every hook.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub request_id: String,
    pub user: Option<String>,
}

impl Context {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

// =============================================================================
// Strategy Traits
// =============================================================================

/// Behavior shared by create and update strategies.
pub trait RestStrategy {
    /// Resource type this strategy governs.
    type Object: Object;

    /// Whether objects are partitioned by namespace.
    fn namespace_scoped(&self) -> bool;
}

/// Hooks invoked before a new object is stored.
pub trait CreateStrategy: RestStrategy {
    /// Normalize `obj` in place before it is persisted for the first time.
    fn prepare_for_create(&self, ctx: &Context, obj: &mut Self::Object);
}

/// Hooks invoked before an existing object is replaced.
pub trait UpdateStrategy: RestStrategy {
    /// Whether an update of a missing object may create it.
    fn allow_create_on_update(&self) -> bool;

    /// Whether an update may omit the resource version it is based on.
    fn allow_unconditional_update(&self) -> bool;

    /// Normalize `new` in place against the stored `old`.
    fn prepare_for_update(&self, ctx: &Context, new: &mut Self::Object, old: &Self::Object);
}

/// Set `new.generation` to `old.generation + 1` if the specs differ.
///
/// Returns whether the generation was bumped. Equal specs leave `new`
/// untouched. The counter saturates instead of wrapping, so once `old` is
/// at `u64::MAX` a spec change no longer moves it: "bumped iff the spec
/// changed" holds only below that limit.
pub fn bump_generation_on_spec_change<O: Object>(new: &mut O, old: &O) -> bool {
    if new.spec() == old.spec() {
        return false;
    }
    new.meta_mut().generation = old.meta().generation.saturating_add(1);
    true
}

// =============================================================================
// ServiceBroker
// =============================================================================

/// Lifecycle strategy for brokers written through the main endpoint.
///
/// The status is always taken from the stored object; controllers change
/// it through [`BrokerStatusStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokerStrategy;

impl RestStrategy for BrokerStrategy {
    type Object = ServiceBroker;

    fn namespace_scoped(&self) -> bool {
        false
    }
}

impl CreateStrategy for BrokerStrategy {
    fn prepare_for_create(&self, ctx: &Context, broker: &mut ServiceBroker) {
        if broker.status.conditions.is_none() {
            broker.status.conditions = Some(Vec::new());
            debug!(
                request_id = %ctx.request_id,
                user = ctx.user.as_deref(),
                broker = %broker.metadata.name,
                "initialized empty broker conditions"
            );
        }
    }
}

impl UpdateStrategy for BrokerStrategy {
    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn allow_unconditional_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, ctx: &Context, new: &mut ServiceBroker, old: &ServiceBroker) {
        // Status is owned by the status subresource.
        new.status = old.status.clone();

        if bump_generation_on_spec_change(new, old) {
            debug!(
                request_id = %ctx.request_id,
                user = ctx.user.as_deref(),
                broker = %new.metadata.name,
                generation = new.metadata.generation,
                "broker spec changed, bumped generation"
            );
        } else {
            trace!(
                request_id = %ctx.request_id,
                user = ctx.user.as_deref(),
                broker = %new.metadata.name,
                "broker spec unchanged"
            );
        }
    }
}

/// Lifecycle strategy for the broker status subresource.
///
/// Controllers write status through this path. The spec is always taken
/// from the stored object, so a status write never changes the generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokerStatusStrategy;

impl RestStrategy for BrokerStatusStrategy {
    type Object = ServiceBroker;

    fn namespace_scoped(&self) -> bool {
        BROKER_STRATEGY.namespace_scoped()
    }
}

impl UpdateStrategy for BrokerStatusStrategy {
    fn allow_create_on_update(&self) -> bool {
        BROKER_STRATEGY.allow_create_on_update()
    }

    fn allow_unconditional_update(&self) -> bool {
        BROKER_STRATEGY.allow_unconditional_update()
    }

    fn prepare_for_update(&self, ctx: &Context, new: &mut ServiceBroker, old: &ServiceBroker) {
        if new.spec != old.spec {
            debug!(
                request_id = %ctx.request_id,
                user = ctx.user.as_deref(),
                broker = %new.metadata.name,
                "ignoring spec change on status update"
            );
            new.spec = old.spec.clone();
        }
    }
}
