//! Shared test utilities for svcat-registry integration tests.

use std::collections::HashMap;

use svcat_registry::{
    Context, CreateStrategy, RegistryError, ServiceBroker, UpdateAdmission, UpdateStrategy,
    before_create, before_update,
};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory stand-in for a storage backend.
///
/// Assigns a new resource version on every successful write, the way a
/// real store would.
#[derive(Default)]
pub struct MemoryStore {
    objects: HashMap<String, ServiceBroker>,
    revision: u64,
}

impl MemoryStore {
    pub fn get(&self, name: &str) -> Option<ServiceBroker> {
        self.objects.get(name).cloned()
    }

    pub fn create<S>(&mut self, strategy: &S, mut broker: ServiceBroker) -> ServiceBroker
    where
        S: CreateStrategy<Object = ServiceBroker>,
    {
        before_create(strategy, &Context::new("create"), &mut broker).expect("create rejected");
        self.persist(broker)
    }

    pub fn update<S>(
        &mut self,
        strategy: &S,
        mut broker: ServiceBroker,
    ) -> Result<ServiceBroker, RegistryError>
    where
        S: UpdateStrategy<Object = ServiceBroker>,
    {
        let old = self.objects.get(&broker.metadata.name).cloned();
        match before_update(strategy, &Context::new("update"), &mut broker, old.as_ref())? {
            UpdateAdmission::Update => Ok(self.persist(broker)),
            UpdateAdmission::Create => panic!("create on update is not expected here"),
        }
    }

    fn persist(&mut self, mut broker: ServiceBroker) -> ServiceBroker {
        self.revision += 1;
        broker.metadata.resource_version = self.revision.to_string();
        self.objects
            .insert(broker.metadata.name.clone(), broker.clone());
        broker
    }
}
