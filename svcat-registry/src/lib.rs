pub mod api;
pub mod codec;
pub mod error;
pub mod registry;
pub mod strategy;

pub use api::{Object, ObjectMeta, ServiceBroker, ServiceBrokerSpec, ServiceBrokerStatus};
pub use codec::{decode_broker, encode_broker};
pub use error::{CodecError, RegistryError};
pub use registry::{UpdateAdmission, before_create, before_update};
pub use strategy::{
    BROKER_STATUS_STRATEGY, BROKER_STRATEGY, BrokerStatusStrategy, BrokerStrategy, Context,
    CreateStrategy, RestStrategy, UpdateStrategy,
};
