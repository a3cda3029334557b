//! JSON encoding of broker objects.
//!
//! Absent and empty condition lists are kept distinct on the wire: an
//! absent `status.conditions` decodes to `None` and is omitted again on
//! encode, while `[]` round-trips as `Some(vec![])`.

use crate::api::{API_VERSION, SERVICE_BROKER_KIND, ServiceBroker};
use crate::error::CodecError;

/// Decode a broker, rejecting payloads of any other type.
pub fn decode_broker(data: &[u8]) -> Result<ServiceBroker, CodecError> {
    let broker: ServiceBroker = serde_json::from_slice(data)?;
    let type_meta = &broker.type_meta;
    if type_meta.api_version != API_VERSION || type_meta.kind != SERVICE_BROKER_KIND {
        return Err(CodecError::UnexpectedKind {
            api_version: type_meta.api_version.clone(),
            kind: type_meta.kind.clone(),
        });
    }
    Ok(broker)
}

/// Encode a broker as JSON.
pub fn encode_broker(broker: &ServiceBroker) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(broker)?)
}
