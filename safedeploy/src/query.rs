use alloy_primitives::Address;
use tracing::debug;

use crate::capabilities::ProxyFactory;
use crate::error::QueryError;

/// Fetch every proxy the factory has ever created, oldest first.
///
/// Stateless full-history scan: build the creation filter, fetch all
/// matching logs, project the proxy address out of each record. Nothing is
/// cached between calls.
pub async fn deployed_proxies(factory: &dyn ProxyFactory) -> Result<Vec<Address>, QueryError> {
    let filter = factory.proxy_creation_filter();
    let events = factory.creation_events(&filter).await?;
    debug!("Fetched {} proxy creation events", events.len());
    Ok(events.into_iter().map(|event| event.proxy).collect())
}
