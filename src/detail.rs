use std::sync::Arc;

use crate::classify::ErrorClassifier;
use crate::client::CatalogClient;
use crate::connectivity::ConnectivityProbe;
use crate::error::Failure;
use crate::types::CatalogDetail;

/// Fetch one item's detail for the detail screen.
/// Offline short-circuits to a `NoConnectivity` failure without calling the client.
pub async fn load_detail(
    client: Arc<dyn CatalogClient>,
    probe: Arc<dyn ConnectivityProbe>,
    classifier: ErrorClassifier,
    id: String,
) -> Result<CatalogDetail, Failure> {
    if !probe.is_available() {
        log::warn!("[detail] {id}: skipped, offline");
        return Err(classifier.offline());
    }
    match client.fetch_detail(&id).await {
        Ok(detail) => Ok(detail),
        Err(fault) => {
            let failure = classifier.failure(&fault);
            log::warn!("[detail] {id} failed ({}): {fault}", failure.category);
            Err(failure)
        }
    }
}
