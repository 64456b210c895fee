use serde::Serialize;
use serde_json::{json, Value};

use super::{require_body, HttpTransport, MutationOutcome, NewProduct, Purchase};
use crate::error::ClientError;

/// Shown when an action request never produced a readable answer.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// POST `payload` as JSON to `path` and split the answer on its `error`
/// field.
///
/// Exactly one [`MutationOutcome`] comes back per call; nothing is
/// retried.
pub async fn post_action<T>(
    transport: &dyn HttpTransport,
    path: &str,
    payload: &T,
) -> MutationOutcome
where
    T: Serialize + ?Sized,
{
    match send(transport, path, payload).await {
        Ok(body) => {
            let outcome = MutationOutcome::from_response(body);
            if let MutationOutcome::Error(message) = &outcome {
                tracing::warn!(path, %message, "Server rejected action");
            }
            outcome
        }
        Err(e) => {
            tracing::error!(path, error = %e, "Action request failed");
            MutationOutcome::Error(NETWORK_ERROR_MESSAGE.to_string())
        }
    }
}

async fn send<T>(transport: &dyn HttpTransport, path: &str, payload: &T) -> Result<Value, ClientError>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_value(payload)?;
    require_body(transport.post_json(path, &body).await?)
}

/// Create a product, or attach a barcode to an existing one.
pub async fn create_product(transport: &dyn HttpTransport, product: &NewProduct) -> MutationOutcome {
    post_action(transport, "/create-product", product).await
}

/// Book a purchase of an existing product.
pub async fn add_purchase(transport: &dyn HttpTransport, purchase: &Purchase) -> MutationOutcome {
    post_action(transport, "/add-purchase", purchase).await
}

/// Ask the server's external barcode lookup about `barcode`.
pub async fn lookup_product(transport: &dyn HttpTransport, barcode: &str) -> MutationOutcome {
    post_action(transport, "/lookup-product", &json!({ "barcode": barcode })).await
}

/// List the products of a product group.
pub async fn products_for_group(transport: &dyn HttpTransport, group_id: &str) -> MutationOutcome {
    post_action(
        transport,
        &format!("/products-for-group/{}", group_id),
        &json!({}),
    )
    .await
}
