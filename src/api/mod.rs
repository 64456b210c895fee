//! HTTP side of the receipt client: the transport seam, the job-status
//! poller and the JSON action requesters.

mod actions;
mod poller;
mod receipt;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{add_purchase, create_product, lookup_product, products_for_group};
pub use poller::{poll_job_status, PollOutcome, PollPolicy, PollReport};
pub use receipt::upload_receipt;
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{require_body, JobState, MutationOutcome, NewProduct, Purchase};
