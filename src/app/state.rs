use std::sync::mpsc::{self, Receiver, Sender};

use derivative::Derivative;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::{MutationOutcome, NewProduct, PollReport, Purchase};

/// Messages background tasks send back to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    /// Upload finished: the queued job id, or why it failed.
    Uploaded(Result<String, String>),
    PollFinished {
        /// Which `start_polling` call produced this report.
        generation: u64,
        job_id: String,
        report: PollReport,
    },
    ActionCompleted { action: ActionKind, outcome: MutationOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    CreateProduct,
    AddPurchase,
    LookupProduct,
    ListGroupProducts,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::CreateProduct => "Create product",
            ActionKind::AddPurchase => "Add purchase",
            ActionKind::LookupProduct => "Lookup product",
            ActionKind::ListGroupProducts => "Products in group",
        }
    }
}

#[derive(Clone, Derivative)]
#[derivative(Debug, Default)]
pub enum ActionProgress {
    #[derivative(Default)]
    NotStarted,
    Uploading {
        file_name: String,
    },
    Polling {
        job_id: String,
    },
    Finished {
        job_id: String,
        #[derivative(Debug = "ignore")]
        result: Value,
    },
    Failed {
        reason: String,
    },
    Cancelled {
        job_id: String,
    },
}

impl ActionProgress {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ActionProgress::Uploading { .. } | ActionProgress::Polling { .. }
        )
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            ActionProgress::Polling { job_id }
            | ActionProgress::Finished { job_id, .. }
            | ActionProgress::Cancelled { job_id } => Some(job_id),
            _ => None,
        }
    }
}

/// One finished action call, as listed under the forms.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub outcome: MutationOutcome,
}

impl ActionRecord {
    pub fn summary(&self) -> String {
        match &self.outcome {
            MutationOutcome::Success(body) => format!("{}: {}", self.action.label(), body),
            MutationOutcome::Error(message) => format!("{}: {}", self.action.label(), message),
        }
    }
}

/// Text fields of the product form, parsed on submit.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub product_id: String,
    pub barcode: String,
    pub category: String,
    pub location: String,
    pub qu_id_purchase: String,
    pub qu_id_stock: String,
    pub store: String,
}

impl ProductForm {
    pub fn to_payload(&self) -> Result<NewProduct, String> {
        let product_id = optional_id("Product ID", &self.product_id)?;
        if product_id.is_none() && self.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        Ok(NewProduct {
            name: self.name.trim().to_string(),
            product_id,
            barcode: optional_text(&self.barcode),
            category: optional_id("Category", &self.category)?,
            location: optional_id("Location", &self.location)?,
            qu_id_purchase: optional_id("Purchase unit", &self.qu_id_purchase)?,
            qu_id_stock: optional_id("Stock unit", &self.qu_id_stock)?,
            store: optional_text(&self.store),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct PurchaseForm {
    pub product_id: String,
    #[derivative(Default(value = "\"1\".to_string()"))]
    pub amount: String,
    pub price: String,
    #[derivative(Default(value = "\"0\".to_string()"))]
    pub days_out: String,
    pub shopping_location_id: String,
}

impl PurchaseForm {
    pub fn to_payload(&self) -> Result<Purchase, String> {
        let product_id = optional_id("Product ID", &self.product_id)?
            .ok_or_else(|| "Product ID and amount are required".to_string())?;
        Ok(Purchase {
            product_id,
            amount: parse_number("Amount", &self.amount)?,
            price: if self.price.trim().is_empty() {
                0.0
            } else {
                parse_number("Price", &self.price)?
            },
            days_out: self
                .days_out
                .trim()
                .parse()
                .map_err(|_| format!("Days out must be a whole number, got {:?}", self.days_out))?,
            shopping_location_id: optional_id("Store ID", &self.shopping_location_id)?,
        })
    }
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn optional_id(field: &str, raw: &str) -> Result<Option<u64>, String> {
    match optional_text(raw) {
        None => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|_| format!("{} must be a number, got {:?}", field, text)),
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("{} must be a number, got {:?}", field, raw))
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct UploadState {
    pub progress: ActionProgress,
    pub cancel: Option<CancellationToken>,
    pub poll_generation: u64,
    pub action_log: Vec<ActionRecord>,
    pub actions_in_flight: usize,
    pub show_result: bool,
    #[derivative(Debug = "ignore")]
    pub sender: Sender<AppEvent>,
    #[derivative(Debug = "ignore")]
    pub receiver: Receiver<AppEvent>,
}

impl Default for UploadState {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            progress: ActionProgress::default(),
            cancel: None,
            poll_generation: 0,
            action_log: Vec::new(),
            actions_in_flight: 0,
            show_result: true,
            sender,
            receiver,
        }
    }
}

impl UploadState {
    /// Forget the current job, keeping the event channel.
    pub fn clear_job(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.progress = ActionProgress::NotStarted;
    }

    pub fn get_status_text(&self) -> String {
        match &self.progress {
            ActionProgress::NotStarted => String::new(),
            ActionProgress::Uploading { file_name } => format!("📤 Uploading {}", file_name),
            ActionProgress::Polling { job_id } => format!("⏳ Processing receipt (job {})", job_id),
            ActionProgress::Finished { job_id, .. } => format!("✅ Receipt processed (job {})", job_id),
            ActionProgress::Failed { reason } => format!("❌ {}", reason),
            ActionProgress::Cancelled { job_id } => format!("⏹ Stopped checking job {}", job_id),
        }
    }
}
