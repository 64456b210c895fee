mod state;
mod ui;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use eframe::{egui, App};
use tokio_util::sync::CancellationToken;

use crate::api::{
    self, HttpTransport, MutationOutcome, PollOutcome, PollReport, ReqwestTransport,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::page::{self, ErrorContainer, Page, SubmitButton};
use crate::upload::{validate_file_input, FileInput, UploadCandidate};
pub use state::{
    ActionKind, ActionProgress, ActionRecord, AppEvent, ProductForm, PurchaseForm, UploadState,
};

pub const JOB_FAILED_MESSAGE: &str = "Error processing receipt. Please try again.";
pub const STATUS_ERROR_MESSAGE: &str = "Error checking status. Please refresh the page.";

pub struct ReceiptUploader {
    config: ClientConfig,
    server_url: String,
    transport: Option<(String, Arc<dyn HttpTransport>)>,
    receipt: FileInput,
    submit: SubmitButton,
    errors: ErrorContainer,
    job_id_input: String,
    product_form: ProductForm,
    purchase_form: PurchaseForm,
    state: UploadState,
}

impl ReceiptUploader {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ClientConfig) -> Self {
        tracing::info!(server = %config.server_url, "Initializing receipt uploader");
        Self {
            server_url: config.server_url.clone(),
            config,
            transport: None,
            receipt: FileInput::default(),
            submit: SubmitButton::default(),
            errors: ErrorContainer::default(),
            job_id_input: String::new(),
            product_form: ProductForm::default(),
            purchase_form: PurchaseForm::default(),
            state: UploadState::default(),
        }
    }

    /// Transport for the current server URL, rebuilt when the URL changes.
    fn transport(&mut self) -> Result<Arc<dyn HttpTransport>, ClientError> {
        let url = self.server_url.trim().trim_end_matches('/').to_string();
        if let Some((cached_url, transport)) = &self.transport {
            if *cached_url == url {
                return Ok(Arc::clone(transport));
            }
        }

        let transport = ReqwestTransport::new(url.clone(), self.config.request_timeout)?;
        tracing::debug!(base_url = transport.base_url(), "Built HTTP transport");
        let transport: Arc<dyn HttpTransport> = Arc::new(transport);
        self.transport = Some((url, Arc::clone(&transport)));
        Ok(transport)
    }

    /// Run `task` on its own thread and runtime; its event is delivered to
    /// the UI thread on a later frame. When the task cannot run at all,
    /// `fallback` builds the event from the reason.
    fn spawn_task<F, Fut, G>(&mut self, ctx: &egui::Context, task: F, fallback: G)
    where
        F: FnOnce(Arc<dyn HttpTransport>) -> Fut + Send + 'static,
        Fut: Future<Output = AppEvent>,
        G: FnOnce(String) -> AppEvent + Send + 'static,
    {
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(e) => {
                tracing::error!(error = %e, "Cannot build HTTP client");
                self.handle_event(ctx, fallback(e.to_string()));
                return;
            }
        };

        let sender = self.state.sender.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let event = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(task(transport)),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start background runtime");
                    fallback(ClientError::Runtime(e.to_string()).to_string())
                }
            };
            sender.send(event).unwrap_or_default();
            ctx.request_repaint();
        });
    }

    /// Take a picked file through the form guard.
    pub fn select_receipt(&mut self, path: &Path) {
        self.submit.disabled = true;
        self.receipt.clear();

        match UploadCandidate::from_path(path) {
            Ok(candidate) => {
                tracing::info!(file = %candidate.file_name, size = candidate.size_bytes, "Receipt selected");
                let mut input = std::mem::take(&mut self.receipt);
                input.select(vec![candidate]);
                validate_file_input(&mut input, self);
                self.receipt = input;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read selected file");
                page::show_error(self, &e.to_string());
            }
        }
    }

    pub fn start_upload(&mut self, ctx: &egui::Context) {
        let Some(candidate) = self.receipt.first().cloned() else {
            page::show_error(self, "No receipt selected");
            return;
        };

        self.state.clear_job();
        self.errors.dismiss();
        self.submit.disabled = true;
        self.state.progress = ActionProgress::Uploading {
            file_name: candidate.file_name.clone(),
        };

        self.spawn_task(
            ctx,
            move |transport| async move {
                let result = api::upload_receipt(transport.as_ref(), &candidate)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Upload failed");
                        e.to_string()
                    });
                AppEvent::Uploaded(result)
            },
            |reason| AppEvent::Uploaded(Err(reason)),
        );
    }

    pub fn start_polling(&mut self, ctx: &egui::Context, job_id: String) {
        self.state.clear_job();
        self.state.poll_generation += 1;
        let generation = self.state.poll_generation;
        let cancel = CancellationToken::new();
        self.state.cancel = Some(cancel.clone());
        self.state.progress = ActionProgress::Polling {
            job_id: job_id.clone(),
        };

        let policy = self.config.poll.clone();
        let fallback_job_id = job_id.clone();
        self.spawn_task(
            ctx,
            move |transport| async move {
                let report =
                    api::poll_job_status(transport.as_ref(), &job_id, &policy, &cancel).await;
                AppEvent::PollFinished {
                    generation,
                    job_id,
                    report,
                }
            },
            move |reason| AppEvent::PollFinished {
                generation,
                job_id: fallback_job_id,
                report: PollReport {
                    outcome: PollOutcome::TransportError(reason),
                    attempts: 0,
                },
            },
        );
    }

    pub fn cancel_polling(&mut self) {
        if let Some(cancel) = &self.state.cancel {
            tracing::info!("Cancelling job polling");
            cancel.cancel();
        }
    }

    pub fn run_action(&mut self, ctx: &egui::Context, action: ActionKind) {
        let request = match action {
            ActionKind::CreateProduct => self.product_form.to_payload().map(ActionRequest::Product),
            ActionKind::AddPurchase => self.purchase_form.to_payload().map(ActionRequest::Purchase),
            ActionKind::LookupProduct => match self.product_form.barcode.trim() {
                "" => Err("Enter a barcode to look up".to_string()),
                barcode => Ok(ActionRequest::Lookup(barcode.to_string())),
            },
            ActionKind::ListGroupProducts => match self.product_form.category.trim() {
                "" => Err("Enter a category ID to list its products".to_string()),
                group_id => Ok(ActionRequest::Group(group_id.to_string())),
            },
        };

        let request = match request {
            Ok(request) => request,
            Err(message) => {
                page::show_error(self, &message);
                return;
            }
        };

        self.state.actions_in_flight += 1;
        self.spawn_task(
            ctx,
            move |transport| async move {
                let transport = transport.as_ref();
                let outcome = match &request {
                    ActionRequest::Product(product) => api::create_product(transport, product).await,
                    ActionRequest::Purchase(purchase) => api::add_purchase(transport, purchase).await,
                    ActionRequest::Lookup(barcode) => api::lookup_product(transport, barcode).await,
                    ActionRequest::Group(group_id) => {
                        api::products_for_group(transport, group_id).await
                    }
                };
                AppEvent::ActionCompleted { action, outcome }
            },
            move |reason| AppEvent::ActionCompleted {
                action,
                outcome: MutationOutcome::Error(reason),
            },
        );
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.state.receiver.try_recv() {
            self.handle_event(ctx, event);
        }
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: AppEvent) {
        match event {
            AppEvent::Uploaded(Ok(job_id)) => {
                self.job_id_input = job_id.clone();
                self.start_polling(ctx, job_id);
            }
            AppEvent::Uploaded(Err(message)) => {
                self.state.progress = ActionProgress::Failed {
                    reason: "Upload failed".to_string(),
                };
                self.submit.disabled = self.receipt.is_empty();
                page::show_error(self, &format!("Error uploading receipt: {}", message));
            }
            AppEvent::PollFinished {
                generation,
                job_id,
                report,
            } => self.finish_polling(generation, job_id, report),
            AppEvent::ActionCompleted { action, outcome } => {
                self.state.actions_in_flight = self.state.actions_in_flight.saturating_sub(1);
                self.finish_action(action, outcome);
            }
        }
    }

    fn finish_polling(&mut self, generation: u64, job_id: String, report: PollReport) {
        // A newer poll may have replaced the one this report belongs to.
        if generation != self.state.poll_generation
            || !matches!(self.state.progress, ActionProgress::Polling { .. })
        {
            tracing::debug!(%job_id, "Ignoring result of superseded poll");
            return;
        }
        self.state.cancel = None;
        self.submit.disabled = self.receipt.is_empty();

        match report.outcome {
            PollOutcome::Finished(result) => {
                self.errors.dismiss();
                self.state.show_result = true;
                self.state.progress = ActionProgress::Finished { job_id, result };
            }
            PollOutcome::Failed => {
                self.state.progress = ActionProgress::Failed {
                    reason: JOB_FAILED_MESSAGE.to_string(),
                };
                page::show_error(self, JOB_FAILED_MESSAGE);
            }
            PollOutcome::TransportError(_) => {
                self.state.progress = ActionProgress::Failed {
                    reason: STATUS_ERROR_MESSAGE.to_string(),
                };
                page::show_error(self, STATUS_ERROR_MESSAGE);
            }
            PollOutcome::Exhausted => {
                let message = format!(
                    "Job {} is still running after {} status checks. Press Resume to keep checking.",
                    job_id, report.attempts
                );
                self.state.progress = ActionProgress::Cancelled { job_id };
                page::show_error(self, &message);
            }
            PollOutcome::Cancelled => {
                self.state.progress = ActionProgress::Cancelled { job_id };
            }
        }
    }

    fn finish_action(&mut self, action: ActionKind, outcome: MutationOutcome) {
        if outcome.is_success() {
            self.errors.dismiss();
        }
        match &outcome {
            MutationOutcome::Success(body) => {
                tracing::info!(action = action.label(), "Action succeeded");
                if action == ActionKind::LookupProduct && self.product_form.name.trim().is_empty() {
                    if let Some(name) = body.get("name").and_then(|n| n.as_str()) {
                        self.product_form.name = name.to_string();
                    }
                }
            }
            MutationOutcome::Error(message) => {
                page::show_error(self, &format!("{} failed: {}", action.label(), message));
            }
        }
        self.state.action_log.push(ActionRecord { action, outcome });
    }
}

enum ActionRequest {
    Product(api::NewProduct),
    Purchase(api::Purchase),
    Lookup(String),
    Group(String),
}

impl Page for ReceiptUploader {
    fn alert(&mut self, message: &str) {
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("Receipt Uploader")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn submit_button(&mut self) -> Option<&mut SubmitButton> {
        Some(&mut self.submit)
    }

    fn error_container(&mut self) -> Option<&mut ErrorContainer> {
        Some(&mut self.errors)
    }
}

impl App for ReceiptUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}

impl Drop for ReceiptUploader {
    fn drop(&mut self) {
        self.cancel_polling();
    }
}
