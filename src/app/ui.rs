use super::{ActionKind, ActionProgress, ReceiptUploader};
use crate::api::MutationOutcome;
use eframe::egui::{self, Align, Color32, RichText};
use rfd::FileDialog;

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const DANGER: Color32 = Color32::from_rgb(220, 50, 50);

impl ReceiptUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let total_height = ui.available_height();
            let footer_height = 40.0;
            let footer_margin = 15.0;
            let content_height = total_height - footer_height - footer_margin;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Receipt Uploader");
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new("Scan receipts and book them into Grocy")
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });

                    ui.add_space(20.0);
                    self.render_error_container(ui);
                    self.render_server(ui);
                    ui.add_space(20.0);
                    self.render_receipt_picker(ui, ctx);
                    ui.add_space(20.0);
                    self.render_progress(ui, ctx);

                    if matches!(self.state.progress, ActionProgress::Finished { .. }) {
                        ui.add_space(20.0);
                        self.render_result(ui);
                    }

                    ui.add_space(20.0);
                    self.render_product_form(ui, ctx);
                    ui.add_space(10.0);
                    self.render_purchase_form(ui, ctx);

                    if !self.state.action_log.is_empty() {
                        ui.add_space(10.0);
                        self.render_action_log(ui);
                    }

                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(footer_margin);
                self.render_footer(ui);
            });
        });
    }

    fn render_error_container(&mut self, ui: &mut egui::Ui) {
        if !self.errors.visible {
            return;
        }
        let Some(message) = self.errors.message.clone() else {
            return;
        };

        egui::Frame::none()
            .fill(DANGER.gamma_multiply(0.15))
            .stroke(egui::Stroke::new(1.0, DANGER))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(DANGER, message);
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                            self.errors.dismiss();
                        }
                    });
                });
            });
        ui.add_space(10.0);
    }

    fn render_server(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Server");
                ui.add_space(4.0);
                ui.label("ℹ").on_hover_text_at_pointer(
                    "Base URL of the receipt OCR web application.\n\
                    Defaults to RECEIPT_SERVER_URL from the environment.",
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.server_url)
                        .desired_width(ui.available_width())
                        .hint_text("http://localhost:8080"),
                );
            });
        });
    }

    fn render_receipt_picker(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.label("Accepted: JPEG, PNG, GIF or PDF, up to 10MB");
        ui.add_space(10.0);
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if ui.button("🧾 Select Receipt").clicked() {
                    if let Some(path) = FileDialog::new()
                        .add_filter("Receipts", &["jpg", "jpeg", "png", "gif", "pdf"])
                        .add_filter("All files", &["*"])
                        .pick_file()
                    {
                        self.select_receipt(&path);
                    }
                }
                if let Some(receipt) = self.receipt.first() {
                    ui.label(format!(
                        "Selected: {} ({})",
                        receipt.file_name,
                        receipt.display_size()
                    ));
                }
            });
        });

        ui.add_space(20.0);

        ui.vertical_centered(|ui| {
            let can_upload = !self.submit.disabled && !self.state.progress.is_busy();
            ui.add_enabled_ui(can_upload, |ui| {
                let button =
                    egui::Button::new("📤 Upload Receipt").min_size(egui::vec2(200.0, 40.0));
                if ui
                    .add(button)
                    .on_hover_text("Send the receipt for OCR processing")
                    .clicked()
                {
                    self.start_upload(ctx);
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label("Or track an existing job:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.job_id_input)
                        .desired_width(220.0)
                        .hint_text("job id"),
                );
                let can_track =
                    !self.job_id_input.trim().is_empty() && !self.state.progress.is_busy();
                if ui
                    .add_enabled(can_track, egui::Button::new("🔍 Track"))
                    .clicked()
                {
                    let job_id = self.job_id_input.trim().to_string();
                    self.start_polling(ctx, job_id);
                }
            });
        });
    }

    fn render_progress(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if matches!(self.state.progress, ActionProgress::NotStarted) {
            return;
        }

        ui.group(|ui| {
            ui.horizontal(|ui| {
                if self.state.progress.is_busy() {
                    ui.spinner();
                }
                ui.label(self.state.get_status_text());

                if matches!(self.state.progress, ActionProgress::Polling { .. })
                    && ui.button("⏹ Cancel").clicked()
                {
                    self.cancel_polling();
                }
                if let ActionProgress::Cancelled { job_id } = &self.state.progress {
                    let job_id = job_id.clone();
                    if ui.button("🔄 Resume").clicked() {
                        self.start_polling(ctx, job_id);
                    }
                }
            });
        });
    }

    fn render_result(&mut self, ui: &mut egui::Ui) {
        let ActionProgress::Finished { result, .. } = &self.state.progress else {
            return;
        };
        let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());

        ui.horizontal(|ui| {
            if ui
                .button(if self.state.show_result {
                    "Hide Result"
                } else {
                    "Show Result"
                })
                .clicked()
            {
                self.state.show_result = !self.state.show_result;
            }

            if let Some(job_id) = self.state.progress.job_id() {
                if ui
                    .button("🌐 Review in browser")
                    .on_hover_text("Open the server's review page for this job")
                    .clicked()
                {
                    let url = format!(
                        "{}/review/{}",
                        self.server_url.trim().trim_end_matches('/'),
                        job_id
                    );
                    if let Err(e) = open::that(&url) {
                        tracing::warn!(%url, error = %e, "Failed to open browser");
                    }
                }
            }
        });

        if self.state.show_result {
            egui::ScrollArea::vertical()
                .id_source("job_result")
                .max_height(200.0)
                .show(ui, |ui| {
                    egui::Frame::none()
                        .fill(ui.style().visuals.extreme_bg_color)
                        .inner_margin(8.0)
                        .show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::multiline(&mut pretty.as_str())
                                    .font(egui::TextStyle::Monospace)
                                    .desired_width(ui.available_width()),
                            );
                        });
                });
        }
    }

    fn render_product_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.collapsing("🛒 Product", |ui| {
            egui::Grid::new("product_form")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    let form = &mut self.product_form;
                    form_row(ui, "Name", &mut form.name, "Product name");
                    form_row(
                        ui,
                        "Existing product ID",
                        &mut form.product_id,
                        "Attach the barcode to this product instead of creating one",
                    );
                    form_row(ui, "Barcode", &mut form.barcode, "Barcode printed on the receipt");
                    form_row(ui, "Category ID", &mut form.category, "Grocy product group");
                    form_row(ui, "Location ID", &mut form.location, "Grocy storage location");
                    form_row(ui, "Purchase unit ID", &mut form.qu_id_purchase, "Quantity unit used when buying");
                    form_row(ui, "Stock unit ID", &mut form.qu_id_stock, "Quantity unit used in stock");
                    form_row(ui, "Store", &mut form.store, "Store the receipt came from");
                });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("➕ Create Product").clicked() {
                    self.run_action(ctx, ActionKind::CreateProduct);
                }
                if ui
                    .button("🔎 Lookup Barcode")
                    .on_hover_text("Ask the external product database about this barcode")
                    .clicked()
                {
                    self.run_action(ctx, ActionKind::LookupProduct);
                }
                if ui
                    .button("📋 Products in Category")
                    .on_hover_text("List the Grocy products in the category above")
                    .clicked()
                {
                    self.run_action(ctx, ActionKind::ListGroupProducts);
                }
            });
        });
    }

    fn render_purchase_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.collapsing("🧾 Purchase", |ui| {
            egui::Grid::new("purchase_form")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    let form = &mut self.purchase_form;
                    form_row(ui, "Product ID", &mut form.product_id, "Grocy product that was bought");
                    form_row(ui, "Amount", &mut form.amount, "Quantity bought");
                    form_row(ui, "Price", &mut form.price, "Price per unit");
                    form_row(ui, "Days until expiry", &mut form.days_out, "Best-before offset in days");
                    form_row(ui, "Store ID", &mut form.shopping_location_id, "Grocy shopping location");
                });

            ui.add_space(8.0);
            if ui.button("📥 Add Purchase").clicked() {
                self.run_action(ctx, ActionKind::AddPurchase);
            }
        });
    }

    fn render_action_log(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Activity").strong());
            if self.state.actions_in_flight > 0 {
                ui.spinner();
            }
            if ui.small_button("Clear").clicked() {
                self.state.action_log.clear();
            }
        });

        egui::ScrollArea::vertical()
            .id_source("action_log")
            .max_height(200.0)
            .show(ui, |ui| {
                egui::Frame::none()
                    .fill(ui.style().visuals.extreme_bg_color)
                    .show(ui, |ui| {
                        ui.add_space(8.0);
                        for record in self.state.action_log.iter().rev() {
                            ui.horizontal(|ui| match &record.outcome {
                                MutationOutcome::Success(_) => {
                                    ui.label("✅");
                                    ui.colored_label(SUCCESS, record.summary());
                                }
                                MutationOutcome::Error(_) => {
                                    ui.label("❌");
                                    ui.colored_label(DANGER, record.summary());
                                }
                            });
                            ui.add_space(4.0);
                        }
                        ui.add_space(8.0);
                    });
            });
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.horizontal_centered(|ui| {
            ui.label("Connected to");
            if ui
                .add(
                    egui::Label::new(RichText::new(self.server_url.trim()).color(ACCENT))
                        .sense(egui::Sense::click()),
                )
                .on_hover_text("Open the web interface")
                .clicked()
            {
                if let Err(e) = open::that(self.server_url.trim()) {
                    tracing::warn!(error = %e, "Failed to open browser");
                }
            }
        });
    }
}

fn form_row(ui: &mut egui::Ui, label: &str, value: &mut String, tooltip: &str) {
    ui.label(label).on_hover_text(tooltip);
    ui.text_edit_singleline(value);
    ui.end_row();
}
