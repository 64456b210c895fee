//! The parts of the window the client logic is allowed to touch.
//!
//! Validation and error reporting talk to a [`Page`] rather than to egui
//! directly, so the same code drives the real window and test doubles.

/// Submit control of the upload form.
#[derive(Debug, Clone)]
pub struct SubmitButton {
    pub disabled: bool,
}

impl Default for SubmitButton {
    fn default() -> Self {
        Self { disabled: true }
    }
}

/// Area reserved for error messages.
#[derive(Debug, Clone, Default)]
pub struct ErrorContainer {
    pub message: Option<String>,
    pub visible: bool,
}

impl ErrorContainer {
    /// Replace whatever was shown with `message` and reveal the container.
    pub fn show_alert(&mut self, message: &str) {
        self.message = Some(message.to_string());
        self.visible = true;
    }

    pub fn dismiss(&mut self) {
        self.message = None;
        self.visible = false;
    }
}

pub trait Page {
    /// Blocking, modal notice.
    fn alert(&mut self, message: &str);

    fn submit_button(&mut self) -> Option<&mut SubmitButton>;

    fn error_container(&mut self) -> Option<&mut ErrorContainer>;
}

/// Show `message` in the page's error container, or alert when the page
/// has none.
pub fn show_error(page: &mut dyn Page, message: &str) {
    tracing::debug!(%message, "Showing error");
    match page.error_container() {
        Some(container) => container.show_alert(message),
        None => page.alert(message),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Page double that records alerts instead of showing them.
    #[derive(Debug, Default)]
    pub struct RecordingPage {
        pub alerts: Vec<String>,
        pub submit: Option<SubmitButton>,
        pub errors: Option<ErrorContainer>,
    }

    impl RecordingPage {
        pub fn with_submit_button() -> Self {
            Self {
                submit: Some(SubmitButton::default()),
                ..Default::default()
            }
        }

        pub fn with_error_container() -> Self {
            Self {
                errors: Some(ErrorContainer::default()),
                ..Default::default()
            }
        }
    }

    impl Page for RecordingPage {
        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn submit_button(&mut self) -> Option<&mut SubmitButton> {
            self.submit.as_mut()
        }

        fn error_container(&mut self) -> Option<&mut ErrorContainer> {
            self.errors.as_mut()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingPage;
    use super::*;

    #[test]
    fn error_goes_into_container() {
        let mut page = RecordingPage::with_error_container();

        show_error(&mut page, "Error processing receipt. Please try again.");

        let container = page.errors.as_ref().unwrap();
        assert!(container.visible);
        assert_eq!(
            container.message.as_deref(),
            Some("Error processing receipt. Please try again.")
        );
        assert!(page.alerts.is_empty());
    }

    #[test]
    fn later_error_replaces_earlier() {
        let mut page = RecordingPage::with_error_container();

        show_error(&mut page, "first");
        show_error(&mut page, "second");

        assert_eq!(page.errors.unwrap().message.as_deref(), Some("second"));
    }

    #[test]
    fn without_container_falls_back_to_alert() {
        let mut page = RecordingPage::default();

        show_error(&mut page, "Error checking status. Please refresh the page.");

        assert_eq!(page.alerts, vec!["Error checking status. Please refresh the page."]);
    }
}
