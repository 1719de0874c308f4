//! TUI widgets module.
//!
//! This module contains the widgets the operator shell is built from.

pub mod form;
pub mod log_view;
pub mod progress_gauge;
pub mod prompt_modal;

pub use form::LaunchForm;
pub use log_view::LogKind;
pub use log_view::LogView;
pub use prompt_modal::ModalAction;
pub use prompt_modal::PromptModal;
