//! Reusable widget components.

pub mod detail;
pub mod dialog;

pub use detail::DetailPanel;
pub use dialog::Dialog;
