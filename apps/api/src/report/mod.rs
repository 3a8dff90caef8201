// Learning-path report export.
// Layout is computed up front; drawing is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod layout;
pub mod pdf;

pub use layout::ReportInput;
pub use pdf::render_learning_path_pdf_blocking;
