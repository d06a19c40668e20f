// Query pipeline and the seam to the store

pub mod operations;
pub mod pipeline;
pub mod traits;

// Re-export commonly used items
pub use operations::{DataTableEndpoint, execute, process, process_with};
pub use pipeline::{QueryContext, QueryOutput};
pub use traits::{DataView, Row};
