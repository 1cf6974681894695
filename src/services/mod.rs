pub mod chat_service;
pub mod file_store;
pub mod llm_service;
pub mod ports;
pub mod report_writer;

pub use chat_service::ChatCompletionService;
pub use file_store::GeminiFileStore;
pub use llm_service::GeminiExtractionService;
pub use ports::{DocumentStore, ExtractionService};
pub use report_writer::ReportWriter;
