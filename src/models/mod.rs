pub mod document;
pub mod history;
pub mod loaders;
pub mod mime;

pub use document::{AnalysisResult, Document, RemoteFileHandle};
pub use history::ResultHistory;
pub use loaders::{load_all_manifests, load_manifest, read_document, read_documents, BatchManifest};
pub use mime::mime_for_filename;
