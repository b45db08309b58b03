/*!
 * Chunked subtitle translation engine.
 *
 * This module contains the logic that turns an ordered list of subtitle line
 * texts into translated texts of the same length. It is split into several
 * submodules:
 *
 * - `chunking`: Byte-bounded chunks with overlap, and tail chunks around failures
 * - `reconcile`: Realignment of backend output onto line indices
 * - `orchestrator`: Initial pass and retry rounds over failed lines
 * - `observer`: Event sink for diagnostics
 * - `prompts`: Translation prompt shared by every provider
 * - `core`: Backend capability and the provider-backed translation service
 */

// Re-export main types for easier usage
pub use self::chunking::{build_chunks, build_tail_chunks, Chunk};
pub use self::core::{TranslationBackend, TranslationService};
pub use self::observer::{CapturingObserver, LogObserver, NullObserver, TranslationObserver};
pub use self::orchestrator::{
    translate_lines, OrchestratorSettings, Pacing, RetryOrchestrator, TranslationOutcome,
};
pub use self::reconcile::{reconcile, BlockDecision, ReconcileOutcome};

// Submodules
pub mod chunking;
pub mod core;
pub mod observer;
pub mod orchestrator;
pub mod prompts;
pub mod reconcile;
