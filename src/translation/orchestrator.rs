/*!
 * Retry orchestration of chunked translation.
 *
 * A run has two phases. The initial phase chunks every line, sends each chunk
 * to the backend and reconciles the output. The retry phase then re-sends only
 * the neighborhood of lines that failed, round after round, until nothing is
 * left or the retry budget is spent. Lines still failed at the end keep their
 * original text.
 *
 * Chunks are sent one at a time. The result slots are owned by the run and only
 * written by the reconciler.
 */

use rand::Rng;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::app_config::TranslationCommonConfig;
use crate::errors::TranslationError;
use super::chunking::{build_chunks, build_tail_chunks, Chunk};
use super::core::TranslationBackend;
use super::observer::{events, TranslationObserver};
use super::reconcile::{reconcile, BlockDecision, ReconcileOutcome};

/// Delays between consecutive backend calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    /// Fixed delay between calls of a retry round
    pub base_delay: Duration,
    /// Upper bound of the random extra delay in the initial phase
    pub jitter: Duration,
}

impl Pacing {
    /// No delays at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_millis(base_delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            base_delay: Duration::from_millis(base_delay_ms),
            jitter: Duration::from_millis(jitter_ms),
        }
    }

    /// Delay before a call of the initial phase: twice the base plus random jitter
    pub fn initial_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms > 0 {
            rand::rng().random_range(0..=jitter_ms)
        } else {
            0
        };
        self.base_delay * 2 + Duration::from_millis(extra)
    }

    /// Delay before a call of a retry round
    pub fn retry_delay(&self) -> Duration {
        self.base_delay
    }
}

/// Tunables of one orchestrated run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Maximum chunk payload in bytes, 0 for a single chunk
    pub max_bytes: usize,
    /// Lines of context carried between chunks and prepended to failure clusters
    pub overlap: usize,
    /// Number of retry rounds after the initial phase
    pub max_retries: u32,
    pub pacing: Pacing,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_bytes: 0,
            overlap: 10,
            max_retries: 10,
            pacing: Pacing::none(),
        }
    }
}

impl From<&TranslationCommonConfig> for OrchestratorSettings {
    fn from(common: &TranslationCommonConfig) -> Self {
        Self {
            max_bytes: common.chunk_size,
            overlap: common.overlap,
            max_retries: common.max_retries,
            pacing: Pacing::from_millis(common.base_delay_ms, common.jitter_ms),
        }
    }
}

/// Result of translating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Final text of every line, same length as the input
    pub texts: Vec<String>,
    /// Lines that fell back to their original text
    pub untranslated: BTreeSet<usize>,
    /// Backend rounds performed, the initial phase included
    pub rounds: usize,
    /// Total number of backend calls
    pub backend_calls: usize,
}

impl TranslationOutcome {
    /// Whether every line was resolved by the backend
    pub fn is_complete(&self) -> bool {
        self.untranslated.is_empty()
    }

    /// Degradation report, if any line fell back to its original text
    pub fn exhaustion(&self) -> Option<TranslationError> {
        if self.is_complete() {
            None
        } else {
            Some(TranslationError::RetryExhausted {
                untranslated: self.untranslated.len(),
                rounds: self.rounds,
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Initial,
    Retry,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Initial => "initial",
            Phase::Retry => "retry",
        }
    }
}

/// Drives a backend over all lines of a document
pub struct RetryOrchestrator<'a> {
    backend: &'a dyn TranslationBackend,
    observer: &'a dyn TranslationObserver,
    settings: OrchestratorSettings,
}

/// Mutable state of a single run
struct RunState {
    slots: Vec<String>,
    backend_calls: usize,
}

impl<'a> RetryOrchestrator<'a> {
    pub fn new(
        backend: &'a dyn TranslationBackend,
        observer: &'a dyn TranslationObserver,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            backend,
            observer,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Translate `lines`, never failing: unresolved lines keep their original text
    pub async fn run(&self, lines: &[String]) -> TranslationOutcome {
        let mut state = RunState {
            slots: lines.to_vec(),
            backend_calls: 0,
        };

        if lines.is_empty() {
            return TranslationOutcome {
                texts: state.slots,
                untranslated: BTreeSet::new(),
                rounds: 0,
                backend_calls: 0,
            };
        }

        let all: BTreeSet<usize> = (0..lines.len()).collect();
        let chunks = build_chunks(&all, lines, self.settings.max_bytes, self.settings.overlap);
        let mut failed = self.run_round(Phase::Initial, 0, &chunks, lines, &mut state).await;
        let mut rounds = 1;

        let mut attempt = 1;
        while attempt <= self.settings.max_retries && !failed.is_empty() {
            let chunks = build_tail_chunks(&failed, lines, self.settings.max_bytes, self.settings.overlap);
            failed = self.run_round(Phase::Retry, attempt, &chunks, lines, &mut state).await;
            rounds += 1;
            attempt += 1;
        }

        for &idx in &failed {
            state.slots[idx] = lines[idx].clone();
        }

        if !failed.is_empty() {
            self.observer.record(events::RETRIES_EXHAUSTED, &[
                ("untranslated", failed.len().to_string()),
                ("rounds", rounds.to_string()),
                ("first", failed.iter().next().map(|i| i.to_string()).unwrap_or_default()),
            ]);
        }

        self.observer.record(events::TRANSLATION_FINISHED, &[
            ("lines", lines.len().to_string()),
            ("untranslated", failed.len().to_string()),
            ("rounds", rounds.to_string()),
            ("backend_calls", state.backend_calls.to_string()),
        ]);

        TranslationOutcome {
            texts: state.slots,
            untranslated: failed,
            rounds,
            backend_calls: state.backend_calls,
        }
    }

    /// Send every chunk of one round and return the union of failed indices
    async fn run_round(
        &self,
        phase: Phase,
        round: u32,
        chunks: &[Chunk],
        lines: &[String],
        state: &mut RunState,
    ) -> BTreeSet<usize> {
        let line_count: usize = chunks.iter().map(Chunk::len).sum();
        self.observer.record(events::PHASE_STARTED, &[
            ("phase", phase.name().to_string()),
            ("round", round.to_string()),
            ("chunks", chunks.len().to_string()),
            ("lines", line_count.to_string()),
        ]);

        let mut failed = BTreeSet::new();
        for (position, chunk) in chunks.iter().enumerate() {
            if position > 0 {
                let delay = match phase {
                    Phase::Initial => self.settings.pacing.initial_delay(),
                    Phase::Retry => self.settings.pacing.retry_delay(),
                };
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            let outcome = self.translate_chunk(round, position, chunk, lines, state).await;
            failed.extend(outcome.failed.iter().copied());
        }

        self.observer.record(events::ROUND_FINISHED, &[
            ("phase", phase.name().to_string()),
            ("round", round.to_string()),
            ("failed", failed.len().to_string()),
        ]);
        failed
    }

    async fn translate_chunk(
        &self,
        round: u32,
        position: usize,
        chunk: &Chunk,
        lines: &[String],
        state: &mut RunState,
    ) -> ReconcileOutcome {
        let span = chunk
            .span()
            .map(|(first, last)| format!("{}-{}", first, last))
            .unwrap_or_default();
        self.observer.record(events::CHUNK_SENT, &[
            ("round", round.to_string()),
            ("chunk", position.to_string()),
            ("lines", chunk.len().to_string()),
            ("bytes", chunk.size().to_string()),
            ("span", span),
        ]);

        state.backend_calls += 1;
        let output = match self.backend.translate(chunk.content()).await {
            Ok(text) => Some(text),
            Err(e) => {
                self.observer.record(events::BACKEND_UNAVAILABLE, &[
                    ("round", round.to_string()),
                    ("chunk", position.to_string()),
                    ("lines", chunk.len().to_string()),
                    ("reason", e.to_string()),
                ]);
                None
            }
        };

        let outcome = reconcile(chunk, output.as_deref(), &mut state.slots, lines);
        self.report(&outcome);

        self.observer.record(events::CHUNK_RECONCILED, &[
            ("round", round.to_string()),
            ("chunk", position.to_string()),
            ("translated", outcome.translated_count().to_string()),
            ("gaps", outcome.gap_count().to_string()),
            ("failed", outcome.failed.len().to_string()),
        ]);
        outcome
    }

    /// Forward every noteworthy reconciliation step to the observer
    fn report(&self, outcome: &ReconcileOutcome) {
        for decision in &outcome.decisions {
            match decision {
                BlockDecision::Stray { number, expected } => self.observer.record(events::STRAY_BLOCK, &[
                    ("number", number.to_string()),
                    ("index", expected.to_string()),
                ]),
                BlockDecision::Gap { index, number } => self.observer.record(events::SKIPPED_LINE, &[
                    ("index", index.to_string()),
                    ("number", number.to_string()),
                ]),
                BlockDecision::Instruction => self.observer.record(events::INSTRUCTION_BLOCK, &[]),
                BlockDecision::Unnumbered { index } => {
                    self.observer.record(events::UNNUMBERED_BLOCK, &[("index", index.to_string())])
                }
                BlockDecision::Malformed { index, reason } => self.observer.record(events::MALFORMED_BLOCK, &[
                    ("index", index.to_string()),
                    ("reason", reason.clone()),
                ]),
                BlockDecision::Match { .. } | BlockDecision::Empty => {}
            }
        }

        if let Some(TranslationError::AlignmentMismatch { first, unresolved }) = &outcome.issue {
            self.observer.record(events::OUTPUT_TRUNCATED, &[
                ("first", first.to_string()),
                ("unresolved", unresolved.to_string()),
            ]);
        }
    }
}

/// Translate `lines` with `backend`, reporting through `observer`
pub async fn translate_lines(
    backend: &dyn TranslationBackend,
    observer: &dyn TranslationObserver,
    settings: OrchestratorSettings,
    lines: &[String],
) -> TranslationOutcome {
    RetryOrchestrator::new(backend, observer, settings).run(lines).await
}
