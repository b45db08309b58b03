/*!
 * Alignment of backend output against the lines of a chunk.
 *
 * The backend is asked to echo every numbered block, but in practice it drops,
 * duplicates, renumbers, merges and annotates blocks. The reconciler walks the
 * output blocks and the chunk's indices with two cursors and classifies every
 * step with a `BlockDecision`:
 *
 * | first line of block          | decision      | effect                                   |
 * |------------------------------|---------------|------------------------------------------|
 * | number equal to expected     | `Match`       | take block body, advance both cursors    |
 * | number below expected        | `Stray`       | drop block                               |
 * | number above expected        | `Gap`         | keep original text, advance line cursor  |
 * | instruction prefix           | `Instruction` | drop block                               |
 * | any other text               | `Unnumbered`  | take whole block, advance both cursors   |
 * | blank                        | `Empty`       | drop block                               |
 * | unparseable number / bad idx | `Malformed`   | fail every remaining line of the chunk   |
 *
 * Lines still expected once the output runs out are reported as failed.
 */

use std::collections::BTreeSet;

use crate::errors::TranslationError;
use super::chunking::Chunk;

/// Leading markers of model meta-commentary that must never be taken as a translation
pub const INSTRUCTION_PREFIXES: [&str; 4] = ["Важно:", "Инструкция:", "Note:", "Important:"];

/// Classification of one reconciliation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockDecision {
    /// Block number matches the expected line
    Match { index: usize },
    /// Block number lower than the expected line: a duplicate or stray block
    Stray { number: usize, expected: usize },
    /// Block number higher than the expected line: the backend skipped a line
    Gap { index: usize, number: usize },
    /// Meta-commentary block
    Instruction,
    /// Block without a leading number, taken verbatim for the expected line
    Unnumbered { index: usize },
    /// Blank block
    Empty,
    /// Block that cannot be interpreted; the rest of the chunk fails
    Malformed { index: usize, reason: String },
}

/// Result of reconciling one chunk
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Indices of the chunk that were not resolved and need another attempt
    pub failed: BTreeSet<usize>,

    /// Every step taken, in order
    pub decisions: Vec<BlockDecision>,

    /// Why the chunk did not fully resolve, if it did not
    pub issue: Option<TranslationError>,
}

impl ReconcileOutcome {
    /// Number of lines that received backend text
    pub fn translated_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, BlockDecision::Match { .. } | BlockDecision::Unnumbered { .. }))
            .count()
    }

    /// Number of lines the backend skipped and that kept their original text
    pub fn gap_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, BlockDecision::Gap { .. }))
            .count()
    }

    fn fail_from(&mut self, indices: &[usize]) {
        self.failed.extend(indices.iter().copied());
    }
}

/// Map backend output back onto the chunk's line slots.
///
/// `slots` is written for every resolved index (translated, or original text
/// for a skipped line) and left untouched for every index in the returned
/// failed set. `None` output means the backend produced nothing and the whole
/// chunk fails.
pub fn reconcile(
    chunk: &Chunk,
    backend_output: Option<&str>,
    slots: &mut [String],
    original_lines: &[String],
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let indices = chunk.indices();

    let Some(output) = backend_output else {
        outcome.fail_from(indices);
        outcome.issue = Some(TranslationError::BackendUnavailable {
            lines: indices.len(),
            reason: "no output".to_string(),
        });
        return outcome;
    };

    let normalized = output.replace("\r\n", "\n");
    let blocks: Vec<&str> = normalized.trim().split("\n\n").collect();

    let mut line_cursor = 0;
    let mut block_cursor = 0;

    while block_cursor < blocks.len() && line_cursor < indices.len() {
        let expected = indices[line_cursor];
        let block = blocks[block_cursor].trim();
        let decision = classify(block, expected);

        match &decision {
            BlockDecision::Empty | BlockDecision::Instruction | BlockDecision::Stray { .. } => {
                block_cursor += 1;
            }
            BlockDecision::Match { index } => {
                let body = block.lines().skip(1).collect::<Vec<_>>().join("\n");
                if !write_slot(slots, *index, body) {
                    return fail_out_of_range(outcome, indices, line_cursor, expected);
                }
                line_cursor += 1;
                block_cursor += 1;
            }
            BlockDecision::Unnumbered { index } => {
                if !write_slot(slots, *index, block.to_string()) {
                    return fail_out_of_range(outcome, indices, line_cursor, expected);
                }
                line_cursor += 1;
                block_cursor += 1;
            }
            BlockDecision::Gap { index, .. } => {
                let Some(original) = original_lines.get(*index) else {
                    return fail_out_of_range(outcome, indices, line_cursor, expected);
                };
                if !write_slot(slots, *index, original.clone()) {
                    return fail_out_of_range(outcome, indices, line_cursor, expected);
                }
                line_cursor += 1;
            }
            BlockDecision::Malformed { index, reason } => {
                outcome.issue = Some(TranslationError::Reconciliation {
                    index: *index,
                    reason: reason.clone(),
                });
                outcome.fail_from(&indices[line_cursor..]);
                outcome.decisions.push(decision);
                return outcome;
            }
        }

        outcome.decisions.push(decision);
    }

    if line_cursor < indices.len() {
        let tail = &indices[line_cursor..];
        outcome.issue = Some(TranslationError::AlignmentMismatch {
            first: tail[0],
            unresolved: tail.len(),
        });
        outcome.fail_from(tail);
    }

    outcome
}

/// Decide what a single trimmed block means for the expected line
pub fn classify(block: &str, expected: usize) -> BlockDecision {
    if block.is_empty() {
        return BlockDecision::Empty;
    }

    let first_line = block.lines().next().unwrap_or_default().trim();

    if first_line.is_empty() || !first_line.chars().all(|c| c.is_ascii_digit()) {
        if INSTRUCTION_PREFIXES.iter().any(|prefix| first_line.starts_with(prefix)) {
            return BlockDecision::Instruction;
        }
        return BlockDecision::Unnumbered { index: expected };
    }

    let number: usize = match first_line.parse() {
        Ok(number) => number,
        Err(e) => {
            return BlockDecision::Malformed {
                index: expected,
                reason: format!("block number '{}' is not usable: {}", first_line, e),
            };
        }
    };

    match number.checked_sub(1) {
        Some(translated) if translated == expected => BlockDecision::Match { index: expected },
        Some(translated) if translated > expected => BlockDecision::Gap { index: expected, number },
        _ => BlockDecision::Stray { number, expected },
    }
}

fn write_slot(slots: &mut [String], index: usize, text: String) -> bool {
    match slots.get_mut(index) {
        Some(slot) => {
            *slot = text;
            true
        }
        None => false,
    }
}

fn fail_out_of_range(
    mut outcome: ReconcileOutcome,
    indices: &[usize],
    line_cursor: usize,
    expected: usize,
) -> ReconcileOutcome {
    let reason = format!("line {} is outside the document", expected);
    outcome.decisions.push(BlockDecision::Malformed { index: expected, reason: reason.clone() });
    outcome.issue = Some(TranslationError::Reconciliation { index: expected, reason });
    outcome.fail_from(&indices[line_cursor..]);
    outcome
}
