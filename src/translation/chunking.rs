/*!
 * Chunk building for backend requests.
 *
 * Subtitle lines are serialized as numbered blocks (`"{index + 1}\n{text}"`)
 * separated by blank lines and packed into byte-bounded chunks:
 *
 * - `build_chunks` covers an arbitrary index set, carrying `overlap` lines of
 *   context from each closed chunk into the next one.
 * - `build_tail_chunks` groups failed indices into clusters and re-sends only
 *   the neighborhood of each cluster, with `overlap` lines of leading context.
 */

use std::collections::BTreeSet;

/// Bytes added per block for the blank-line separator
const SEPARATOR_BYTES: usize = 2;

/// An ordered group of subtitle lines submitted as one backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based line indices, ascending and unique
    indices: Vec<usize>,

    /// Serialized numbered blocks joined by blank lines
    content: String,
}

impl Chunk {
    /// Serialize the given lines into a chunk.
    ///
    /// Indices must be ascending and within `lines`.
    pub fn from_indices(indices: Vec<usize>, lines: &[String]) -> Self {
        let content = indices
            .iter()
            .map(|&idx| numbered_block(idx, &lines[idx]))
            .collect::<Vec<_>>()
            .join("\n\n");

        Self { indices, content }
    }

    /// Line indices covered by this chunk
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Request payload
    pub fn content(&self) -> &str {
        &self.content
    }

    /// UTF-8 byte size of the payload
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// First and last covered index, for diagnostics
    pub fn span(&self) -> Option<(usize, usize)> {
        match (self.indices.first(), self.indices.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }
}

fn numbered_block(idx: usize, text: &str) -> String {
    format!("{}\n{}", idx + 1, text)
}

fn block_cost(idx: usize, lines: &[String]) -> usize {
    numbered_block(idx, &lines[idx]).len() + SEPARATOR_BYTES
}

/// Partition `indices` into byte-bounded chunks with `overlap` lines of carry-over.
///
/// A `max_bytes` of zero disables splitting and yields a single chunk. A line
/// larger than `max_bytes` on its own still gets a chunk of its own. Indices
/// outside `lines` are ignored.
pub fn build_chunks(
    indices: &BTreeSet<usize>,
    lines: &[String],
    max_bytes: usize,
    overlap: usize,
) -> Vec<Chunk> {
    let ordered: Vec<usize> = indices.iter().copied().filter(|&idx| idx < lines.len()).collect();
    pack(ordered, lines, max_bytes, overlap)
}

/// Build re-translation chunks around previously failed indices.
///
/// Failures closer than or exactly `overlap` apart share a cluster. Each cluster
/// `[start, end]` is re-sent as the range `[start - overlap, end]` (clamped at
/// zero), split by `max_bytes` without any further carry-over.
pub fn build_tail_chunks(
    failed: &BTreeSet<usize>,
    lines: &[String],
    max_bytes: usize,
    overlap: usize,
) -> Vec<Chunk> {
    failure_clusters(failed, overlap)
        .into_iter()
        .flat_map(|(start_fail, end_fail)| {
            let coverage_start = start_fail.saturating_sub(overlap);
            let coverage: Vec<usize> = (coverage_start..=end_fail)
                .filter(|&idx| idx < lines.len())
                .collect();
            pack(coverage, lines, max_bytes, 0)
        })
        .collect()
}

/// Group sorted failures into inclusive `(start, end)` clusters.
///
/// A new cluster starts whenever the gap to the previous failure exceeds `overlap`.
pub fn failure_clusters(failed: &BTreeSet<usize>, overlap: usize) -> Vec<(usize, usize)> {
    let mut clusters = Vec::new();
    let mut iter = failed.iter().copied();

    let Some(first) = iter.next() else {
        return clusters;
    };

    let (mut start, mut end) = (first, first);
    for idx in iter {
        if idx - end <= overlap {
            end = idx;
        } else {
            clusters.push((start, end));
            start = idx;
            end = idx;
        }
    }
    clusters.push((start, end));

    clusters
}

fn pack(ordered: Vec<usize>, lines: &[String], max_bytes: usize, overlap: usize) -> Vec<Chunk> {
    if ordered.is_empty() {
        return Vec::new();
    }

    if max_bytes == 0 {
        return vec![Chunk::from_indices(ordered, lines)];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_size = 0;

    for idx in ordered {
        let cost = block_cost(idx, lines);

        if !current.is_empty() && current_size + cost > max_bytes {
            let closed = std::mem::take(&mut current);
            current = carry_over(&closed, lines, overlap, max_bytes.saturating_sub(cost));
            current_size = current.iter().map(|&i| block_cost(i, lines)).sum();
            chunks.push(Chunk::from_indices(closed, lines));
        }

        current.push(idx);
        current_size += cost;
    }

    if !current.is_empty() {
        chunks.push(Chunk::from_indices(current, lines));
    }

    chunks
}

/// Last `overlap` indices of a closed chunk, dropping leading lines until the
/// carried context fits in `budget` bytes.
fn carry_over(closed: &[usize], lines: &[String], overlap: usize, budget: usize) -> Vec<usize> {
    let keep = overlap.min(closed.len());
    let mut carried = &closed[closed.len() - keep..];
    let mut size: usize = carried.iter().map(|&i| block_cost(i, lines)).sum();

    while size > budget {
        let Some((&dropped, rest)) = carried.split_first() else {
            break;
        };
        size -= block_cost(dropped, lines);
        carried = rest;
    }

    carried.to_vec()
}
