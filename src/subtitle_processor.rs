use std::fmt;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use log::{debug, warn};

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: Subtitle parsing and rendering

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{1,2}:\d{2}:\d{2}[,.]\d{3}").unwrap()
});

// @const: Blank line between SRT blocks, tolerating trailing whitespace
static BLOCK_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*\n").unwrap()
});

// @const: Number of comma separated fields of an ASS event line
const ASS_EVENT_FIELDS: usize = 10;

// @enum: Supported subtitle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Ass,
}

impl SubtitleFormat {
    // @param path: Subtitle file path
    // @returns: Format matching the file extension, case-insensitive
    pub fn from_path(path: &Path) -> Result<Self, SubtitleError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "srt" => Ok(Self::Srt),
            "ass" => Ok(Self::Ass),
            _ => Err(SubtitleError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
        }
    }

    // @returns: True when the path has a supported subtitle extension
    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

// @struct: Single SRT entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtEntry {
    // @field: Timecode line, kept verbatim
    pub timecode: String,

    // @field: Subtitle text, possibly multi-line
    pub text: String,
}

// @enum: One physical line of an ASS script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssLine {
    // @variant: Header, style, format, comment or unparsable line
    Verbatim(String),

    // @variant: Dialogue event split before its Text field
    Dialogue {
        // @field: Everything up to and including the comma before Text
        prefix: String,
        // @field: Text field
        text: String,
    },
}

/// Parsed subtitle document exposing its texts as an ordered line list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleDocument {
    Srt(Vec<SrtEntry>),
    Ass(Vec<AssLine>),
}

impl SubtitleDocument {
    /// Parse subtitle content of the given format
    pub fn parse(content: &str, format: SubtitleFormat) -> Self {
        let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        match format {
            SubtitleFormat::Srt => Self::Srt(parse_srt(&content)),
            SubtitleFormat::Ass => Self::Ass(parse_ass(&content)),
        }
    }

    /// Read and parse a subtitle file, picking the format from its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)?;
        let content = FileManager::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        let document = Self::parse(&content, format);
        debug!("Parsed {} {} lines from {}", document.len(), format, path.display());
        Ok(document)
    }

    pub fn format(&self) -> SubtitleFormat {
        match self {
            Self::Srt(_) => SubtitleFormat::Srt,
            Self::Ass(_) => SubtitleFormat::Ass,
        }
    }

    /// Translatable texts in document order
    pub fn texts(&self) -> Vec<String> {
        match self {
            Self::Srt(entries) => entries.iter().map(|e| e.text.clone()).collect(),
            Self::Ass(lines) => lines
                .iter()
                .filter_map(|line| match line {
                    AssLine::Dialogue { text, .. } => Some(text.clone()),
                    AssLine::Verbatim(_) => None,
                })
                .collect(),
        }
    }

    /// Number of translatable lines
    pub fn len(&self) -> usize {
        match self {
            Self::Srt(entries) => entries.len(),
            Self::Ass(lines) => lines
                .iter()
                .filter(|line| matches!(line, AssLine::Dialogue { .. }))
                .count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the document with `texts` in place of the original texts.
    ///
    /// Everything else (timecodes, headers, styles) is written unchanged.
    pub fn render(&self, texts: &[String]) -> Result<String, SubtitleError> {
        if texts.len() != self.len() {
            return Err(SubtitleError::LineCountMismatch {
                expected: self.len(),
                actual: texts.len(),
            });
        }

        let rendered = match self {
            Self::Srt(entries) => entries
                .iter()
                .zip(texts)
                .enumerate()
                .map(|(i, (entry, text))| format!("{}\n{}\n{}\n\n", i + 1, entry.timecode, text))
                .collect::<String>(),
            Self::Ass(lines) => {
                let mut texts = texts.iter();
                lines
                    .iter()
                    .map(|line| match line {
                        AssLine::Verbatim(raw) => raw.clone(),
                        AssLine::Dialogue { prefix, text } => {
                            let text = texts.next().unwrap_or(text);
                            // Event text is single-line; hard breaks are written as \N
                            format!("{}{}", prefix, text.replace('\n', "\\N"))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };

        Ok(rendered)
    }
}

// @param content: LF-normalized SRT content
// @returns: Entries of blocks with at least a sequence, timecode and text line
fn parse_srt(content: &str) -> Vec<SrtEntry> {
    BLOCK_SEPARATOR_REGEX
        .split(content)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .filter_map(|block| {
            let lines: Vec<&str> = block.split('\n').collect();
            if lines.len() < 3 {
                warn!("Skipping incomplete SRT block: {:?}", block);
                return None;
            }
            if !TIMESTAMP_REGEX.is_match(lines[1].trim()) {
                warn!("Unexpected SRT timecode line kept as is: {:?}", lines[1]);
            }
            Some(SrtEntry {
                timecode: lines[1].to_string(),
                text: lines[2..].join("\n").trim_end().to_string(),
            })
        })
        .collect()
}

// @param content: LF-normalized ASS content
// @returns: Every line in order, Dialogue events of the [Events] section split out
fn parse_ass(content: &str) -> Vec<AssLine> {
    let mut in_events = false;

    content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('[') {
                in_events = trimmed.eq_ignore_ascii_case("[events]");
                return AssLine::Verbatim(line.to_string());
            }
            if in_events && trimmed.to_lowercase().starts_with("dialogue:") {
                if let Some((prefix, text)) = split_dialogue(line) {
                    return AssLine::Dialogue { prefix, text };
                }
                warn!("Dialogue line with fewer than {} fields kept as is: {:?}", ASS_EVENT_FIELDS, line);
            }
            AssLine::Verbatim(line.to_string())
        })
        .collect()
}

// @param line: A `Dialogue:` line
// @returns: (prefix up to Text, Text) if the line has all ten fields
fn split_dialogue(line: &str) -> Option<(String, String)> {
    let colon = line.find(':')?;
    let mut commas = line[colon + 1..]
        .match_indices(',')
        .map(|(offset, _)| colon + 1 + offset);

    let text_start = commas.nth(ASS_EVENT_FIELDS - 2)? + 1;
    Some((line[..text_start].to_string(), line[text_start..].to_string()))
}
