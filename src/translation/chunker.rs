/*!
 * Splitting transcripts into service-sized chunks.
 *
 * The translation endpoints reject requests above a few thousand characters,
 * so a document is cut into ordered chunks of at most `max_len` characters
 * (Unicode scalar values, not bytes).
 *
 * Two packing policies exist and are kept separate:
 * - `Lines` (default): packs whole lines; a single line longer than the limit
 *   is hard-split into fixed-width slices, mid-word if need be.
 * - `Words`: packs whitespace-separated words joined by single spaces.
 */

use serde::{Deserialize, Serialize};

/// Separator used when packing lines back into a chunk
const LINE_SEPARATOR: char = '\n';

/// How text is packed into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPolicy {
    /// Pack whole lines, hard-splitting oversized ones
    #[default]
    Lines,
    /// Pack words separated by single spaces
    Words,
}

/// One unit of translation work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within its document
    pub index: usize,
    /// Text payload, at most `max_len` characters
    pub text: String,
}

impl Chunk {
    /// Whether the chunk has nothing worth sending to a service
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text according to a policy and a size limit
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    policy: ChunkPolicy,
    max_len: usize,
}

impl Chunker {
    pub fn new(policy: ChunkPolicy, max_len: usize) -> Self {
        Self {
            policy,
            max_len: max_len.max(1),
        }
    }

    /// Split a document into indexed chunks
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let pieces = match self.policy {
            ChunkPolicy::Lines => split(text, self.max_len),
            ChunkPolicy::Words => split_words(text, self.max_len),
        };

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }
}

/// Split text on line boundaries into chunks of at most `max_len` characters.
///
/// When no line exceeds the limit, joining the chunks with `'\n'` gives back
/// the input. Empty input yields no chunks.
pub fn split(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();

    if text.is_empty() {
        return chunks;
    }

    let mut buffer = String::new();
    let mut buffer_len = 0usize;
    let mut buffer_has_lines = false;

    for line in text.split(LINE_SEPARATOR) {
        let line_len = line.chars().count();

        if line_len > max_len {
            if buffer_has_lines {
                chunks.push(std::mem::take(&mut buffer));
                buffer_len = 0;
                buffer_has_lines = false;
            }
            chunks.extend(hard_split(line, max_len));
            continue;
        }

        let separator_len = usize::from(buffer_has_lines);
        if buffer_len + separator_len + line_len <= max_len {
            if buffer_has_lines {
                buffer.push(LINE_SEPARATOR);
            }
            buffer.push_str(line);
            buffer_len += separator_len + line_len;
            buffer_has_lines = true;
        } else {
            chunks.push(std::mem::replace(&mut buffer, line.to_string()));
            buffer_len = line_len;
            buffer_has_lines = true;
        }
    }

    if buffer_has_lines {
        chunks.push(buffer);
    }

    chunks
}

/// Pack whitespace-separated words into chunks of at most `max_len` characters.
///
/// Original whitespace is collapsed to single spaces. A word longer than the
/// limit is hard-split like an oversized line.
pub fn split_words(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_len {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(hard_split(word, max_len));
            continue;
        }

        let separator_len = usize::from(current_len > 0);
        if current_len + separator_len + word_len <= max_len {
            if current_len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            current_len += separator_len + word_len;
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if current_len > 0 {
        chunks.push(current);
    }

    chunks
}

/// Cut a string into consecutive slices of `max_len` characters
fn hard_split(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_len)
        .map(|slice| slice.iter().collect())
        .collect()
}
