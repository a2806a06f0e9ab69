use crate::metadata::ChunkMetadata;

/// How content gets split: fixed line windows, or a byte budget per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    Lines(usize),
    Bytes(usize),
}

/// Whether content exceeds the threshold for its mode. Sub-threshold files
/// are rendered as a single implicit chunk and keep `chunks` empty.
pub fn should_chunk(content: &str, mode: ChunkMode) -> bool {
    match mode {
        ChunkMode::Lines(0) | ChunkMode::Bytes(0) => false,
        ChunkMode::Lines(n) => content.lines().count() > n,
        ChunkMode::Bytes(budget) => content.len() > budget,
    }
}

/// Split content into contiguous, non-overlapping line windows covering the
/// whole file. Start/end line numbers are 1-based and refer to the original
/// (pre-trim) line positions.
pub fn split_into_chunks(content: &str, mode: ChunkMode) -> Vec<ChunkMetadata> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    match mode {
        ChunkMode::Lines(0) | ChunkMode::Bytes(0) => {}
        ChunkMode::Lines(window) => {
            for (i, group) in lines.chunks(window).enumerate() {
                let start_line = i * window + 1;
                let end_line = start_line + group.len() - 1;
                chunks.push(make_chunk(group, start_line, end_line));
            }
        }
        ChunkMode::Bytes(budget) => {
            let mut current: Vec<&str> = Vec::new();
            let mut current_bytes = 0usize;
            let mut start_line = 1usize;
            for (idx, line) in lines.iter().enumerate() {
                let line_bytes = line.len() + 1; // +1 for the newline
                // Flush before overrunning the budget; a chunk may exceed it
                // by one line rather than ever being empty.
                if !current.is_empty() && current_bytes + line_bytes > budget {
                    let end_line = start_line + current.len() - 1;
                    chunks.push(make_chunk(&current, start_line, end_line));
                    start_line = idx + 1;
                    current.clear();
                    current_bytes = 0;
                }
                current.push(line);
                current_bytes += line_bytes;
            }
            if !current.is_empty() {
                let end_line = start_line + current.len() - 1;
                chunks.push(make_chunk(&current, start_line, end_line));
            }
        }
    }
    log::trace!("Split content into {} chunks", chunks.len());
    chunks
}

fn make_chunk(lines: &[&str], start_line: usize, end_line: usize) -> ChunkMetadata {
    ChunkMetadata {
        start_line,
        end_line,
        content: lines.join("\n"),
        summary: format!("Lines {}-{}", start_line, end_line),
    }
}
