use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::errors::Result;

/// Separator written after every word of a segmentation.
pub const WORD_DELIMITER: &str = " | ";

/// Reads one sentence per line from a UTF-8 text file.
///
/// Line terminators (`\n`, `\r`) are stripped; nothing else is trimmed.
/// Empty lines are skipped with a warning.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid UTF-8.
pub fn load_corpus(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut sentences = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let sentence = line.replace(['\n', '\r'], "");
        if sentence.is_empty() {
            warn!("skipping empty line {} in {}", i + 1, path.display());
            continue;
        }
        sentences.push(sentence);
    }

    Ok(sentences)
}

/// Renders a segmentation as `w1 | w2 | ... | wn | `.
pub fn format_segmentation<S: AsRef<str>>(words: &[S]) -> String {
    let mut line = String::new();
    for w in words {
        line.push_str(w.as_ref());
        line.push_str(WORD_DELIMITER);
    }
    line
}

/// Writes every segmentation on its own line, in the format of
/// [`format_segmentation`].
pub fn write_segmentations<W: Write, S: AsRef<str>>(
    writer: &mut W,
    segmentations: &[Vec<S>],
) -> Result<()> {
    for words in segmentations {
        writeln!(writer, "{}", format_segmentation(words))?;
    }
    Ok(())
}

/// Writes every segmentation to a file, see [`write_segmentations`].
pub fn save_segmentations<S: AsRef<str>>(path: &Path, segmentations: &[Vec<S>]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_segmentations(&mut writer, segmentations)?;
    writer.flush()?;
    Ok(())
}
