//! Transcription evaluation: error rates and the outcome log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Word-level Levenshtein edit distance.
fn word_edit_distance(reference: &[&str], hypothesis: &[&str]) -> usize {
    let n = reference.len();
    let m = hypothesis.len();

    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        dp[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(reference[i - 1] != hypothesis[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1) // deletion
                .min(dp[i][j - 1] + 1) // insertion
                .min(dp[i - 1][j - 1] + cost); // substitution
        }
    }

    dp[n][m]
}

/// Compute the word error rate between a reference and a hypothesis.
///
/// WER = (substitutions + deletions + insertions) / reference length.
/// Returns 0.0 for identical transcripts and can exceed 1.0 when the
/// hypothesis is much longer than the reference. Over phone transcripts
/// (whitespace-separated phone symbols) the same computation is the phone
/// error rate.
///
/// An empty reference scores 1.0 against a non-empty hypothesis and 0.0
/// against an empty one, keeping batch aggregates finite.
pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let ref_words: Vec<&str> = reference.split_whitespace().collect();
    let hyp_words: Vec<&str> = hypothesis.split_whitespace().collect();

    if ref_words.is_empty() {
        return if hyp_words.is_empty() { 0.0 } else { 1.0 };
    }

    word_edit_distance(&ref_words, &hyp_words) as f64 / ref_words.len() as f64
}

/// Corpus-level error rate over (reference, hypothesis) pairs: total edit
/// operations divided by total reference words.
///
/// This is the batch metric logged as `{task}/wer`. Pairs with an empty
/// reference contribute their hypothesis length as pure insertions.
pub fn corpus_error_rate<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> f64 {
    let mut total_edits = 0usize;
    let mut total_ref_words = 0usize;

    for (reference, hypothesis) in pairs {
        let ref_words: Vec<&str> = reference.split_whitespace().collect();
        let hyp_words: Vec<&str> = hypothesis.split_whitespace().collect();
        total_edits += word_edit_distance(&ref_words, &hyp_words);
        total_ref_words += ref_words.len();
    }

    if total_ref_words == 0 {
        return if total_edits == 0 { 0.0 } else { 1.0 };
    }
    total_edits as f64 / total_ref_words as f64
}

/// Append-only evaluation transcript.
///
/// Sections are delimited by a banner naming the task and epoch; each
/// example contributes an error-rate/reference/hypothesis block. The file is
/// opened and closed per write, and existing content is never rewritten.
#[derive(Debug, Clone)]
pub struct OutcomeWriter {
    path: PathBuf,
}

impl OutcomeWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Write the section banner for one task/epoch pass.
    pub fn banner(&self, task: &str, epoch: u32) -> Result<()> {
        let bar = "=".repeat(10);
        self.append(&format!("{bar}{task} | Epoch: {epoch}{bar}\n"))
    }

    /// Append one per-example record.
    pub fn record(&self, rate: f64, actual: &str, predicted: &str) -> Result<()> {
        self.append(&format!(
            "PER    : {rate}\nActual : {actual}\nPredict: {predicted}\n{}\n",
            "=".repeat(20)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identical_transcripts_score_zero() {
        assert_eq!(word_error_rate("sh iy hh ae d", "sh iy hh ae d"), 0.0);
    }

    #[test]
    fn test_single_substitution() {
        // One substitution over four reference words.
        assert_abs_diff_eq!(
            word_error_rate("aa bb cc dd", "aa bb cc xx"),
            0.25,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_deletion_and_insertion() {
        assert_abs_diff_eq!(word_error_rate("aa bb", "aa"), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(word_error_rate("aa", "aa bb"), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_can_exceed_one() {
        assert!(word_error_rate("aa", "bb cc dd") > 1.0);
    }

    #[test]
    fn test_empty_reference_convention() {
        assert_eq!(word_error_rate("", ""), 0.0);
        assert_eq!(word_error_rate("", "aa bb"), 1.0);
    }

    #[test]
    fn test_corpus_rate_weights_by_reference_length() {
        // 1 error over 5 reference words total, not mean(1/4, 0/1).
        let pairs = [("aa bb cc dd", "aa bb cc xx"), ("ee", "ee")];
        assert_abs_diff_eq!(
            corpus_error_rate(pairs.iter().copied()),
            0.2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_corpus_rate_empty_input() {
        assert_eq!(corpus_error_rate(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_outcome_writer_appends_sections() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutcomeWriter::new(dir.path().join("test_outcome.txt"));

        writer.banner("test", 0).unwrap();
        writer.record(0.25, "aa bb", "aa cc").unwrap();
        writer.banner("test", 1).unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert!(content.starts_with("==========test | Epoch: 0==========\n"));
        assert!(content.contains("PER    : 0.25\nActual : aa bb\nPredict: aa cc\n"));
        assert!(content.contains("====================\n"));
        // Both banners survive in order; nothing was rewritten.
        assert_eq!(content.matches("test | Epoch:").count(), 2);
        let first = content.find("Epoch: 0").unwrap();
        let second = content.find("Epoch: 1").unwrap();
        assert!(first < second);
    }
}
