//! Echo suppression for the speech recognizer.
//!
//! The microphone hears the narration. Every chunk handed to the speech
//! engine is recorded here, and recognizer transcripts that resemble
//! recently spoken text are classified as echoes and dropped.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::config::EchoConfig;

/// Words that carry no signal for overlap matching.
const STOPWORDS: &[&str] = &[
    "the", "and", "you", "are", "was", "for", "with", "that", "this", "there", "here", "have",
    "has", "not", "but", "its", "his", "her", "from", "into", "can", "your", "all", "out", "who",
    "what",
];

#[derive(Debug, Clone)]
struct SpokenRecord {
    text: String,
    words: HashSet<String>,
    at: Instant,
}

/// Bounded, time-windowed record of recently spoken text.
#[derive(Debug, Clone)]
pub struct EchoGuard {
    records: VecDeque<SpokenRecord>,
    settings: EchoConfig,
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new(EchoConfig::default())
    }
}

/// Lowercase, strip punctuation, collapse whitespace.
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn significant_words(normalized: &str) -> HashSet<String> {
    normalized
        .split(' ')
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// 1.0 for identical strings, 0.0 for nothing in common.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

impl EchoGuard {
    pub fn new(settings: EchoConfig) -> Self {
        Self {
            records: VecDeque::with_capacity(settings.max_records),
            settings,
        }
    }

    fn retention(&self) -> Duration {
        Duration::from_millis(self.settings.retention_ms)
    }

    /// Remember text that is about to be spoken.
    pub fn record(&mut self, text: &str) {
        self.record_at(text, Instant::now());
    }

    pub fn record_at(&mut self, text: &str, now: Instant) {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return;
        }
        while self.records.len() >= self.settings.max_records.max(1) {
            self.records.pop_front();
        }
        self.records.push_back(SpokenRecord {
            words: significant_words(&normalized),
            text: normalized,
            at: now,
        });
    }

    fn prune(&mut self, now: Instant) {
        let retention = self.retention();
        self.records
            .retain(|r| now.saturating_duration_since(r.at) <= retention);
    }

    /// Whether a recognizer transcript is the system hearing itself.
    pub fn is_echo(&mut self, transcript: &str) -> bool {
        self.is_echo_at(transcript, Instant::now())
    }

    pub fn is_echo_at(&mut self, transcript: &str, now: Instant) -> bool {
        self.prune(now);
        let heard = normalize(transcript);
        if heard.is_empty() {
            return false;
        }
        let heard_words = significant_words(&heard);

        let matched = self.records.iter().find(|record| {
            if record.text.contains(&heard) || heard.contains(&record.text) {
                return true;
            }
            if similarity(&heard, &record.text) > self.settings.similarity_threshold {
                return true;
            }
            if heard_words.len() >= 2 && record.words.len() >= 3 {
                let shared = heard_words.intersection(&record.words).count();
                return shared as f64 / heard_words.len() as f64 > self.settings.overlap_threshold;
            }
            false
        });

        if let Some(record) = matched {
            tracing::debug!(transcript, spoken = %record.text, "suppressed echo");
        }
        matched.is_some()
    }

    /// Number of live records (not pruned until the next classification).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: &str = "You are standing in an open field west of a white house.";

    #[test]
    fn verbatim_within_retention_is_echo() {
        let mut guard = EchoGuard::default();
        let t0 = Instant::now();
        guard.record_at(CHUNK, t0);
        assert!(guard.is_echo_at(CHUNK, t0 + Duration::from_secs(2)));
    }

    #[test]
    fn aged_out_text_is_not_echo() {
        let mut guard = EchoGuard::default();
        let t0 = Instant::now();
        guard.record_at(CHUNK, t0);
        assert!(!guard.is_echo_at(CHUNK, t0 + Duration::from_secs(9)));
        assert!(guard.is_empty());
    }

    #[test]
    fn substring_of_recorded_chunk_is_echo() {
        let mut guard = EchoGuard::default();
        let t0 = Instant::now();
        guard.record_at(CHUNK, t0);
        assert!(guard.is_echo_at("open field west", t0));
        assert!(guard.is_echo_at("OPEN FIELD, WEST!", t0));
    }

    #[test]
    fn near_miss_transcription_is_echo() {
        let mut guard = EchoGuard::default();
        let t0 = Instant::now();
        guard.record_at("There is a small mailbox here.", t0);
        assert!(guard.is_echo_at("there is a small male box here", t0));
    }

    #[test]
    fn word_overlap_is_echo() {
        let mut guard = EchoGuard::default();
        let t0 = Instant::now();
        guard.record_at("The mailbox contains a leaflet and a rusty key.", t0);
        assert!(guard.is_echo_at("leaflet rusty mailbox please", t0));
    }

    #[test]
    fn genuine_command_is_not_echo() {
        let mut guard = EchoGuard::default();
        let t0 = Instant::now();
        guard.record_at(CHUNK, t0);
        assert!(!guard.is_echo_at("open the mailbox", t0));
        assert!(!guard.is_echo_at("   ", t0));
    }

    #[test]
    fn records_are_capped() {
        let mut guard = EchoGuard::new(EchoConfig {
            max_records: 2,
            ..EchoConfig::default()
        });
        let t0 = Instant::now();
        guard.record_at("first utterance", t0);
        guard.record_at("second utterance", t0);
        guard.record_at("third utterance", t0);
        assert_eq!(guard.len(), 2);
        assert!(!guard.is_echo_at("first utterance", t0));
        assert!(guard.is_echo_at("third utterance", t0));
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert!((similarity("abc", "abc") - 1.0).abs() < f64::EPSILON);
    }
}
