//! Legacy topic aliases.
//!
//! `DATA_ANALYSIS` used to be its own category and was later folded into
//! `STATISTICS`. Questions still carry both tags, so selecting either one
//! samples from both, and results always report the canonical topic.

use crate::domain::Topic;

/// `(canonical, legacy)` pairs. Lookups go both ways.
pub const ALIASES: &[(Topic, Topic)] = &[(Topic::Statistics, Topic::DataAnalysis)];

/// Canonical display topic for a stored topic.
pub fn canonical(topic: Topic) -> Topic {
  ALIASES
    .iter()
    .find(|(_, legacy)| *legacy == topic)
    .map(|(canon, _)| *canon)
    .unwrap_or(topic)
}

/// Every stored topic that belongs to the same group as `topic`, canonical first.
pub fn group(topic: Topic) -> Vec<Topic> {
  let canon = canonical(topic);
  let mut out = vec![canon];
  out.extend(
    ALIASES
      .iter()
      .filter(|(c, _)| *c == canon)
      .map(|(_, legacy)| *legacy),
  );
  out
}

/// Expand requested topics into the stored topics to sample from.
/// Preserves first-seen order and drops duplicates.
pub fn expand(topics: &[Topic]) -> Vec<Topic> {
  let mut out: Vec<Topic> = Vec::with_capacity(topics.len() + ALIASES.len());
  for t in topics {
    for g in group(*t) {
      if !out.contains(&g) {
        out.push(g);
      }
    }
  }
  out
}
