//! Analytics roll-up over all of a user's sessions.
//!
//! Everything is recomputed from the store on each call; `roll_up` itself is a
//! pure function of the loaded rows and `now`, which keeps it easy to test.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{PracticeSession, Topic, TopicAnswer};
use crate::scoring::Tally;
use crate::store::{QuizStore, StorageError};
use crate::topics;

pub const RECENT_SESSIONS: usize = 10;
pub const PROGRESS_WINDOW_DAYS: i64 = 30;
pub const MAX_SUGGESTIONS: usize = 3;
pub const ONBOARDING_SUGGESTION: &str =
  "Start practicing to see your analytics and get personalized suggestions!";

/// Bucket label, inclusive lower bound (s), exclusive upper bound (s).
const TIME_BUCKETS: [(&str, f64, f64); 5] = [
  ("0-5s", 0.0, 5.0),
  ("5-10s", 5.0, 10.0),
  ("10-20s", 10.0, 20.0),
  ("20-30s", 20.0, 30.0),
  ("30s+", 30.0, f64::INFINITY),
];

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
  pub total_sessions: usize,
  /// Rounded mean of session scores.
  pub average_score: u32,
  /// Rounded mean of session accuracies, as a percentage.
  pub average_accuracy: u32,
  pub total_questions_answered: usize,
  /// Seconds, one decimal.
  pub average_time_per_question: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
  pub id: String,
  pub score: u32,
  pub accuracy: f64,
  pub duration: u64,
  pub topics: Vec<Topic>,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicPerformance {
  pub topic: Topic,
  pub display_name: &'static str,
  pub average_accuracy: f64,
  pub total_questions: u32,
  pub correct_answers: u32,
  /// Milliseconds.
  pub average_time: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
  /// Calendar day, `YYYY-MM-DD`.
  pub date: String,
  pub score: u32,
  /// Percentage.
  pub accuracy: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
  pub time_range: String,
  pub count: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
  pub overall_stats: OverallStats,
  pub recent_sessions: Vec<RecentSession>,
  pub topic_performance: Vec<TopicPerformance>,
  pub progress_over_time: Vec<ProgressPoint>,
  pub time_distribution: Vec<TimeBucket>,
  pub suggestions: Vec<String>,
}

impl AnalyticsData {
  pub fn empty() -> Self {
    Self {
      overall_stats: OverallStats::default(),
      recent_sessions: Vec::new(),
      topic_performance: Vec::new(),
      progress_over_time: Vec::new(),
      time_distribution: Vec::new(),
      suggestions: vec![ONBOARDING_SUGGESTION.to_string()],
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Comparison {
  #[serde(rename = "self")]
  pub own: AnalyticsData,
  pub other: AnalyticsData,
}

/// Load a user's rows and roll them up.
#[instrument(level = "info", skip_all, fields(%user_id))]
pub async fn user_analytics(
  store: &dyn QuizStore,
  user_id: &str,
  now: DateTime<Utc>,
) -> Result<AnalyticsData, StorageError> {
  let sessions = store.user_sessions(user_id).await?;
  let answers = store.user_answers(user_id).await?;
  let data = roll_up(&sessions, &answers, now);
  debug!(
    target: "analytics",
    %user_id,
    sessions = data.overall_stats.total_sessions,
    answered = data.overall_stats.total_questions_answered,
    "Analytics computed"
  );
  Ok(data)
}

/// Two independent roll-ups, side by side.
#[instrument(level = "info", skip_all, fields(%user_id, %other_id))]
pub async fn compare(
  store: &dyn QuizStore,
  user_id: &str,
  other_id: &str,
  now: DateTime<Utc>,
) -> Result<Comparison, StorageError> {
  let (own, other) = tokio::try_join!(
    user_analytics(store, user_id, now),
    user_analytics(store, other_id, now),
  )?;
  Ok(Comparison { own, other })
}

/// `sessions` must be newest first. Every session counts, finished or not;
/// open sessions contribute their stored (zero) score and duration.
pub fn roll_up(sessions: &[PracticeSession], answers: &[TopicAnswer], now: DateTime<Utc>) -> AnalyticsData {
  if sessions.is_empty() {
    return AnalyticsData::empty();
  }

  let mut answered_per_session: HashMap<&str, usize> = HashMap::new();
  for a in answers {
    *answered_per_session.entry(a.answer.session_id.as_str()).or_default() += 1;
  }

  // Overall
  let n = sessions.len() as f64;
  let mean_score = sessions.iter().map(|s| f64::from(s.score)).sum::<f64>() / n;
  let mean_accuracy = sessions.iter().map(|s| s.accuracy).sum::<f64>() / n;
  let total_answered = answers.len();
  let total_duration: u64 = sessions.iter().map(|s| s.duration).sum();
  let average_time_per_question = if total_answered == 0 {
    0.0
  } else {
    round1(total_duration as f64 / total_answered as f64)
  };

  let recent_sessions = sessions
    .iter()
    .take(RECENT_SESSIONS)
    .map(|s| RecentSession {
      id: s.id.clone(),
      score: s.score,
      accuracy: s.accuracy,
      duration: s.duration,
      topics: s.topics.clone(),
      created_at: s.created_at,
    })
    .collect();

  let topic_performance = topic_performance(answers);

  let window_start = now - Duration::days(PROGRESS_WINDOW_DAYS);
  let progress_over_time = sessions
    .iter()
    .rev()
    .filter(|s| s.created_at >= window_start)
    .map(|s| ProgressPoint {
      date: s.created_at.format("%Y-%m-%d").to_string(),
      score: s.score,
      accuracy: percent(s.accuracy),
    })
    .collect();

  let time_distribution = TIME_BUCKETS
    .iter()
    .map(|(label, lo, hi)| {
      let count = sessions
        .iter()
        .filter(|s| {
          let answered = answered_per_session.get(s.id.as_str()).copied().unwrap_or(0);
          let per_question = if answered > 0 { s.duration as f64 / answered as f64 } else { 0.0 };
          per_question >= *lo && per_question < *hi
        })
        .count();
      TimeBucket { time_range: (*label).to_string(), count }
    })
    .collect();

  let suggestions = suggestions(&topic_performance, mean_score, mean_accuracy);

  AnalyticsData {
    overall_stats: OverallStats {
      total_sessions: sessions.len(),
      average_score: mean_score.round() as u32,
      average_accuracy: percent(mean_accuracy),
      total_questions_answered: total_answered,
      average_time_per_question,
    },
    recent_sessions,
    topic_performance,
    progress_over_time,
    time_distribution,
    suggestions,
  }
}

fn topic_performance(answers: &[TopicAnswer]) -> Vec<TopicPerformance> {
  let mut stats: BTreeMap<Topic, (Tally, u64)> = BTreeMap::new();
  for a in answers {
    let entry = stats.entry(topics::canonical(a.topic)).or_default();
    entry.0.record(a.answer.is_correct);
    entry.1 += a.answer.time_taken_ms;
  }
  stats
    .into_iter()
    .map(|(topic, (tally, time_ms))| TopicPerformance {
      topic,
      display_name: topic.display_name(),
      average_accuracy: f64::from(tally.correct) / f64::from(tally.total),
      total_questions: tally.total,
      correct_answers: tally.correct,
      average_time: time_ms as f64 / f64::from(tally.total),
    })
    .collect()
}

/// Ordered heuristics, capped at `MAX_SUGGESTIONS`.
pub fn suggestions(performance: &[TopicPerformance], mean_score: f64, mean_accuracy: f64) -> Vec<String> {
  let mut out = Vec::new();

  let weakest = performance.iter().fold(None::<&TopicPerformance>, |min, t| match min {
    Some(m) if m.average_accuracy <= t.average_accuracy => Some(m),
    _ => Some(t),
  });
  if let Some(w) = weakest.filter(|w| w.average_accuracy < 0.7) {
    out.push(format!(
      "Focus more on {} - your accuracy is {}%",
      w.display_name,
      percent(w.average_accuracy)
    ));
  }

  if !performance.is_empty() {
    let mean_time = performance.iter().map(|t| t.average_time).sum::<f64>() / performance.len() as f64;
    if mean_time > 10_000.0 {
      out.push("Try practicing with shorter time limits to improve your speed".to_string());
    }
  }

  if mean_score < 60.0 {
    out.push("Consider reviewing fundamental concepts before timed practice".to_string());
  } else if mean_score > 80.0 {
    out.push("Great job! Try harder time settings or mixed topic sessions".to_string());
  }

  if mean_accuracy < 0.6 {
    out.push("Focus on accuracy over speed - take time to read questions carefully".to_string());
  }

  out.truncate(MAX_SUGGESTIONS);
  out
}

fn percent(fraction: f64) -> u32 {
  (fraction * 100.0).round().max(0.0) as u32
}

fn round1(x: f64) -> f64 {
  (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Answer, SessionStatus};
  use chrono::TimeZone;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap()
  }

  fn session(id: &str, days_ago: i64, score: u32, accuracy: f64, duration: u64) -> PracticeSession {
    PracticeSession {
      id: id.into(),
      user_id: "u1".into(),
      topics: vec![Topic::Statistics, Topic::DataAnalysis],
      time_limit: 10,
      question_count: 4,
      status: SessionStatus::Finalized,
      score,
      accuracy,
      duration,
      created_at: now() - Duration::days(days_ago),
      finished_at: Some(now() - Duration::days(days_ago)),
    }
  }

  fn answer(session_id: &str, n: usize, topic: Topic, correct: bool, ms: u64) -> TopicAnswer {
    TopicAnswer {
      answer: Answer {
        id: format!("{session_id}-{n}"),
        session_id: session_id.into(),
        question_id: format!("q{n}"),
        chosen_answer: if correct { "A".into() } else { "B".into() },
        is_correct: correct,
        time_taken_ms: ms,
        created_at: now(),
      },
      topic,
    }
  }

  #[test]
  fn no_sessions_yields_empty_shape_with_one_suggestion() {
    let data = roll_up(&[], &[], now());
    assert_eq!(data.overall_stats, OverallStats::default());
    assert!(data.recent_sessions.is_empty());
    assert!(data.topic_performance.is_empty());
    assert!(data.time_distribution.is_empty());
    assert_eq!(data.suggestions, vec![ONBOARDING_SUGGESTION.to_string()]);
  }

  #[test]
  fn open_sessions_still_count() {
    let mut open = session("s2", 0, 0, 0.0, 0);
    open.status = SessionStatus::InProgress;
    open.finished_at = None;
    let sessions = vec![open, session("s1", 1, 100, 1.0, 10)];
    let answers = vec![
      answer("s1", 0, Topic::AppliedMath, true, 1000),
      answer("s2", 0, Topic::AppliedMath, true, 2000),
    ];
    let data = roll_up(&sessions, &answers, now());
    assert_eq!(data.overall_stats.total_sessions, 2);
    assert_eq!(data.overall_stats.average_score, 50);
    assert_eq!(data.overall_stats.total_questions_answered, 2);
    assert_eq!(data.recent_sessions[0].id, "s2");
    assert_eq!(data.topic_performance[0].total_questions, 2);
    assert_ne!(data.suggestions, vec![ONBOARDING_SUGGESTION.to_string()]);
  }

  #[test]
  fn overall_stats_average_sessions() {
    // newest first
    let sessions = vec![session("s2", 1, 50, 0.5, 40), session("s1", 2, 100, 1.0, 20)];
    let answers = vec![
      answer("s1", 0, Topic::Statistics, true, 4000),
      answer("s1", 1, Topic::DataAnalysis, true, 6000),
      answer("s2", 0, Topic::AppliedMath, true, 9000),
      answer("s2", 1, Topic::AppliedMath, false, 11000),
    ];
    let data = roll_up(&sessions, &answers, now());
    let o = &data.overall_stats;
    assert_eq!(o.total_sessions, 2);
    assert_eq!(o.average_score, 75);
    assert_eq!(o.average_accuracy, 75);
    assert_eq!(o.total_questions_answered, 4);
    assert_eq!(o.average_time_per_question, 15.0);
    assert_eq!(data.recent_sessions[0].id, "s2");
  }

  #[test]
  fn topic_performance_collapses_aliases() {
    let sessions = vec![session("s1", 0, 67, 2.0 / 3.0, 30)];
    let answers = vec![
      answer("s1", 0, Topic::Statistics, true, 2000),
      answer("s1", 1, Topic::DataAnalysis, false, 4000),
      answer("s1", 2, Topic::GeneralKnowledge, true, 3000),
    ];
    let perf = roll_up(&sessions, &answers, now()).topic_performance;
    assert_eq!(perf.len(), 2);
    assert_eq!(perf[0].topic, Topic::Statistics);
    assert_eq!((perf[0].correct_answers, perf[0].total_questions), (1, 2));
    assert_eq!(perf[0].average_time, 3000.0);
    assert_eq!(perf[0].display_name, "Statistics & Data Analysis");
    assert_eq!(perf[1].topic, Topic::GeneralKnowledge);
  }

  #[test]
  fn progress_covers_last_thirty_days_oldest_first() {
    let sessions = vec![
      session("recent", 1, 90, 0.9, 10),
      session("edge", 30, 80, 0.8, 10),
      session("old", 31, 70, 0.7, 10),
    ];
    let points = roll_up(&sessions, &[], now()).progress_over_time;
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, "2025-03-01");
    assert_eq!(points[0].score, 80);
    assert_eq!(points[1].date, "2025-03-30");
    assert_eq!(points[1].accuracy, 90);
  }

  #[test]
  fn time_distribution_buckets_per_question_average() {
    let sessions = vec![
      session("fast", 0, 100, 1.0, 8),  // 4s per question
      session("mid", 0, 100, 1.0, 10),  // 5s: lower bound inclusive
      session("slow", 0, 100, 1.0, 70), // 35s
      session("empty", 0, 0, 0.0, 50),  // no answers -> 0s
    ];
    let answers = vec![
      answer("fast", 0, Topic::AppliedMath, true, 1),
      answer("fast", 1, Topic::AppliedMath, true, 1),
      answer("mid", 0, Topic::AppliedMath, true, 1),
      answer("mid", 1, Topic::AppliedMath, true, 1),
      answer("slow", 0, Topic::AppliedMath, true, 1),
      answer("slow", 1, Topic::AppliedMath, true, 1),
    ];
    let dist = roll_up(&sessions, &answers, now()).time_distribution;
    let counts: Vec<(String, usize)> = dist.into_iter().map(|b| (b.time_range, b.count)).collect();
    assert_eq!(
      counts,
      vec![
        ("0-5s".to_string(), 2),
        ("5-10s".to_string(), 1),
        ("10-20s".to_string(), 0),
        ("20-30s".to_string(), 0),
        ("30s+".to_string(), 1),
      ]
    );
  }

  fn perf(topic: Topic, accuracy: f64, time: f64) -> TopicPerformance {
    TopicPerformance {
      topic,
      display_name: topic.display_name(),
      average_accuracy: accuracy,
      total_questions: 10,
      correct_answers: (accuracy * 10.0) as u32,
      average_time: time,
    }
  }

  #[test]
  fn suggestions_follow_priority_and_cap() {
    let performance = vec![perf(Topic::AppliedMath, 0.4, 15_000.0), perf(Topic::VerbalReasoning, 0.5, 12_000.0)];
    let got = suggestions(&performance, 45.0, 0.45);
    assert_eq!(got.len(), 3);
    assert_eq!(got[0], "Focus more on Applied Math - your accuracy is 40%");
    assert_eq!(got[1], "Try practicing with shorter time limits to improve your speed");
    assert_eq!(got[2], "Consider reviewing fundamental concepts before timed practice");
  }

  #[test]
  fn low_accuracy_alone_asks_for_care() {
    let performance = vec![perf(Topic::GeneralKnowledge, 0.75, 3_000.0)];
    let got = suggestions(&performance, 70.0, 0.55);
    assert_eq!(
      got,
      vec!["Focus on accuracy over speed - take time to read questions carefully".to_string()]
    );
  }

  #[test]
  fn strong_user_gets_praise_only() {
    let performance = vec![perf(Topic::GeneralKnowledge, 0.9, 3_000.0)];
    let got = suggestions(&performance, 90.0, 0.9);
    assert_eq!(got, vec!["Great job! Try harder time settings or mixed topic sessions".to_string()]);
  }

  #[test]
  fn middling_user_gets_nothing() {
    let performance = vec![perf(Topic::GeneralKnowledge, 0.75, 3_000.0)];
    assert!(suggestions(&performance, 70.0, 0.75).is_empty());
  }
}
