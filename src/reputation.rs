//! Reputation metrics derived from a wallet's sessions and feedback.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{timestamp, Feedback, Session};

pub const RATING_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;
pub const NPS_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;
pub const TOP_SKILLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillUsage {
    pub skill: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub text: String,
    pub timestamp: String,
    pub from_wallet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reputation {
    pub sessions_completed: u32,
    pub sessions_given: u32,
    pub sessions_received: u32,
    /// Rounded to one decimal.
    pub avg_rating: f64,
    pub nps_score: i64,
    pub top_skills_usage: Vec<SkillUsage>,
    pub peer_testimonials: Vec<Testimonial>,
    pub reputation_score: i64,
    pub last_active_timestamp: String,
}

pub fn compute(
    wallet: &str,
    sessions: &[Session],
    feedback: &[Feedback],
    now: DateTime<Utc>,
) -> Reputation {
    let completed: Vec<&Session> = sessions.iter().filter(|s| s.is_completed()).collect();
    let sessions_completed = completed.len() as u32;
    let sessions_given = completed
        .iter()
        .filter(|s| s.mentor_wallet.eq_ignore_ascii_case(wallet))
        .count() as u32;
    let sessions_received = completed
        .iter()
        .filter(|s| s.learner_wallet.eq_ignore_ascii_case(wallet))
        .count() as u32;

    let received: Vec<&Feedback> = feedback
        .iter()
        .filter(|f| f.to_wallet.eq_ignore_ascii_case(wallet))
        .collect();

    let avg_rating = mean(
        received
            .iter()
            .filter_map(|f| f.rating)
            .filter(|r| RATING_RANGE.contains(r)),
    );
    let nps = mean(
        received
            .iter()
            .filter_map(|f| f.nps_score)
            .filter(|n| NPS_RANGE.contains(n)),
    );

    let peer_testimonials = received
        .iter()
        .filter_map(|f| {
            let text = f.text.as_deref()?.trim();
            (!text.is_empty()).then(|| Testimonial {
                text: text.to_string(),
                timestamp: f.created_at.clone(),
                from_wallet: f.from_wallet.clone(),
            })
        })
        .collect();

    Reputation {
        sessions_completed,
        sessions_given,
        sessions_received,
        avg_rating: (avg_rating * 10.0).round() / 10.0,
        nps_score: nps.round() as i64,
        top_skills_usage: top_skills(&completed, TOP_SKILLS),
        peer_testimonials,
        reputation_score: (f64::from(sessions_completed) * avg_rating * 10.0).round() as i64,
        last_active_timestamp: timestamp(now),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Most frequent skills, ties kept in order of first appearance.
fn top_skills(sessions: &[&Session], n: usize) -> Vec<SkillUsage> {
    let mut usage: Vec<SkillUsage> = Vec::new();
    for session in sessions {
        match usage.iter_mut().find(|u| u.skill == session.skill) {
            Some(entry) => entry.count += 1,
            None => usage.push(SkillUsage {
                skill: session.skill.clone(),
                count: 1,
            }),
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    usage.sort_by(|a, b| b.count.cmp(&a.count));
    usage.truncate(n);
    usage
}
