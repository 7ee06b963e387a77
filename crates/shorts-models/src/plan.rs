//! Narrative plan models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a beat, unique within one plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct BeatId(pub String);

impl BeatId {
    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BeatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BeatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One narrative unit of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanBeat {
    pub id: BeatId,
    /// On-screen hook line
    pub hook: String,
    /// Text read by the narrator
    pub narration: String,
    /// Prompt for the visual generator
    pub visual_prompt: String,
    /// Planned length in seconds (narration length wins at assembly)
    pub duration_seconds: f64,
}

/// Structured narrative produced before any media exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentPlan {
    pub title: String,
    pub description: String,
    /// Ordered, de-duplicated tags
    pub tags: Vec<String>,
    /// Beats in render order
    pub beats: Vec<PlanBeat>,
}

impl ContentPlan {
    /// Sum of planned beat durations.
    pub fn planned_duration(&self) -> f64 {
        self.beats.iter().map(|b| b.duration_seconds).sum()
    }

    /// Beat ids in render order.
    pub fn beat_ids(&self) -> Vec<BeatId> {
        self.beats.iter().map(|b| b.id.clone()).collect()
    }

    /// Remove the given beats, keeping the order of the rest.
    ///
    /// Returns the number of beats removed.
    pub fn drop_beats(&mut self, dropped: &HashSet<BeatId>) -> usize {
        let before = self.beats.len();
        self.beats.retain(|b| !dropped.contains(&b.id));
        before - self.beats.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(id: &str, duration: f64) -> PlanBeat {
        PlanBeat {
            id: BeatId::from(id),
            hook: format!("hook {id}"),
            narration: format!("narration {id}"),
            visual_prompt: format!("visual {id}"),
            duration_seconds: duration,
        }
    }

    fn plan() -> ContentPlan {
        ContentPlan {
            title: "Morning routines".to_string(),
            description: "Start strong".to_string(),
            tags: vec!["habits".to_string()],
            beats: vec![beat("b1", 15.0), beat("b2", 15.0), beat("b3", 10.0)],
        }
    }

    #[test]
    fn test_planned_duration() {
        assert_eq!(plan().planned_duration(), 40.0);
    }

    #[test]
    fn test_drop_beats_keeps_order() {
        let mut plan = plan();
        let dropped: HashSet<BeatId> = [BeatId::from("b2")].into_iter().collect();

        assert_eq!(plan.drop_beats(&dropped), 1);
        assert_eq!(plan.beat_ids(), vec![BeatId::from("b1"), BeatId::from("b3")]);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(plan()).unwrap();
        assert_eq!(json["beats"][0]["id"], "b1");
        assert_eq!(json["beats"][0]["visualPrompt"], "visual b1");
        assert_eq!(json["beats"][0]["durationSeconds"], 15.0);
    }
}
