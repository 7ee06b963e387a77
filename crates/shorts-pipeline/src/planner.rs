//! Plan generation and validation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use shorts_clients::{NarrativeService, PlanBrief};
use shorts_models::{ContentPlan, PipelineStep, ShortRequest};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, StageResult};
use crate::log::PipelineLog;
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Bounds a plan must satisfy.
#[derive(Debug, Clone)]
pub struct PlanRules {
    pub min_beats: usize,
    pub max_beats: usize,
    pub duration_tolerance: f64,
}

impl From<&PipelineConfig> for PlanRules {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_beats: config.min_beats,
            max_beats: config.max_beats,
            duration_tolerance: config.duration_tolerance,
        }
    }
}

/// Turns a request into a validated `ContentPlan`.
pub struct PlanGenerator {
    narrative: Arc<dyn NarrativeService>,
    rules: PlanRules,
    retry: RetryConfig,
}

impl PlanGenerator {
    pub fn new(narrative: Arc<dyn NarrativeService>, rules: PlanRules, retry: RetryConfig) -> Self {
        Self { narrative, rules, retry }
    }

    /// Draft a plan, validate it, fit it to the requested duration and
    /// apply the request's overrides.
    ///
    /// Transport failures are retried. A malformed draft is returned as
    /// `PipelineError::Planning` immediately.
    pub async fn generate_plan(&self, request: &ShortRequest, log: &PipelineLog) -> StageResult<ContentPlan> {
        let brief = PlanBrief {
            topic: request.topic.trim().to_string(),
            tone: request.tone_or_default().to_string(),
            audience: request.audience_or_default().to_string(),
            cta: request.cta().map(String::from),
            duration_seconds: request.duration_seconds,
            min_beats: self.rules.min_beats,
            max_beats: self.rules.max_beats,
        };

        let draft = match retry_async(&self.retry, || self.narrative.draft_plan(&brief)).await {
            RetryResult::Success(plan) => plan,
            RetryResult::Failed { error, attempts } => {
                return Err(PipelineError::planning(format!("{error} (after {attempts} attempt(s))")));
            }
        };

        validate_plan(&draft, &self.rules)?;
        let mut plan = draft;

        if let Some(scale) = duration_rescale(&plan, request.duration_seconds, self.rules.duration_tolerance) {
            let planned = plan.planned_duration();
            for beat in &mut plan.beats {
                beat.duration_seconds *= scale;
            }
            log.info(
                PipelineStep::Planning,
                format!(
                    "Rescaled beat durations from {planned:.1}s to {:.1}s",
                    request.duration_seconds
                ),
            );
        }

        apply_overrides(&mut plan, request);
        debug!(title = %plan.title, beats = plan.beats.len(), "Plan finalized");
        Ok(plan)
    }
}

/// Structural checks on a drafted plan.
pub fn validate_plan(plan: &ContentPlan, rules: &PlanRules) -> StageResult<()> {
    let count = plan.beats.len();
    if count == 0 {
        return Err(PipelineError::planning("plan has no beats"));
    }
    if count < rules.min_beats || count > rules.max_beats {
        return Err(PipelineError::planning(format!(
            "plan has {count} beats, expected {}-{}",
            rules.min_beats, rules.max_beats
        )));
    }

    let mut seen = HashSet::with_capacity(count);
    for beat in &plan.beats {
        if beat.id.as_str().trim().is_empty() {
            return Err(PipelineError::planning("beat with blank id"));
        }
        if !seen.insert(&beat.id) {
            return Err(PipelineError::planning(format!("duplicate beat id {}", beat.id)));
        }
        if !(beat.duration_seconds.is_finite() && beat.duration_seconds > 0.0) {
            return Err(PipelineError::planning(format!(
                "beat {} has non-positive duration {}",
                beat.id, beat.duration_seconds
            )));
        }
        if beat.narration.trim().is_empty() {
            return Err(PipelineError::planning(format!("beat {} has no narration", beat.id)));
        }
        if beat.visual_prompt.trim().is_empty() {
            return Err(PipelineError::planning(format!("beat {} has no visual prompt", beat.id)));
        }
    }

    Ok(())
}

/// Factor that brings the planned total to `target`, or `None` when the
/// plan is already within tolerance.
pub fn duration_rescale(plan: &ContentPlan, target: f64, tolerance: f64) -> Option<f64> {
    let planned = plan.planned_duration();
    if planned <= 0.0 || target <= 0.0 {
        return None;
    }
    ((planned - target).abs() > target * tolerance).then(|| target / planned)
}

fn apply_overrides(plan: &mut ContentPlan, request: &ShortRequest) {
    if let Some(title) = non_blank(request.custom_title.as_deref()) {
        plan.title = title.to_string();
    } else if plan.title.trim().is_empty() {
        plan.title = request.topic.trim().to_string();
    }

    if let Some(description) = non_blank(request.custom_description.as_deref()) {
        plan.description = description.to_string();
    }

    let custom = request.custom_tags.as_deref().map(clean_custom_tags).unwrap_or_default();
    plan.tags = if custom.is_empty() {
        normalize_tags(std::mem::take(&mut plan.tags))
    } else {
        custom
    };
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Caller tags are kept as written apart from trimming, dropping blanks
/// and exact duplicates.
fn clean_custom_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(*t))
        .map(String::from)
        .collect()
}

/// Generated tags: trim, drop blanks and leading `#`, de-duplicate
/// case-insensitively keeping the first spelling.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}
