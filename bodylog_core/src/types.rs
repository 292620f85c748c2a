//! Core domain types for the bodylog journal.
//!
//! This module defines:
//! - Workout days and the payloads that create or patch them
//! - Reusable templates
//! - The derived analytics summary

use crate::block::Block;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Workout Days
// ============================================================================

/// One calendar day's log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub id: u64,
    pub date: NaiveDate,
    pub scenario_type: String,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub comment: String,
}

/// Payload for creating a workout day (the store assigns the id)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkoutDay {
    pub date: NaiveDate,
    pub scenario_type: String,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub comment: String,
}

impl NewWorkoutDay {
    /// Seed a new day from a template's scenario and blocks
    pub fn from_template(template: &Template, date: NaiveDate) -> Self {
        Self {
            date,
            scenario_type: template.scenario_type.clone(),
            blocks: template.blocks.clone(),
            comment: String::new(),
        }
    }

    pub(crate) fn into_day(self, id: u64) -> WorkoutDay {
        WorkoutDay {
            id,
            date: self.date,
            scenario_type: self.scenario_type,
            blocks: self.blocks,
            comment: self.comment,
        }
    }
}

/// Partial update: a `None` field leaves the stored value untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDayUpdate {
    #[serde(default)]
    pub scenario_type: Option<String>,
    #[serde(default)]
    pub blocks: Option<Vec<Block>>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl WorkoutDayUpdate {
    pub fn is_empty(&self) -> bool {
        self.scenario_type.is_none() && self.blocks.is_none() && self.comment.is_none()
    }

    /// Apply the present fields to a stored day
    pub fn apply_to(self, day: &mut WorkoutDay) {
        if let Some(scenario_type) = self.scenario_type {
            day.scenario_type = scenario_type;
        }
        if let Some(blocks) = self.blocks {
            day.blocks = blocks;
        }
        if let Some(comment) = self.comment {
            day.comment = comment;
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// A named, reusable blueprint for a workout day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: u64,
    pub name: String,
    pub scenario_type: String,
    pub blocks: Vec<Block>,
}

/// Payload for creating a template
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub scenario_type: String,
    pub blocks: Vec<Block>,
}

impl NewTemplate {
    pub(crate) fn into_template(self, id: u64) -> Template {
        Template {
            id,
            name: self.name,
            scenario_type: self.scenario_type,
            blocks: self.blocks,
        }
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// Rolling summary over a trailing window of days. Computed per request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Requested window size, echoed unchanged
    #[serde(rename = "days")]
    pub window_days: i64,
    pub training_days: usize,
    pub avg_steps: Option<i64>,
    pub last_working_weights: BTreeMap<String, Option<f64>>,
}
