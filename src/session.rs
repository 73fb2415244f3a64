use crate::palette::ColorName;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One stimulus: the word spelled out and the ink it is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub word: ColorName,
    pub ink: ColorName,
}

impl Trial {
    pub fn new(word: ColorName, ink: ColorName) -> Self {
        Self { word, ink }
    }

    pub fn is_congruent(&self) -> bool {
        self.word == self.ink
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub trial: Trial,
    pub chosen: ColorName,
    pub correct: bool,
    pub reaction_time_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Stage {
    #[default]
    Instructions,
    Running,
    Finished,
}

/// State of a single test run. Only `StroopTest` mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub(crate) stage: Stage,
    pub(crate) trials: Vec<Trial>,
    pub(crate) current_index: usize,
    pub(crate) responses: Vec<Response>,
    pub(crate) trial_start_time: Option<Instant>,
    pub(crate) subject_age: Option<u32>,
}

impl Session {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn trial_start_time(&self) -> Option<Instant> {
        self.trial_start_time
    }

    pub fn subject_age(&self) -> Option<u32> {
        self.subject_age
    }

    pub fn number_of_trials(&self) -> usize {
        self.trials.len()
    }
}
