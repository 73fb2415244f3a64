//! Reduction of a response log into the numbers the classifier and the results screen use.
//!
//! Everything here is a pure function of the response slice.

use crate::error::{Error, Result};
use crate::session::Response;

/// Points awarded per correct answer in the composite score
pub const CORRECT_WEIGHT: i64 = 4;
/// Points deducted per wrong answer in the composite score
pub const WRONG_WEIGHT: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub correct_count: u32,
    pub wrong_count: u32,
    pub avg_reaction_time: f64,
    pub composite_score: i64,
}

/// Reaction-time cost of incongruent stimuli relative to congruent ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interference {
    pub congruent_mean: f64,
    pub incongruent_mean: f64,
    pub effect: f64,
}

pub fn composite_score(correct_count: u32, wrong_count: u32) -> i64 {
    i64::from(correct_count) * CORRECT_WEIGHT - i64::from(wrong_count) * WRONG_WEIGHT
}

pub fn summarize(responses: &[Response]) -> Result<ScoreSummary> {
    if responses.is_empty() {
        return Err(Error::InsufficientData(
            "cannot score a session with no responses".into(),
        ));
    }

    let correct_count = responses.iter().filter(|r| r.correct).count() as u32;
    let wrong_count = responses.len() as u32 - correct_count;
    let reaction_times = reaction_times(responses);
    let avg_reaction_time = mean(&reaction_times).unwrap_or(f64::NAN);

    Ok(ScoreSummary {
        correct_count,
        wrong_count,
        avg_reaction_time,
        composite_score: composite_score(correct_count, wrong_count),
    })
}

/// Population standard deviation of reaction times, `None` for an empty log
pub fn reaction_time_std_dev(responses: &[Response]) -> Option<f64> {
    std_dev(&reaction_times(responses))
}

/// Needs at least one congruent and one incongruent trial
pub fn interference(responses: &[Response]) -> Option<Interference> {
    let (congruent, incongruent): (Vec<&Response>, Vec<&Response>) =
        responses.iter().partition(|r| r.trial.is_congruent());

    let congruent_mean = mean(
        &congruent
            .iter()
            .map(|r| r.reaction_time_seconds)
            .collect::<Vec<f64>>(),
    )?;
    let incongruent_mean = mean(
        &incongruent
            .iter()
            .map(|r| r.reaction_time_seconds)
            .collect::<Vec<f64>>(),
    )?;

    Some(Interference {
        congruent_mean,
        incongruent_mean,
        effect: incongruent_mean - congruent_mean,
    })
}

fn reaction_times(responses: &[Response]) -> Vec<f64> {
    responses.iter().map(|r| r.reaction_time_seconds).collect()
}

fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}
