use crate::classifier::{FeatureVector, RiskClassifier, RiskLabel};
use crate::error::{Error, Result};
use crate::palette::ColorName;
use crate::scoring::{self, ScoreSummary};
use crate::session::{Response, Session, Stage, Trial};
use crate::trial_generator::TrialGenerator;
use std::ops::RangeInclusive;
use std::time::Instant;

/// Accepted subject ages unless configured otherwise
pub const DEFAULT_AGE_RANGE: RangeInclusive<u32> = 10..=120;

/// What happened to a submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Submission {
    Accepted { correct: bool, finished: bool },
    /// The trial was already answered; nothing changed
    Duplicate,
}

/// Everything the results screen reports for a finished session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub summary: ScoreSummary,
    pub features: FeatureVector,
    pub risk: RiskLabel,
}

/// Drives one session through instructions, trials and results
#[derive(Debug)]
pub struct StroopTest {
    session: Session,
    age_range: RangeInclusive<u32>,
    generator: TrialGenerator,
}

impl StroopTest {
    pub fn new(age_range: RangeInclusive<u32>, generator: TrialGenerator) -> Self {
        Self {
            session: Session::default(),
            age_range,
            generator,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stage(&self) -> Stage {
        self.session.stage
    }

    pub fn age_range(&self) -> &RangeInclusive<u32> {
        &self.age_range
    }

    pub fn start(&mut self, age: u32, n: usize, palette: &[ColorName]) -> Result<()> {
        self.expect_stage(Stage::Instructions, "start")?;

        if !self.age_range.contains(&age) {
            return Err(Error::InvalidInput(format!(
                "age {age} outside accepted range {}..={}",
                self.age_range.start(),
                self.age_range.end()
            )));
        }

        let trials = self.generator.generate(n, palette)?;

        self.session = Session {
            stage: Stage::Running,
            trials,
            current_index: 0,
            responses: Vec::with_capacity(n),
            trial_start_time: None,
            subject_age: Some(age),
        };

        tracing::info!(age, trials = n, "stroop session started");
        Ok(())
    }

    pub fn current_trial(&self) -> Result<Trial> {
        self.expect_stage(Stage::Running, "current_trial")?;
        self.session
            .trials
            .get(self.session.current_index)
            .copied()
            .ok_or_else(|| Error::InvalidState("no trial at the current index".into()))
    }

    /// Record that the current stimulus became visible at `at`
    pub fn mark_presented(&mut self, at: Instant) -> Result<()> {
        self.expect_stage(Stage::Running, "mark_presented")?;
        self.session.trial_start_time = Some(at);
        Ok(())
    }

    /// Whether the current stimulus has been shown and is waiting for an answer
    pub fn is_presented(&self) -> bool {
        self.session.stage == Stage::Running && self.session.trial_start_time.is_some()
    }

    pub fn submit_response(&mut self, chosen: ColorName, elapsed: f64) -> Result<Submission> {
        let index = self.session.current_index;
        self.submit_for(index, chosen, elapsed)
    }

    /// Answer trial `trial_index`. A repeat answer for a trial that has already been scored is
    /// ignored and reported as [`Submission::Duplicate`].
    pub fn submit_for(
        &mut self,
        trial_index: usize,
        chosen: ColorName,
        elapsed: f64,
    ) -> Result<Submission> {
        self.expect_stage(Stage::Running, "submit_response")?;

        let current = self.session.current_index;
        if trial_index < current {
            tracing::debug!(trial_index, current, "ignoring duplicate submission");
            return Ok(Submission::Duplicate);
        }
        if trial_index > current {
            return Err(Error::InvalidState(format!(
                "trial {trial_index} has not been presented yet (current trial is {current})"
            )));
        }

        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(Error::InvalidInput(format!(
                "reaction time must be a non-negative number of seconds, got {elapsed}"
            )));
        }

        let trial = self.current_trial()?;
        let correct = chosen == trial.ink;

        self.session.responses.push(Response {
            trial,
            chosen,
            correct,
            reaction_time_seconds: elapsed,
        });
        self.session.current_index += 1;
        self.session.trial_start_time = None;

        tracing::debug!(
            trial = trial_index,
            word = %trial.word,
            ink = %trial.ink,
            chosen = %chosen,
            correct,
            reaction_time = elapsed,
            "response recorded"
        );

        let finished = self.session.current_index == self.session.trials.len();
        if finished {
            self.session.stage = Stage::Finished;
            tracing::info!(
                responses = self.session.responses.len(),
                "stroop session finished"
            );
        }

        Ok(Submission::Accepted { correct, finished })
    }

    /// Answer using the time elapsed since [`StroopTest::mark_presented`]
    pub fn submit_at(
        &mut self,
        trial_index: usize,
        chosen: ColorName,
        now: Instant,
    ) -> Result<Submission> {
        self.expect_stage(Stage::Running, "submit_response")?;
        if trial_index < self.session.current_index {
            return Ok(Submission::Duplicate);
        }

        let started = self.session.trial_start_time.ok_or_else(|| {
            Error::InvalidState("the current stimulus has not been presented".into())
        })?;
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        self.submit_for(trial_index, chosen, elapsed)
    }

    pub fn restart(&mut self) {
        tracing::info!(from = %self.session.stage, "stroop session restarted");
        self.session = Session::default();
    }

    pub fn summary(&self) -> Result<ScoreSummary> {
        scoring::summarize(&self.session.responses)
    }

    /// Score the finished session and ask `classifier` for a verdict
    pub fn assess(&self, classifier: &dyn RiskClassifier) -> Result<Assessment> {
        self.expect_stage(Stage::Finished, "assess")?;

        let summary = self.summary()?;
        let age = self
            .session
            .subject_age
            .ok_or_else(|| Error::InvalidState("finished session has no subject age".into()))?;
        let features = FeatureVector::new(age, &summary);
        let risk = classifier.predict(&features)?;

        tracing::info!(
            features = ?features.to_array(),
            risk = %risk,
            "risk assessment complete"
        );

        Ok(Assessment {
            summary,
            features,
            risk,
        })
    }

    fn expect_stage(&self, expected: Stage, operation: &str) -> Result<()> {
        if self.session.stage == expected {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{operation} requires the {expected} stage, session is {}",
                self.session.stage
            )))
        }
    }
}

impl Default for StroopTest {
    fn default() -> Self {
        Self::new(DEFAULT_AGE_RANGE, TrialGenerator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::default_palette;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::time::Duration;

    fn seeded_test() -> StroopTest {
        StroopTest::new(DEFAULT_AGE_RANGE, TrialGenerator::seeded(5))
    }

    fn wrong_color(ink: ColorName) -> ColorName {
        default_palette()
            .into_iter()
            .find(|c| *c != ink)
            .unwrap()
    }

    struct Recording {
        seen: RefCell<Vec<[f64; 5]>>,
        label: RiskLabel,
    }

    impl RiskClassifier for Recording {
        fn predict(&self, features: &FeatureVector) -> Result<RiskLabel> {
            self.seen.borrow_mut().push(features.to_array());
            Ok(self.label)
        }
    }

    #[test]
    fn test_new_starts_in_instructions() {
        let test = seeded_test();
        assert_eq!(test.stage(), Stage::Instructions);
        assert_eq!(test.session(), &Session::default());
        assert_matches!(test.current_trial(), Err(Error::InvalidState(_)));
    }

    #[test]
    fn test_start_enters_running() {
        let mut test = seeded_test();
        test.start(65, 5, &default_palette()).unwrap();

        assert_eq!(test.stage(), Stage::Running);
        assert_eq!(test.session().number_of_trials(), 5);
        assert_eq!(test.session().current_index(), 0);
        assert_eq!(test.session().subject_age(), Some(65));
        assert!(test.current_trial().is_ok());
    }

    #[test]
    fn test_start_rejects_age_out_of_range() {
        let mut test = seeded_test();
        assert_matches!(
            test.start(5, 5, &default_palette()),
            Err(Error::InvalidInput(_))
        );
        assert_eq!(test.stage(), Stage::Instructions);

        let mut narrow = StroopTest::new(40..=90, TrialGenerator::seeded(1));
        assert_matches!(
            narrow.start(91, 5, &default_palette()),
            Err(Error::InvalidInput(_))
        );
        assert!(narrow.start(40, 5, &default_palette()).is_ok());
    }

    #[test]
    fn test_start_propagates_bad_configuration() {
        let mut test = seeded_test();
        assert_matches!(
            test.start(65, 0, &default_palette()),
            Err(Error::InvalidConfiguration(_))
        );
        assert_matches!(test.start(65, 5, &[]), Err(Error::InvalidConfiguration(_)));
        assert_eq!(test.stage(), Stage::Instructions);
    }

    #[test]
    fn test_start_twice_is_invalid_state() {
        let mut test = seeded_test();
        test.start(65, 3, &default_palette()).unwrap();
        assert_matches!(
            test.start(65, 3, &default_palette()),
            Err(Error::InvalidState(_))
        );
    }

    #[test]
    fn test_submit_before_start_is_invalid_state() {
        let mut test = seeded_test();
        assert_matches!(
            test.submit_response(ColorName::Red, 1.0),
            Err(Error::InvalidState(_))
        );
    }

    #[test]
    fn test_submit_scores_against_ink() {
        let mut test = seeded_test();
        test.start(65, 2, &default_palette()).unwrap();

        let trial = test.current_trial().unwrap();
        let outcome = test.submit_response(trial.ink, 0.7).unwrap();
        assert_eq!(
            outcome,
            Submission::Accepted {
                correct: true,
                finished: false
            }
        );

        let trial = test.current_trial().unwrap();
        let outcome = test.submit_response(wrong_color(trial.ink), 1.1).unwrap();
        assert_eq!(
            outcome,
            Submission::Accepted {
                correct: false,
                finished: true
            }
        );

        let responses = test.session().responses();
        assert!(responses[0].correct);
        assert!(!responses[1].correct);
        assert_eq!(responses[1].reaction_time_seconds, 1.1);
        assert_eq!(test.stage(), Stage::Finished);
    }

    #[test]
    fn test_submit_after_finish_is_invalid_state() {
        let mut test = seeded_test();
        test.start(65, 1, &default_palette()).unwrap();
        test.submit_response(ColorName::Red, 1.0).unwrap();

        assert_eq!(test.stage(), Stage::Finished);
        assert_eq!(test.session().current_index(), 1);
        assert_matches!(
            test.submit_response(ColorName::Red, 1.0),
            Err(Error::InvalidState(_))
        );
        assert_matches!(test.current_trial(), Err(Error::InvalidState(_)));
    }

    #[test]
    fn test_negative_or_nan_reaction_time_rejected() {
        let mut test = seeded_test();
        test.start(65, 2, &default_palette()).unwrap();

        assert_matches!(
            test.submit_response(ColorName::Red, -0.1),
            Err(Error::InvalidInput(_))
        );
        assert_matches!(
            test.submit_response(ColorName::Red, f64::NAN),
            Err(Error::InvalidInput(_))
        );
        assert!(test.session().responses().is_empty());
    }

    #[test]
    fn test_duplicate_submission_is_ignored() {
        let mut test = seeded_test();
        test.start(65, 3, &default_palette()).unwrap();

        test.submit_for(0, ColorName::Red, 0.9).unwrap();
        assert_eq!(
            test.submit_for(0, ColorName::Blue, 0.95).unwrap(),
            Submission::Duplicate
        );

        assert_eq!(test.session().current_index(), 1);
        assert_eq!(test.session().responses().len(), 1);
        assert_eq!(test.session().responses()[0].chosen, ColorName::Red);
    }

    #[test]
    fn test_submission_ahead_of_current_is_rejected() {
        let mut test = seeded_test();
        test.start(65, 3, &default_palette()).unwrap();
        assert_matches!(
            test.submit_for(2, ColorName::Red, 0.9),
            Err(Error::InvalidState(_))
        );
        assert!(test.session().responses().is_empty());
    }

    #[test]
    fn test_submit_at_measures_from_presentation() {
        let mut test = seeded_test();
        test.start(65, 2, &default_palette()).unwrap();

        let shown = Instant::now();
        test.mark_presented(shown).unwrap();
        assert!(test.is_presented());

        test.submit_at(0, ColorName::Red, shown + Duration::from_millis(1250))
            .unwrap();

        let rt = test.session().responses()[0].reaction_time_seconds;
        assert!((rt - 1.25).abs() < 1e-9);
        // the clock must be restarted for the next stimulus
        assert!(!test.is_presented());
        assert_matches!(
            test.submit_at(1, ColorName::Red, Instant::now()),
            Err(Error::InvalidState(_))
        );
    }

    #[test]
    fn test_submit_at_ignores_stale_index() {
        let mut test = seeded_test();
        test.start(65, 2, &default_palette()).unwrap();
        let shown = Instant::now();
        test.mark_presented(shown).unwrap();
        test.submit_at(0, ColorName::Red, shown).unwrap();
        test.mark_presented(shown).unwrap();

        assert_eq!(
            test.submit_at(0, ColorName::Red, shown).unwrap(),
            Submission::Duplicate
        );
        assert_eq!(test.session().responses().len(), 1);
    }

    #[test]
    fn test_restart_from_every_stage() {
        let mut test = seeded_test();
        test.restart();
        assert_eq!(test.session(), &Session::default());

        test.start(65, 2, &default_palette()).unwrap();
        test.mark_presented(Instant::now()).unwrap();
        test.submit_response(ColorName::Red, 1.0).unwrap();
        test.restart();
        assert_eq!(test.session(), &Session::default());

        test.start(65, 1, &default_palette()).unwrap();
        test.submit_response(ColorName::Red, 1.0).unwrap();
        assert_eq!(test.stage(), Stage::Finished);
        test.restart();
        assert_eq!(test.session(), &Session::default());

        // a restarted machine accepts a new session
        assert!(test.start(30, 3, &default_palette()).is_ok());
    }

    #[test]
    fn test_assess_requires_finished() {
        let test = seeded_test();
        let classifier = Recording {
            seen: RefCell::new(vec![]),
            label: RiskLabel::LowRisk,
        };
        assert_matches!(test.assess(&classifier), Err(Error::InvalidState(_)));
        assert!(classifier.seen.borrow().is_empty());
    }

    #[test]
    fn test_assess_passes_feature_vector() {
        let mut test = seeded_test();
        test.start(72, 2, &default_palette()).unwrap();
        let ink = test.current_trial().unwrap().ink;
        test.submit_response(ink, 1.0).unwrap();
        let ink = test.current_trial().unwrap().ink;
        test.submit_response(wrong_color(ink), 2.0).unwrap();

        let classifier = Recording {
            seen: RefCell::new(vec![]),
            label: RiskLabel::HighRisk,
        };
        let assessment = test.assess(&classifier).unwrap();

        assert_eq!(assessment.risk, RiskLabel::HighRisk);
        assert_eq!(assessment.summary.composite_score, 2);
        assert_eq!(classifier.seen.borrow().as_slice(), &[[72.0, 1.5, 1.0, 1.0, 2.0]]);
    }

    proptest! {
        /// Property: every accepted submission advances the index by one and keeps
        /// responses in lockstep with it
        #[test]
        fn prop_index_tracks_responses(
            n in 1usize..40,
            seed in any::<u64>(),
            picks in prop::collection::vec((0usize..5, 0.0f64..5.0), 40)
        ) {
            let palette = default_palette();
            let mut test = StroopTest::new(DEFAULT_AGE_RANGE, TrialGenerator::seeded(seed));
            test.start(50, n, &palette).unwrap();

            for (step, (pick, rt)) in picks.iter().take(n).enumerate() {
                prop_assert_eq!(test.session().current_index(), step);
                test.submit_response(palette[*pick], *rt).unwrap();
                prop_assert_eq!(test.session().current_index(), step + 1);
                prop_assert_eq!(test.session().responses().len(), step + 1);
            }

            prop_assert_eq!(test.stage(), Stage::Finished);
            prop_assert!(matches!(
                test.submit_response(palette[0], 1.0),
                Err(Error::InvalidState(_))
            ));
        }
    }
}
