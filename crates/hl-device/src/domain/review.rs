//! Per-image evaluation workflow. A workflow instance is created when the
//! reviewer opens an image and dropped as soon as a terminal decision is
//! produced; nothing in between is persisted, so abandoning the flow leaves
//! the image pending with no trace of partial answers.

use hl_types::{Prediction, QualityChecks};
use thiserror::Error;

pub const REASON_NOT_TARGET_SPECIES: &str = "Not a cattle/buffalo";
pub const REASON_NOT_IDENTIFIABLE: &str = "Animal not clearly identifiable";
pub const REASON_MULTIPLE_SUBJECTS: &str = "Multiple animals in frame";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    ConfirmAngle,
    SpeciesCheck,
    IdentifiableCheck,
    SingleSubjectCheck,
    QualityGates,
    ConfirmLabel,
    Decided,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewInput {
    /// Reviewer confirms the angle label, optionally correcting it.
    AngleConfirmed { label: Option<String> },
    SpeciesIsTarget(bool),
    SubjectIdentifiable(bool),
    SingleSubject(bool),
    Quality(QualityChecks),
    /// Final label, either one of the candidate predictions or a manual
    /// override typed by the reviewer.
    ConfirmLabel { label: String },
    /// Manual rejection at the final step, with a free-form reason.
    RejectManually { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationDecision {
    Approved {
        final_label: String,
        quality: QualityChecks,
        angle_label: Option<String>,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ReviewError {
    #[error("input {input} is not valid in state {state}")]
    UnexpectedInput { state: String, input: String },
    #[error("workflow already reached a terminal decision")]
    AlreadyDecided,
    #[error("final label cannot be empty")]
    EmptyLabel,
    #[error("rejection reason cannot be empty")]
    EmptyReason,
}

/// Either the next state to present or the terminal decision. Once
/// `Decided` is returned the instance refuses further input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewProgress {
    Continue(ReviewState),
    Decided(EvaluationDecision),
}

pub struct EvaluationWorkflow {
    candidates: Vec<Prediction>,
    state: ReviewState,
    confirmed_angle: Option<String>,
    quality: Option<QualityChecks>,
    decision: Option<EvaluationDecision>,
}

impl EvaluationWorkflow {
    pub fn new(candidates: Vec<Prediction>) -> Self {
        Self {
            candidates,
            state: ReviewState::ConfirmAngle,
            confirmed_angle: None,
            quality: None,
            decision: None,
        }
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn candidates(&self) -> &[Prediction] {
        &self.candidates
    }

    pub fn decision(&self) -> Option<&EvaluationDecision> {
        self.decision.as_ref()
    }

    pub fn apply(&mut self, input: ReviewInput) -> Result<ReviewProgress, ReviewError> {
        if self.decision.is_some() {
            return Err(ReviewError::AlreadyDecided);
        }

        match (&self.state, input) {
            (ReviewState::ConfirmAngle, ReviewInput::AngleConfirmed { label }) => {
                self.confirmed_angle = label;
                self.advance(ReviewState::SpeciesCheck)
            }
            (ReviewState::SpeciesCheck, ReviewInput::SpeciesIsTarget(true)) => {
                self.advance(ReviewState::IdentifiableCheck)
            }
            (ReviewState::SpeciesCheck, ReviewInput::SpeciesIsTarget(false)) => {
                self.reject(REASON_NOT_TARGET_SPECIES.to_string())
            }
            (ReviewState::IdentifiableCheck, ReviewInput::SubjectIdentifiable(true)) => {
                self.advance(ReviewState::SingleSubjectCheck)
            }
            (ReviewState::IdentifiableCheck, ReviewInput::SubjectIdentifiable(false)) => {
                self.reject(REASON_NOT_IDENTIFIABLE.to_string())
            }
            (ReviewState::SingleSubjectCheck, ReviewInput::SingleSubject(true)) => {
                self.advance(ReviewState::QualityGates)
            }
            (ReviewState::SingleSubjectCheck, ReviewInput::SingleSubject(false)) => {
                self.reject(REASON_MULTIPLE_SUBJECTS.to_string())
            }
            (ReviewState::QualityGates, ReviewInput::Quality(checks)) => {
                self.quality = Some(checks);
                self.advance(ReviewState::ConfirmLabel)
            }
            (ReviewState::ConfirmLabel, ReviewInput::ConfirmLabel { label }) => {
                if label.trim().is_empty() {
                    return Err(ReviewError::EmptyLabel);
                }
                // QualityGates always precedes ConfirmLabel, so the
                // annotations are present here.
                let quality = self.quality.unwrap_or(QualityChecks {
                    lighting: false,
                    sharpness: false,
                    centering: false,
                });
                self.decide(EvaluationDecision::Approved {
                    final_label: label,
                    quality,
                    angle_label: self.confirmed_angle.clone(),
                })
            }
            (ReviewState::ConfirmLabel, ReviewInput::RejectManually { reason }) => {
                if reason.trim().is_empty() {
                    return Err(ReviewError::EmptyReason);
                }
                self.reject(reason)
            }
            (state, input) => Err(ReviewError::UnexpectedInput {
                state: format!("{state:?}"),
                input: format!("{input:?}"),
            }),
        }
    }

    fn advance(&mut self, next: ReviewState) -> Result<ReviewProgress, ReviewError> {
        self.state = next.clone();
        Ok(ReviewProgress::Continue(next))
    }

    fn reject(&mut self, reason: String) -> Result<ReviewProgress, ReviewError> {
        self.decide(EvaluationDecision::Rejected { reason })
    }

    fn decide(&mut self, decision: EvaluationDecision) -> Result<ReviewProgress, ReviewError> {
        self.state = ReviewState::Decided;
        self.decision = Some(decision.clone());
        Ok(ReviewProgress::Decided(decision))
    }
}
