use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Events emitted by the ledger, in the order the operations were applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyEvent {
    SurveySubmitted { respondent: Address, timestamp: u64 },
    QuestionResultsRevealed { question_id: u64, requester: Address },
}
