use chrono::NaiveDate;
use thiserror::Error;

use super::irr_model::IrrSubject;

/// Failures of the cash-flow extraction, solving and storing pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrrError {
    #[error("Portfolio fund {fund_id} has activity but no valuation on or before {as_of}")]
    DataIncomplete { fund_id: i64, as_of: NaiveDate },

    #[error("Cash flows cannot produce a meaningful IRR: {0}")]
    DegenerateInput(String),

    #[error("IRR did not converge after {iterations} iterations over {flow_count} cash flows")]
    Convergence { iterations: u32, flow_count: usize },

    #[error("Stored IRR for {subject} on {date} could not be written: concurrent writer won")]
    PersistenceConflict { subject: IrrSubject, date: NaiveDate },

    #[error("Portfolio fund {0} not found")]
    FundNotFound(i64),

    #[error("Portfolio {0} not found")]
    PortfolioNotFound(i64),
}

impl IrrError {
    pub fn reason_class(&self) -> &'static str {
        match self {
            IrrError::DataIncomplete { .. } => "data_incomplete",
            IrrError::DegenerateInput(_) => "degenerate_input",
            IrrError::Convergence { .. } => "convergence",
            IrrError::PersistenceConflict { .. } => "persistence_conflict",
            IrrError::FundNotFound(_) | IrrError::PortfolioNotFound(_) => "not_found",
        }
    }

    pub fn entity_id(&self) -> Option<i64> {
        match self {
            IrrError::DataIncomplete { fund_id, .. } => Some(*fund_id),
            IrrError::PersistenceConflict { subject, .. } => Some(subject.id()),
            IrrError::FundNotFound(id) | IrrError::PortfolioNotFound(id) => Some(*id),
            IrrError::DegenerateInput(_) | IrrError::Convergence { .. } => None,
        }
    }
}
