use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use super::transactions_model::*;
use super::transactions_traits::OrderedTransactionServiceTrait;
use crate::activities::{ActivityRepositoryTrait, ActivityType, NewActivity};
use crate::errors::{Error, FieldViolation, Result, ValidationError};
use crate::irr::{IrrError, IrrServiceTrait, IrrSubject};
use crate::portfolios::PortfolioRepositoryTrait;
use crate::valuations::{NewFundValuation, ValuationRepositoryTrait};

const ENTITY_ACTIVITY: &str = "activity";
const ENTITY_VALUATION: &str = "valuation";
const ENTITY_FUND: &str = "fund";
const ENTITY_PORTFOLIO: &str = "portfolio";

struct Validated {
    activities: Vec<(usize, NewActivity)>,
    valuations: Vec<(usize, NewFundValuation)>,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", value, e))
}

fn violation(entity: &str, index: usize, field: &str, message: impl Into<String>) -> FieldViolation {
    FieldViolation {
        index,
        entity: entity.to_string(),
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(request: &OrderedTransactionRequest) -> Result<Validated> {
    let mut violations = Vec::new();
    let mut activities = Vec::with_capacity(request.activities.len());
    let mut valuations = Vec::with_capacity(request.valuations.len());

    for (index, input) in request.activities.iter().enumerate() {
        let before = violations.len();

        let fund_id = match input.portfolio_fund_id {
            Some(id) if id > 0 => Some(id),
            Some(_) => {
                violations.push(violation(ENTITY_ACTIVITY, index, "portfolioFundId", "must be positive"));
                None
            }
            None => {
                violations.push(violation(ENTITY_ACTIVITY, index, "portfolioFundId", "is required"));
                None
            }
        };
        let activity_type = match input.activity_type.as_deref() {
            Some(label) => ActivityType::from_str(label)
                .map_err(|e| violations.push(violation(ENTITY_ACTIVITY, index, "activityType", e)))
                .ok(),
            None => {
                violations.push(violation(ENTITY_ACTIVITY, index, "activityType", "is required"));
                None
            }
        };
        let timestamp = match input.activity_timestamp.as_deref() {
            Some(value) => parse_date(value)
                .map_err(|e| violations.push(violation(ENTITY_ACTIVITY, index, "activityTimestamp", e)))
                .ok(),
            None => {
                violations.push(violation(ENTITY_ACTIVITY, index, "activityTimestamp", "is required"));
                None
            }
        };
        let amount = match input.amount {
            Some(amount) if amount > Decimal::ZERO => Some(amount),
            Some(_) => {
                violations.push(violation(ENTITY_ACTIVITY, index, "amount", "must be greater than zero"));
                None
            }
            None => {
                violations.push(violation(ENTITY_ACTIVITY, index, "amount", "is required"));
                None
            }
        };

        if violations.len() == before {
            if let (Some(portfolio_fund_id), Some(activity_type), Some(activity_timestamp), Some(amount)) =
                (fund_id, activity_type, timestamp, amount)
            {
                activities.push((
                    index,
                    NewActivity {
                        portfolio_fund_id,
                        activity_type,
                        activity_timestamp,
                        amount,
                    },
                ));
            }
        }
    }

    for (index, input) in request.valuations.iter().enumerate() {
        let before = violations.len();

        let fund_id = match input.portfolio_fund_id {
            Some(id) if id > 0 => Some(id),
            Some(_) => {
                violations.push(violation(ENTITY_VALUATION, index, "portfolioFundId", "must be positive"));
                None
            }
            None => {
                violations.push(violation(ENTITY_VALUATION, index, "portfolioFundId", "is required"));
                None
            }
        };
        let date = match input.valuation_date.as_deref() {
            Some(value) => parse_date(value)
                .map_err(|e| violations.push(violation(ENTITY_VALUATION, index, "valuationDate", e)))
                .ok(),
            None => {
                violations.push(violation(ENTITY_VALUATION, index, "valuationDate", "is required"));
                None
            }
        };
        // Zero is a valid closing value (fully exited fund).
        let value = match input.valuation {
            Some(value) if value >= Decimal::ZERO => Some(value),
            Some(_) => {
                violations.push(violation(ENTITY_VALUATION, index, "valuation", "must not be negative"));
                None
            }
            None => {
                violations.push(violation(ENTITY_VALUATION, index, "valuation", "is required"));
                None
            }
        };

        if violations.len() == before {
            if let (Some(portfolio_fund_id), Some(valuation_date), Some(valuation)) = (fund_id, date, value) {
                valuations.push((
                    index,
                    NewFundValuation {
                        portfolio_fund_id,
                        valuation_date,
                        valuation,
                    },
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(Validated {
            activities,
            valuations,
        })
    } else {
        Err(ValidationError::Fields(violations).into())
    }
}

fn ordering_conflicts(validated: &Validated) -> Vec<OrderingConflict> {
    let activity_keys: BTreeSet<(i64, NaiveDate)> = validated
        .activities
        .iter()
        .map(|(_, a)| (a.portfolio_fund_id, a.activity_timestamp))
        .collect();
    validated
        .valuations
        .iter()
        .map(|(_, v)| (v.portfolio_fund_id, v.valuation_date))
        .filter(|key| activity_keys.contains(key))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|(portfolio_fund_id, date)| OrderingConflict {
            portfolio_fund_id,
            date,
        })
        .collect()
}

fn item_error(
    stage: SaveStage,
    entity: &str,
    index: Option<usize>,
    entity_id: Option<i64>,
    date: Option<NaiveDate>,
    err: &Error,
) -> TransactionItemError {
    TransactionItemError {
        stage,
        entity: entity.to_string(),
        index,
        entity_id,
        date,
        reason: err.reason_class().to_string(),
        message: err.to_string(),
    }
}

/// What one save wrote, per fund.
#[derive(Default)]
struct Affected {
    valuation_dates: BTreeMap<i64, BTreeSet<NaiveDate>>,
    earliest_activity: BTreeMap<i64, NaiveDate>,
}

impl Affected {
    fn fund_ids(&self) -> Vec<i64> {
        self.valuation_dates
            .keys()
            .chain(self.earliest_activity.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Coordinates one ordered save of activities and valuations.
pub struct OrderedTransactionService {
    activity_repository: Arc<dyn ActivityRepositoryTrait>,
    valuation_repository: Arc<dyn ValuationRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    irr_service: Arc<dyn IrrServiceTrait>,
}

impl OrderedTransactionService {
    pub fn new(
        activity_repository: Arc<dyn ActivityRepositoryTrait>,
        valuation_repository: Arc<dyn ValuationRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        irr_service: Arc<dyn IrrServiceTrait>,
    ) -> Self {
        Self {
            activity_repository,
            valuation_repository,
            portfolio_repository,
            irr_service,
        }
    }

    /// Dates to recompute per fund: the valuation dates saved now plus every stored
    /// valuation date from the earliest activity saved now.
    fn recalculation_targets(&self, affected: &Affected) -> Result<BTreeMap<i64, BTreeSet<NaiveDate>>> {
        let mut targets: BTreeMap<i64, BTreeSet<NaiveDate>> = affected.valuation_dates.clone();
        for (fund_id, earliest) in &affected.earliest_activity {
            let dates = self
                .valuation_repository
                .get_fund_valuation_dates_from(*fund_id, *earliest)?;
            targets.entry(*fund_id).or_default().extend(dates);
        }
        Ok(targets)
    }

    async fn recalculate(&self, affected: &Affected, result: &mut OrderedTransactionResult) {
        let targets = match self.recalculation_targets(affected) {
            Ok(targets) => targets,
            Err(e) => {
                result.errors.push(item_error(SaveStage::RecalculateIrr, ENTITY_FUND, None, None, None, &e));
                return;
            }
        };

        let mut portfolio_targets: BTreeSet<(i64, NaiveDate)> = BTreeSet::new();
        for (fund_id, dates) in &targets {
            match self.portfolio_repository.get_fund(*fund_id) {
                Ok(Some(fund)) => portfolio_targets.extend(dates.iter().map(|d| (fund.portfolio_id, *d))),
                Ok(None) => {}
                Err(e) => result.errors.push(item_error(
                    SaveStage::RecalculateIrr,
                    ENTITY_FUND,
                    None,
                    Some(*fund_id),
                    None,
                    &e,
                )),
            }

            for date in dates {
                match self.irr_service.recalculate_fund_irr(*fund_id, *date).await {
                    Ok(stored) => result.irr_calculations.push(IrrRecalculation {
                        subject: stored.subject,
                        irr_date: stored.irr_date,
                        irr_percentage: stored.irr_result,
                        stored_irr_id: stored.id,
                    }),
                    Err(Error::Irr(IrrError::DegenerateInput(reason))) => {
                        debug!("Skipping IRR of fund {} on {}: {}", fund_id, date, reason);
                    }
                    Err(e) => result.errors.push(item_error(
                        SaveStage::RecalculateIrr,
                        ENTITY_FUND,
                        None,
                        Some(*fund_id),
                        Some(*date),
                        &e,
                    )),
                }
            }
        }

        for (portfolio_id, date) in portfolio_targets {
            match self.irr_service.calculate_portfolio_irr(portfolio_id, date).await {
                Ok(response) => result.irr_calculations.push(IrrRecalculation {
                    subject: IrrSubject::Portfolio(portfolio_id),
                    irr_date: date,
                    irr_percentage: response.stored.irr_result,
                    stored_irr_id: response.stored.id,
                }),
                Err(Error::Irr(IrrError::DegenerateInput(reason))) => {
                    debug!("Skipping IRR of portfolio {} on {}: {}", portfolio_id, date, reason);
                }
                Err(Error::Irr(e @ IrrError::DataIncomplete { .. })) => {
                    warn!("Skipping IRR of portfolio {} on {}: {}", portfolio_id, date, e);
                }
                Err(e) => result.errors.push(item_error(
                    SaveStage::RecalculateIrr,
                    ENTITY_PORTFOLIO,
                    None,
                    Some(portfolio_id),
                    Some(date),
                    &e,
                )),
            }
        }
    }
}

#[async_trait]
impl OrderedTransactionServiceTrait for OrderedTransactionService {
    async fn save(&self, request: OrderedTransactionRequest) -> Result<OrderedTransactionResult> {
        debug!(
            "Ordered save: {} activities, {} valuations",
            request.activities.len(),
            request.valuations.len()
        );

        let validated = validate(&request)?;
        let conflicts = ordering_conflicts(&validated);
        for conflict in &conflicts {
            warn!(
                "Fund {} has an activity and a valuation on {}; activities are written first",
                conflict.portfolio_fund_id, conflict.date
            );
        }

        let mut result = OrderedTransactionResult {
            success: false,
            stage: SaveStage::ActivitiesWrite,
            activities_saved: 0,
            valuations_saved: 0,
            irr_calculations: Vec::new(),
            ordering_conflicts: conflicts,
            errors: Vec::new(),
        };
        let mut affected = Affected::default();

        for (index, activity) in validated.activities {
            let fund_id = activity.portfolio_fund_id;
            let date = activity.activity_timestamp;
            match self.activity_repository.create_activity(activity).await {
                Ok(_) => {
                    result.activities_saved += 1;
                    affected
                        .earliest_activity
                        .entry(fund_id)
                        .and_modify(|d| *d = (*d).min(date))
                        .or_insert(date);
                }
                Err(e) => result.errors.push(item_error(
                    SaveStage::ActivitiesWrite,
                    ENTITY_ACTIVITY,
                    Some(index),
                    Some(fund_id),
                    Some(date),
                    &e,
                )),
            }
        }

        result.stage = SaveStage::ValuationsWrite;
        for (index, valuation) in validated.valuations {
            let fund_id = valuation.portfolio_fund_id;
            let date = valuation.valuation_date;
            match self.valuation_repository.upsert_fund_valuation(valuation).await {
                Ok(_) => {
                    result.valuations_saved += 1;
                    affected.valuation_dates.entry(fund_id).or_default().insert(date);
                }
                Err(e) => result.errors.push(item_error(
                    SaveStage::ValuationsWrite,
                    ENTITY_VALUATION,
                    Some(index),
                    Some(fund_id),
                    Some(date),
                    &e,
                )),
            }
        }

        result.stage = SaveStage::RecalculateIrr;
        let fund_ids = affected.fund_ids();
        if !fund_ids.is_empty() {
            let removed = self.irr_service.invalidate_funds(&fund_ids);
            debug!("Invalidated {} cached IRR entries for funds {:?}", removed, fund_ids);
            self.recalculate(&affected, &mut result).await;
        }

        result.success = result.errors.is_empty();
        result.stage = if result.success {
            SaveStage::Done
        } else {
            SaveStage::Failed
        };
        info!(
            "Ordered save finished: {} activities, {} valuations, {} IRR values, {} errors",
            result.activities_saved,
            result.valuations_saved,
            result.irr_calculations.len(),
            result.errors.len()
        );
        Ok(result)
    }
}
