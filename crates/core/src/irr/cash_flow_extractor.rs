use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::irr_errors::IrrError;
use super::irr_model::{CashFlow, FundPosition, TerminalValue};
use crate::activities::ActivityRepositoryTrait;
use crate::errors::{Result, ValidationError};
use crate::valuations::ValuationRepositoryTrait;

/// Turns activity-log rows and valuations into signed, dated cash flows.
pub struct CashFlowExtractor {
    activity_repository: Arc<dyn ActivityRepositoryTrait>,
    valuation_repository: Arc<dyn ValuationRepositoryTrait>,
}

impl CashFlowExtractor {
    pub fn new(
        activity_repository: Arc<dyn ActivityRepositoryTrait>,
        valuation_repository: Arc<dyn ValuationRepositoryTrait>,
    ) -> Self {
        Self {
            activity_repository,
            valuation_repository,
        }
    }

    /// Builds one position per fund id, in ascending id order.
    ///
    /// A value in `provided` replaces the stored valuation of that fund and is
    /// dated `as_of`. Otherwise the latest valuation on or before `as_of` anchors
    /// the series, dated at its own valuation date. A fund with activity and no
    /// anchor fails with `DataIncomplete`, a negative closing value with a
    /// validation error naming the fund.
    pub fn extract_positions(
        &self,
        fund_ids: &[i64],
        as_of: NaiveDate,
        provided: Option<&HashMap<i64, Decimal>>,
    ) -> Result<Vec<FundPosition>> {
        let mut flows_by_fund: BTreeMap<i64, Vec<CashFlow>> =
            fund_ids.iter().map(|id| (*id, Vec::new())).collect();

        for activity in self
            .activity_repository
            .get_activities_for_funds(fund_ids, as_of)?
        {
            if let Some(flows) = flows_by_fund.get_mut(&activity.portfolio_fund_id) {
                flows.push(CashFlow::activity(
                    activity.activity_timestamp,
                    activity.signed_amount(),
                    activity.activity_type.category(),
                ));
            }
        }

        let mut positions = Vec::with_capacity(flows_by_fund.len());
        for (fund_id, cash_flows) in flows_by_fund {
            let terminal = match provided.and_then(|values| values.get(&fund_id)) {
                Some(amount) => Some(TerminalValue {
                    amount: *amount,
                    date: as_of,
                    valuation_id: None,
                }),
                None => self
                    .valuation_repository
                    .get_latest_fund_valuation(fund_id, as_of)?
                    .map(|v| TerminalValue {
                        amount: v.valuation,
                        date: v.valuation_date,
                        valuation_id: Some(v.id),
                    }),
            };

            if let Some(value) = terminal.as_ref().filter(|v| v.amount < Decimal::ZERO) {
                return Err(ValidationError::FundMismatch {
                    portfolio_fund_id: fund_id,
                    message: format!("closing value {} must not be negative", value.amount),
                }
                .into());
            }
            if terminal.is_none() && !cash_flows.is_empty() {
                return Err(IrrError::DataIncomplete { fund_id, as_of }.into());
            }

            positions.push(FundPosition {
                portfolio_fund_id: fund_id,
                cash_flows,
                terminal,
            });
        }

        Ok(positions)
    }

    /// Pooled, date-ordered series for the given funds.
    pub fn extract(&self, fund_ids: &[i64], as_of: NaiveDate) -> Result<Vec<CashFlow>> {
        let positions = self.extract_positions(fund_ids, as_of, None)?;
        Ok(Self::pool(&positions))
    }

    /// Merges positions into one series. Same-day flows keep separate entries and
    /// empty positions are left out.
    pub fn pool(positions: &[FundPosition]) -> Vec<CashFlow> {
        let mut series: Vec<CashFlow> = positions
            .iter()
            .filter(|p| {
                let empty = p.is_empty();
                if empty {
                    debug!("Fund {} has no flows and no value, skipping", p.portfolio_fund_id);
                }
                !empty
            })
            .flat_map(FundPosition::series)
            .collect();
        series.sort_by_key(|f| f.date);
        series
    }
}
