use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::cache::{CacheStats, IrrCache, IrrCacheKey};
use super::cash_flow_extractor::CashFlowExtractor;
use super::irr_errors::IrrError;
use super::irr_model::*;
use super::irr_traits::{IrrServiceTrait, StoredIrrRepositoryTrait};
use super::solver;
use crate::activities::ActivityRepositoryTrait;
use crate::constants::IRR_CALCULATION_METHOD;
use crate::errors::{Result, ValidationError};
use crate::portfolios::PortfolioRepositoryTrait;
use crate::valuations::ValuationRepositoryTrait;

/// Extracts, solves, caches and persists IRR values for funds and portfolios.
pub struct IrrService {
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    valuation_repository: Arc<dyn ValuationRepositoryTrait>,
    stored_irr_repository: Arc<dyn StoredIrrRepositoryTrait>,
    extractor: CashFlowExtractor,
    cache: Arc<IrrCache>,
}

impl IrrService {
    pub fn new(
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        activity_repository: Arc<dyn ActivityRepositoryTrait>,
        valuation_repository: Arc<dyn ValuationRepositoryTrait>,
        stored_irr_repository: Arc<dyn StoredIrrRepositoryTrait>,
        cache: Arc<IrrCache>,
    ) -> Self {
        Self {
            portfolio_repository,
            extractor: CashFlowExtractor::new(activity_repository, valuation_repository.clone()),
            valuation_repository,
            stored_irr_repository,
            cache,
        }
    }

    fn ensure_fund_exists(&self, portfolio_fund_id: i64) -> Result<()> {
        match self.portfolio_repository.get_fund(portfolio_fund_id)? {
            Some(_) => Ok(()),
            None => Err(IrrError::FundNotFound(portfolio_fund_id).into()),
        }
    }

    /// Shared path of every calculation: extract, look up the cache, solve on miss.
    fn compute(
        &self,
        fund_ids: &[i64],
        as_of: NaiveDate,
        provided: Option<&HashMap<i64, Decimal>>,
    ) -> Result<IrrCalculation> {
        let positions = self.extractor.extract_positions(fund_ids, as_of, provided)?;
        let series = CashFlowExtractor::pool(&positions);

        let key = IrrCacheKey::build(fund_ids, Some(as_of), Some(&series), provided);
        if let Some(hit) = self.cache.get(&key) {
            debug!("IRR cache hit for funds {:?} on {}", fund_ids, as_of);
            return Ok(hit);
        }

        let result = solver::solve(&series)?;
        // solve() rejects an empty series, so a first flow exists here.
        let start_date = series.first().map(|f| f.date).unwrap_or(as_of);
        let calculation = IrrCalculation {
            days_in_period: (as_of - start_date).num_days(),
            start_date,
            total_valuation: positions.iter().map(FundPosition::terminal_amount).sum(),
            flow_count: series.len(),
            result,
        };

        self.cache.set(&key, calculation.clone(), None);
        Ok(calculation)
    }

    async fn portfolio_total_on(&self, portfolio_id: i64, on: NaiveDate) -> Result<Option<i64>> {
        let fund_ids: Vec<i64> = self
            .portfolio_repository
            .get_funds_for_portfolio(portfolio_id)?
            .iter()
            .map(|f| f.id)
            .collect();
        let valuations = self
            .valuation_repository
            .get_fund_valuations_on(&fund_ids, on)?;
        if valuations.is_empty() {
            return Ok(None);
        }
        let total: Decimal = valuations.iter().map(|v| v.valuation).sum();
        let stored = self
            .valuation_repository
            .upsert_portfolio_valuation(portfolio_id, on, total)
            .await?;
        Ok(Some(stored.id))
    }
}

#[async_trait]
impl IrrServiceTrait for IrrService {
    fn calculate_fund_irr(&self, request: SingleFundIrrRequest) -> Result<FundIrrResponse> {
        self.ensure_fund_exists(request.portfolio_fund_id)?;

        let provided = request
            .valuation_amount
            .map(|amount| HashMap::from([(request.portfolio_fund_id, amount)]));
        let calculation = self.compute(
            &[request.portfolio_fund_id],
            request.valuation_date,
            provided.as_ref(),
        )?;

        Ok(FundIrrResponse {
            portfolio_fund_id: request.portfolio_fund_id,
            valuation_date: request.valuation_date,
            irr: calculation.result.rounded_rate(),
            irr_percentage: calculation.result.percentage(),
            days_in_period: calculation.days_in_period,
            calculation_method: IRR_CALCULATION_METHOD.to_string(),
            converged: calculation.result.converged,
        })
    }

    fn calculate_multi_fund_irr(&self, request: MultiFundIrrRequest) -> Result<MultiFundIrrResponse> {
        if request.portfolio_fund_ids.is_empty() {
            return Err(ValidationError::InvalidInput(
                "portfolioFundIds must not be empty".to_string(),
            )
            .into());
        }

        let ids: BTreeSet<i64> = request.portfolio_fund_ids.iter().copied().collect();
        if let Some(missing) = ids
            .iter()
            .find(|id| !request.fund_valuations.contains_key(*id))
        {
            return Err(ValidationError::FundMismatch {
                portfolio_fund_id: *missing,
                message: "no entry in fundValuations".to_string(),
            }
            .into());
        }
        let mut extra: Vec<i64> = request
            .fund_valuations
            .keys()
            .filter(|id| !ids.contains(*id))
            .copied()
            .collect();
        extra.sort_unstable();
        if let Some(extra) = extra.first() {
            return Err(ValidationError::FundMismatch {
                portfolio_fund_id: *extra,
                message: "valued but not listed in portfolioFundIds".to_string(),
            }
            .into());
        }

        let ids: Vec<i64> = ids.into_iter().collect();
        let found: BTreeSet<i64> = self
            .portfolio_repository
            .get_funds_by_ids(&ids)?
            .iter()
            .map(|f| f.id)
            .collect();
        if let Some(unknown) = ids.iter().find(|id| !found.contains(*id)) {
            return Err(IrrError::FundNotFound(*unknown).into());
        }

        let calculation = self.compute(&ids, request.valuation_date, Some(&request.fund_valuations))?;

        Ok(MultiFundIrrResponse {
            portfolio_fund_ids: ids,
            valuation_date: request.valuation_date,
            irr: calculation.result.rounded_rate(),
            irr_percentage: calculation.result.percentage(),
            days_in_period: calculation.days_in_period,
            calculation_method: IRR_CALCULATION_METHOD.to_string(),
            total_valuation: calculation.total_valuation,
        })
    }

    async fn recalculate_fund_irr(&self, portfolio_fund_id: i64, as_of: NaiveDate) -> Result<StoredIrr> {
        self.ensure_fund_exists(portfolio_fund_id)?;

        let valuation = self
            .valuation_repository
            .get_fund_valuation_on(portfolio_fund_id, as_of)?
            .ok_or(IrrError::DataIncomplete {
                fund_id: portfolio_fund_id,
                as_of,
            })?;
        let calculation = self.compute(&[portfolio_fund_id], as_of, None)?;

        let stored = self
            .stored_irr_repository
            .upsert_stored_irr(
                IrrSubject::Fund(portfolio_fund_id),
                as_of,
                calculation.result.percentage(),
                Some(valuation.id),
            )
            .await?;
        debug!(
            "Stored IRR {}% for fund {} on {}",
            stored.irr_result, portfolio_fund_id, as_of
        );
        Ok(stored)
    }

    async fn calculate_portfolio_irr(
        &self,
        portfolio_id: i64,
        as_of: NaiveDate,
    ) -> Result<PortfolioIrrResponse> {
        if self.portfolio_repository.get_portfolio(portfolio_id)?.is_none() {
            return Err(IrrError::PortfolioNotFound(portfolio_id).into());
        }

        let fund_ids: Vec<i64> = self
            .portfolio_repository
            .get_funds_for_portfolio(portfolio_id)?
            .iter()
            .map(|f| f.id)
            .collect();
        if fund_ids.is_empty() {
            return Err(IrrError::DegenerateInput(format!(
                "portfolio {} holds no funds",
                portfolio_id
            ))
            .into());
        }

        let calculation = self.compute(&fund_ids, as_of, None)?;

        let valuation = self
            .valuation_repository
            .upsert_portfolio_valuation(portfolio_id, as_of, calculation.total_valuation)
            .await?;
        let stored = self
            .stored_irr_repository
            .upsert_stored_irr(
                IrrSubject::Portfolio(portfolio_id),
                as_of,
                calculation.result.percentage(),
                Some(valuation.id),
            )
            .await?;

        Ok(PortfolioIrrResponse {
            portfolio_id,
            valuation_date: as_of,
            irr: calculation.result.rounded_rate(),
            irr_percentage: calculation.result.percentage(),
            days_in_period: calculation.days_in_period,
            calculation_method: IRR_CALCULATION_METHOD.to_string(),
            total_valuation: calculation.total_valuation,
            stored,
        })
    }

    fn get_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<Option<StoredIrr>> {
        self.stored_irr_repository.get_stored_irr(subject, irr_date)
    }

    async fn backfill_valuation_links(&self) -> Result<BackfillSummary> {
        let unlinked = self.stored_irr_repository.get_unlinked_stored_irrs()?;
        let mut summary = BackfillSummary {
            examined: unlinked.len(),
            ..Default::default()
        };

        for row in unlinked {
            let valuation_id = match row.subject {
                IrrSubject::Fund(fund_id) => self
                    .valuation_repository
                    .get_fund_valuation_on(fund_id, row.irr_date)?
                    .map(|v| v.id),
                IrrSubject::Portfolio(portfolio_id) => {
                    self.portfolio_total_on(portfolio_id, row.irr_date).await?
                }
            };

            match valuation_id {
                Some(valuation_id) => {
                    self.stored_irr_repository
                        .upsert_stored_irr(row.subject, row.irr_date, row.irr_result, Some(valuation_id))
                        .await?;
                    summary.linked += 1;
                }
                None => {
                    warn!(
                        "No valuation found for stored IRR of {} on {}",
                        row.subject, row.irr_date
                    );
                    summary.unresolved += 1;
                }
            }
        }

        info!(
            "Valuation backfill: examined {}, linked {}, unresolved {}",
            summary.examined, summary.linked, summary.unresolved
        );
        Ok(summary)
    }

    fn invalidate_funds(&self, portfolio_fund_ids: &[i64]) -> usize {
        self.cache.invalidate_by_funds(portfolio_fund_ids)
    }

    fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn sweep_cache(&self) -> usize {
        let removed = self.cache.sweep_expired();
        if removed > 0 {
            debug!("Swept {} expired IRR cache entries", removed);
        }
        removed
    }
}
