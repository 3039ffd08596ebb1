//! In-memory repositories shared by the service tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::activities::{Activity, ActivityRepositoryTrait, NewActivity};
use crate::errors::{DatabaseError, Error, Result};
use crate::irr::{IrrCache, IrrService, IrrSubject, StoredIrr, StoredIrrRepositoryTrait};
use crate::portfolios::{NewPortfolio, NewPortfolioFund, Portfolio, PortfolioFund, PortfolioRepositoryTrait};
use crate::scheduled::{
    NewScheduledTransaction, ScheduleExecutionUpdate, ScheduleStatus, ScheduledTransaction,
    ScheduledTransactionRepositoryTrait,
};
use crate::valuations::{FundValuation, NewFundValuation, PortfolioValuation, ValuationRepositoryTrait};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timestamp() -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()
}

#[derive(Default)]
struct State {
    next_id: i64,
    portfolios: Vec<Portfolio>,
    funds: Vec<PortfolioFund>,
    activities: Vec<Activity>,
    fund_valuations: Vec<FundValuation>,
    portfolio_valuations: Vec<PortfolioValuation>,
    stored_irrs: Vec<StoredIrr>,
    schedules: Vec<ScheduledTransaction>,
    /// Funds whose activity writes fail.
    failing_activity_funds: HashSet<i64>,
    /// Dates on which activity writes fail.
    failing_activity_dates: HashSet<NaiveDate>,
    /// Write calls in order, e.g. `activity:1:2024-01-01`.
    calls: Vec<String>,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One store behind every repository trait.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_portfolio(&self, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.portfolios.push(Portfolio {
            id,
            name: name.to_string(),
            created_at: timestamp(),
        });
        id
    }

    pub fn add_fund(&self, portfolio_id: i64, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.funds.push(PortfolioFund {
            id,
            portfolio_id,
            fund_name: name.to_string(),
            status: Default::default(),
            start_date: None,
            created_at: timestamp(),
        });
        id
    }

    pub fn add_activity(&self, new_activity: NewActivity) {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.activities.push(Activity {
            id,
            portfolio_fund_id: new_activity.portfolio_fund_id,
            activity_type: new_activity.activity_type,
            activity_timestamp: new_activity.activity_timestamp,
            amount: new_activity.amount,
            created_at: timestamp(),
        });
    }

    pub fn add_valuation(&self, portfolio_fund_id: i64, on: NaiveDate, valuation: Decimal) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.fund_valuations.push(FundValuation {
            id,
            portfolio_fund_id,
            valuation_date: on,
            valuation,
            created_at: timestamp(),
        });
        id
    }

    pub fn add_unlinked_irr(&self, subject: IrrSubject, on: NaiveDate, irr_result: Decimal) {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.stored_irrs.push(StoredIrr {
            id,
            subject,
            irr_date: on,
            irr_result,
            valuation_id: None,
            created_at: timestamp(),
            updated_at: timestamp(),
        });
    }

    pub fn fail_activities_for(&self, portfolio_fund_id: i64) {
        self.state
            .lock()
            .unwrap()
            .failing_activity_funds
            .insert(portfolio_fund_id);
    }

    pub fn fail_activities_on(&self, on: NaiveDate) {
        self.state.lock().unwrap().failing_activity_dates.insert(on);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_activity_funds.clear();
        state.failing_activity_dates.clear();
    }

    pub fn activity_dates(&self, portfolio_fund_id: i64) -> Vec<NaiveDate> {
        self.state
            .lock()
            .unwrap()
            .activities
            .iter()
            .filter(|a| a.portfolio_fund_id == portfolio_fund_id)
            .map(|a| a.activity_timestamp)
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn activity_count(&self) -> usize {
        self.state.lock().unwrap().activities.len()
    }

    pub fn stored_irrs(&self) -> Vec<StoredIrr> {
        self.state.lock().unwrap().stored_irrs.clone()
    }

    pub fn portfolio_valuations(&self) -> Vec<PortfolioValuation> {
        self.state.lock().unwrap().portfolio_valuations.clone()
    }

    /// IRR service over this store with a fresh cache.
    pub fn irr_service(&self, cache: Arc<IrrCache>) -> IrrService {
        let store = Arc::new(self.clone());
        IrrService::new(store.clone(), store.clone(), store.clone(), store, cache)
    }
}

#[async_trait]
impl PortfolioRepositoryTrait for InMemoryStore {
    async fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        let id = self.add_portfolio(&new_portfolio.name);
        Ok(self.get_portfolio(id)?.unwrap())
    }

    async fn create_fund(&self, new_fund: NewPortfolioFund) -> Result<PortfolioFund> {
        let id = self.add_fund(new_fund.portfolio_id, &new_fund.fund_name);
        Ok(self.get_fund(id)?.unwrap())
    }

    fn get_portfolio(&self, portfolio_id: i64) -> Result<Option<Portfolio>> {
        let state = self.state.lock().unwrap();
        Ok(state.portfolios.iter().find(|p| p.id == portfolio_id).cloned())
    }

    fn get_fund(&self, portfolio_fund_id: i64) -> Result<Option<PortfolioFund>> {
        let state = self.state.lock().unwrap();
        Ok(state.funds.iter().find(|f| f.id == portfolio_fund_id).cloned())
    }

    fn get_funds_by_ids(&self, portfolio_fund_ids: &[i64]) -> Result<Vec<PortfolioFund>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .funds
            .iter()
            .filter(|f| portfolio_fund_ids.contains(&f.id))
            .cloned()
            .collect())
    }

    fn get_funds_for_portfolio(&self, portfolio_id: i64) -> Result<Vec<PortfolioFund>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .funds
            .iter()
            .filter(|f| f.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityRepositoryTrait for InMemoryStore {
    async fn create_activity(&self, new_activity: NewActivity) -> Result<Activity> {
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!(
                "activity:{}:{}",
                new_activity.portfolio_fund_id, new_activity.activity_timestamp
            ));
            if state
                .failing_activity_funds
                .contains(&new_activity.portfolio_fund_id)
                || state
                    .failing_activity_dates
                    .contains(&new_activity.activity_timestamp)
                || !state.funds.iter().any(|f| f.id == new_activity.portfolio_fund_id)
            {
                return Err(DatabaseError::ForeignKeyViolation(format!(
                    "portfolio fund {} rejected",
                    new_activity.portfolio_fund_id
                ))
                .into());
            }
        }
        self.add_activity(new_activity);
        let state = self.state.lock().unwrap();
        state
            .activities
            .last()
            .cloned()
            .ok_or_else(|| Error::Unexpected("activity missing".to_string()))
    }

    fn get_activities_for_funds(&self, portfolio_fund_ids: &[i64], as_of: NaiveDate) -> Result<Vec<Activity>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Activity> = state
            .activities
            .iter()
            .filter(|a| portfolio_fund_ids.contains(&a.portfolio_fund_id) && a.activity_timestamp <= as_of)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.activity_timestamp, a.id));
        Ok(rows)
    }

    fn get_first_activity_date(&self, portfolio_fund_id: i64) -> Result<Option<NaiveDate>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .activities
            .iter()
            .filter(|a| a.portfolio_fund_id == portfolio_fund_id)
            .map(|a| a.activity_timestamp)
            .min())
    }
}

#[async_trait]
impl ValuationRepositoryTrait for InMemoryStore {
    async fn upsert_fund_valuation(&self, valuation: NewFundValuation) -> Result<FundValuation> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!(
            "valuation:{}:{}",
            valuation.portfolio_fund_id, valuation.valuation_date
        ));
        if let Some(existing) = state.fund_valuations.iter_mut().find(|v| {
            v.portfolio_fund_id == valuation.portfolio_fund_id && v.valuation_date == valuation.valuation_date
        }) {
            existing.valuation = valuation.valuation;
            return Ok(existing.clone());
        }
        let id = state.id();
        let row = FundValuation {
            id,
            portfolio_fund_id: valuation.portfolio_fund_id,
            valuation_date: valuation.valuation_date,
            valuation: valuation.valuation,
            created_at: timestamp(),
        };
        state.fund_valuations.push(row.clone());
        Ok(row)
    }

    async fn upsert_portfolio_valuation(
        &self,
        portfolio_id: i64,
        valuation_date: NaiveDate,
        value: Decimal,
    ) -> Result<PortfolioValuation> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .portfolio_valuations
            .iter_mut()
            .find(|v| v.portfolio_id == portfolio_id && v.valuation_date == valuation_date)
        {
            existing.value = value;
            return Ok(existing.clone());
        }
        let id = state.id();
        let row = PortfolioValuation {
            id,
            portfolio_id,
            valuation_date,
            value,
            created_at: timestamp(),
        };
        state.portfolio_valuations.push(row.clone());
        Ok(row)
    }

    fn get_latest_fund_valuation(&self, portfolio_fund_id: i64, as_of: NaiveDate) -> Result<Option<FundValuation>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .fund_valuations
            .iter()
            .filter(|v| v.portfolio_fund_id == portfolio_fund_id && v.valuation_date <= as_of)
            .max_by_key(|v| v.valuation_date)
            .cloned())
    }

    fn get_fund_valuation_on(&self, portfolio_fund_id: i64, valuation_date: NaiveDate) -> Result<Option<FundValuation>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .fund_valuations
            .iter()
            .find(|v| v.portfolio_fund_id == portfolio_fund_id && v.valuation_date == valuation_date)
            .cloned())
    }

    fn get_fund_valuations_on(&self, portfolio_fund_ids: &[i64], valuation_date: NaiveDate) -> Result<Vec<FundValuation>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .fund_valuations
            .iter()
            .filter(|v| portfolio_fund_ids.contains(&v.portfolio_fund_id) && v.valuation_date == valuation_date)
            .cloned()
            .collect())
    }

    fn get_fund_valuation_dates_from(&self, portfolio_fund_id: i64, from: NaiveDate) -> Result<Vec<NaiveDate>> {
        let state = self.state.lock().unwrap();
        let mut dates: Vec<NaiveDate> = state
            .fund_valuations
            .iter()
            .filter(|v| v.portfolio_fund_id == portfolio_fund_id && v.valuation_date >= from)
            .map(|v| v.valuation_date)
            .collect();
        dates.sort();
        Ok(dates)
    }
}

#[async_trait]
impl StoredIrrRepositoryTrait for InMemoryStore {
    async fn upsert_stored_irr(
        &self,
        subject: IrrSubject,
        irr_date: NaiveDate,
        irr_result: Decimal,
        valuation_id: Option<i64>,
    ) -> Result<StoredIrr> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .stored_irrs
            .iter_mut()
            .find(|r| r.subject == subject && r.irr_date == irr_date)
        {
            existing.irr_result = irr_result;
            if valuation_id.is_some() {
                existing.valuation_id = valuation_id;
            }
            return Ok(existing.clone());
        }
        let id = state.id();
        let row = StoredIrr {
            id,
            subject,
            irr_date,
            irr_result,
            valuation_id,
            created_at: timestamp(),
            updated_at: timestamp(),
        };
        state.stored_irrs.push(row.clone());
        Ok(row)
    }

    fn get_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<Option<StoredIrr>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stored_irrs
            .iter()
            .find(|r| r.subject == subject && r.irr_date == irr_date)
            .cloned())
    }

    fn count_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stored_irrs
            .iter()
            .filter(|r| r.subject == subject && r.irr_date == irr_date)
            .count() as i64)
    }

    fn get_unlinked_stored_irrs(&self) -> Result<Vec<StoredIrr>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stored_irrs
            .iter()
            .filter(|r| r.valuation_id.is_none())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScheduledTransactionRepositoryTrait for InMemoryStore {
    async fn create(&self, new_schedule: NewScheduledTransaction) -> Result<ScheduledTransaction> {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let row = ScheduledTransaction {
            id,
            portfolio_fund_id: new_schedule.portfolio_fund_id,
            activity_type: new_schedule.activity_type,
            amount: new_schedule.amount,
            recurrence: new_schedule.recurrence,
            next_execution_date: new_schedule.next_execution_date,
            status: ScheduleStatus::Active,
            max_executions: new_schedule.max_executions,
            total_executions: 0,
            last_executed_date: None,
        };
        state.schedules.push(row.clone());
        Ok(row)
    }

    fn list(&self) -> Result<Vec<ScheduledTransaction>> {
        Ok(self.state.lock().unwrap().schedules.clone())
    }

    fn get_by_id(&self, id: i64) -> Result<Option<ScheduledTransaction>> {
        let state = self.state.lock().unwrap();
        Ok(state.schedules.iter().find(|s| s.id == id).cloned())
    }

    fn get_due(&self, today: NaiveDate) -> Result<Vec<ScheduledTransaction>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .schedules
            .iter()
            .filter(|s| s.status == ScheduleStatus::Active && s.next_execution_date <= today)
            .cloned()
            .collect())
    }

    async fn advance_execution(
        &self,
        id: i64,
        expected_next: NaiveDate,
        expected_total: i32,
        update: ScheduleExecutionUpdate,
    ) -> Result<Option<ScheduledTransaction>> {
        let mut state = self.state.lock().unwrap();
        let Some(schedule) = state.schedules.iter_mut().find(|s| {
            s.id == id
                && s.next_execution_date == expected_next
                && s.total_executions == expected_total
        }) else {
            return Ok(None);
        };
        schedule.next_execution_date = update.next_execution_date;
        schedule.total_executions = update.total_executions;
        schedule.last_executed_date = update.last_executed_date;
        schedule.status = update.status;
        Ok(Some(schedule.clone()))
    }

    async fn update_status(&self, id: i64, status: ScheduleStatus) -> Result<ScheduledTransaction> {
        let mut state = self.state.lock().unwrap();
        let schedule = state
            .schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Scheduled transaction {}", id)))?;
        schedule.status = status;
        Ok(schedule.clone())
    }
}
