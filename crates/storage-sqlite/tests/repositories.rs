use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

use wealthdesk_core::activities::{ActivityRepositoryTrait, ActivityType, NewActivity};
use wealthdesk_core::errors::{DatabaseError, Error};
use wealthdesk_core::irr::{
    IrrCache, IrrService, IrrServiceTrait, IrrSubject, StoredIrrRepositoryTrait,
};
use wealthdesk_core::portfolios::{NewPortfolio, NewPortfolioFund, PortfolioRepositoryTrait};
use wealthdesk_core::scheduled::{
    NewScheduledTransaction, Recurrence, ScheduleExecutionUpdate, ScheduleStatus,
    ScheduledTransactionRepositoryTrait, ScheduledTransactionService,
    ScheduledTransactionServiceTrait,
};
use wealthdesk_core::transactions::OrderedTransactionService;
use wealthdesk_core::valuations::{NewFundValuation, ValuationRepositoryTrait};
use wealthdesk_storage_sqlite::{
    create_pool, run_migrations, spawn_writer, ActivityRepository, DbPool, PortfolioRepository,
    ScheduledTransactionRepository, StoredIrrRepository, ValuationRepository, WriteHandle,
};

struct TestDb {
    _dir: TempDir,
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TestDb {
    fn portfolios(&self) -> PortfolioRepository {
        PortfolioRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn activities(&self) -> ActivityRepository {
        ActivityRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn valuations(&self) -> ValuationRepository {
        ValuationRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn irrs(&self) -> StoredIrrRepository {
        StoredIrrRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn schedules(&self) -> ScheduledTransactionRepository {
        ScheduledTransactionRepository::new(self.pool.clone(), self.writer.clone())
    }

    /// Creates a portfolio holding `count` funds and returns their ids.
    async fn seed(&self, count: usize) -> (i64, Vec<i64>) {
        let repo = self.portfolios();
        let portfolio = repo
            .create_portfolio(NewPortfolio {
                name: "Main".to_string(),
            })
            .await
            .unwrap();
        let mut funds = Vec::new();
        for i in 0..count {
            let fund = repo
                .create_fund(NewPortfolioFund {
                    portfolio_id: portfolio.id,
                    fund_name: format!("Fund {}", i),
                    status: Default::default(),
                    start_date: None,
                })
                .await
                .unwrap();
            funds.push(fund.id);
        }
        (portfolio.id, funds)
    }
}

fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db").to_string_lossy().into_owned();
    let pool = create_pool(&db_path).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer((*pool).clone());
    TestDb {
        _dir: dir,
        pool,
        writer,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn activity(fund: i64, activity_type: ActivityType, on: NaiveDate, amount: rust_decimal::Decimal) -> NewActivity {
    NewActivity {
        portfolio_fund_id: fund,
        activity_type,
        activity_timestamp: on,
        amount,
    }
}

#[tokio::test]
async fn test_funds_are_looked_up_by_id_and_portfolio() {
    let db = setup();
    let (portfolio, funds) = db.seed(3).await;
    let repo = db.portfolios();

    let found = repo.get_funds_by_ids(&[funds[2], 999, funds[0]]).unwrap();
    let ids: Vec<i64> = found.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![funds[0], funds[2]]);

    assert_eq!(repo.get_funds_for_portfolio(portfolio).unwrap().len(), 3);
    assert!(repo.get_portfolio(portfolio).unwrap().is_some());
    assert!(repo.get_fund(12345).unwrap().is_none());
}

#[tokio::test]
async fn test_activities_are_ordered_and_cut_at_as_of() {
    let db = setup();
    let (_, funds) = db.seed(2).await;
    let repo = db.activities();
    repo.create_activity(activity(funds[1], ActivityType::Investment, date(2023, 3, 1), dec!(50)))
        .await
        .unwrap();
    let first = repo
        .create_activity(activity(funds[0], ActivityType::Investment, date(2023, 1, 1), dec!(1000)))
        .await
        .unwrap();
    repo.create_activity(activity(funds[0], ActivityType::Withdrawal, date(2023, 3, 1), dec!(25.5)))
        .await
        .unwrap();
    repo.create_activity(activity(funds[0], ActivityType::Investment, date(2024, 6, 1), dec!(10)))
        .await
        .unwrap();

    let loaded = repo
        .get_activities_for_funds(&funds, date(2024, 1, 1))
        .unwrap();

    let summary: Vec<(i64, NaiveDate)> = loaded
        .iter()
        .map(|a| (a.portfolio_fund_id, a.activity_timestamp))
        .collect();
    assert_eq!(
        summary,
        vec![
            (funds[0], date(2023, 1, 1)),
            (funds[1], date(2023, 3, 1)),
            (funds[0], date(2023, 3, 1)),
        ]
    );
    assert_eq!(loaded[2].amount, dec!(25.5));
    assert_eq!(loaded[2].signed_amount(), dec!(25.5));
    assert_eq!(loaded[0].id, first.id);
    assert_eq!(
        repo.get_first_activity_date(funds[0]).unwrap(),
        Some(date(2023, 1, 1))
    );
}

#[tokio::test]
async fn test_activity_for_unknown_fund_is_rejected() {
    let db = setup();

    let err = db
        .activities()
        .create_activity(activity(404, ActivityType::Investment, date(2023, 1, 1), dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Database(DatabaseError::ForeignKeyViolation(_))
    ));
}

#[tokio::test]
async fn test_fund_valuation_upsert_replaces_value() {
    let db = setup();
    let (_, funds) = db.seed(1).await;
    let repo = db.valuations();
    let fund = funds[0];

    let first = repo
        .upsert_fund_valuation(NewFundValuation {
            portfolio_fund_id: fund,
            valuation_date: date(2024, 1, 1),
            valuation: dec!(1000),
        })
        .await
        .unwrap();
    let second = repo
        .upsert_fund_valuation(NewFundValuation {
            portfolio_fund_id: fund,
            valuation_date: date(2024, 1, 1),
            valuation: dec!(1100.25),
        })
        .await
        .unwrap();
    repo.upsert_fund_valuation(NewFundValuation {
        portfolio_fund_id: fund,
        valuation_date: date(2023, 6, 30),
        valuation: dec!(900),
    })
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.valuation, dec!(1100.25));
    let latest = repo
        .get_latest_fund_valuation(fund, date(2023, 12, 31))
        .unwrap()
        .unwrap();
    assert_eq!(latest.valuation_date, date(2023, 6, 30));
    assert_eq!(
        repo.get_fund_valuation_dates_from(fund, date(2023, 7, 1)).unwrap(),
        vec![date(2024, 1, 1)]
    );
    assert_eq!(
        repo.get_fund_valuations_on(&[fund], date(2024, 1, 1))
            .unwrap()
            .len(),
        1
    );
    assert!(repo
        .get_fund_valuation_on(fund, date(2024, 1, 2))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_stored_irr_upsert_keeps_one_row_and_link() {
    let db = setup();
    let (_, funds) = db.seed(1).await;
    let repo = db.irrs();
    let subject = IrrSubject::Fund(funds[0]);
    let on = date(2024, 1, 1);

    let first = repo
        .upsert_stored_irr(subject, on, dec!(10.00), Some(7))
        .await
        .unwrap();
    let second = repo
        .upsert_stored_irr(subject, on, dec!(11.50), None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.irr_result, dec!(11.50));
    assert_eq!(second.valuation_id, Some(7));
    assert_eq!(repo.count_stored_irr(subject, on).unwrap(), 1);
    assert!(repo.get_unlinked_stored_irrs().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_upserts_for_one_key_leave_one_row() {
    let db = setup();
    let (portfolio, _) = db.seed(1).await;
    let a = db.irrs();
    let b = db.irrs();
    let subject = IrrSubject::Portfolio(portfolio);
    let on = date(2024, 3, 31);

    let (left, right) = tokio::join!(
        a.upsert_stored_irr(subject, on, dec!(4.20), None),
        b.upsert_stored_irr(subject, on, dec!(4.30), None)
    );

    let left = left.unwrap();
    let right = right.unwrap();
    assert_eq!(left.id, right.id);
    assert_eq!(a.count_stored_irr(subject, on).unwrap(), 1);
    let stored = a.get_stored_irr(subject, on).unwrap().unwrap();
    assert!(stored.irr_result == dec!(4.20) || stored.irr_result == dec!(4.30));
    assert_eq!(a.get_unlinked_stored_irrs().unwrap().len(), 1);
}

#[tokio::test]
async fn test_schedule_lifecycle() {
    let db = setup();
    let (_, funds) = db.seed(1).await;
    let repo = db.schedules();

    let created = repo
        .create(NewScheduledTransaction {
            portfolio_fund_id: funds[0],
            activity_type: ActivityType::RegularInvestment,
            amount: dec!(250),
            recurrence: Recurrence::Monthly,
            next_execution_date: date(2024, 1, 31),
            max_executions: Some(12),
        })
        .await
        .unwrap();
    assert_eq!(created.status, ScheduleStatus::Active);
    assert_eq!(created.total_executions, 0);

    assert!(repo.get_due(date(2024, 1, 30)).unwrap().is_empty());
    assert_eq!(repo.get_due(date(2024, 1, 31)).unwrap().len(), 1);

    let update = ScheduleExecutionUpdate {
        next_execution_date: date(2024, 2, 29),
        total_executions: 1,
        last_executed_date: Some(date(2024, 1, 31)),
        status: ScheduleStatus::Active,
    };
    let advanced = repo
        .advance_execution(created.id, date(2024, 1, 31), 0, update.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(advanced.next_execution_date, date(2024, 2, 29));
    assert_eq!(advanced.last_executed_date, Some(date(2024, 1, 31)));

    // A second claim from the same stale read no longer matches.
    let stale = repo
        .advance_execution(created.id, date(2024, 1, 31), 0, update)
        .await
        .unwrap();
    assert!(stale.is_none());
    assert_eq!(repo.get_by_id(created.id).unwrap().unwrap().total_executions, 1);

    repo.update_status(created.id, ScheduleStatus::Paused)
        .await
        .unwrap();
    assert!(repo.get_due(date(2025, 1, 1)).unwrap().is_empty());

    let missing = repo
        .update_status(9999, ScheduleStatus::Paused)
        .await
        .unwrap_err();
    assert_eq!(missing.reason_class(), "not_found");
}

#[tokio::test]
async fn test_irr_service_persists_through_sqlite() {
    let db = setup();
    let (portfolio, funds) = db.seed(2).await;
    let activities = db.activities();
    let valuations = db.valuations();
    for fund in &funds {
        activities
            .create_activity(activity(*fund, ActivityType::Investment, date(2023, 1, 1), dec!(1000)))
            .await
            .unwrap();
    }
    valuations
        .upsert_fund_valuation(NewFundValuation {
            portfolio_fund_id: funds[0],
            valuation_date: date(2024, 1, 1),
            valuation: dec!(1150),
        })
        .await
        .unwrap();
    valuations
        .upsert_fund_valuation(NewFundValuation {
            portfolio_fund_id: funds[1],
            valuation_date: date(2024, 1, 1),
            valuation: dec!(1050),
        })
        .await
        .unwrap();

    let service = IrrService::new(
        Arc::new(db.portfolios()),
        Arc::new(db.activities()),
        Arc::new(db.valuations()),
        Arc::new(db.irrs()),
        Arc::new(IrrCache::default()),
    );

    let fund_irr = service
        .recalculate_fund_irr(funds[0], date(2024, 1, 1))
        .await
        .unwrap();
    let again = service
        .recalculate_fund_irr(funds[0], date(2024, 1, 1))
        .await
        .unwrap();
    let portfolio_irr = service
        .calculate_portfolio_irr(portfolio, date(2024, 1, 1))
        .await
        .unwrap();

    assert_eq!(fund_irr.id, again.id);
    assert_eq!(fund_irr.irr_result, dec!(15.00));
    assert!(fund_irr.valuation_id.is_some());
    assert_eq!(portfolio_irr.total_valuation, dec!(2200));
    assert_eq!(portfolio_irr.irr_percentage, dec!(10.00));
    assert!(portfolio_irr.stored.valuation_id.is_some());
}

#[tokio::test]
async fn test_concurrent_schedule_runs_write_each_occurrence_once() {
    let db = setup();
    let (_, funds) = db.seed(1).await;
    let irr_service = Arc::new(IrrService::new(
        Arc::new(db.portfolios()),
        Arc::new(db.activities()),
        Arc::new(db.valuations()),
        Arc::new(db.irrs()),
        Arc::new(IrrCache::default()),
    ));
    let coordinator = Arc::new(OrderedTransactionService::new(
        Arc::new(db.activities()),
        Arc::new(db.valuations()),
        Arc::new(db.portfolios()),
        irr_service,
    ));
    let service = ScheduledTransactionService::new(
        Arc::new(db.schedules()),
        Arc::new(db.portfolios()),
        coordinator,
    );
    let schedule = service
        .create_schedule(NewScheduledTransaction {
            portfolio_fund_id: funds[0],
            activity_type: ActivityType::RegularInvestment,
            amount: dec!(100),
            recurrence: Recurrence::Monthly,
            next_execution_date: date(2024, 1, 15),
            max_executions: None,
        })
        .await
        .unwrap();

    let (left, right) = tokio::join!(
        service.execute_due(date(2024, 4, 20)),
        service.execute_due(date(2024, 4, 20))
    );

    let created = left.unwrap().activities_created + right.unwrap().activities_created;
    assert_eq!(created, 4);
    let saved = db
        .activities()
        .get_activities_for_funds(&funds, date(2024, 12, 31))
        .unwrap();
    assert_eq!(saved.len(), 4);
    let stored = db.schedules().get_by_id(schedule.id).unwrap().unwrap();
    assert_eq!(stored.total_executions, 4);
    assert_eq!(stored.next_execution_date, date(2024, 5, 15));
}
