/// Decimal precision for stored rates
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for percentages surfaced to callers
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Default lifetime of an IRR cache entry
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 30;

/// Day-count basis used to annualize cash-flow timing
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Label used in cache keys when no calculation date is given
pub const LATEST_CALCULATION_DATE: &str = "latest";

/// Method label reported with every IRR calculation
pub const IRR_CALCULATION_METHOD: &str = "xirr_newton_bisection";
