/// Activity types
///
/// Each constant is the canonical label stored in the activity log.

/// Lump-sum investment into a fund. Money leaves the client.
pub const ACTIVITY_TYPE_INVESTMENT: &str = "Investment";

/// Recurring investment into a fund. Money leaves the client.
pub const ACTIVITY_TYPE_REGULAR_INVESTMENT: &str = "RegularInvestment";

/// Government top-up (tax relief) credited to a fund. Treated as extra investment.
pub const ACTIVITY_TYPE_GOVERNMENT_UPLIFT: &str = "GovernmentUplift";

/// Money switched into this fund from another fund of the same product.
pub const ACTIVITY_TYPE_FUND_SWITCH_IN: &str = "FundSwitchIn";

/// Money switched into this fund from another product.
pub const ACTIVITY_TYPE_PRODUCT_SWITCH_IN: &str = "ProductSwitchIn";

/// Lump-sum withdrawal from a fund. Money returns to the client.
pub const ACTIVITY_TYPE_WITHDRAWAL: &str = "Withdrawal";

/// Recurring withdrawal from a fund. Money returns to the client.
pub const ACTIVITY_TYPE_REGULAR_WITHDRAWAL: &str = "RegularWithdrawal";

/// Money switched out of this fund into another fund of the same product.
pub const ACTIVITY_TYPE_FUND_SWITCH_OUT: &str = "FundSwitchOut";

/// Money switched out of this fund into another product.
pub const ACTIVITY_TYPE_PRODUCT_SWITCH_OUT: &str = "ProductSwitchOut";

/// Legacy labels still found in older activity logs.
pub const ACTIVITY_TYPE_SWITCH_IN_LEGACY: &str = "SwitchIn";
pub const ACTIVITY_TYPE_SWITCH_OUT_LEGACY: &str = "SwitchOut";
pub const ACTIVITY_TYPE_TAX_UPLIFT_LEGACY: &str = "TaxUplift";
