use bigdecimal::BigDecimal;
use chrono::NaiveDate;

pub struct SubscriptionCreateRequest {
    pub user_id: i64,
    pub name: String,
    pub amount: BigDecimal,
    pub interval: String,
    pub next_billing_date: NaiveDate,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SubscriptionUpdateRequest {
    pub name: Option<String>,
    pub amount: Option<BigDecimal>,
    pub interval: Option<String>,
    pub next_billing_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}
