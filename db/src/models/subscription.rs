use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(serialize_with = "amount_as_float")]
    pub amount: BigDecimal,
    pub interval: String, // monthly or yearly
    pub next_billing_date: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Subscription {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

fn amount_as_float<S: Serializer>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(amount.to_f64().unwrap_or_default())
}
