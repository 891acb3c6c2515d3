use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Signed, Zero};
use common::{
    error::{AppError, Res},
    validators::{validate_date, validate_subscription_interval},
};
use db::{
    dtos::subscription::{SubscriptionCreateRequest, SubscriptionUpdateRequest},
    models::{audit_log::AuditLog, subscription::Subscription},
};
use serde::Serialize;
use serde_json::{Map, Value};

const MAX_NAME_LEN: usize = 200;
/// NUMERIC(10,2) holds at most eight integer digits.
const AMOUNT_LIMIT: i64 = 100_000_000;
const MAX_INTEGER_DIGITS: i64 = 8;
/// Anything below 0.001 rounds to zero cents.
const MIN_INTEGER_DIGITS: i64 = -2;

const NAME_REQUIRED: &str = "Subscription name is required";
const NAME_TOO_LONG: &str = "Subscription name is too long (max 200 characters)";
const AMOUNT_REQUIRED: &str = "Amount is required";
const AMOUNT_INVALID: &str = "Invalid amount";
const AMOUNT_NOT_POSITIVE: &str = "Amount must be a positive number";
const AMOUNT_TOO_LARGE: &str = "Amount is too large";
const INTERVAL_INVALID: &str = "Interval must be 'monthly' or 'yearly'";
const DATE_INVALID: &str = "Invalid next billing date (format: YYYY-MM-DD)";
const IS_ACTIVE_INVALID: &str = "is_active must be a boolean";

#[derive(Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
}

#[derive(Serialize)]
pub struct AuditLogsResponse {
    pub audit_logs: Vec<AuditLog>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Decodes a request body into a non-empty JSON object.
pub fn read_payload(body: &[u8]) -> Res<Map<String, Value>> {
    let no_data = || AppError::BadRequest("No data provided".to_string());

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(no_data());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(_) => Err(no_data()),
        Err(e) => Err(AppError::BadRequest(format!("Malformed JSON payload: {}", e))),
    }
}

/// Validates a full subscription for `user_id`, reporting every bad field at once.
pub fn parse_create(user_id: i64, payload: &Map<String, Value>) -> Res<SubscriptionCreateRequest> {
    let mut errors = Vec::new();

    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let name = collect(&mut errors, parse_name(name));

    let amount = match payload.get("amount") {
        None | Some(Value::Null) => {
            errors.push(AMOUNT_REQUIRED.to_string());
            None
        }
        Some(value) => collect(&mut errors, parse_amount(value)),
    };

    let interval = payload
        .get("interval")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let interval = collect(&mut errors, parse_interval(interval));

    let date = payload
        .get("next_billing_date")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let next_billing_date = collect(&mut errors, parse_date(date.trim()));

    match (name, amount, interval, next_billing_date) {
        (Some(name), Some(amount), Some(interval), Some(next_billing_date)) if errors.is_empty() => {
            Ok(SubscriptionCreateRequest {
                user_id,
                name,
                amount,
                interval,
                next_billing_date,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

/// Validates the supplied subset of fields; absent keys stay `None`.
///
/// A key that is present with a `null` or mistyped value is invalid, it is
/// never treated as absent.
pub fn parse_update(payload: &Map<String, Value>) -> Res<SubscriptionUpdateRequest> {
    let mut errors = Vec::new();
    let mut update = SubscriptionUpdateRequest::default();

    if let Some(value) = payload.get("name") {
        update.name = collect(&mut errors, value.as_str().ok_or(NAME_REQUIRED).and_then(parse_name));
    }

    if let Some(value) = payload.get("amount") {
        update.amount = collect(&mut errors, parse_amount(value));
    }

    if let Some(value) = payload.get("interval") {
        update.interval = collect(
            &mut errors,
            value.as_str().ok_or(INTERVAL_INVALID).and_then(parse_interval),
        );
    }

    if let Some(value) = payload.get("next_billing_date") {
        update.next_billing_date =
            collect(&mut errors, value.as_str().ok_or(DATE_INVALID).and_then(parse_date));
    }

    if let Some(value) = payload.get("is_active") {
        update.is_active = collect(&mut errors, value.as_bool().ok_or(IS_ACTIVE_INVALID));
    }

    if errors.is_empty() {
        Ok(update)
    } else {
        Err(AppError::Validation(errors))
    }
}

fn collect<T>(errors: &mut Vec<String>, result: Result<T, &'static str>) -> Option<T> {
    result.map_err(|e| errors.push(e.to_string())).ok()
}

fn parse_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.is_empty() {
        Err(NAME_REQUIRED)
    } else if name.chars().count() > MAX_NAME_LEN {
        Err(NAME_TOO_LONG)
    } else {
        Ok(name.to_string())
    }
}

/// Accepts JSON numbers and numeric strings, rounded to cents.
fn parse_amount(value: &Value) -> Result<BigDecimal, &'static str> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(AMOUNT_INVALID),
    };

    let amount = BigDecimal::from_str(&text).map_err(|_| AMOUNT_INVALID)?;
    if !amount.is_positive() {
        return Err(AMOUNT_NOT_POSITIVE);
    }

    // Exponent notation can carry any scale; bound the magnitude before
    // rescaling so rounding never builds a huge integer.
    let (_, scale) = amount.as_bigint_and_exponent();
    let integer_digits = i64::try_from(amount.digits())
        .unwrap_or(i64::MAX)
        .saturating_sub(scale);
    if integer_digits > MAX_INTEGER_DIGITS {
        return Err(AMOUNT_TOO_LARGE);
    }
    if integer_digits < MIN_INTEGER_DIGITS {
        return Err(AMOUNT_NOT_POSITIVE);
    }

    let amount = amount.with_scale_round(2, RoundingMode::HalfUp);
    if amount <= BigDecimal::zero() {
        Err(AMOUNT_NOT_POSITIVE)
    } else if amount >= BigDecimal::from(AMOUNT_LIMIT) {
        Err(AMOUNT_TOO_LARGE)
    } else {
        Ok(amount)
    }
}

fn parse_interval(raw: &str) -> Result<String, &'static str> {
    let interval = raw.trim().to_lowercase();
    if validate_subscription_interval(&interval) {
        Ok(interval)
    } else {
        Err(INTERVAL_INVALID)
    }
}

fn parse_date(raw: &str) -> Result<chrono::NaiveDate, &'static str> {
    match validate_date(raw) {
        (true, Some(date)) => Ok(date),
        _ => Err(DATE_INVALID),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn create_errors(value: Value) -> Vec<String> {
        match parse_create(1, &object(value)) {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other.map(|r| r.name)),
        }
    }

    fn update_errors(value: Value) -> Vec<String> {
        match parse_update(&object(value)) {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn empty_or_non_object_bodies_carry_no_data() {
        for body in [&b""[..], b"  ", b"{}", b"[]", b"null", b"[1, 2]", b"\"netflix\""] {
            match read_payload(body) {
                Err(AppError::BadRequest(msg)) => assert_eq!(msg, "No data provided"),
                other => panic!("unexpected {other:?} for {body:?}"),
            }
        }
        assert!(matches!(read_payload(b"{name"), Err(AppError::BadRequest(_))));
        assert_eq!(read_payload(br#"{"name":"x"}"#).unwrap().len(), 1);
    }

    #[test]
    fn create_normalizes_fields() {
        let req = parse_create(
            4,
            &object(json!({
                "name": "  Netflix ",
                "amount": "9.999",
                "interval": " Monthly",
                "next_billing_date": " 2030-01-15 ",
            })),
        )
        .unwrap();

        assert_eq!(req.user_id, 4);
        assert_eq!(req.name, "Netflix");
        assert_eq!(req.amount, BigDecimal::from_str("10.00").unwrap());
        assert_eq!(req.interval, "monthly");
        assert_eq!(req.next_billing_date, NaiveDate::from_ymd_opt(2030, 1, 15).unwrap());
    }

    #[test]
    fn create_accepts_json_numbers() {
        let req = parse_create(
            1,
            &object(json!({
                "name": "Spotify",
                "amount": 9.99,
                "interval": "yearly",
                "next_billing_date": "2030-02-28",
            })),
        )
        .unwrap();
        assert_eq!(req.amount, BigDecimal::from_str("9.99").unwrap());
    }

    #[test]
    fn create_reports_every_field_in_order() {
        assert_eq!(
            create_errors(json!({ "name": " " })),
            vec![NAME_REQUIRED, AMOUNT_REQUIRED, INTERVAL_INVALID, DATE_INVALID]
        );
        assert_eq!(
            create_errors(json!({
                "name": "x".repeat(201),
                "amount": "abc",
                "interval": "weekly",
                "next_billing_date": "2030-02-30",
            })),
            vec![NAME_TOO_LONG, AMOUNT_INVALID, INTERVAL_INVALID, DATE_INVALID]
        );
    }

    #[test]
    fn amount_bounds() {
        let base = |amount: Value| {
            json!({
                "name": "Gym",
                "amount": amount,
                "interval": "monthly",
                "next_billing_date": "2030-01-01",
            })
        };

        assert_eq!(create_errors(base(json!(0))), vec![AMOUNT_NOT_POSITIVE]);
        assert_eq!(create_errors(base(json!(-5))), vec![AMOUNT_NOT_POSITIVE]);
        assert_eq!(create_errors(base(json!("0.001"))), vec![AMOUNT_NOT_POSITIVE]);
        assert_eq!(create_errors(base(json!(100_000_000))), vec![AMOUNT_TOO_LARGE]);
        assert_eq!(create_errors(base(json!(true))), vec![AMOUNT_INVALID]);
        assert_eq!(create_errors(base(json!("NaN"))), vec![AMOUNT_INVALID]);
        assert_eq!(create_errors(base(json!("99999999.995"))), vec![AMOUNT_TOO_LARGE]);
        assert!(parse_create(1, &object(base(json!("99999999.99")))).is_ok());
    }

    #[test]
    fn amounts_round_half_up_to_cents() {
        let cases = [("0.125", "0.13"), ("0.005", "0.01"), ("2.675", "2.68"), ("1.994", "1.99")];
        for (raw, cents) in cases {
            assert_eq!(
                parse_amount(&json!(raw)),
                Ok(BigDecimal::from_str(cents).unwrap()),
                "{raw}"
            );
        }
        assert_eq!(parse_amount(&json!("0.0049")), Err(AMOUNT_NOT_POSITIVE));
    }

    #[test]
    fn huge_exponents_are_rejected_without_rescaling() {
        let started = std::time::Instant::now();
        assert_eq!(parse_amount(&json!("1e20000000")), Err(AMOUNT_TOO_LARGE));
        assert_eq!(parse_amount(&json!("1E999999999")), Err(AMOUNT_TOO_LARGE));
        assert_eq!(parse_amount(&json!("1e-20000000")), Err(AMOUNT_NOT_POSITIVE));
        assert_eq!(parse_amount(&json!("-1e20000000")), Err(AMOUNT_NOT_POSITIVE));
        assert_eq!(parse_amount(&json!("1.5e3")), Ok(BigDecimal::from(1500)));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn update_only_touches_supplied_fields() {
        let update = parse_update(&object(json!({ "amount": 12.5 }))).unwrap();
        assert_eq!(
            update,
            SubscriptionUpdateRequest {
                amount: Some(BigDecimal::from_str("12.50").unwrap()),
                ..Default::default()
            }
        );

        let update = parse_update(&object(json!({ "is_active": false, "unknown": 1 }))).unwrap();
        assert_eq!(update.is_active, Some(false));
        assert_eq!(update.name, None);
    }

    #[test]
    fn update_treats_null_as_invalid() {
        assert_eq!(
            update_errors(json!({
                "name": null,
                "amount": null,
                "interval": null,
                "next_billing_date": null,
                "is_active": null,
            })),
            vec![NAME_REQUIRED, AMOUNT_INVALID, INTERVAL_INVALID, DATE_INVALID, IS_ACTIVE_INVALID]
        );
    }

    #[test]
    fn update_is_all_or_nothing() {
        assert_eq!(
            update_errors(json!({ "name": "Valid name", "amount": -5 })),
            vec![AMOUNT_NOT_POSITIVE]
        );
    }
}
