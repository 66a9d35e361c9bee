use chrono::{DateTime, Local, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Follow-ups are scheduled in the server's local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts the `YYYY-MM-DD` value an HTML date input submits.
pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
