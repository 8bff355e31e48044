use time::{Date, Duration, OffsetDateTime};

/// Monday of the ISO week containing `at`, evaluated in UTC.
pub fn week_start(at: OffsetDateTime) -> Date {
	let date = at.to_offset(time::UtcOffset::UTC).date();
	let offset = date.weekday().number_days_from_monday();

	date - Duration::days(i64::from(offset))
}
