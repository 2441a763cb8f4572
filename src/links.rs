use crate::error::AttendanceError;
use chrono::{Local, NaiveDateTime, TimeZone};

pub const DEFAULT_QUIZ_BASE_URL: &str =
    "https://jlvcpa.github.io/my-quizzes/t2-summative-test-01.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizLink {
    pub url: String,
    pub expires_at_ms: i64,
}

/// Parses a local `YYYY-MM-DDTHH:MM` (seconds optional) into epoch milliseconds.
pub fn parse_local_expiry(raw: &str) -> Result<i64, AttendanceError> {
    let t = raw.trim();
    let naive = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| AttendanceError::validation("expiry must be YYYY-MM-DDTHH:MM"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| AttendanceError::validation("expiry falls in a skipped local time"))
}

pub fn generate(
    base_url: &str,
    attendance_id: &str,
    expiry: &str,
    duration_minutes: i64,
) -> Result<QuizLink, AttendanceError> {
    if attendance_id.trim().is_empty() || expiry.trim().is_empty() {
        return Err(AttendanceError::validation(
            "Please fill in all link generation fields.",
        ));
    }
    if duration_minutes <= 0 {
        return Err(AttendanceError::validation(
            "durationMinutes must be a positive integer",
        ));
    }
    let expires_at_ms = parse_local_expiry(expiry)?;
    Ok(QuizLink {
        url: format!(
            "{}?att={}&exp={}&dur={}",
            base_url,
            attendance_id.trim(),
            expires_at_ms,
            duration_minutes
        ),
        expires_at_ms,
    })
}
