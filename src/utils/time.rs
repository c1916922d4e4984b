use crate::utils::error::{Result, SosError};
use chrono::NaiveDate;

fn parse_part(name: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| SosError::value(format!("Invalid {}: '{}'", name, value)))
}

/// 驗證日期時間並回傳 `yyyy-MM-ddTHH:mm`；未提供分鐘時回傳 `yyyy-MM-ddTHH`
pub fn formatted_time_string(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: Option<&str>,
) -> Result<String> {
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| SosError::value(format!("Invalid year: '{}'", year)))?;
    let month = parse_part("month", month)?;
    let day = parse_part("day", day)?;
    let hour = parse_part("hour", hour)?;
    let minute = minute.map(|m| parse_part("minute", m)).transpose()?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        SosError::value(format!("Invalid date: {}-{}-{}", year, month, day))
    })?;
    let timestamp = date
        .and_hms_opt(hour, minute.unwrap_or(0), 0)
        .ok_or_else(|| SosError::value(format!("Invalid time: {}:{:?}", hour, minute)))?;

    let pattern = if minute.is_some() {
        "%Y-%m-%dT%H:%M"
    } else {
        "%Y-%m-%dT%H"
    };
    Ok(timestamp.format(pattern).to_string())
}
