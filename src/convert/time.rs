use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// A parsed point in time, with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Naive(NaiveDateTime),
    Fixed(DateTime<FixedOffset>),
}

impl Moment {
    /// Offset-carrying moments are normalized to UTC.
    pub fn naive(self) -> NaiveDateTime {
        match self {
            Moment::Naive(dt) => dt,
            Moment::Fixed(dt) => dt.naive_utc(),
        }
    }

    /// Offset-less moments are taken as UTC.
    pub fn fixed(self) -> DateTime<FixedOffset> {
        match self {
            Moment::Naive(dt) => dt.and_utc().fixed_offset(),
            Moment::Fixed(dt) => dt,
        }
    }
}

// --------------------------- Exact pattern ------------------------------- //

/// Parse strictly against a chrono `strftime` pattern. Patterns without time
/// fields yield midnight.
pub fn parse_exact(raw: &str, format: &str) -> Result<Moment, String> {
    if let Ok(dt) = DateTime::parse_from_str(raw, format) {
        return Ok(Moment::Fixed(dt));
    }
    match NaiveDateTime::parse_from_str(raw, format) {
        Ok(dt) => Ok(Moment::Naive(dt)),
        Err(e) => NaiveDate::parse_from_str(raw, format)
            .map(|d| Moment::Naive(d.and_time(NaiveTime::MIN)))
            .map_err(|_| format!("does not match `{format}`: {e}")),
    }
}

// ---------------------------- Best effort -------------------------------- //

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

static MS_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\\?/Date\((-?[0-9]+)([+-][0-9]{4})?\)\\?/$").unwrap());
static NEW_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^newDate\((-?[0-9]+)\)$").unwrap());

/// Try the common date/time spellings, ISO-8601 first.
pub fn parse_loose(raw: &str) -> Result<Moment, String> {
    let cleaned: String = raw.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let s = cleaned.trim().trim_matches('"');
    if s.is_empty() {
        return Err("empty date".into());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Moment::Fixed(dt));
    }
    // a trailing `Z` is not accepted by `%#z`
    let zoned = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => s.to_owned(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
            return Ok(Moment::Fixed(dt));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Moment::Naive(dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Moment::Naive(d.and_time(NaiveTime::MIN)));
        }
    }

    if let Some(caps) = MS_DATE.captures(s) {
        let offset = caps.get(2).map(|m| m.as_str());
        return from_millis(&caps[1], offset);
    }
    if let Some(caps) = NEW_DATE.captures(&s.replace(' ', "")) {
        return from_millis(&caps[1], None);
    }
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|dt| Moment::Fixed(dt.fixed_offset()))
            .ok_or_else(|| "unix timestamp out of range".to_owned());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(Moment::Fixed(dt));
    }
    Err("unrecognized date/time format".into())
}

fn from_millis(ms: &str, offset: Option<&str>) -> Result<Moment, String> {
    let ms: i64 = ms.parse().map_err(|_| "milliseconds out of range".to_owned())?;
    let utc = DateTime::<Utc>::from_timestamp_millis(ms).ok_or("milliseconds out of range")?;
    let offset = match offset {
        None => FixedOffset::east_opt(0),
        Some(o) => {
            let sign = if o.starts_with('-') { -1 } else { 1 };
            let hours: i32 = o.get(1..3).and_then(|h| h.parse().ok()).ok_or("bad offset")?;
            let minutes: i32 = o.get(3..5).and_then(|m| m.parse().ok()).ok_or("bad offset")?;
            FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        }
    }
    .ok_or("offset out of range")?;
    Ok(Moment::Fixed(utc.with_timezone(&offset)))
}

// ------------------------------ Durations -------------------------------- //

static CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?(?:([0-9]+)\.)?([0-9]{1,2}):([0-9]{1,2})(?::([0-9]{1,2})(?:\.([0-9]{1,7}))?)?$").unwrap()
});
static DAYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-)?([0-9]+)$").unwrap());
static ISO: Lazy<Regex> = Lazy::new(|| {
    let n = r"([0-9]+(?:[.,][0-9]+)?)";
    Regex::new(&format!(
        r"^(-)?P(?:{n}W)?(?:{n}D)?(?:T(?:{n}H)?(?:{n}M)?(?:{n}S)?)?$"
    ))
    .unwrap()
});

/// `[-][d.]hh:mm[:ss[.fffffff]]`, a bare day count, or ISO-8601 `PnWnDTnHnMnS`.
pub fn parse_duration(raw: &str) -> Result<TimeDelta, String> {
    let s = raw.trim();
    if let Some(caps) = CLOCK.captures(s) {
        let num = |i: usize| caps.get(i).map_or(Ok(0), |m| m.as_str().parse::<i64>());
        let parsed = (|| Ok::<_, std::num::ParseIntError>((num(2)?, num(3)?, num(4)?, num(5)?)))();
        let (days, hours, minutes, seconds) = parsed.map_err(|e| e.to_string())?;
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err("hours, minutes or seconds out of range".into());
        }
        let nanos = caps.get(6).map_or(0, |m| {
            let mut digits = m.as_str().to_owned();
            digits.extend(std::iter::repeat_n('0', 9usize.saturating_sub(digits.chars().count())));
            digits.parse::<u32>().unwrap_or(0)
        });
        let secs = days
            .checked_mul(86_400)
            .and_then(|d| d.checked_add(hours * 3600 + minutes * 60 + seconds))
            .ok_or("duration out of range")?;
        let delta = TimeDelta::new(secs, nanos).ok_or("duration out of range")?;
        return Ok(if caps.get(1).is_some() { -delta } else { delta });
    }
    if let Some(caps) = DAYS.captures(s) {
        let days: i64 = caps[2].parse().map_err(|_| "day count out of range")?;
        let delta = TimeDelta::try_days(days).ok_or("duration out of range")?;
        return Ok(if caps.get(1).is_some() { -delta } else { delta });
    }
    if let Some(caps) = ISO.captures(s) {
        const UNITS: [(usize, i64); 5] = [(2, 604_800), (3, 86_400), (4, 3_600), (5, 60), (6, 1)];
        if UNITS.iter().all(|(i, _)| caps.get(*i).is_none()) || s.ends_with('T') {
            return Err("ISO-8601 duration has no components".into());
        }
        let mut total = Decimal::ZERO;
        for (i, unit) in UNITS {
            if let Some(m) = caps.get(i) {
                let amount: Decimal = m.as_str().replace(',', ".").parse().map_err(|_| "bad duration component")?;
                total = amount
                    .checked_mul(Decimal::from(unit))
                    .and_then(|v| total.checked_add(v))
                    .ok_or("duration out of range")?;
            }
        }
        let secs = total.trunc();
        let nanos = ((total - secs) * Decimal::from(1_000_000_000)).trunc();
        let delta = secs
            .to_i64()
            .zip(nanos.to_u32())
            .and_then(|(s, n)| TimeDelta::new(s, n))
            .ok_or("duration out of range")?;
        return Ok(if caps.get(1).is_some() { -delta } else { delta });
    }
    Err("expected [-][d.]hh:mm[:ss[.fffffff]], a day count, or an ISO-8601 duration".into())
}
