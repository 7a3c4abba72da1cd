//! 타임스탬프 정규화 -- 다양한 시간 표현을 epoch 밀리초로 변환합니다.
//!
//! # 모드
//! - [`TimestampFormat::Fuzzy`]: 자유 형식 텍스트 (`Oct  3 08:28:06`, `Wed Oct 11 14:32:52 2023`)
//! - [`TimestampFormat::Strict`]: chrono 포맷 패턴 (`10/Oct/2023:13:55:36 +0000`)
//! - [`TimestampFormat::ErrorLog`]: 대괄호로 감싼 에러 로그 타임스탬프
//!
//! # 시간대와 연도
//! 오프셋이 있으면 UTC로 변환하고, 없으면 벽시계 시간을 그대로 UTC로 취급합니다.
//! 호스트 로컬 시간대는 적용하지 않으므로, UTC가 아닌 호스트에서 로컬 시간으로
//! 해석하는 도구와는 오프셋 없는 타임스탬프 결과가 다릅니다.
//! 연도가 없는 타임스탬프는 주입된 기준 연도를 사용하며, 기준 연도가 없으면
//! 현재 연도를 사용하되 결과가 하루 이상 미래이면 전년도로 넘깁니다.
//!
//! # 사용 예시
//! ```ignore
//! use lognorm_log_pipeline::timestamp::{TimestampFormat, TimestampNormalizer};
//!
//! let normalizer = TimestampNormalizer::with_reference_year(2023);
//! let ms = normalizer.normalize("Oct  3 08:28:06", TimestampFormat::Fuzzy)?;
//! assert_eq!(ms, 1_696_321_686_000);
//! ```

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc,
};
use lognorm_core::error::ParseError;

/// combined 접근 로그의 타임스탬프 패턴
pub const ACCESS_LOG_PATTERN: &str = "%d/%b/%Y:%H:%M:%S %z";

/// 자유 형식 스캐너가 받아들이는 최대 입력 길이 (바이트)
const MAX_TIMESTAMP_LEN: usize = 256;

/// 에러 메시지에 포함할 입력의 최대 문자 수
const MAX_ECHOED_INPUT: usize = 64;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// 타임스탬프 텍스트 해석 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// 자유 형식 텍스트
    Fuzzy,
    /// chrono 포맷 패턴
    Strict(&'static str),
    /// `[Wed Oct 11 14:32:52.123456 2023]` 형태의 에러 로그 타임스탬프
    ErrorLog,
}

/// 타임스탬프 정규화기
///
/// 소스별로 하나씩 만들어 파서에 바인딩합니다. 상태가 없으므로 `Copy`입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampNormalizer {
    reference_year: Option<i32>,
}

impl TimestampNormalizer {
    /// 기준 연도 없이 생성합니다. 연도 없는 타임스탬프는 현재 연도에서 추론합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 연도 없는 타임스탬프에 사용할 기준 연도를 지정하여 생성합니다.
    pub fn with_reference_year(year: i32) -> Self {
        Self {
            reference_year: Some(year),
        }
    }

    /// 설정된 기준 연도를 반환합니다.
    pub fn reference_year(&self) -> Option<i32> {
        self.reference_year
    }

    /// 타임스탬프 텍스트를 epoch 밀리초로 변환합니다.
    pub fn normalize(&self, text: &str, format: TimestampFormat) -> Result<i64, ParseError> {
        self.normalize_at(text, format, Utc::now())
    }

    /// `now`를 현재 시각으로 간주하여 변환합니다.
    pub(crate) fn normalize_at(
        &self,
        text: &str,
        format: TimestampFormat,
        now: DateTime<Utc>,
    ) -> Result<i64, ParseError> {
        match format {
            TimestampFormat::Strict(pattern) => parse_strict(text, pattern),
            TimestampFormat::Fuzzy => self.parse_fuzzy(text, now),
            TimestampFormat::ErrorLog => {
                let inner = text.trim();
                let inner = inner.strip_prefix('[').unwrap_or(inner);
                let inner = inner.strip_suffix(']').unwrap_or(inner);
                self.parse_fuzzy(inner, now)
            }
        }
    }

    fn parse_fuzzy(&self, text: &str, now: DateTime<Utc>) -> Result<i64, ParseError> {
        let trimmed = text.trim();
        if trimmed.len() > MAX_TIMESTAMP_LEN {
            return Err(unparseable(
                text,
                format!("longer than {MAX_TIMESTAMP_LEN} bytes"),
            ));
        }
        if trimmed.is_empty() {
            return Err(unparseable(text, "empty"));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.timestamp_millis());
        }

        let mut scan = FuzzyScan::default();
        for token in trimmed.split_whitespace() {
            let token = token.trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')' | ','));
            if !token.is_empty() {
                scan.feed(token).map_err(|reason| unparseable(text, reason))?;
            }
        }

        let time = scan.time.unwrap_or(NaiveTime::MIN);
        let date = match (scan.iso_date, scan.month, scan.day) {
            (Some(date), _, _) => date,
            (None, Some(month), Some(day)) => match scan.year.or(self.reference_year) {
                Some(year) => make_date(year, month, day).map_err(|r| unparseable(text, r))?,
                None => {
                    return infer_year(month, day, time, scan.offset, now)
                        .map_err(|r| unparseable(text, r));
                }
            },
            _ => return Err(unparseable(text, "no month/day or ISO date found")),
        };

        Ok(to_epoch_ms(date.and_time(time), scan.offset))
    }
}

/// 고정 패턴 파싱. 패턴에 오프셋이 없으면 벽시계 시간으로 해석합니다.
fn parse_strict(text: &str, pattern: &str) -> Result<i64, ParseError> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_str(trimmed, pattern) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(trimmed, pattern)
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|e| unparseable(text, format!("does not match '{pattern}': {e}")))
}

/// 연도가 없는 날짜에 현재 연도를 적용하고, 하루 이상 미래이면 전년도로 넘깁니다.
fn infer_year(
    month: u32,
    day: u32,
    time: NaiveTime,
    offset: Option<FixedOffset>,
    now: DateTime<Utc>,
) -> Result<i64, String> {
    let horizon = (now + TimeDelta::days(1)).timestamp_millis();
    let year = now.year();

    if let Ok(date) = make_date(year, month, day) {
        let ms = to_epoch_ms(date.and_time(time), offset);
        if ms <= horizon {
            return Ok(ms);
        }
    }

    // 올해에 존재하지 않는 날짜(2월 29일)이거나 미래인 경우
    let date = make_date(year - 1, month, day)?;
    Ok(to_epoch_ms(date.and_time(time), offset))
}

fn make_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, String> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("invalid date {year:04}-{month:02}-{day:02}"))
}

fn to_epoch_ms(naive: NaiveDateTime, offset: Option<FixedOffset>) -> i64 {
    let wall_ms = naive.and_utc().timestamp_millis();
    match offset {
        Some(offset) => wall_ms - i64::from(offset.local_minus_utc()) * 1000,
        None => wall_ms,
    }
}

fn unparseable(text: &str, reason: impl Into<String>) -> ParseError {
    ParseError::TimestampUnparseable {
        input: text.chars().take(MAX_ECHOED_INPUT).collect(),
        reason: reason.into(),
    }
}

/// 토큰 단위로 날짜 구성 요소를 모으는 스캐너 상태
#[derive(Debug, Default)]
struct FuzzyScan {
    month: Option<u32>,
    day: Option<u32>,
    year: Option<i32>,
    iso_date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    offset: Option<FixedOffset>,
}

impl FuzzyScan {
    /// 토큰 하나를 분류합니다. 알 수 없는 토큰은 무시합니다.
    fn feed(&mut self, token: &str) -> Result<(), String> {
        let lower = token.to_ascii_lowercase();

        if lower.chars().all(|c| c.is_ascii_alphabetic()) {
            if is_weekday(&lower) {
                return Ok(());
            }
            if let Some(month) = month_number(&lower) {
                self.month.get_or_insert(month);
                return Ok(());
            }
            if matches!(lower.as_str(), "z" | "utc" | "gmt") {
                self.offset = FixedOffset::east_opt(0);
            }
            return Ok(());
        }

        let bytes = token.as_bytes();

        if (bytes[0] == b'+' || bytes[0] == b'-') && token.len() > 1 {
            if let Some(offset) = parse_offset(token) {
                self.offset = Some(offset);
            }
            return Ok(());
        }

        if is_iso_date_prefix(bytes) {
            let (date_part, rest) = match token.find(['T', 't']) {
                Some(idx) => (&token[..idx], Some(&token[idx + 1..])),
                None => (token, None),
            };
            self.iso_date = Some(parse_iso_date(date_part)?);
            if let Some(rest) = rest {
                self.feed_clock(rest)?;
            }
            return Ok(());
        }

        if bytes[0].is_ascii_digit() && token.contains(':') {
            return self.feed_clock(token);
        }

        if token.chars().all(|c| c.is_ascii_digit()) {
            match token.len() {
                1 | 2 if self.day.is_none() => {
                    let day: u32 = token.parse().map_err(|_| format!("bad day '{token}'"))?;
                    if (1..=31).contains(&day) {
                        self.day = Some(day);
                    }
                }
                4 if self.year.is_none() => {
                    self.year = token.parse().ok();
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// `HH:MM[:SS[.frac]]` 뒤에 붙은 `Z`/`±HH[:MM]` 오프셋까지 처리합니다.
    fn feed_clock(&mut self, token: &str) -> Result<(), String> {
        let (clock, zone) = match token.find(['+', '-', 'Z', 'z']) {
            Some(idx) => (&token[..idx], Some(&token[idx..])),
            None => (token, None),
        };

        if let Some(zone) = zone {
            if zone.eq_ignore_ascii_case("z") {
                self.offset = FixedOffset::east_opt(0);
            } else {
                self.offset =
                    Some(parse_offset(zone).ok_or_else(|| format!("bad offset '{zone}'"))?);
            }
        }

        self.time = Some(parse_clock(clock)?);
        Ok(())
    }
}

fn is_weekday(lower: &str) -> bool {
    lower.len() >= 3 && WEEKDAYS.iter().any(|w| w.starts_with(lower))
        || matches!(lower, "tues" | "thur" | "thurs")
}

fn month_number(lower: &str) -> Option<u32> {
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| (lower.len() == 3 || lower.len() == m.len()) && m.starts_with(lower))
        .map(|idx| idx as u32 + 1)
}

fn is_iso_date_prefix(bytes: &[u8]) -> bool {
    bytes.len() >= 8
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && (bytes[4] == b'-' || bytes[4] == b'/')
}

fn parse_iso_date(text: &str) -> Result<NaiveDate, String> {
    let mut parts = text.split(['-', '/']);
    let mut next = |name: &str| -> Result<u32, String> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| format!("bad {name} in '{text}'"))
    };
    let year = next("year")?;
    let month = next("month")?;
    let day = next("day")?;
    let year = i32::try_from(year).map_err(|_| format!("bad year in '{text}'"))?;
    make_date(year, month, day)
}

fn parse_clock(text: &str) -> Result<NaiveTime, String> {
    let (hms, frac) = match text.find(['.', ',']) {
        Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
        None => (text, None),
    };

    let mut fields = hms.split(':');
    let mut component = |required: bool| -> Result<u32, String> {
        match fields.next() {
            Some(part) if !part.is_empty() && part.len() <= 2 => {
                part.parse().map_err(|_| format!("bad clock time '{text}'"))
            }
            None if !required => Ok(0),
            _ => Err(format!("bad clock time '{text}'")),
        }
    };
    let hour = component(true)?;
    let minute = component(true)?;
    let second = component(false)?;

    let nanos = match frac {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            let taken: String = digits.chars().take(9).collect();
            let scale = 10_u32.pow(9 - taken.len() as u32);
            taken
                .parse::<u32>()
                .map_err(|_| format!("bad fraction in '{text}'"))?
                * scale
        }
        Some(_) => return Err(format!("bad fraction in '{text}'")),
        None => 0,
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| format!("clock time out of range '{text}'"))
}

/// `±HHMM`, `±HH:MM`, `±HH` 형식의 UTC 오프셋을 해석합니다.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let sign = match text.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = text[1..].chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
