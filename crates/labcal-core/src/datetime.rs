use anyhow::anyhow;
use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;

pub const DEFAULT_WEEK_START: Weekday =
  Weekday::Sun;

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured calendar timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// The real current date, seen from
/// `timezone` or the host clock.
#[must_use]
pub fn today_in(
  timezone: Option<Tz>
) -> NaiveDate {
  match timezone {
    | Some(tz) => {
      Utc::now()
        .with_timezone(&tz)
        .date_naive()
    }
    | None => Local::now().date_naive()
  }
}

pub fn parse_week_start(
  raw: &str
) -> Option<Weekday> {
  match raw
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | _ => None
  }
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

/// Day-of-month of "day 0 of next
/// month".
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  checked_add_days(date, days)
    .unwrap_or(date)
}

/// `None` when the result falls outside
/// chrono's date range.
pub fn checked_add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  date.checked_add_signed(
    Duration::try_days(days)?
  )
}

/// Moves by whole months, clamping the
/// day to the target month's length.
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  checked_shift_months(
    date,
    i64::from(months)
  )
  .unwrap_or(date)
}

pub fn checked_shift_months(
  date: NaiveDate,
  months: i64
) -> Option<NaiveDate> {
  let total = i64::from(date.year())
    .checked_mul(12)?
    .checked_add(
      i64::from(date.month0())
    )?
    .checked_add(months)?;
  let year =
    i32::try_from(total.div_euclid(12))
      .ok()?;
  let month =
    total.rem_euclid(12) as u32 + 1;

  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

/// Columns between `week_start` and
/// `day` (0..=6).
pub fn weekday_offset(
  day: Weekday,
  week_start: Weekday
) -> u32 {
  let day_idx =
    day.num_days_from_sunday();
  let start_idx =
    week_start.num_days_from_sunday();
  (7 + day_idx - start_idx) % 7
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let diff = weekday_offset(
    day.weekday(),
    week_start
  );
  add_days(day, -(diff as i64))
}

/// Resolves a `--date` style
/// expression against `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token =
    input.trim().to_ascii_lowercase();

  match token.as_str() {
    | "" | "today" | "now" => {
      return Ok(today);
    }
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      &token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  if let Some(weekday) =
    parse_weekday_name(&token)
  {
    return Ok(next_weekday_date(
      today, weekday
    ));
  }

  if let Some(date) =
    parse_relative(&token, today)
  {
    return Ok(date);
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
}

fn parse_relative(
  token: &str,
  today: NaiveDate
) -> Option<NaiveDate> {
  let (sign, rest) =
    match token.chars().next()? {
      | '+' => (1_i64, &token[1..]),
      | '-' => (-1_i64, &token[1..]),
      | _ => (1_i64, token)
    };
  let unit = rest.chars().last()?;
  let amount = rest
    [..rest.len() - unit.len_utf8()]
    .parse::<i64>()
    .ok()?
    .checked_mul(sign)?;

  match unit {
    | 'd' => {
      checked_add_days(today, amount)
    }
    | 'w' => {
      checked_add_days(
        today,
        amount.checked_mul(7)?
      )
    }
    | 'm' => {
      checked_shift_months(today, amount)
    }
    | _ => None
  }
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let mut delta = weekday_offset(
    target,
    from.weekday()
  ) as i64;
  if delta == 0 {
    delta = 7;
  }
  add_days(from, delta)
}
