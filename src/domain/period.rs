use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stored timestamps compare as strings, which only holds for four-digit
/// years. The exclusive end of a December or last-day window falls in the
/// following year, so that year must have four digits too.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9998;

/// A calendar month as budgets address it: `month` is zero-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub year: i32,
    pub month: u32,
}

impl BudgetPeriod {
    /// Build a period, rejecting months outside 0..=11 and years outside
    /// [`MIN_YEAR`]..=[`MAX_YEAR`].
    pub fn new(month: u32, year: i32) -> Option<Self> {
        if month > 11 || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }
        Some(Self { year, month })
    }

    /// The period containing the given instant.
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month0(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn next(&self) -> Self {
        if self.month == 11 {
            Self {
                year: self.year + 1,
                month: 0,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Half-open window `[start, end)` covering every instant from the first
    /// day of the month up to and including the whole last day.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (start_of_day(self.first_day()), start_of_day(self.next().first_day()))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (start, end) = self.window();
        at >= start && at < end
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month + 1)
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Window `[start, end)` covering a single UTC day.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date);
    (start, start + Duration::days(1))
}

/// Parse either a plain date (`YYYY-MM-DD`, taken as midnight UTC) or an
/// RFC 3339 timestamp.
/// Years outside [`MIN_YEAR`]..=[`MAX_YEAR`] are refused.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    let parsed = match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => start_of_day(date),
        Err(_) => DateTime::parse_from_rfc3339(input)
            .ok()?
            .with_timezone(&Utc),
    };
    (MIN_YEAR..=MAX_YEAR)
        .contains(&parsed.year())
        .then_some(parsed)
}

/// Serde adapter for timestamps that also accepts plain dates.
pub mod flexible_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::super::parse_date(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}
