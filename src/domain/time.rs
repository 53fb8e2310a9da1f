//! Business-timezone handling.
//!
//! The portal reports civil times without an offset. Every such value is
//! interpreted in one fixed business timezone, never the host's.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Default business timezone.
pub const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";

/// Format used for the "from" field sent to the portal.
pub const PORTAL_WINDOW_FORMAT: &str = "%d/%m/%Y %H:%M";

const PORTAL_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const PORTAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Converts between UTC instants and business-local civil time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessTime {
    tz: Tz,
}

impl BusinessTime {
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns a parse error for unknown zone names.
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|e| Error::Parse(format!("unknown timezone '{name}': {e}")))
    }

    #[must_use]
    pub const fn tz(&self) -> Tz {
        self.tz
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Civil time in the business timezone for a UTC instant.
    #[must_use]
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    /// UTC instant for a business-local civil time.
    ///
    /// Ambiguous times resolve to the earliest instant; times inside a gap
    /// fall back to reading the civil time as UTC shifted by the zone's
    /// current offset.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => {
                let offset = self.tz.offset_from_utc_datetime(&local);
                let shifted = local - chrono::Duration::seconds(i64::from(
                    chrono::Offset::fix(&offset).local_minus_utc(),
                ));
                Utc.from_utc_datetime(&shifted)
            }
        }
    }

    /// Midnight of the business day containing `instant`.
    #[must_use]
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        self.to_local(instant).date().and_time(NaiveTime::MIN)
    }
}

impl Default for BusinessTime {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Ho_Chi_Minh)
    }
}

/// Parse a portal timestamp.
///
/// Accepts `dd/mm/YYYY HH:MM:SS`, `dd/mm/YYYY HH:MM`, and a bare date, which
/// is read as the last second of that day so it never precedes timed rows.
///
/// # Errors
///
/// Returns a parse error when no supported format matches.
pub fn parse_portal_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    for format in PORTAL_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }

    let date_part = raw.split_whitespace().next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, PORTAL_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .ok_or_else(|| Error::Parse(format!("unrecognized portal timestamp '{raw}'")))
}
