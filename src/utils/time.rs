//! Time utilities for the generated `date` stamp

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::fmt;

/// Format of the XMLTV root `date` attribute
pub const XMLTV_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Timezone the generation stamp is rendered in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputTimezone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl OutputTimezone {
    /// Parse a named timezone ("Asia/Shanghai") or a UTC offset ("+08:00", "+0800")
    pub fn parse(tz_str: &str) -> Result<Self, String> {
        let tz_str = tz_str.trim();

        if let Ok(offset) = parse_fixed_offset(tz_str) {
            return Ok(Self::Fixed(offset));
        }

        if let Ok(tz) = tz_str.parse::<Tz>() {
            return Ok(Self::Named(tz));
        }

        Err(format!("Invalid timezone: '{}'. Use either a named timezone (e.g., 'Asia/Shanghai') or UTC offset (e.g., '+08:00')", tz_str))
    }

    /// Render an instant as an XMLTV date stamp in this timezone
    pub fn format_xmltv(&self, instant: DateTime<Utc>) -> String {
        match self {
            Self::Fixed(offset) => instant
                .with_timezone(offset)
                .format(XMLTV_DATE_FORMAT)
                .to_string(),
            Self::Named(tz) => instant
                .with_timezone(tz)
                .format(XMLTV_DATE_FORMAT)
                .to_string(),
        }
    }

    /// The current time as an XMLTV date stamp
    pub fn now_stamp(&self) -> String {
        self.format_xmltv(Utc::now())
    }
}

impl Default for OutputTimezone {
    /// UTC+8
    fn default() -> Self {
        Self::Fixed(FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()))
    }
}

impl fmt::Display for OutputTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(offset) => write!(f, "{}", offset),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Parse fixed offset timezone formats like "+01:00", "+0100", etc.
fn parse_fixed_offset(offset_str: &str) -> Result<FixedOffset, String> {
    let offset_str = offset_str.trim();

    // Handle formats like +01:00, -05:30, +0100, -0530
    let re = Regex::new(r"^([+-])(\d{2}):?(\d{2})$").map_err(|e| format!("Regex error: {}", e))?;

    let caps = re
        .captures(offset_str)
        .ok_or_else(|| format!("Invalid offset format: '{}'", offset_str))?;

    let sign = if &caps[1] == "+" { 1 } else { -1 };
    let hours: i32 = caps[2].parse().map_err(|_| "Invalid hours in offset")?;
    let minutes: i32 = caps[3].parse().map_err(|_| "Invalid minutes in offset")?;

    if hours > 23 || minutes > 59 {
        return Err("Invalid time values in offset".to_string());
    }

    let total_seconds = sign * (hours * 3600 + minutes * 60);

    FixedOffset::east_opt(total_seconds).ok_or_else(|| "Invalid timezone offset".to_string())
}
