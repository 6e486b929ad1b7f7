use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime, PrimitiveDateTime};

/// All timestamps are stored as naive UTC.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn days_before(value: PrimitiveDateTime, days: i64) -> PrimitiveDateTime {
    value - Duration::days(days)
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_optional(value: Option<PrimitiveDateTime>) -> Option<String> {
    value.map(format_primitive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    fn at(day: u8, hour: u8, minute: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::January, day).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, 0).unwrap())
    }

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn days_before_crosses_month_boundary() {
        let start = at(3, 9, 0);
        let earlier = days_before(start, 7);
        assert_eq!(format_primitive(earlier), "2024-12-27T09:00:00Z");
    }

    #[test]
    fn format_optional_passes_none_through() {
        assert_eq!(format_optional(None), None);
        assert_eq!(format_optional(Some(at(5, 1, 2))).as_deref(), Some("2025-01-05T01:02:00Z"));
    }
}
