// Module name shadows the `serde` crate, so the external crate is `::serde`.
use ::serde::Serializer;
use chrono::{DateTime, SecondsFormat, Utc};

fn format_ms(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize `DateTime<Utc>` as RFC 3339 with millisecond precision and a `Z` suffix.
pub fn to_rfc3339_ms<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format_ms(dt))
}

/// Same as [`to_rfc3339_ms`] for optional timestamps; `None` becomes `null`.
pub fn to_rfc3339_ms_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_some(&format_ms(dt)),
        None => s.serialize_none(),
    }
}
