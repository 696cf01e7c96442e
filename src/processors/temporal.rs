//! Instants as formatted strings or epoch milliseconds.
//!
//! Writing follows [`DateMode`]: `String` renders the instant in the
//! configured [`DateFormat`] offset, `Number` writes milliseconds since the
//! Unix epoch as a long. Reading accepts both, whatever the mode.

use super::unexpected;
use crate::{DateFormat, DateMode, DatePattern, Element, Error, Primitive, Result, TypeProcessor};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::time::SystemTime;

/// Converts `DateTime<Utc>`, `DateTime<FixedOffset>` and [`SystemTime`].
#[derive(Clone, Debug, Default)]
pub struct TemporalProcessor {
    mode: DateMode,
    format: DateFormat,
}

impl TemporalProcessor {
    #[must_use]
    pub fn new(mode: DateMode, format: DateFormat) -> Self {
        TemporalProcessor { mode, format }
    }

    fn write(&self, instant: DateTime<Utc>) -> Element {
        match self.mode {
            DateMode::Number => Element::from(instant.timestamp_millis()),
            DateMode::String => {
                let local = instant.with_timezone(&self.format.offset);
                match &self.format.pattern {
                    DatePattern::Rfc3339 => {
                        Element::from(local.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                    }
                    DatePattern::Custom(pattern) => Element::from(local.format(pattern).to_string()),
                }
            }
        }
    }

    fn read(&self, element: &Element, type_name: &str) -> Result<Option<DateTime<Utc>>> {
        match element {
            Element::Primitive(Primitive::Null) => Ok(None),
            Element::Primitive(Primitive::String(text)) => self.parse(text, type_name).map(Some),
            Element::Primitive(p) if p.is_integral() => {
                let millis: i64 = p.to_integer()?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(Some)
                    .ok_or_else(|| Error::conversion(type_name, "epoch milliseconds in range", p.describe()))
            }
            other => Err(unexpected(type_name, "date string or epoch milliseconds", other)),
        }
    }

    /// Tries the configured pattern, then RFC 3339.
    fn parse(&self, text: &str, type_name: &str) -> Result<DateTime<Utc>> {
        let text = text.trim();
        if let DatePattern::Custom(pattern) = &self.format.pattern {
            if let Some(instant) = parse_pattern(text, pattern, &self.format.offset) {
                return Ok(instant);
            }
        }
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                let expected = match &self.format.pattern {
                    DatePattern::Rfc3339 => "RFC 3339 date".to_string(),
                    DatePattern::Custom(pattern) => format!("date matching {:?}", pattern),
                };
                Error::conversion(type_name, expected, format!("{:?}", text))
            })
    }
}

/// A pattern without an offset is read in `offset`; one without a time is read at midnight.
fn parse_pattern(text: &str, pattern: &str, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(text, pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, pattern)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

impl TypeProcessor<DateTime<Utc>> for TemporalProcessor {
    fn to_element(&self, value: Option<&DateTime<Utc>>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |instant| self.write(*instant)))
    }

    fn to_object(&self, element: &Element) -> Result<Option<DateTime<Utc>>> {
        self.read(element, "DateTime<Utc>")
    }
}

impl TypeProcessor<DateTime<FixedOffset>> for TemporalProcessor {
    fn to_element(&self, value: Option<&DateTime<FixedOffset>>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |instant| {
            self.write(instant.with_timezone(&Utc))
        }))
    }

    fn to_object(&self, element: &Element) -> Result<Option<DateTime<FixedOffset>>> {
        Ok(self
            .read(element, "DateTime<FixedOffset>")?
            .map(|instant| instant.with_timezone(&self.format.offset)))
    }
}

impl TypeProcessor<SystemTime> for TemporalProcessor {
    fn to_element(&self, value: Option<&SystemTime>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |time| {
            self.write(DateTime::<Utc>::from(*time))
        }))
    }

    fn to_object(&self, element: &Element) -> Result<Option<SystemTime>> {
        Ok(self.read(element, "SystemTime")?.map(SystemTime::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JULY_FOURTH_NOON: i64 = 1_720_094_400_000;

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn instant(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_string_mode_uses_offset() {
        let utc = TemporalProcessor::default();
        let est = TemporalProcessor::new(DateMode::String, DateFormat::rfc3339().with_offset(eastern()));

        let noon = instant(JULY_FOURTH_NOON);
        assert_eq!(
            utc.to_element(Some(&noon)).unwrap(),
            Element::from("2024-07-04T12:00:00Z")
        );
        assert_eq!(
            est.to_element(Some(&noon)).unwrap(),
            Element::from("2024-07-04T07:00:00-05:00")
        );
        assert_eq!(
            est.to_element(Some(&instant(0))).unwrap(),
            Element::from("1969-12-31T19:00:00-05:00")
        );
    }

    #[test]
    fn test_number_mode() {
        let processor = TemporalProcessor::new(DateMode::Number, DateFormat::default());
        let element = processor.to_element(Some(&instant(JULY_FOURTH_NOON))).unwrap();
        assert_eq!(element.as_long().unwrap(), JULY_FOURTH_NOON);
    }

    #[test]
    fn test_reads_any_form() {
        let processor = TemporalProcessor::default();
        let noon = instant(JULY_FOURTH_NOON);
        for element in [
            Element::from(JULY_FOURTH_NOON),
            Element::from("2024-07-04T12:00:00Z"),
            Element::from("2024-07-04T07:00:00-05:00"),
        ] {
            assert_eq!(processor.to_object(&element).unwrap(), Some(noon));
        }
        assert!(TypeProcessor::<DateTime<Utc>>::to_object(&processor, &Element::from(true)).is_err());
        assert!(TypeProcessor::<DateTime<Utc>>::to_object(&processor, &Element::from("yesterday")).is_err());
    }

    #[test]
    fn test_custom_pattern() {
        let format = DateFormat::pattern("%Y-%m-%d %H:%M").with_offset(eastern());
        let processor = TemporalProcessor::new(DateMode::String, format);
        let noon = instant(JULY_FOURTH_NOON);

        let element = processor.to_element(Some(&noon)).unwrap();
        assert_eq!(element, Element::from("2024-07-04 07:00"));
        assert_eq!(processor.to_object(&element).unwrap(), Some(noon));

        let date_only = TemporalProcessor::new(DateMode::String, DateFormat::pattern("%Y-%m-%d"));
        assert_eq!(
            date_only.to_object(&Element::from("2024-07-04")).unwrap(),
            Some(instant(JULY_FOURTH_NOON - 12 * 3600 * 1000))
        );
    }

    #[test]
    fn test_system_time() {
        let processor = TemporalProcessor::new(DateMode::Number, DateFormat::default());
        let element = processor.to_element(Some(&SystemTime::UNIX_EPOCH)).unwrap();
        assert_eq!(element.as_long().unwrap(), 0);
        assert_eq!(
            processor.to_object(&element).unwrap(),
            Some(SystemTime::UNIX_EPOCH)
        );
    }
}
