use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::config::HeaderPolicy;
use crate::error::AppError;
use crate::models::{
    Answer, Field, MonthBucket, PartySize, RawRecord, RawTable, ResponseRecord, Survey,
};

/// Google Forms timestamp layout, `month/day/year hour:minute:second`.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Raw form headers and the canonical field each one becomes. `None` is dropped.
pub const RENAME_MAP: &[(&str, Option<Field>)] = &[
    ("Timestamp", Some(Field::Timestamp)),
    ("1. What is your name?", Some(Field::Name)),
    ("2. What is your country of residence?", Some(Field::Country)),
    ("3. Is this your first time in Diber?", Some(Field::FirstTime)),
    (
        "4. Please list other cities you visited during your time in Albania.",
        Some(Field::OtherCitiesVisited),
    ),
    (
        "1. On a scale of 1 to 5, how satisfied are you with the assistance provided by our staff?",
        Some(Field::StaffRating),
    ),
    (
        "2. What improvements would you suggest to make our tourism office more welcoming and informative?",
        Some(Field::Improvements),
    ),
    ("5. What is your age group?", Some(Field::AgeGroup)),
    ("6. How many people are in your group?", Some(Field::PartySize)),
    (
        "7. What is the primary reason for your visit to Diber?",
        Some(Field::PrimaryVisitReason),
    ),
    (
        "8. Do you follow @visitdiber on any social media channels?",
        Some(Field::FollowsSocialMedia),
    ),
    (
        "9. How would you rate the accessibility and clarity of our maps and brochures?",
        Some(Field::MapsRating),
    ),
    (
        "10. Did you encounter any language barriers while seeking information or assistance at our office?",
        Some(Field::LanguageBarriers),
    ),
    (
        "11. Will you visit any of the following Balkan countries during your travels? [Select all that apply]",
        Some(Field::OtherBalkanCountries),
    ),
    (
        "12. Would you be interested in participating in guided tours or workshops to enhance your experience in our destination?",
        Some(Field::WorkshopsInterest),
    ),
    ("4. Anything else you want to to tell us?!", Some(Field::AnythingElse)),
    ("Experience in our Office", None),
];

pub fn raw_header(field: Field) -> Option<&'static str> {
    RENAME_MAP
        .iter()
        .find(|(_, canonical)| *canonical == Some(field))
        .map(|(raw, _)| *raw)
}

/// One record with its cells looked up by canonical field.
struct Renamed<'a> {
    raw: &'a RawRecord,
}

impl<'a> Renamed<'a> {
    fn get(&self, field: Field) -> Option<&'a str> {
        raw_header(field)
            .and_then(|header| self.raw.get(header))
            .map(String::as_str)
    }

    fn text(&self, field: Field) -> String {
        self.get(field).unwrap_or_default().to_string()
    }

    fn answer(&self, field: Field) -> Answer {
        Answer::parse(self.get(field).unwrap_or_default())
    }

    fn rating(&self, field: Field) -> Option<u8> {
        let raw = self.get(field)?.trim();
        match raw.parse::<u8>() {
            Ok(value) if (1..=5).contains(&value) => Some(value),
            _ => {
                if !raw.is_empty() {
                    tracing::debug!("Ignoring {} value {:?}", field, raw);
                }
                None
            }
        }
    }
}

pub struct Normalizer {
    policy: HeaderPolicy,
}

impl Normalizer {
    pub fn new(policy: HeaderPolicy) -> Self {
        Self { policy }
    }

    /// Renames, types and buckets every record. Any bad row fails the whole batch.
    pub fn normalize(&self, table: &RawTable) -> Result<Survey, AppError> {
        let start = std::time::Instant::now();

        if self.policy == HeaderPolicy::Strict {
            check_headers(&table.headers)?;
        }

        let fields: BTreeSet<Field> = present_fields(table);

        if !table.is_empty() && !fields.contains(&Field::Timestamp) {
            return Err(AppError::MissingField(Field::Timestamp.to_string()));
        }

        let records = table
            .records
            .iter()
            .enumerate()
            .map(|(idx, raw)| normalize_record(raw, table.sheet_row(idx)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fields = fields;
        if !records.is_empty() {
            fields.insert(Field::Month);
        }

        tracing::info!(
            "Normalized {} records ({} canonical fields) in {:?}",
            records.len(),
            fields.len(),
            start.elapsed()
        );

        Ok(Survey { records, fields })
    }
}

/// Canonical fields carried by at least one record, or by the header row.
fn present_fields(table: &RawTable) -> BTreeSet<Field> {
    RENAME_MAP
        .iter()
        .filter_map(|(raw, canonical)| {
            let canonical = (*canonical)?;
            let in_headers = table.headers.iter().any(|h| h == raw);
            let in_records = table.records.iter().any(|r| r.contains_key(*raw));
            (in_headers || in_records).then_some(canonical)
        })
        .collect()
}

fn check_headers(headers: &[String]) -> Result<(), AppError> {
    let missing: Vec<&str> = RENAME_MAP
        .iter()
        .map(|(raw, _)| *raw)
        .filter(|raw| !headers.iter().any(|h| h == raw))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingField(format!(
            "expected header(s) not found: {}",
            missing.join("; ")
        )))
    }
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
}

fn parse_party_size(raw: &str, row: usize) -> Result<PartySize, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(PartySize(None));
    }

    match raw.parse::<u32>() {
        Ok(size) if size >= 1 => Ok(PartySize(Some(size))),
        _ => Err(AppError::Parse {
            row,
            message: format!("party size {:?} is not a whole number of at least 1", raw),
        }),
    }
}

fn normalize_record(raw: &RawRecord, row: usize) -> Result<ResponseRecord, AppError> {
    let record = Renamed { raw };

    let raw_timestamp = record.get(Field::Timestamp).unwrap_or_default();
    let timestamp = parse_timestamp(raw_timestamp).map_err(|e| AppError::Parse {
        row,
        message: format!(
            "timestamp {:?} does not match {}: {}",
            raw_timestamp, TIMESTAMP_FORMAT, e
        ),
    })?;

    let party_size = parse_party_size(record.get(Field::PartySize).unwrap_or_default(), row)?;

    let other_balkan_countries = record
        .get(Field::OtherBalkanCountries)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|country| !country.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ResponseRecord {
        row,
        timestamp,
        name: record.text(Field::Name),
        country: record.text(Field::Country),
        first_time: record.answer(Field::FirstTime),
        other_cities_visited: record.text(Field::OtherCitiesVisited),
        staff_rating: record.rating(Field::StaffRating),
        improvements: record.text(Field::Improvements),
        age_group: record.text(Field::AgeGroup),
        party_size,
        primary_visit_reason: record.text(Field::PrimaryVisitReason),
        follows_social_media: record.answer(Field::FollowsSocialMedia),
        maps_rating: record.rating(Field::MapsRating),
        language_barriers: record.answer(Field::LanguageBarriers),
        other_balkan_countries,
        workshops_interest: record.answer(Field::WorkshopsInterest),
        anything_else: record.text(Field::AnythingElse),
        month: MonthBucket::of(&timestamp),
    })
}
