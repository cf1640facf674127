use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDateTime};

/// One spreadsheet row keyed by its raw header text.
pub type RawRecord = HashMap<String, String>;

/// Everything read from the responses tab, before renaming.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    /// 1-based sheet row of each record; the header row is row 1.
    pub sheet_rows: Vec<usize>,
}

impl RawTable {
    /// Records taken from consecutive sheet rows right below the header row.
    pub fn new(headers: Vec<String>, records: Vec<RawRecord>) -> Self {
        let sheet_rows = (2..records.len() + 2).collect();
        Self::with_sheet_rows(headers, records, sheet_rows)
    }

    pub fn with_sheet_rows(
        headers: Vec<String>,
        records: Vec<RawRecord>,
        sheet_rows: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(records.len(), sheet_rows.len());
        Self {
            headers,
            records,
            sheet_rows,
        }
    }

    pub fn sheet_row(&self, idx: usize) -> usize {
        self.sheet_rows.get(idx).copied().unwrap_or(idx + 2)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Canonical field names used after renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Timestamp,
    Name,
    Country,
    FirstTime,
    OtherCitiesVisited,
    StaffRating,
    Improvements,
    AgeGroup,
    PartySize,
    PrimaryVisitReason,
    FollowsSocialMedia,
    MapsRating,
    LanguageBarriers,
    OtherBalkanCountries,
    WorkshopsInterest,
    AnythingElse,
    Month,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Name => "name",
            Field::Country => "country",
            Field::FirstTime => "first_time",
            Field::OtherCitiesVisited => "other_cities_visited",
            Field::StaffRating => "staff_rating",
            Field::Improvements => "improvements",
            Field::AgeGroup => "age_group",
            Field::PartySize => "party_size",
            Field::PrimaryVisitReason => "primary_visit_reason",
            Field::FollowsSocialMedia => "follows_social_media",
            Field::MapsRating => "maps_rating",
            Field::LanguageBarriers => "language_barriers",
            Field::OtherBalkanCountries => "other_balkan_countries",
            Field::WorkshopsInterest => "workshops_interest",
            Field::AnythingElse => "anything_else",
            Field::Month => "month",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Year-month bucket. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Answer to a yes/no question. Anything else, blanks included, is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Answer {
    Yes,
    No,
    Other(String),
}

impl Answer {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("yes") {
            Answer::Yes
        } else if trimmed.eq_ignore_ascii_case("no") {
            Answer::No
        } else {
            Answer::Other(raw.to_string())
        }
    }
}

/// Group size as answered. `None` when the cell was blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartySize(pub Option<u32>);

impl PartySize {
    pub fn headcount(&self) -> u64 {
        self.0.map(u64::from).unwrap_or(0)
    }
}

impl fmt::Display for PartySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(size) => write!(f, "{}", size),
            None => Ok(()),
        }
    }
}

/// One survey submission after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    /// Sheet row the response came from.
    pub row: usize,
    pub timestamp: NaiveDateTime,
    pub name: String,
    pub country: String,
    pub first_time: Answer,
    pub other_cities_visited: String,
    pub staff_rating: Option<u8>,
    pub improvements: String,
    pub age_group: String,
    pub party_size: PartySize,
    pub primary_visit_reason: String,
    pub follows_social_media: Answer,
    pub maps_rating: Option<u8>,
    pub language_barriers: Answer,
    pub other_balkan_countries: Vec<String>,
    pub workshops_interest: Answer,
    pub anything_else: String,
    pub month: MonthBucket,
}

/// The normalized record set plus the canonical fields the input carried.
#[derive(Debug, Clone, Default)]
pub struct Survey {
    pub records: Vec<ResponseRecord>,
    pub fields: BTreeSet<Field>,
}

impl Survey {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }
}

/// Key of a yes/no summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    Yes,
    No,
    Other,
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKey::Yes => f.write_str("Yes"),
            FlagKey::No => f.write_str("No"),
            FlagKey::Other => f.write_str("Other"),
        }
    }
}

/// Grouped measure, in the order the aggregation defines.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable<K> {
    pub rows: Vec<(K, u64)>,
}

impl<K> Default for SummaryTable<K> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<K: PartialEq> SummaryTable<K> {
    pub fn new(rows: Vec<(K, u64)>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|(_, value)| value).sum()
    }

    pub fn get(&self, key: &K) -> Option<u64> {
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.iter().map(|(key, _)| key)
    }
}

/// The seven tables feeding the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summaries {
    pub party_size_by_country: SummaryTable<String>,
    pub age_groups: SummaryTable<String>,
    pub responses_by_month: SummaryTable<MonthBucket>,
    pub party_sizes: SummaryTable<PartySize>,
    pub follows_social_media: SummaryTable<FlagKey>,
    pub first_time: SummaryTable<FlagKey>,
    pub visit_reasons: SummaryTable<String>,
}

impl Summaries {
    pub fn all_empty(&self) -> bool {
        self.party_size_by_country.is_empty()
            && self.age_groups.is_empty()
            && self.responses_by_month.is_empty()
            && self.party_sizes.is_empty()
            && self.follows_social_media.is_empty()
            && self.first_time.is_empty()
            && self.visit_reasons.is_empty()
    }
}
