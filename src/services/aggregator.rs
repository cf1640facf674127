use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::config::FlagPolicy;
use crate::error::AppError;
use crate::models::{
    Answer, Field, FlagKey, MonthBucket, PartySize, ResponseRecord, Summaries, Survey,
    SummaryTable,
};

/// Computes the dashboard tables from one immutable survey snapshot.
pub struct Aggregator<'a> {
    survey: &'a Survey,
    flag_policy: FlagPolicy,
}

impl<'a> Aggregator<'a> {
    pub fn new(survey: &'a Survey, flag_policy: FlagPolicy) -> Self {
        Self {
            survey,
            flag_policy,
        }
    }

    pub fn aggregate(&self) -> Result<Summaries, AppError> {
        let start = std::time::Instant::now();

        let summaries = Summaries {
            party_size_by_country: self.party_size_by_country()?,
            age_groups: self.age_groups()?,
            responses_by_month: self.responses_by_month()?,
            party_sizes: self.party_sizes()?,
            follows_social_media: self.flag_counts(Field::FollowsSocialMedia, |r| {
                &r.follows_social_media
            })?,
            first_time: self.flag_counts(Field::FirstTime, |r| &r.first_time)?,
            visit_reasons: self.visit_reasons()?,
        };

        tracing::info!(
            "Aggregated {} records ({} visitors): {} countries, {} months, {} visit reasons in {:?}",
            self.survey.len(),
            summaries.party_size_by_country.total(),
            summaries.party_size_by_country.len(),
            summaries.responses_by_month.len(),
            summaries.visit_reasons.len(),
            start.elapsed()
        );

        Ok(summaries)
    }

    /// A grouping field must exist somewhere unless there is nothing to group.
    fn require(&self, field: Field) -> Result<(), AppError> {
        if self.survey.is_empty() || self.survey.has_field(field) {
            Ok(())
        } else {
            Err(AppError::MissingField(field.to_string()))
        }
    }

    pub fn party_size_by_country(&self) -> Result<SummaryTable<String>, AppError> {
        self.require(Field::Country)?;
        self.require(Field::PartySize)?;

        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for record in &self.survey.records {
            *totals.entry(record.country.as_str()).or_insert(0) += record.party_size.headcount();
        }

        Ok(SummaryTable::new(
            totals
                .into_iter()
                .map(|(country, total)| (country.to_string(), total))
                .collect(),
        ))
    }

    pub fn age_groups(&self) -> Result<SummaryTable<String>, AppError> {
        self.require(Field::AgeGroup)?;
        Ok(sorted_counts(
            self.survey.records.iter().map(|r| r.age_group.clone()),
        ))
    }

    pub fn responses_by_month(&self) -> Result<SummaryTable<MonthBucket>, AppError> {
        self.require(Field::Month)?;
        Ok(sorted_counts(self.survey.records.iter().map(|r| r.month)))
    }

    pub fn party_sizes(&self) -> Result<SummaryTable<PartySize>, AppError> {
        self.require(Field::PartySize)?;
        Ok(value_counts(self.survey.records.iter().map(|r| r.party_size)))
    }

    pub fn visit_reasons(&self) -> Result<SummaryTable<String>, AppError> {
        self.require(Field::PrimaryVisitReason)?;
        Ok(value_counts(
            self.survey
                .records
                .iter()
                .map(|r| r.primary_visit_reason.clone()),
        ))
    }

    /// Yes/No tally. Non-empty input always carries `Yes` then `No`; `Other` only when used.
    pub fn flag_counts<F>(&self, field: Field, answer_of: F) -> Result<SummaryTable<FlagKey>, AppError>
    where
        F: Fn(&ResponseRecord) -> &Answer,
    {
        self.require(field)?;
        if self.survey.is_empty() {
            return Ok(SummaryTable::default());
        }

        let (mut yes, mut no, mut other) = (0u64, 0u64, 0u64);
        for record in &self.survey.records {
            match answer_of(record) {
                Answer::Yes => yes += 1,
                Answer::No => no += 1,
                Answer::Other(value) => match self.flag_policy {
                    FlagPolicy::Bucket => other += 1,
                    FlagPolicy::Reject => {
                        return Err(AppError::CategoryMismatch {
                            field: field.to_string(),
                            value: value.clone(),
                            row: record.row,
                        })
                    }
                },
            }
        }

        let mut rows = vec![(FlagKey::Yes, yes), (FlagKey::No, no)];
        if other > 0 {
            tracing::warn!("{} answers to {} were neither Yes nor No", other, field);
            rows.push((FlagKey::Other, other));
        }
        Ok(SummaryTable::new(rows))
    }
}

/// Counts per key, ascending by key.
fn sorted_counts<K, I>(keys: I) -> SummaryTable<K>
where
    K: Ord + PartialEq,
    I: IntoIterator<Item = K>,
{
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    SummaryTable::new(counts.into_iter().collect())
}

/// Counts per key, most frequent first; equal counts keep first-occurrence order.
fn value_counts<K, I>(keys: I) -> SummaryTable<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut rows: Vec<(K, u64)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&pos) => rows[pos].1 += 1,
            None => {
                index.insert(key.clone(), rows.len());
                rows.push((key, 1));
            }
        }
    }

    // sort_by is stable
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    SummaryTable::new(rows)
}
