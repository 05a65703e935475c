// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::Record;
use crate::normalize::{normalize, normalize_opt};

/// Current search/status/category constraint. Status and category are held
/// in normalized form; the search term is only lower-cased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search_term: String,
    pub status_filter: String,
    pub category_filter: String,
}

impl FilterCriteria {
    /// Builds criteria from raw control values. `None` dropdowns mean "all".
    pub fn from_inputs(search: &str, status: Option<&str>, category: Option<&str>) -> Self {
        Self {
            search_term: search.trim().to_lowercase(),
            status_filter: normalize_opt(status),
            category_filter: normalize_opt(category),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && self.status_filter.is_empty()
            && self.category_filter.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record)
            && label_matches(&self.status_filter, &record.status)
            && label_matches(&self.category_filter, &record.category)
    }

    fn matches_search(&self, record: &Record) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        record.name.to_lowercase().contains(&self.search_term)
            || record.phone.to_lowercase().contains(&self.search_term)
    }
}

fn label_matches(filter: &str, value: &str) -> bool {
    filter.is_empty() || normalize(value) == filter
}

/// Visible subset of `records`, in their original order.
pub fn filter_records<'a>(records: &'a [Record], criteria: &FilterCriteria) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{FilterCriteria, filter_records};
    use crate::{Record, RecordId};

    fn record(id: &str, name: &str, phone: &str, status: &str, category: &str) -> Record {
        Record {
            id: RecordId::from(id),
            name: name.to_owned(),
            phone: phone.to_owned(),
            status: status.to_owned(),
            category: category.to_owned(),
            ..Record::default()
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("1", "Alice", "555-0101", "Open", "FIRST_TIMER"),
            record("2", "Bob", "555-0202", "Closed", "OUTREACH"),
            record("3", "Carol", "", "In Progress", "SECOND_TIMER"),
            record("4", "", "555-0404", "", ""),
            record("5", "Alicia Bobson", "555-0505", "in_progress", "first timer"),
        ]
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|record| record.id.to_string()).collect()
    }

    #[test]
    fn empty_criteria_is_identity() {
        let records = sample();
        let criteria = FilterCriteria::from_inputs("", None, None);
        assert!(criteria.is_empty());
        let filtered = filter_records(&records, &criteria);
        assert_eq!(filtered.len(), records.len());
        assert!(filtered.iter().zip(&records).all(|(a, b)| *a == b));
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let records = vec![
            record("1", "Alice", "", "Open", ""),
            record("2", "Bob", "", "Closed", ""),
        ];
        let criteria = FilterCriteria::from_inputs("bob", Some(""), Some(""));
        let filtered = filter_records(&records, &criteria);
        assert_eq!(ids(&filtered), vec!["2"]);
    }

    #[test]
    fn search_matches_phone_substring() {
        let records = sample();
        let criteria = FilterCriteria::from_inputs("0404", None, None);
        assert_eq!(ids(&filter_records(&records, &criteria)), vec!["4"]);
    }

    #[test]
    fn search_term_is_not_normalized() {
        let records = sample();
        let spaced = FilterCriteria::from_inputs("alicia bob", None, None);
        assert_eq!(ids(&filter_records(&records, &spaced)), vec!["5"]);

        let collapsed = FilterCriteria::from_inputs("aliciabob", None, None);
        assert!(filter_records(&records, &collapsed).is_empty());
    }

    #[test]
    fn status_filter_compares_normalized_values() {
        let records = vec![record("1", "Dana", "", "OPEN", "")];
        let criteria = FilterCriteria {
            status_filter: "open".to_owned(),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &criteria)), vec!["1"]);
    }

    #[test]
    fn status_and_category_match_across_spelling_drift() {
        let records = sample();
        let criteria = FilterCriteria::from_inputs("", Some("IN_PROGRESS"), Some("First Timer"));
        assert_eq!(ids(&filter_records(&records, &criteria)), vec!["5"]);
    }

    #[test]
    fn empty_record_fields_only_fail_non_empty_constraints() {
        let records = sample();
        let by_search = FilterCriteria::from_inputs("carol", None, None);
        assert_eq!(ids(&filter_records(&records, &by_search)), vec!["3"]);

        let by_status = FilterCriteria::from_inputs("", Some("Open"), None);
        assert_eq!(ids(&filter_records(&records, &by_status)), vec!["1"]);
    }

    #[test]
    fn output_is_ordered_subsequence() {
        let records = sample();
        let criteria = FilterCriteria::from_inputs("555", None, None);
        let filtered = filter_records(&records, &criteria);

        let mut cursor = 0;
        for kept in &filtered {
            let position = records[cursor..]
                .iter()
                .position(|record| record == *kept)
                .map(|offset| cursor + offset);
            let Some(position) = position else {
                panic!("record {} out of order", kept.id);
            };
            cursor = position + 1;
        }
        assert_eq!(ids(&filtered), vec!["1", "2", "4", "5"]);
    }
}
