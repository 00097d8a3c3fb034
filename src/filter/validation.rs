//! Pure validation over the filter under edit.

use crate::error::{QueueError, Result};

use super::Filter;
use super::menu::MenuVariant;

pub const START_DATE_REQUIRED: &str = "Select a start date";
pub const END_DATE_REQUIRED: &str = "Select an end date";
pub const END_BEFORE_START: &str = "End date must be after start date";
pub const DATE_RANGE_REQUIRED: &str =
    "A date range is required if Status includes 'Complete' or 'Cancelled'";
pub const ASSIGNMENT_REQUIRED: &str = "Select an assignment or created by me";
pub const NAME_REQUIRED: &str = "Filter name is required";
pub const NAME_INVALID_CHARACTER: &str = "Filter name cannot contain '%'";

/// Which part of the filter an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationField {
    StartDate,
    EndDate,
    Status,
    Assignment,
    Name,
}

/// Errors found in a filter, keyed by the field the user has to fix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(ValidationField, &'static str)>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    fn push(&mut self, field: ValidationField, message: &'static str) {
        self.errors.push((field, message));
    }

    /// First error for a field, if any
    pub fn get(&self, field: ValidationField) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| *message)
    }

    pub fn contains(&self, message: &str) -> bool {
        self.errors.iter().any(|(_, m)| *m == message)
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|(_, m)| m.to_string()).collect()
    }

    /// Merge another set of errors into this one
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(QueueError::Validation(self.messages()))
        }
    }
}

/// Validate the criteria of a filter for the given menu variant
pub fn validate_filter(filter: &Filter, variant: MenuVariant) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let range = &filter.date_range;

    if range.custom {
        match (range.start, range.end) {
            (None, end) => {
                errors.push(ValidationField::StartDate, START_DATE_REQUIRED);
                if end.is_none() {
                    errors.push(ValidationField::EndDate, END_DATE_REQUIRED);
                }
            }
            (Some(_), None) => errors.push(ValidationField::EndDate, END_DATE_REQUIRED),
            (Some(start), Some(end)) if end < start => {
                errors.push(ValidationField::EndDate, END_BEFORE_START)
            }
            _ => {}
        }
    }

    if filter.status.iter().any(|s| s.is_closed()) && !range.is_active() {
        errors.push(ValidationField::Status, DATE_RANGE_REQUIRED);
    }

    if variant == MenuVariant::Strict
        && filter.teams.is_empty()
        && filter.assignments == crate::types::Assignment::Any
        && !filter.created_by_me
    {
        errors.push(ValidationField::Assignment, ASSIGNMENT_REQUIRED);
    }

    errors
}

/// Validate a filter name before saving
pub fn validate_filter_name(name: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if name.trim().is_empty() {
        errors.push(ValidationField::Name, NAME_REQUIRED);
    } else if name.contains('%') {
        errors.push(ValidationField::Name, NAME_INVALID_CHARACTER);
    }
    errors
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::filter::DateRangeValue;
    use crate::types::{Assignment, Status};

    fn custom(start: Option<jiff::civil::Date>, end: Option<jiff::civil::Date>) -> Filter {
        Filter::adhoc()
            .with_assignment(Assignment::Mine)
            .with_date_range(DateRangeValue::Custom { start, end })
    }

    #[test]
    fn test_missing_dates() {
        let errors = validate_filter(&custom(None, None), MenuVariant::Strict);
        assert_eq!(errors.get(ValidationField::StartDate), Some(START_DATE_REQUIRED));
        assert_eq!(errors.get(ValidationField::EndDate), Some(END_DATE_REQUIRED));

        let errors = validate_filter(&custom(Some(date(2024, 3, 1)), None), MenuVariant::Strict);
        assert_eq!(errors.get(ValidationField::StartDate), None);
        assert_eq!(errors.get(ValidationField::EndDate), Some(END_DATE_REQUIRED));
    }

    #[test]
    fn test_end_before_start_reports_only_ordering_error() {
        let pairs = [
            (date(2024, 3, 2), date(2024, 3, 1)),
            (date(2024, 1, 1), date(2023, 12, 31)),
            (date(2030, 6, 15), date(2001, 6, 15)),
        ];
        for (start, end) in pairs {
            let errors = validate_filter(&custom(Some(start), Some(end)), MenuVariant::Lenient);
            assert!(errors.contains(END_BEFORE_START));
            assert!(!errors.contains(START_DATE_REQUIRED));
            assert!(!errors.contains(END_DATE_REQUIRED));
        }
    }

    #[test]
    fn test_same_day_range_is_valid() {
        let d = date(2024, 3, 1);
        assert!(validate_filter(&custom(Some(d), Some(d)), MenuVariant::Strict).is_empty());
    }

    #[test]
    fn test_closed_status_requires_date_range() {
        let filter = Filter::adhoc()
            .with_assignment(Assignment::Mine)
            .with_status([Status::Complete]);
        let errors = validate_filter(&filter, MenuVariant::Strict);
        assert_eq!(errors.get(ValidationField::Status), Some(DATE_RANGE_REQUIRED));

        let fixed = filter.with_date_range(DateRangeValue::Preset("30days".into()));
        assert!(validate_filter(&fixed, MenuVariant::Strict).is_empty());
    }

    #[test]
    fn test_assignment_rule_only_in_strict_variant() {
        let filter = Filter::adhoc();
        assert!(
            validate_filter(&filter, MenuVariant::Strict).contains(ASSIGNMENT_REQUIRED)
        );
        assert!(validate_filter(&filter, MenuVariant::Lenient).is_empty());

        let with_team = filter.toggle_team("IT");
        assert!(validate_filter(&with_team, MenuVariant::Strict).is_empty());
    }

    #[test]
    fn test_filter_name_rules() {
        assert!(validate_filter_name("").contains(NAME_REQUIRED));
        assert!(validate_filter_name("   ").contains(NAME_REQUIRED));
        assert!(validate_filter_name("100% mine").contains(NAME_INVALID_CHARACTER));
        assert!(validate_filter_name("Mine, open").is_empty());
    }

    #[test]
    fn test_into_result() {
        let err = validate_filter_name("").into_result().unwrap_err();
        assert!(matches!(err, QueueError::Validation(ref m) if m[0] == NAME_REQUIRED));
    }
}
