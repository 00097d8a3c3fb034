//! Filter menu edit session.
//!
//! The menu keeps the filter being edited (`current_filter`) next to the
//! snapshot taken when editing began (`initial_filter`). All transitions go
//! through [`reduce_filter_menu`]; applying, saving and deleting are effects
//! performed by the caller once validation passes.

use crate::error::{QueueError, Result};
use crate::types::{Assignment, FilterType, SortDirection, SortField, Status, Timeline};

use super::validation::{ValidationErrors, validate_filter, validate_filter_name};
use super::{DateRangeValue, Filter};

/// Facet editor visible in the menu; `None` in the state means the overview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSection {
    Teams,
    Assignment,
    Status,
    Date,
    Sort,
    Save,
    SaveFilter,
    DeleteFilter,
}

enum_display_fromstr!(
    MenuSection,
    QueueError::Other,
    {
        Teams => "teams",
        Assignment => "assignment",
        Status => "status",
        Date => "date",
        Sort => "sort",
        Save => "save",
        SaveFilter => "save-filter",
        DeleteFilter => "delete-filter",
    }
);

/// The two menu flavours differ in how strictly they validate
///
/// `Strict` additionally requires an assignment, a team or "created by me"
/// before a filter may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuVariant {
    #[default]
    Strict,
    Lenient,
}

/// State of the filter menu session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMenuState {
    pub is_open: bool,
    /// Snapshot when editing began; baseline for dirty checks and reset
    pub initial_filter: Option<Filter>,
    /// Filter under edit
    pub current_filter: Option<Filter>,
    pub active_section: Option<MenuSection>,
    /// Working copy of the name while saving
    pub filter_name: String,
}

/// All transitions of the filter menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMenuAction {
    Open(Filter),
    Close,
    Reset,
    ShowSection(Option<MenuSection>),
    ToggleTeam(String),
    ToggleStatus(Status),
    ToggleAssignment(Assignment),
    ToggleCreatedByMe(bool),
    SetDateRangeTimeline(Timeline),
    SetDateRange(DateRangeValue),
    SetSortedBy(SortField),
    SetSortDirection(SortDirection),
    SetFilterName(String),
}

/// Pure function: apply an action to the menu state
///
/// Editing actions on a closed menu are ignored.
pub fn reduce_filter_menu(mut state: FilterMenuState, action: FilterMenuAction) -> FilterMenuState {
    let action = match action {
        FilterMenuAction::Open(filter) => {
            let filter_name = if filter.filter_type == FilterType::Custom {
                filter.name.clone()
            } else {
                String::new()
            };
            return FilterMenuState {
                is_open: true,
                initial_filter: Some(filter.clone()),
                current_filter: Some(filter),
                active_section: None,
                filter_name,
            };
        }
        FilterMenuAction::Close => return FilterMenuState::default(),
        other => other,
    };

    if !state.is_open {
        return state;
    }

    match action {
        FilterMenuAction::Reset => {
            state.current_filter = state.initial_filter.clone();
        }
        FilterMenuAction::ShowSection(section) => {
            state.active_section = if section.is_some() && section == state.active_section {
                None
            } else {
                section
            };
        }
        FilterMenuAction::SetFilterName(name) => {
            state.current_filter = state.current_filter.map(|f| f.with_name(name.clone()));
            state.filter_name = name;
        }
        edit => {
            state.current_filter = state.current_filter.map(|f| apply_edit(f, edit));
        }
    }

    state
}

fn apply_edit(filter: Filter, action: FilterMenuAction) -> Filter {
    match action {
        FilterMenuAction::ToggleTeam(team) => filter.toggle_team(&team),
        FilterMenuAction::ToggleStatus(status) => filter.toggle_status(status),
        FilterMenuAction::ToggleAssignment(assignment) => filter.with_assignment(assignment),
        FilterMenuAction::ToggleCreatedByMe(value) => filter.with_created_by_me(value),
        FilterMenuAction::SetDateRangeTimeline(timeline) => filter.with_timeline(timeline),
        FilterMenuAction::SetDateRange(value) => filter.with_date_range(value),
        FilterMenuAction::SetSortedBy(field) => filter.with_sort_by(field),
        FilterMenuAction::SetSortDirection(direction) => filter.with_sort_direction(direction),
        _ => filter,
    }
}

impl FilterMenuState {
    /// Open a session editing `filter`
    pub fn open(filter: Filter) -> Self {
        reduce_filter_menu(Self::default(), FilterMenuAction::Open(filter))
    }

    /// Apply a sequence of actions in order
    pub fn apply_all<I>(self, actions: I) -> Self
    where
        I: IntoIterator<Item = FilterMenuAction>,
    {
        actions.into_iter().fold(self, reduce_filter_menu)
    }

    /// True when the filter under edit differs from the baseline
    pub fn is_dirty(&self) -> bool {
        self.current_filter != self.initial_filter
    }

    /// Re-evaluate validation for the filter under edit
    pub fn validate(&self, variant: MenuVariant) -> ValidationErrors {
        match &self.current_filter {
            Some(filter) => validate_filter(filter, variant),
            None => ValidationErrors::default(),
        }
    }

    fn current(&self) -> Result<&Filter> {
        self.current_filter
            .as_ref()
            .ok_or_else(|| QueueError::Other("filter menu is not open".to_string()))
    }

    /// Validate and produce the ad hoc filter to run
    pub fn apply(&self, variant: MenuVariant) -> Result<Filter> {
        let filter = self.current()?;
        validate_filter(filter, variant).into_result()?;
        Ok(filter.clone().with_type(FilterType::Adhoc))
    }

    /// Validate and produce the personal filter to persist
    ///
    /// `existing` are the user's saved filters; the name must not collide with
    /// one of them unless it is the filter this session started from.
    pub fn save(&self, variant: MenuVariant, existing: &[Filter]) -> Result<Filter> {
        let filter = self.current()?;
        let mut errors = validate_filter(filter, variant);
        errors.extend(validate_filter_name(&self.filter_name));
        errors.into_result()?;

        let name = self.filter_name.trim().to_string();
        let editing = self
            .initial_filter
            .as_ref()
            .filter(|f| f.filter_type == FilterType::Custom)
            .map(|f| f.name.as_str());
        let collides = existing.iter().any(|f| {
            f.name.eq_ignore_ascii_case(&name)
                && editing.is_none_or(|original| !original.eq_ignore_ascii_case(&name))
        });
        if collides {
            return Err(QueueError::DuplicateFilter(name));
        }

        Ok(filter
            .clone()
            .with_type(FilterType::Custom)
            .with_name(name))
    }

    /// The saved filter this session would delete
    pub fn delete_target(&self) -> Result<Filter> {
        match &self.initial_filter {
            Some(f) if f.filter_type == FilterType::Custom => Ok(f.clone()),
            Some(f) => Err(QueueError::Other(format!(
                "only personal filters can be deleted, '{}' is a {} filter",
                f.display_name(),
                f.filter_type
            ))),
            None => Err(QueueError::Other("filter menu is not open".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::filter::validation::{ASSIGNMENT_REQUIRED, DATE_RANGE_REQUIRED};

    fn open_adhoc() -> FilterMenuState {
        FilterMenuState::open(Filter::adhoc())
    }

    #[test]
    fn test_open_initializes_session() {
        let custom = Filter::new(FilterType::Custom, "Escalations");
        let state = FilterMenuState::open(custom.clone());
        assert!(state.is_open);
        assert_eq!(state.initial_filter.as_ref(), Some(&custom));
        assert_eq!(state.current_filter.as_ref(), Some(&custom));
        assert_eq!(state.active_section, None);
        assert_eq!(state.filter_name, "Escalations");

        let team = FilterMenuState::open(Filter::new(FilterType::Team, "IT"));
        assert_eq!(team.filter_name, "");
    }

    #[test]
    fn test_open_replaces_session() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::ToggleTeam("IT".into()),
            FilterMenuAction::ShowSection(Some(MenuSection::Teams)),
        ]);
        let next = Filter::new(FilterType::Custom, "Other");
        let state = reduce_filter_menu(state, FilterMenuAction::Open(next.clone()));
        assert_eq!(state, FilterMenuState::open(next));
    }

    #[test]
    fn test_close_discards_session() {
        let state = reduce_filter_menu(open_adhoc(), FilterMenuAction::Close);
        assert_eq!(state, FilterMenuState::default());
    }

    #[test]
    fn test_reset_keeps_section() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::ShowSection(Some(MenuSection::Status)),
            FilterMenuAction::ToggleStatus(Status::Open),
            FilterMenuAction::Reset,
        ]);
        assert_eq!(state.current_filter, state.initial_filter);
        assert_eq!(state.active_section, Some(MenuSection::Status));
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_show_same_section_twice_closes_it() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::ShowSection(Some(MenuSection::Date)),
            FilterMenuAction::ShowSection(Some(MenuSection::Date)),
        ]);
        assert_eq!(state.active_section, None);

        let state = reduce_filter_menu(
            state,
            FilterMenuAction::ShowSection(Some(MenuSection::Sort)),
        );
        let state = reduce_filter_menu(
            state,
            FilterMenuAction::ShowSection(Some(MenuSection::Teams)),
        );
        assert_eq!(state.active_section, Some(MenuSection::Teams));
    }

    #[test]
    fn test_edits_ignored_when_closed() {
        let state = reduce_filter_menu(
            FilterMenuState::default(),
            FilterMenuAction::ToggleTeam("IT".into()),
        );
        assert_eq!(state, FilterMenuState::default());
    }

    #[test]
    fn test_assignment_and_created_by_me_are_independent() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::ToggleAssignment(Assignment::Unassigned),
            FilterMenuAction::ToggleCreatedByMe(true),
        ]);
        let f = state.current_filter.unwrap();
        assert_eq!(f.assignments, Assignment::Unassigned);
        assert!(f.created_by_me);
    }

    #[test]
    fn test_timeline_with_preset_forces_sort() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::SetDateRange(DateRangeValue::Preset("7days".into())),
            FilterMenuAction::SetDateRangeTimeline(Timeline::UpdatedAt),
        ]);
        assert_eq!(state.current_filter.unwrap().sort_by, SortField::UpdatedAt);
    }

    #[test]
    fn test_timeline_without_range_leaves_sort() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::SetSortedBy(SortField::DueDate),
            FilterMenuAction::SetDateRangeTimeline(Timeline::UpdatedAt),
        ]);
        let f = state.current_filter.unwrap();
        assert_eq!(f.sort_by, SortField::DueDate);
        assert_eq!(f.date_range.timeline, Timeline::UpdatedAt);
    }

    #[test]
    fn test_set_date_range_forces_sort_and_clear_does_not() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::SetDateRangeTimeline(Timeline::ClosedAt),
            FilterMenuAction::SetDateRange(DateRangeValue::Custom {
                start: Some(date(2024, 1, 1)),
                end: Some(date(2024, 1, 31)),
            }),
        ]);
        assert_eq!(
            state.current_filter.as_ref().unwrap().sort_by,
            SortField::ClosedAt
        );

        let state = state.apply_all([
            FilterMenuAction::SetSortedBy(SortField::DueDate),
            FilterMenuAction::SetDateRange(DateRangeValue::Clear),
        ]);
        assert_eq!(state.current_filter.unwrap().sort_by, SortField::DueDate);
    }

    #[test]
    fn test_sort_setters_are_not_gated() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::SetDateRange(DateRangeValue::Preset("7days".into())),
            FilterMenuAction::SetSortedBy(SortField::DueDate),
            FilterMenuAction::SetSortDirection(SortDirection::Asc),
        ]);
        let f = state.current_filter.unwrap();
        assert_eq!(f.sort_by, SortField::DueDate);
        assert_eq!(f.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn test_set_filter_name_updates_both() {
        let state = reduce_filter_menu(
            open_adhoc(),
            FilterMenuAction::SetFilterName("Late".into()),
        );
        assert_eq!(state.filter_name, "Late");
        assert_eq!(state.current_filter.unwrap().name, "Late");
    }

    #[test]
    fn test_apply_requires_date_range_for_closed_status() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::ToggleAssignment(Assignment::Mine),
            FilterMenuAction::ToggleStatus(Status::Complete),
        ]);
        let err = state.apply(MenuVariant::Strict).unwrap_err();
        assert!(matches!(err, QueueError::Validation(ref m) if m.contains(&DATE_RANGE_REQUIRED.to_string())));

        let state = reduce_filter_menu(
            state,
            FilterMenuAction::SetDateRange(DateRangeValue::Preset("30days".into())),
        );
        let applied = state.apply(MenuVariant::Strict).unwrap();
        assert_eq!(applied.filter_type, FilterType::Adhoc);
    }

    #[test]
    fn test_apply_variants() {
        let state = open_adhoc();
        let err = state.apply(MenuVariant::Strict).unwrap_err();
        assert!(matches!(err, QueueError::Validation(ref m) if m[0] == ASSIGNMENT_REQUIRED));
        assert!(state.apply(MenuVariant::Lenient).is_ok());
    }

    #[test]
    fn test_save_rejects_duplicates_but_allows_resave() {
        let existing = vec![
            Filter::new(FilterType::Custom, "Escalations").with_assignment(Assignment::Mine),
            Filter::new(FilterType::Custom, "Backlog").with_assignment(Assignment::Mine),
        ];

        let fresh = open_adhoc().apply_all([
            FilterMenuAction::ToggleAssignment(Assignment::Mine),
            FilterMenuAction::SetFilterName("backlog".into()),
        ]);
        assert!(matches!(
            fresh.save(MenuVariant::Strict, &existing),
            Err(QueueError::DuplicateFilter(_))
        ));

        let editing = FilterMenuState::open(existing[1].clone()).apply_all([
            FilterMenuAction::ToggleStatus(Status::Open),
        ]);
        let saved = editing.save(MenuVariant::Strict, &existing).unwrap();
        assert_eq!(saved.name, "Backlog");
        assert_eq!(saved.filter_type, FilterType::Custom);
    }

    #[test]
    fn test_save_validates_name() {
        let state = open_adhoc().apply_all([
            FilterMenuAction::ToggleCreatedByMe(true),
            FilterMenuAction::SetFilterName("50% done".into()),
        ]);
        assert!(matches!(
            state.save(MenuVariant::Strict, &[]),
            Err(QueueError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_target_only_for_custom() {
        let custom = Filter::new(FilterType::Custom, "Mine late");
        assert_eq!(
            FilterMenuState::open(custom.clone()).delete_target().unwrap(),
            custom
        );
        assert!(open_adhoc().delete_target().is_err());
        assert!(FilterMenuState::default().delete_target().is_err());
    }

    #[test]
    fn test_section_parse() {
        assert_eq!(
            "save-filter".parse::<MenuSection>().unwrap(),
            MenuSection::SaveFilter
        );
    }
}
