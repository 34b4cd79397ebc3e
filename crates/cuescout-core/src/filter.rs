//! Filter compilation.
//!
//! Turns a declarative [`FilterSpec`] into an ordered, conjunctive
//! [`PredicateSet`]. Compilation is pure and total: unrecognized or empty
//! fields are simply omitted, never an error. The resulting predicates are
//! evaluable in-process (for tests and fakes) and translatable to SQL by
//! the persistence crate.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::Tournament;

/// Filter criteria as supplied by the consumer session. Every field is
/// optional; an empty specification matches all tournaments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Substring match against the tournament name.
    pub search: Option<String>,
    pub game_type: Option<String>,
    pub format: Option<String>,
    pub equipment: Option<String>,
    pub skill_level: Option<String>,
    /// Inclusive lower bound on the scheduled date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the scheduled date.
    pub date_to: Option<NaiveDate>,
    /// Inclusive upper bound on the entry fee.
    pub max_entry_fee: Option<Decimal>,
    /// Tri-state: `None` means "not filtering on this flag". `Some(false)`
    /// is a real filter value, not "filter off".
    pub reports_to_fargo: Option<bool>,
    pub handicapped: Option<bool>,
}

/// Enumerated text attributes that filter by trimmed, case-folded equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    GameType,
    Format,
    Equipment,
    SkillLevel,
}

impl TextField {
    /// Column name in the `tournaments` table.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::GameType => "game_type",
            Self::Format => "format",
            Self::Equipment => "equipment",
            Self::SkillLevel => "skill_level",
        }
    }
}

/// Boolean attributes with tri-state filter semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagField {
    ReportsToFargo,
    Handicapped,
}

impl FlagField {
    /// Column name in the `tournaments` table.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::ReportsToFargo => "reports_to_fargo",
            Self::Handicapped => "handicapped",
        }
    }
}

/// One compiled predicate clause. Text payloads are stored already
/// normalized (trimmed, case-folded) so evaluation sites never re-decide
/// the comparison rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match against the tournament name.
    NameContains(String),
    /// Trimmed, case-insensitive equality on an enumerated text field.
    TextEquals { field: TextField, value: String },
    ScheduledOnOrAfter(NaiveDate),
    ScheduledOnOrBefore(NaiveDate),
    EntryFeeAtMost(Decimal),
    FlagIs { field: FlagField, value: bool },
}

impl Predicate {
    /// Evaluates this clause against a tournament record.
    ///
    /// Stored text is normalized the same way the filter value was at
    /// compile time; a record missing the filtered attribute does not
    /// satisfy an explicit constraint on it.
    #[must_use]
    pub fn matches(&self, t: &Tournament) -> bool {
        match self {
            Self::NameContains(needle) => t.name.to_lowercase().contains(needle),
            Self::TextEquals { field, value } => {
                text_field(t, *field).is_some_and(|stored| normalize_term(stored) == *value)
            }
            Self::ScheduledOnOrAfter(from) => t.scheduled_date >= *from,
            Self::ScheduledOnOrBefore(to) => t.scheduled_date <= *to,
            Self::EntryFeeAtMost(limit) => t.entry_fee.is_some_and(|fee| fee <= *limit),
            Self::FlagIs { field, value } => flag_field(t, *field) == *value,
        }
    }
}

/// An ordered, conjunctive set of compiled predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.predicates.iter()
    }

    /// `true` when the tournament satisfies every clause. An empty set
    /// matches everything.
    #[must_use]
    pub fn matches(&self, t: &Tournament) -> bool {
        self.predicates.iter().all(|p| p.matches(t))
    }
}

impl<'a> IntoIterator for &'a PredicateSet {
    type Item = &'a Predicate;
    type IntoIter = std::slice::Iter<'a, Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.predicates.iter()
    }
}

/// Compiles a filter specification into predicate clauses.
///
/// Pure and total: empty or whitespace-only text fields are treated as
/// absent, unset flags compile to no clause at all.
#[must_use]
pub fn compile(spec: &FilterSpec) -> PredicateSet {
    let mut predicates = Vec::new();

    if let Some(needle) = spec.search.as_deref().map(normalize_term) {
        if !needle.is_empty() {
            predicates.push(Predicate::NameContains(needle));
        }
    }

    let text_filters = [
        (TextField::GameType, spec.game_type.as_deref()),
        (TextField::Format, spec.format.as_deref()),
        (TextField::Equipment, spec.equipment.as_deref()),
        (TextField::SkillLevel, spec.skill_level.as_deref()),
    ];
    for (field, raw) in text_filters {
        if let Some(value) = raw.map(normalize_term) {
            if !value.is_empty() {
                predicates.push(Predicate::TextEquals { field, value });
            }
        }
    }

    if let Some(from) = spec.date_from {
        predicates.push(Predicate::ScheduledOnOrAfter(from));
    }
    if let Some(to) = spec.date_to {
        predicates.push(Predicate::ScheduledOnOrBefore(to));
    }
    if let Some(limit) = spec.max_entry_fee {
        predicates.push(Predicate::EntryFeeAtMost(limit));
    }

    let flag_filters = [
        (FlagField::ReportsToFargo, spec.reports_to_fargo),
        (FlagField::Handicapped, spec.handicapped),
    ];
    for (field, raw) in flag_filters {
        if let Some(value) = raw {
            predicates.push(Predicate::FlagIs { field, value });
        }
    }

    PredicateSet { predicates }
}

/// Trims and case-folds operator-entered text. Equality filters on
/// enumerated fields go through this on both sides; an exact case-sensitive
/// match against free-entered data is a known failure mode.
#[must_use]
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn text_field(t: &Tournament, field: TextField) -> Option<&str> {
    match field {
        TextField::GameType => t.game_type.as_deref(),
        TextField::Format => t.format.as_deref(),
        TextField::Equipment => t.equipment.as_deref(),
        TextField::SkillLevel => t.skill_level.as_deref(),
    }
}

fn flag_field(t: &Tournament, field: FlagField) -> bool {
    match field {
        FlagField::ReportsToFargo => t.reports_to_fargo,
        FlagField::Handicapped => t.handicapped,
    }
}
