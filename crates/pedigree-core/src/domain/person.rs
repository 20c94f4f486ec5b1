//! Person attributes carried by every node of the chart.
//!
//! The attribute bag is plain data: it is copied into the editor panel on
//! selection and copied back on every edit. Nothing in here holds a reference
//! to a graph node.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PedigreeError;

/// Upper bound offered by the gestation-age picker
pub const MAX_GESTATION_WEEKS: u8 = 50;

/// Recorded gender of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Not known or not recorded
    #[default]
    Unknown,
}

impl Gender {
    /// The gender given by default to a sibling added next to a person of this gender
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
            Gender::Unknown => Gender::Unknown,
        }
    }
}

/// Derive the default gender of a newly created sibling.
///
/// Opposite-sex sibling by default; the user edits it afterwards if needed.
pub fn infer_sibling_gender(existing: Gender) -> Gender {
    existing.opposite()
}

/// Vital status of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IndividualStatus {
    /// Living person
    #[default]
    Alive,
    /// Deceased after birth
    Deceased,
    /// Pregnancy in progress
    Unborn,
    /// Stillbirth
    Stillborn,
    /// Miscarriage
    Miscarriage,
    /// Terminated pregnancy
    Aborted,
}

impl IndividualStatus {
    /// Birth/death dates apply; gestation age does not
    pub fn has_life_dates(self) -> bool {
        matches!(self, IndividualStatus::Alive | IndividualStatus::Deceased)
    }

    /// Gestation age applies
    pub fn has_gestation_age(self) -> bool {
        !self.has_life_dates()
    }
}

/// Heredity option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HeredityValue {
    /// No heredity note
    #[default]
    None,
    /// Childless by choice
    Childless,
    /// Infertile
    Infertile,
}

/// Carrier status of the tracked condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CarrierStatus {
    /// Not affected
    #[default]
    NotAffected,
    /// Affected
    Affected,
    /// Carrier
    Carrier,
    /// Pre-symptomatic
    PreSymptomatic,
}

/// Gestation age: "-" when not applicable, otherwise a week count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "GestationRepr", into = "String")]
pub enum GestationAge {
    /// Rendered as "-"
    #[default]
    NotApplicable,
    /// Completed weeks of gestation
    Weeks(u8),
}

impl GestationAge {
    /// Build a week count, rejecting values outside 1..=50
    pub fn weeks(weeks: u8) -> Result<Self, PedigreeError> {
        if weeks == 0 || weeks > MAX_GESTATION_WEEKS {
            return Err(PedigreeError::InvalidAttribute(format!(
                "gestation age must be between 1 and {} weeks, got {}",
                MAX_GESTATION_WEEKS, weeks
            )));
        }
        Ok(GestationAge::Weeks(weeks))
    }
}

impl fmt::Display for GestationAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestationAge::NotApplicable => write!(f, "-"),
            GestationAge::Weeks(weeks) => write!(f, "{}", weeks),
        }
    }
}

impl FromStr for GestationAge {
    type Err = PedigreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "-" || trimmed.is_empty() {
            return Ok(GestationAge::NotApplicable);
        }
        let number = trimmed.trim_end_matches("weeks").trim();
        let weeks = number
            .parse::<u8>()
            .map_err(|_| PedigreeError::InvalidAttribute(format!("gestation age: {}", s)))?;
        GestationAge::weeks(weeks)
    }
}

impl From<GestationAge> for String {
    fn from(age: GestationAge) -> Self {
        age.to_string()
    }
}

/// Wire form accepted for gestation age: "-", "12", "12 weeks" or a bare number
#[derive(Deserialize)]
#[serde(untagged)]
enum GestationRepr {
    Weeks(u8),
    Text(String),
}

impl TryFrom<GestationRepr> for GestationAge {
    type Error = PedigreeError;

    fn try_from(repr: GestationRepr) -> Result<Self, Self::Error> {
        match repr {
            GestationRepr::Weeks(weeks) => GestationAge::weeks(weeks),
            GestationRepr::Text(text) => text.parse(),
        }
    }
}

/// Attribute bag of one person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonAttributes {
    /// Gender
    pub gender: Gender,
    /// Display name
    pub name: String,
    /// Surname at birth
    pub last_name_at_birth: Option<String>,
    /// Identifier from an outside record
    pub external_id: Option<String>,
    /// Free-text ethnicities
    pub ethnicities: Option<String>,
    /// Birth date
    pub date_of_birth: Option<NaiveDate>,
    /// Death date
    pub date_of_death: Option<NaiveDate>,
    /// Living status
    pub individual_is: IndividualStatus,
    /// Affection status
    pub heredity_value: HeredityValue,
    /// Free-text heredity note
    pub heredity_text: Option<String>,
    /// Adopted into the family
    pub adopted_in: bool,
    /// Gestation age, only meaningful before birth
    pub gestation_age: GestationAge,
    /// Carrier status
    pub carrier_status: CarrierStatus,
    /// Evaluation has been documented
    pub documented_evaluation: bool,
    /// At most one proband is expected per chart; not enforced here
    pub proband: bool,
    /// Free-text known disorders
    pub known_disorders: Option<String>,
    /// Free-text observed phenotypes
    pub observed_phenotypes: Option<String>,
    /// Free-text candidate genes
    pub candidate_genes: Option<String>,
    /// Free-text comments
    pub comments: Option<String>,
}

impl Default for PersonAttributes {
    fn default() -> Self {
        Self {
            gender: Gender::Unknown,
            name: String::new(),
            last_name_at_birth: None,
            external_id: None,
            ethnicities: None,
            date_of_birth: None,
            date_of_death: None,
            individual_is: IndividualStatus::Alive,
            heredity_value: HeredityValue::None,
            heredity_text: None,
            adopted_in: false,
            gestation_age: GestationAge::NotApplicable,
            carrier_status: CarrierStatus::NotAffected,
            documented_evaluation: false,
            proband: false,
            known_disorders: None,
            observed_phenotypes: None,
            candidate_genes: None,
            comments: None,
        }
    }
}

impl PersonAttributes {
    /// Defaults with only the gender overridden
    pub fn with_gender(gender: Gender) -> Self {
        Self {
            gender,
            ..Self::default()
        }
    }

    /// Defaults for the first person of a chart
    pub fn proband() -> Self {
        Self {
            proband: true,
            ..Self::default()
        }
    }

    /// Clear the gestation age when the status carries life dates instead.
    ///
    /// Used for whole-bag writes, where the status change and a stale
    /// gestation age can arrive together.
    pub fn normalize(&mut self) {
        if self.individual_is.has_life_dates() {
            self.gestation_age = GestationAge::NotApplicable;
        }
    }

    /// Apply one field change coming from the editor.
    ///
    /// Setting `individual_is` to Alive or Deceased resets the gestation age;
    /// no other change touches it.
    pub fn apply(&mut self, change: AttributeChange) {
        match change {
            AttributeChange::Gender(value) => self.gender = value,
            AttributeChange::Name(value) => self.name = value,
            AttributeChange::LastNameAtBirth(value) => self.last_name_at_birth = value,
            AttributeChange::ExternalId(value) => self.external_id = value,
            AttributeChange::Ethnicities(value) => self.ethnicities = value,
            AttributeChange::DateOfBirth(value) => self.date_of_birth = value,
            AttributeChange::DateOfDeath(value) => self.date_of_death = value,
            AttributeChange::IndividualIs(value) => {
                if value.has_life_dates() {
                    self.gestation_age = GestationAge::NotApplicable;
                }
                self.individual_is = value;
            }
            AttributeChange::HeredityValue(value) => self.heredity_value = value,
            AttributeChange::HeredityText(value) => self.heredity_text = value,
            AttributeChange::AdoptedIn(value) => self.adopted_in = value,
            AttributeChange::GestationAge(value) => self.gestation_age = value,
            AttributeChange::CarrierStatus(value) => self.carrier_status = value,
            AttributeChange::DocumentedEvaluation(value) => self.documented_evaluation = value,
            AttributeChange::Proband(value) => self.proband = value,
            AttributeChange::KnownDisorders(value) => self.known_disorders = value,
            AttributeChange::ObservedPhenotypes(value) => self.observed_phenotypes = value,
            AttributeChange::CandidateGenes(value) => self.candidate_genes = value,
            AttributeChange::Comments(value) => self.comments = value,
        }
    }
}

/// One field edit emitted by the editor form, serialized as `{ "key": .., "value": .. }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum AttributeChange {
    /// Replace `gender`
    Gender(Gender),
    /// Replace `name`
    Name(String),
    /// Replace `last_name_at_birth`
    LastNameAtBirth(Option<String>),
    /// Replace `external_id`
    ExternalId(Option<String>),
    /// Replace `ethnicities`
    Ethnicities(Option<String>),
    /// Replace `date_of_birth`
    DateOfBirth(Option<NaiveDate>),
    /// Replace `date_of_death`
    DateOfDeath(Option<NaiveDate>),
    /// Replace `individual_is`
    IndividualIs(IndividualStatus),
    /// Replace `heredity_value`
    HeredityValue(HeredityValue),
    /// Replace `heredity_text`
    HeredityText(Option<String>),
    /// Replace `adopted_in`
    AdoptedIn(bool),
    /// Replace `gestation_age`
    GestationAge(GestationAge),
    /// Replace `carrier_status`
    CarrierStatus(CarrierStatus),
    /// Replace `documented_evaluation`
    DocumentedEvaluation(bool),
    /// Replace `proband`
    Proband(bool),
    /// Replace `known_disorders`
    KnownDisorders(Option<String>),
    /// Replace `observed_phenotypes`
    ObservedPhenotypes(Option<String>),
    /// Replace `candidate_genes`
    CandidateGenes(Option<String>),
    /// Replace `comments`
    Comments(Option<String>),
}
