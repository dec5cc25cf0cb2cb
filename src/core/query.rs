use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Logical collection holding planning applications.
pub const APPLICATIONS_INDEX: &str = "applications";

pub const DEFAULT_SINCE_DATE: &str = "01/01/2014";
pub const DEFAULT_UNTIL_DATE: &str = "now";

pub const RESIDENTIAL_UNITS_FIELD: &str =
    "application_details.residential_details.total_no_proposed_residential_units";
pub const SOCIAL_RENT_UNITS_FIELD: &str =
    "application_details.residential_details.total_no_proposed_residential_units_social_rent";
pub const VALID_DATE_FIELD: &str = "valid_date";
pub const STATUS_KEYWORD_FIELD: &str = "status.keyword";
pub const SUPERSEDED_STATUS: &str = "Superseded";

const RESIDENTIAL_UNITS_SOURCE: &[&str] = &[
    "borough",
    "decision_date",
    "valid_date",
    "decision",
    "actual_completion_date",
    "application_details.residential_details.total_no_proposed_residential_units",
    "application_details.residential_details.site_area",
    "application_details.affordable_housing_fast_track",
    "application_details.residential_details.total_no_affordable_units",
    "application_details.residential_details.total_no_proposed_residential_units_discount_market_rent",
    "application_details.residential_details.total_no_proposed_residential_units_discount_market_rent_charged_at_london_rents",
    "application_details.residential_details.total_no_proposed_residential_units_discount_market_sale",
    "application_details.residential_details.total_no_proposed_residential_units_intermediate",
    "application_details.residential_details.total_no_proposed_residential_units_london_affordable_rent",
    "application_details.residential_details.total_no_proposed_residential_units_london_living_rent",
    "application_details.residential_details.total_no_proposed_residential_units_london_shared_ownership",
    "application_details.residential_details.total_no_proposed_residential_units_market_for_rent",
    "application_details.residential_details.total_no_proposed_residential_units_market_for_sale",
    "application_details.residential_details.total_no_proposed_residential_units_self_build_and_custom_build",
    "application_details.residential_details.total_no_proposed_residential_units_shared_equity",
    "application_details.residential_details.total_no_proposed_residential_units_social_rent",
    "application_details.residential_details.total_no_proposed_residential_units_starter_homes",
    "status",
    "id",
    "pp_id",
    "lpa_name",
    "lpa_app_no",
    "site_name",
    "site_number",
    "street_name",
    "uprn",
    "polygon",
    "wgs84_polygon",
];

// Same as above plus `postcode` (after street_name) and `description`.
const SOCIAL_RENT_UNITS_SOURCE: &[&str] = &[
    "borough",
    "decision_date",
    "valid_date",
    "decision",
    "actual_completion_date",
    "application_details.residential_details.total_no_proposed_residential_units",
    "application_details.residential_details.site_area",
    "application_details.affordable_housing_fast_track",
    "application_details.residential_details.total_no_affordable_units",
    "application_details.residential_details.total_no_proposed_residential_units_discount_market_rent",
    "application_details.residential_details.total_no_proposed_residential_units_discount_market_rent_charged_at_london_rents",
    "application_details.residential_details.total_no_proposed_residential_units_discount_market_sale",
    "application_details.residential_details.total_no_proposed_residential_units_intermediate",
    "application_details.residential_details.total_no_proposed_residential_units_london_affordable_rent",
    "application_details.residential_details.total_no_proposed_residential_units_london_living_rent",
    "application_details.residential_details.total_no_proposed_residential_units_london_shared_ownership",
    "application_details.residential_details.total_no_proposed_residential_units_market_for_rent",
    "application_details.residential_details.total_no_proposed_residential_units_market_for_sale",
    "application_details.residential_details.total_no_proposed_residential_units_self_build_and_custom_build",
    "application_details.residential_details.total_no_proposed_residential_units_shared_equity",
    "application_details.residential_details.total_no_proposed_residential_units_social_rent",
    "application_details.residential_details.total_no_proposed_residential_units_starter_homes",
    "status",
    "id",
    "pp_id",
    "lpa_name",
    "lpa_app_no",
    "site_name",
    "site_number",
    "street_name",
    "postcode",
    "uprn",
    "polygon",
    "wgs84_polygon",
    "description",
];

/// Which unit count the threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Total proposed residential units.
    AllResidentialUnits,
    /// Total proposed social-rent units; also projects postcode and description.
    SocialRentUnits,
}

impl Variant {
    pub fn filter_field(self) -> &'static str {
        match self {
            Variant::AllResidentialUnits => RESIDENTIAL_UNITS_FIELD,
            Variant::SocialRentUnits => SOCIAL_RENT_UNITS_FIELD,
        }
    }

    pub fn source_fields(self) -> &'static [&'static str] {
        match self {
            Variant::AllResidentialUnits => RESIDENTIAL_UNITS_SOURCE,
            Variant::SocialRentUnits => SOCIAL_RENT_UNITS_SOURCE,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::AllResidentialUnits => write!(f, "all-residential-units"),
            Variant::SocialRentUnits => write!(f, "social-rent-units"),
        }
    }
}

/// Caller-supplied filter values. Dates are passed through untouched, so
/// date-math expressions such as `now-1y` work as the backend defines them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParameters {
    pub threshold: u64,
    pub since_date: String,
    pub until_date: String,
}

impl FilterParameters {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            since_date: DEFAULT_SINCE_DATE.to_string(),
            until_date: DEFAULT_UNTIL_DATE.to_string(),
        }
    }

    pub fn since(mut self, date: impl Into<String>) -> Self {
        self.since_date = date.into();
        self
    }

    pub fn until(mut self, date: impl Into<String>) -> Self {
        self.until_date = date.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub query: Query,
    #[serde(rename = "_source")]
    pub source: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "bool")]
    pub bool_filter: BoolFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolFilter {
    pub must: Vec<Clause>,
    pub must_not: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    Range(BTreeMap<String, RangeBounds>),
    Term(BTreeMap<String, Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
}

impl Clause {
    fn range(field: &str, bounds: RangeBounds) -> Self {
        Clause::Range(BTreeMap::from([(field.to_string(), bounds)]))
    }

    fn term(field: &str, value: impl Into<Value>) -> Self {
        Clause::Term(BTreeMap::from([(field.to_string(), value.into())]))
    }
}

/// Builds the filter for `variant`: unit count >= threshold, valid_date in
/// `[since_date, until_date)`, and status not Superseded.
pub fn build_query(variant: Variant, params: &FilterParameters) -> QueryDocument {
    let units = Clause::range(
        variant.filter_field(),
        RangeBounds {
            gte: Some(Value::from(params.threshold)),
            lt: None,
        },
    );
    let validity = Clause::range(
        VALID_DATE_FIELD,
        RangeBounds {
            gte: Some(Value::from(params.since_date.as_str())),
            lt: Some(Value::from(params.until_date.as_str())),
        },
    );

    QueryDocument {
        query: Query {
            bool_filter: BoolFilter {
                must: vec![units, validity],
                must_not: vec![Clause::term(STATUS_KEYWORD_FIELD, SUPERSEDED_STATUS)],
            },
        },
        source: variant
            .source_fields()
            .iter()
            .map(|f| f.to_string())
            .collect(),
    }
}

impl QueryDocument {
    /// Field the numeric threshold is applied to, if the document has one.
    pub fn threshold_field(&self) -> Option<&str> {
        self.query
            .bool_filter
            .must
            .iter()
            .find_map(|clause| match clause {
                Clause::Range(fields) => fields
                    .keys()
                    .find(|k| k.as_str() != VALID_DATE_FIELD)
                    .map(String::as_str),
                Clause::Term(_) => None,
            })
    }
}
