//! The discovery taxonomy: every dimension a query request can carry.
//!
//! These enums are closed sets. The planner iterates them, the query
//! generator maps them to keywords, and the judge aligns results against
//! them. Labels are the human-readable strings used in search queries and
//! prompts; they are stable and lowercase-comparable.

use serde::{Deserialize, Serialize};

/// Funding-search category. One per query request, required.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FundingCategory {
    StemEducation,
    MathematicsEducation,
    ScienceEducation,
    TechnologyEducation,
    EngineeringEducation,
    LanguageLearning,
    EnglishLanguage,
    LiteracyPrograms,
    EarlyChildhoodEducation,
    PrimaryEducation,
    SecondaryEducation,
    HigherEducation,
    VocationalTraining,
    TeacherDevelopment,
    AdultEducation,
    SpecialNeedsEducation,
    ArtsCulture,
    MusicEducation,
    SportsYouth,
    ResearchGrants,
    Scholarships,
    StudentExchange,
    SchoolInfrastructure,
    EducationTechnology,
    DigitalSkills,
    EnvironmentalEducation,
    CivicEducation,
    CommunityDevelopment,
    RuralEducation,
    MinorityInclusion,
    HealthEducation,
}

impl FundingCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StemEducation => "STEM education",
            Self::MathematicsEducation => "mathematics education",
            Self::ScienceEducation => "science education",
            Self::TechnologyEducation => "technology education",
            Self::EngineeringEducation => "engineering education",
            Self::LanguageLearning => "language learning",
            Self::EnglishLanguage => "English language education",
            Self::LiteracyPrograms => "literacy programs",
            Self::EarlyChildhoodEducation => "early childhood education",
            Self::PrimaryEducation => "primary education",
            Self::SecondaryEducation => "secondary education",
            Self::HigherEducation => "higher education",
            Self::VocationalTraining => "vocational training",
            Self::TeacherDevelopment => "teacher professional development",
            Self::AdultEducation => "adult education",
            Self::SpecialNeedsEducation => "special needs education",
            Self::ArtsCulture => "arts and culture education",
            Self::MusicEducation => "music education",
            Self::SportsYouth => "youth sports programs",
            Self::ResearchGrants => "research funding",
            Self::Scholarships => "scholarships",
            Self::StudentExchange => "student exchange programs",
            Self::SchoolInfrastructure => "school infrastructure",
            Self::EducationTechnology => "education technology",
            Self::DigitalSkills => "digital skills training",
            Self::EnvironmentalEducation => "environmental education",
            Self::CivicEducation => "civic education",
            Self::CommunityDevelopment => "community development",
            Self::RuralEducation => "rural education",
            Self::MinorityInclusion => "minority inclusion in education",
            Self::HealthEducation => "health education",
        }
    }
}

/// Who gives the money.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FunderType {
    Government,
    PrivateFoundation,
    CorporateCsr,
    Multilateral,
    BilateralDonor,
    CommunityFoundation,
    DevelopmentBank,
    Ngo,
}

impl FunderType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Government => "government agency",
            Self::PrivateFoundation => "private foundation",
            Self::CorporateCsr => "corporate social responsibility program",
            Self::Multilateral => "multilateral organization",
            Self::BilateralDonor => "bilateral donor agency",
            Self::CommunityFoundation => "community foundation",
            Self::DevelopmentBank => "development bank",
            Self::Ngo => "non-governmental organization",
        }
    }
}

/// How the money moves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FundingMechanism {
    Grant,
    Scholarship,
    Fellowship,
    Prize,
    Tender,
    MatchingFunds,
    InKindDonation,
}

impl FundingMechanism {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Scholarship => "scholarship",
            Self::Fellowship => "fellowship",
            Self::Prize => "prize",
            Self::Tender => "tender",
            Self::MatchingFunds => "matching funds",
            Self::InKindDonation => "in-kind donation",
        }
    }
}

/// Rough size of the funded project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectScale {
    Micro,
    Small,
    Medium,
    Large,
}

impl ProjectScale {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Micro => "micro-grant",
            Self::Small => "small project",
            Self::Medium => "medium-sized project",
            Self::Large => "large-scale program",
        }
    }
}

/// Who ultimately benefits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Beneficiary {
    Students,
    Teachers,
    Schools,
    YoungChildren,
    AdultLearners,
    Researchers,
    RuralCommunities,
    MinorityGroups,
    Municipalities,
    Nonprofits,
}

impl Beneficiary {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Schools => "schools",
            Self::YoungChildren => "young children",
            Self::AdultLearners => "adult learners",
            Self::Researchers => "researchers",
            Self::RuralCommunities => "rural communities",
            Self::MinorityGroups => "minority groups",
            Self::Municipalities => "municipalities",
            Self::Nonprofits => "nonprofit organizations",
        }
    }
}

/// Who may formally apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    School,
    University,
    Municipality,
    Nonprofit,
    Individual,
    InformalGroup,
}

impl RecipientType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::School => "school",
            Self::University => "university",
            Self::Municipality => "municipality",
            Self::Nonprofit => "registered nonprofit",
            Self::Individual => "individual applicant",
            Self::InformalGroup => "informal community group",
        }
    }
}

/// Language a query should be phrased in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchLanguage {
    English,
    Bulgarian,
    German,
    French,
}

impl SearchLanguage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Bulgarian => "Bulgarian",
            Self::German => "German",
            Self::French => "French",
        }
    }
}

/// Which external search service executes a query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackendKind {
    /// Keyword-style meta-search (Serper).
    Serper,
    /// AI research search that accepts natural-language prompts (Tavily).
    Tavily,
    /// General web meta-search (Brave).
    Brave,
}

impl SearchBackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Serper => "serper",
            Self::Tavily => "tavily",
            Self::Brave => "brave",
        }
    }

    /// True if the backend wants natural-language prompts rather than
    /// keyword strings.
    pub fn prefers_prose(&self) -> bool {
        matches!(self, Self::Tavily)
    }

    pub const ALL: [SearchBackendKind; 3] = [Self::Serper, Self::Tavily, Self::Brave];
}

// ============================================================================
// Geography
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Country {
    Bulgaria,
    Romania,
    Greece,
    Serbia,
    NorthMacedonia,
    Croatia,
    Germany,
    France,
    Netherlands,
    Poland,
    UnitedKingdom,
    UnitedStates,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Balkans,
    EasternEurope,
    WesternEurope,
    CentralEurope,
    NorthAmerica,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Bloc {
    EuropeanUnion,
    Transatlantic,
    Global,
}

/// A geographic scope at one of three levels. Countries belong to regions,
/// regions belong to blocs; the judge rewards direct mentions over
/// membership mentions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GeoScope {
    Country(Country),
    Region(Region),
    Bloc(Bloc),
}

impl Country {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bulgaria => "Bulgaria",
            Self::Romania => "Romania",
            Self::Greece => "Greece",
            Self::Serbia => "Serbia",
            Self::NorthMacedonia => "North Macedonia",
            Self::Croatia => "Croatia",
            Self::Germany => "Germany",
            Self::France => "France",
            Self::Netherlands => "Netherlands",
            Self::Poland => "Poland",
            Self::UnitedKingdom => "United Kingdom",
            Self::UnitedStates => "United States",
        }
    }

    /// Terms whose presence in metadata counts as a mention of this country.
    pub fn mention_terms(&self) -> &'static [&'static str] {
        match self {
            Self::Bulgaria => &["bulgaria", "bulgarian", "sofia", "plovdiv"],
            Self::Romania => &["romania", "romanian", "bucharest"],
            Self::Greece => &["greece", "greek", "athens"],
            Self::Serbia => &["serbia", "serbian", "belgrade"],
            Self::NorthMacedonia => &["north macedonia", "macedonian", "skopje"],
            Self::Croatia => &["croatia", "croatian", "zagreb"],
            Self::Germany => &["germany", "german", "berlin"],
            Self::France => &["france", "french", "paris"],
            Self::Netherlands => &["netherlands", "dutch", "amsterdam"],
            Self::Poland => &["poland", "polish", "warsaw"],
            Self::UnitedKingdom => &["united kingdom", "british", "england", "london"],
            Self::UnitedStates => &["united states", "american", "usa", "u.s."],
        }
    }

    pub fn region(&self) -> Region {
        match self {
            Self::Bulgaria | Self::Greece | Self::Serbia | Self::NorthMacedonia | Self::Croatia => {
                Region::Balkans
            }
            Self::Romania | Self::Poland => Region::EasternEurope,
            Self::Germany => Region::CentralEurope,
            Self::France | Self::Netherlands | Self::UnitedKingdom => Region::WesternEurope,
            Self::UnitedStates => Region::NorthAmerica,
        }
    }

    pub fn blocs(&self) -> &'static [Bloc] {
        match self {
            Self::Bulgaria
            | Self::Romania
            | Self::Greece
            | Self::Croatia
            | Self::Germany
            | Self::France
            | Self::Netherlands
            | Self::Poland => &[Bloc::EuropeanUnion, Bloc::Global],
            Self::Serbia | Self::NorthMacedonia => &[Bloc::Global],
            Self::UnitedKingdom | Self::UnitedStates => &[Bloc::Transatlantic, Bloc::Global],
        }
    }

    pub const ALL: [Country; 12] = [
        Self::Bulgaria,
        Self::Romania,
        Self::Greece,
        Self::Serbia,
        Self::NorthMacedonia,
        Self::Croatia,
        Self::Germany,
        Self::France,
        Self::Netherlands,
        Self::Poland,
        Self::UnitedKingdom,
        Self::UnitedStates,
    ];
}

impl Region {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Balkans => "the Balkans",
            Self::EasternEurope => "Eastern Europe",
            Self::WesternEurope => "Western Europe",
            Self::CentralEurope => "Central Europe",
            Self::NorthAmerica => "North America",
        }
    }

    pub fn mention_terms(&self) -> &'static [&'static str] {
        match self {
            Self::Balkans => &["balkan", "balkans", "southeast europe", "south-eastern europe"],
            Self::EasternEurope => &["eastern europe", "eastern european"],
            Self::WesternEurope => &["western europe", "western european"],
            Self::CentralEurope => &["central europe", "central european"],
            Self::NorthAmerica => &["north america", "north american"],
        }
    }

    pub fn countries(&self) -> Vec<Country> {
        Country::ALL
            .iter()
            .copied()
            .filter(|c| c.region() == *self)
            .collect()
    }

    pub fn blocs(&self) -> &'static [Bloc] {
        match self {
            Self::Balkans | Self::EasternEurope | Self::WesternEurope | Self::CentralEurope => {
                &[Bloc::EuropeanUnion, Bloc::Global]
            }
            Self::NorthAmerica => &[Bloc::Transatlantic, Bloc::Global],
        }
    }
}

impl Bloc {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EuropeanUnion => "the European Union",
            Self::Transatlantic => "transatlantic partners",
            Self::Global => "worldwide",
        }
    }

    pub fn mention_terms(&self) -> &'static [&'static str] {
        match self {
            Self::EuropeanUnion => &["european union", "eu-funded", "europe", "european"],
            Self::Transatlantic => &["transatlantic", "us-european"],
            Self::Global => &["international", "global", "worldwide"],
        }
    }
}

impl GeoScope {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Country(c) => c.label(),
            Self::Region(r) => r.label(),
            Self::Bloc(b) => b.label(),
        }
    }

    /// Terms counting as a direct mention of this scope.
    pub fn mention_terms(&self) -> &'static [&'static str] {
        match self {
            Self::Country(c) => c.mention_terms(),
            Self::Region(r) => r.mention_terms(),
            Self::Bloc(b) => b.mention_terms(),
        }
    }

    /// Terms counting as a membership-level mention: parents of a country,
    /// members of a region or bloc.
    pub fn membership_terms(&self) -> Vec<&'static str> {
        let mut terms = Vec::new();
        match self {
            Self::Country(c) => {
                terms.extend_from_slice(c.region().mention_terms());
                for bloc in c.blocs() {
                    terms.extend_from_slice(bloc.mention_terms());
                }
            }
            Self::Region(r) => {
                for country in r.countries() {
                    terms.extend_from_slice(country.mention_terms());
                }
                for bloc in r.blocs() {
                    terms.extend_from_slice(bloc.mention_terms());
                }
            }
            Self::Bloc(b) => {
                for country in Country::ALL {
                    if country.blocs().contains(b) {
                        terms.extend_from_slice(country.mention_terms());
                    }
                }
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_region_membership_is_total() {
        for country in Country::ALL {
            // Every country resolves to a region and at least one bloc.
            let _ = country.region();
            assert!(!country.blocs().is_empty(), "{country:?} has no bloc");
        }
    }

    #[test]
    fn region_countries_round_trip() {
        for country in Country::ALL {
            assert!(
                country.region().countries().contains(&country),
                "{country:?} missing from its region's member list"
            );
        }
    }

    #[test]
    fn membership_terms_for_country_include_region() {
        let scope = GeoScope::Country(Country::Bulgaria);
        let terms = scope.membership_terms();
        assert!(terms.contains(&"balkans"));
        assert!(terms.contains(&"european union"));
    }

    #[test]
    fn membership_terms_for_bloc_include_members() {
        let scope = GeoScope::Bloc(Bloc::EuropeanUnion);
        let terms = scope.membership_terms();
        assert!(terms.contains(&"bulgaria"));
        assert!(!terms.contains(&"belgrade"), "Serbia is not an EU member");
    }
}
