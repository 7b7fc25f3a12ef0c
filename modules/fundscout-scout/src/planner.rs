//! TaxonomyBatchPlanner — turns a wall-clock date into the night's batch of
//! query requests.
//!
//! The weekly rotation is compile-time configuration: each weekday covers a
//! fixed slice of the taxonomy, and the batch is the Cartesian product of
//! that day's funder types, categories and geographic scopes, truncated to
//! the nightly cap. Planning is fully deterministic: same date and
//! configuration, same sequence. No randomness, no I/O, never fails.

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use fundscout_common::{
    Beneficiary, Bloc, Country, FunderType, FundingCategory, FundingMechanism, GeoScope,
    ProjectScale, QueryRequest, RecipientType, Region, SearchBackendKind, SearchLanguage,
};

/// One weekday's slice of the taxonomy.
struct DayPlan {
    funder_types: &'static [FunderType],
    categories: &'static [FundingCategory],
    scopes: &'static [GeoScope],
    mechanism: Option<FundingMechanism>,
    project_scale: Option<ProjectScale>,
    beneficiaries: &'static [Beneficiary],
    recipient_type: Option<RecipientType>,
    search_languages: &'static [SearchLanguage],
}

const HOME_SCOPES: &[GeoScope] = &[
    GeoScope::Country(Country::Bulgaria),
    GeoScope::Region(Region::Balkans),
    GeoScope::Bloc(Bloc::EuropeanUnion),
];

const WIDE_SCOPES: &[GeoScope] = &[
    GeoScope::Country(Country::Bulgaria),
    GeoScope::Bloc(Bloc::EuropeanUnion),
    GeoScope::Bloc(Bloc::Global),
];

fn rotation(weekday: Weekday) -> DayPlan {
    use FundingCategory::*;
    match weekday {
        // Government money moves on weekday publication schedules; STEM
        // calls cluster at the start of the week.
        Weekday::Mon => DayPlan {
            funder_types: &[FunderType::Government],
            categories: &[
                StemEducation,
                MathematicsEducation,
                ScienceEducation,
                TechnologyEducation,
                EngineeringEducation,
                EducationTechnology,
            ],
            scopes: HOME_SCOPES,
            mechanism: Some(FundingMechanism::Grant),
            project_scale: None,
            beneficiaries: &[Beneficiary::Students, Beneficiary::Teachers],
            recipient_type: None,
            search_languages: &[SearchLanguage::English, SearchLanguage::Bulgarian],
        },
        Weekday::Tue => DayPlan {
            funder_types: &[FunderType::PrivateFoundation, FunderType::CommunityFoundation],
            categories: &[LanguageLearning, EnglishLanguage, LiteracyPrograms],
            scopes: HOME_SCOPES,
            mechanism: None,
            project_scale: None,
            beneficiaries: &[Beneficiary::Students],
            recipient_type: None,
            search_languages: &[SearchLanguage::English],
        },
        Weekday::Wed => DayPlan {
            funder_types: &[FunderType::Multilateral],
            categories: &[Scholarships, StudentExchange, HigherEducation],
            scopes: WIDE_SCOPES,
            mechanism: Some(FundingMechanism::Scholarship),
            project_scale: None,
            beneficiaries: &[Beneficiary::Students],
            recipient_type: Some(RecipientType::Individual),
            search_languages: &[SearchLanguage::English],
        },
        Weekday::Thu => DayPlan {
            funder_types: &[FunderType::BilateralDonor, FunderType::DevelopmentBank],
            categories: &[SchoolInfrastructure, RuralEducation],
            scopes: HOME_SCOPES,
            mechanism: None,
            project_scale: Some(ProjectScale::Large),
            beneficiaries: &[Beneficiary::Municipalities, Beneficiary::RuralCommunities],
            recipient_type: Some(RecipientType::Municipality),
            search_languages: &[SearchLanguage::English],
        },
        Weekday::Fri => DayPlan {
            funder_types: &[FunderType::CorporateCsr],
            categories: &[VocationalTraining, DigitalSkills, AdultEducation],
            scopes: WIDE_SCOPES,
            mechanism: None,
            project_scale: None,
            beneficiaries: &[Beneficiary::AdultLearners],
            recipient_type: None,
            search_languages: &[SearchLanguage::English],
        },
        Weekday::Sat => DayPlan {
            funder_types: &[FunderType::CommunityFoundation, FunderType::Ngo],
            categories: &[EarlyChildhoodEducation, CommunityDevelopment, SpecialNeedsEducation],
            scopes: HOME_SCOPES,
            mechanism: None,
            project_scale: Some(ProjectScale::Small),
            beneficiaries: &[Beneficiary::YoungChildren],
            recipient_type: Some(RecipientType::Nonprofit),
            search_languages: &[SearchLanguage::English, SearchLanguage::Bulgarian],
        },
        Weekday::Sun => DayPlan {
            funder_types: &[FunderType::PrivateFoundation],
            categories: &[ArtsCulture, MusicEducation, ResearchGrants],
            scopes: WIDE_SCOPES,
            mechanism: None,
            project_scale: None,
            beneficiaries: &[],
            recipient_type: None,
            search_languages: &[SearchLanguage::English],
        },
    }
}

pub struct TaxonomyBatchPlanner {
    queries_per_night: usize,
}

impl TaxonomyBatchPlanner {
    pub fn new(queries_per_night: usize) -> Self {
        Self { queries_per_night }
    }

    /// Plan the batch for one date. Iteration order is funder type →
    /// category → scope; backends rotate round-robin across the batch.
    pub fn plan_daily_batch(&self, date: NaiveDate) -> Vec<QueryRequest> {
        let plan = rotation(date.weekday());
        let mut requests = Vec::new();
        let mut backends = SearchBackendKind::ALL.iter().cycle();

        'product: for funder_type in plan.funder_types {
            for category in plan.categories {
                for scope in plan.scopes {
                    if requests.len() >= self.queries_per_night {
                        break 'product;
                    }
                    requests.push(QueryRequest {
                        category: *category,
                        geographic_scope: *scope,
                        backend: *backends.next().expect("cycle never ends"),
                        number_of_queries: 3,
                        funder_type: Some(*funder_type),
                        mechanism: plan.mechanism,
                        project_scale: plan.project_scale,
                        beneficiaries: plan.beneficiaries.iter().copied().collect(),
                        recipient_type: plan.recipient_type,
                        user_language: None,
                        search_languages: plan.search_languages.iter().copied().collect(),
                    });
                }
            }
        }

        debug!(
            date = %date,
            weekday = ?date.weekday(),
            requests = requests.len(),
            "Planned daily batch"
        );
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> TaxonomyBatchPlanner {
        TaxonomyBatchPlanner::new(20)
    }

    #[test]
    fn planning_is_deterministic_across_dates() {
        // Two years of dates: planning twice gives identical sequences.
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for offset in 0..730 {
            let date = start + chrono::Duration::days(offset);
            let first = planner().plan_daily_batch(date);
            let second = planner().plan_daily_batch(date);
            assert_eq!(first, second, "plan for {date} must be stable");
        }
    }

    #[test]
    fn batch_is_capped_at_queries_per_night() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(); // Monday
        let batch = TaxonomyBatchPlanner::new(5).plan_daily_batch(date);
        assert_eq!(batch.len(), 5);

        let full = planner().plan_daily_batch(date);
        assert!(full.len() <= 20);
    }

    #[test]
    fn monday_is_government_stem() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert_eq!(date.weekday(), Weekday::Mon);
        let batch = planner().plan_daily_batch(date);
        assert!(!batch.is_empty());
        for request in &batch {
            assert_eq!(request.funder_type, Some(FunderType::Government));
            assert_eq!(request.mechanism, Some(FundingMechanism::Grant));
        }
        assert!(batch
            .iter()
            .any(|r| r.category == FundingCategory::StemEducation));
    }

    #[test]
    fn backends_rotate_round_robin() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(); // Tuesday
        let batch = planner().plan_daily_batch(date);
        assert!(batch.len() >= 3);
        for (i, request) in batch.iter().enumerate() {
            assert_eq!(
                request.backend,
                SearchBackendKind::ALL[i % SearchBackendKind::ALL.len()],
                "backend assignment must cycle in batch order"
            );
        }
    }

    #[test]
    fn every_weekday_produces_a_batch() {
        let start = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        for offset in 0..7 {
            let date = start + chrono::Duration::days(offset);
            let batch = planner().plan_daily_batch(date);
            assert!(!batch.is_empty(), "{:?} yielded an empty batch", date.weekday());
            for request in &batch {
                assert_eq!(request.number_of_queries, 3);
            }
        }
    }

    #[test]
    fn zero_cap_yields_empty_batch() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let batch = TaxonomyBatchPlanner::new(0).plan_daily_batch(date);
        assert!(batch.is_empty());
    }
}
