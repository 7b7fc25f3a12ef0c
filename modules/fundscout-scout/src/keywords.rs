//! Closed keyword mappings for every taxonomy dimension.
//!
//! These tables drive query generation. Keywords are search-engine phrases,
//! not display labels; keep them lowercase and free of operators so they
//! compose into both keyword queries and prose prompts.

use fundscout_common::{
    Beneficiary, FunderType, FundingCategory, FundingMechanism, ProjectScale, RecipientType,
};

pub fn category_keywords(category: FundingCategory) -> &'static [&'static str] {
    use FundingCategory::*;
    match category {
        StemEducation => &["stem education", "science technology engineering math", "stem programs"],
        MathematicsEducation => &["mathematics education", "math olympiad", "numeracy"],
        ScienceEducation => &["science education", "school laboratory", "science fair"],
        TechnologyEducation => &["technology education", "computer science education", "coding for kids"],
        EngineeringEducation => &["engineering education", "robotics club", "maker space"],
        LanguageLearning => &["language learning", "foreign language instruction", "bilingual education"],
        EnglishLanguage => &["english language teaching", "esl", "english immersion"],
        LiteracyPrograms => &["literacy", "reading programs", "book access"],
        EarlyChildhoodEducation => &["early childhood education", "preschool", "kindergarten readiness"],
        PrimaryEducation => &["primary school", "elementary education", "basic education"],
        SecondaryEducation => &["secondary school", "high school education", "gymnasium"],
        HigherEducation => &["higher education", "university programs", "tertiary education"],
        VocationalTraining => &["vocational training", "apprenticeship", "technical skills"],
        TeacherDevelopment => &["teacher training", "professional development for educators", "pedagogy"],
        AdultEducation => &["adult education", "lifelong learning", "continuing education"],
        SpecialNeedsEducation => &["special needs education", "inclusive education", "disability support"],
        ArtsCulture => &["arts education", "cultural programs", "creative youth"],
        MusicEducation => &["music education", "youth orchestra", "instrument donation"],
        SportsYouth => &["youth sports", "physical education", "sports equipment"],
        ResearchGrants => &["research grants", "scientific research", "academic research"],
        Scholarships => &["scholarships", "student financial aid", "merit awards"],
        StudentExchange => &["student exchange", "study abroad", "international mobility"],
        SchoolInfrastructure => &["school renovation", "school building", "classroom equipment"],
        EducationTechnology => &["education technology", "edtech", "digital classroom"],
        DigitalSkills => &["digital skills", "computer literacy", "ict training"],
        EnvironmentalEducation => &["environmental education", "sustainability education", "outdoor learning"],
        CivicEducation => &["civic education", "democracy education", "youth participation"],
        CommunityDevelopment => &["community development", "local capacity building", "civil society"],
        RuralEducation => &["rural schools", "village education", "remote learning access"],
        MinorityInclusion => &["minority education", "roma inclusion", "integration programs"],
        HealthEducation => &["health education", "school nutrition", "wellbeing programs"],
    }
}

pub fn funder_type_keywords(funder_type: FunderType) -> &'static [&'static str] {
    use FunderType::*;
    match funder_type {
        Government => &["government grant", "ministry of education", "public funding"],
        PrivateFoundation => &["foundation grant", "philanthropic foundation", "charitable trust"],
        CorporateCsr => &["corporate social responsibility", "corporate giving", "company foundation"],
        Multilateral => &["eu funding", "united nations", "international organization"],
        BilateralDonor => &["bilateral aid", "development cooperation", "embassy grants"],
        CommunityFoundation => &["community foundation", "local giving", "regional fund"],
        DevelopmentBank => &["development bank", "investment facility", "concessional financing"],
        Ngo => &["ngo grants", "nonprofit funding", "civil society support"],
    }
}

pub fn mechanism_keywords(mechanism: FundingMechanism) -> &'static [&'static str] {
    use FundingMechanism::*;
    match mechanism {
        Grant => &["grant", "open call", "call for proposals"],
        Scholarship => &["scholarship", "tuition support", "stipend"],
        Fellowship => &["fellowship", "visiting program"],
        Prize => &["prize", "award competition"],
        Tender => &["tender", "procurement", "request for applications"],
        MatchingFunds => &["matching funds", "co-financing"],
        InKindDonation => &["in-kind donation", "equipment donation"],
    }
}

pub fn project_scale_keywords(scale: ProjectScale) -> &'static [&'static str] {
    use ProjectScale::*;
    match scale {
        Micro => &["micro-grant", "small grants scheme"],
        Small => &["small project funding", "seed funding"],
        Medium => &["project grant", "program funding"],
        Large => &["large-scale program", "institutional funding", "multi-year grant"],
    }
}

pub fn beneficiary_keywords(beneficiary: Beneficiary) -> &'static [&'static str] {
    use Beneficiary::*;
    match beneficiary {
        Students => &["for students", "student support"],
        Teachers => &["for teachers", "educator support"],
        Schools => &["for schools", "school grants"],
        YoungChildren => &["early years", "young children"],
        AdultLearners => &["adult learners", "second chance education"],
        Researchers => &["for researchers", "research teams"],
        RuralCommunities => &["rural communities", "underserved areas"],
        MinorityGroups => &["minority communities", "marginalized groups"],
        Municipalities => &["for municipalities", "local government"],
        Nonprofits => &["for nonprofits", "ngo eligibility"],
    }
}

pub fn recipient_type_keywords(recipient: RecipientType) -> &'static [&'static str] {
    use RecipientType::*;
    match recipient {
        School => &["school applicants", "eligible schools"],
        University => &["university applicants", "higher education institutions"],
        Municipality => &["municipal applicants", "local authorities"],
        Nonprofit => &["registered nonprofits", "ngo applicants"],
        Individual => &["individual applicants", "direct application"],
        InformalGroup => &["community groups", "informal initiatives"],
    }
}
