//! QueryGenerator — expands a query request into concrete search strings.
//!
//! Keyword gathering is a closed mapping over the request's populated
//! dimensions; the union is a sorted set, so the result is independent of
//! dimension population order. The LLM rewrites keywords into
//! backend-appropriate queries; on any failure or shortfall the generator
//! pads from deterministic templates. It never fails and always returns
//! exactly `number_of_queries` trimmed, non-empty strings.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use ai_client::QueryWriter;
use fundscout_common::QueryRequest;

use crate::keywords::{
    beneficiary_keywords, category_keywords, funder_type_keywords, mechanism_keywords,
    project_scale_keywords, recipient_type_keywords,
};

/// Funding vocabulary rotated through template queries to keep padded
/// strings distinct.
const TEMPLATE_TERMS: &[&str] = &[
    "grants",
    "funding opportunities",
    "call for proposals",
    "financial support",
    "open call",
];

pub struct QueryGenerator {
    /// None disables the LLM entirely (dry runs, tests); templates only.
    llm: Option<Arc<dyn QueryWriter>>,
    llm_timeout: Duration,
}

impl QueryGenerator {
    pub fn new(llm: Option<Arc<dyn QueryWriter>>, llm_timeout: Duration) -> Self {
        Self { llm, llm_timeout }
    }

    /// Produce exactly `request.number_of_queries` search strings.
    pub async fn generate(&self, request: &QueryRequest) -> Vec<String> {
        let wanted = request.number_of_queries;
        if wanted == 0 {
            return Vec::new();
        }

        let keywords = gather_keywords(request);
        let mut queries = match &self.llm {
            Some(llm) => {
                let prompt = build_prompt(request, &keywords);
                match llm.generate(&prompt, wanted, self.llm_timeout).await {
                    Ok(lines) => lines,
                    Err(e) => {
                        warn!(error = %e, "LLM query generation failed, using templates");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        queries.retain(|q| !q.trim().is_empty());
        for query in &mut queries {
            *query = query.trim().to_string();
        }
        queries.truncate(wanted);

        if queries.len() < wanted {
            let shortfall = wanted - queries.len();
            debug!(shortfall, "Padding queries from templates");
            for template in template_queries(request, wanted) {
                if queries.len() == wanted {
                    break;
                }
                if !queries.contains(&template) {
                    queries.push(template);
                }
            }
        }

        queries
    }
}

/// Union the keyword sets of every populated dimension. Sorted set: the
/// result is the same no matter which order dimensions were populated, and
/// always includes the category's keywords.
pub fn gather_keywords(request: &QueryRequest) -> BTreeSet<&'static str> {
    let mut keywords: BTreeSet<&'static str> = BTreeSet::new();
    keywords.extend(category_keywords(request.category));

    if let Some(funder_type) = request.funder_type {
        keywords.extend(funder_type_keywords(funder_type));
    }
    if let Some(mechanism) = request.mechanism {
        keywords.extend(mechanism_keywords(mechanism));
    }
    if let Some(scale) = request.project_scale {
        keywords.extend(project_scale_keywords(scale));
    }
    for beneficiary in &request.beneficiaries {
        keywords.extend(beneficiary_keywords(*beneficiary));
    }
    if let Some(recipient) = request.recipient_type {
        keywords.extend(recipient_type_keywords(recipient));
    }

    keywords
}

/// The prompt sent to the LLM. Style depends on the backend: keyword
/// backends get keyword strings, research backends get prose prompts.
fn build_prompt(request: &QueryRequest, keywords: &BTreeSet<&'static str>) -> String {
    let style = if request.backend.prefers_prose() {
        "natural-language research questions"
    } else {
        "short keyword search queries"
    };
    let keyword_list = keywords.iter().copied().collect::<Vec<_>>().join(", ");
    let languages = if request.search_languages.is_empty() {
        String::new()
    } else {
        let labels: Vec<&str> = request.search_languages.iter().map(|l| l.label()).collect();
        format!(" Write queries in: {}.", labels.join(", "))
    };

    format!(
        "Write exactly {count} distinct {style} for finding organizations that fund \
         {category} in {geography}.{languages}\n\
         Work these topics in: {keyword_list}.\n\
         Every query must target funding opportunities (grants, scholarships, open \
         calls), not news or general information.",
        count = request.number_of_queries,
        style = style,
        category = request.category.label(),
        geography = request.geographic_scope.label(),
        languages = languages,
        keyword_list = keyword_list,
    )
}

/// Deterministic fallback queries: keyword x funding-term combinations with
/// the request's geography. Same request, same sequence.
pub fn template_queries(request: &QueryRequest, count: usize) -> Vec<String> {
    let keywords = gather_keywords(request);
    let geography = request.geographic_scope.label();
    let mut queries = Vec::with_capacity(count);

    'outer: for term in TEMPLATE_TERMS {
        for keyword in &keywords {
            if queries.len() == count {
                break 'outer;
            }
            queries.push(format!("{keyword} {term} {geography}"));
        }
    }

    // Counts beyond the keyword x term grid get numbered variants, so the
    // exact-count guarantee holds for any request.
    let mut serial = 2usize;
    while queries.len() < count {
        queries.push(format!(
            "{} funding {} {serial}",
            request.category.label(),
            geography
        ));
        serial += 1;
    }
    queries
}
