use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Publication {
    pub title: String,
    pub journal: String,
    pub year: u16,
    pub authors: Vec<String>,
    pub link: String,
}

/// Placeholder publication search. Returns query-derived dummy records until
/// a real PubMed integration lands.
pub struct PublicationSearchService;

impl PublicationSearchService {
    pub fn search(query: &str, limit: usize) -> Vec<Publication> {
        let results = vec![
            Publication {
                title: format!("Dummy Publication 1 related to {}", query),
                journal: "Journal of Dummy Science".to_string(),
                year: 2023,
                authors: vec!["A. Author".to_string(), "B. Writer".to_string()],
                link: "https://pubmed.ncbi.nlm.nih.gov/dummy1/".to_string(),
            },
            Publication {
                title: format!("Another Dummy Study on {} Research", query),
                journal: "Fictional Medical Journal".to_string(),
                year: 2022,
                authors: vec![
                    "C. Editor".to_string(),
                    "D. Reviewer".to_string(),
                    "E. Collaborator".to_string(),
                ],
                link: "https://pubmed.ncbi.nlm.nih.gov/dummy2/".to_string(),
            },
            Publication {
                title: format!("The Impact of {} on Modern Society", query),
                journal: "Journal of Advanced Topics".to_string(),
                year: 2024,
                authors: vec!["F. Pioneer".to_string()],
                link: "https://pubmed.ncbi.nlm.nih.gov/dummy3/".to_string(),
            },
        ];

        results.into_iter().take(limit).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PublicationQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// GET /publications/search
pub async fn search_publications(
    query: web::Query<PublicationQuery>,
) -> Result<HttpResponse, AppError> {
    let q = query.q.clone().unwrap_or_default();
    let limit = query.limit.unwrap_or(20);
    let results = PublicationSearchService::search(&q, limit);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "query": q,
        "results": results,
    })))
}
