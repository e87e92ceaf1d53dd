use thiserror::Error;

use crate::models::LocationId;

/// Ошибки обращения к REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{path} responded with status {status}")]
    Status { status: u16, path: String },
    #[error("invalid API base URL {0:?}")]
    InvalidBaseUrl(String),
    #[error("session token contains characters not allowed in a header")]
    InvalidToken,
    #[error("could not encode query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

/// Этап загрузки справочника локаций.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStage {
    Countries,
    Cities,
    Districts,
}

impl std::fmt::Display for CatalogStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogStage::Countries => write!(f, "countries"),
            CatalogStage::Cities => write!(f, "cities"),
            CatalogStage::Districts => write!(f, "districts"),
        }
    }
}

/// Ошибка загрузки справочника: все сбои одного этапа собраны вместе.
///
/// `failures` хранит id родителя (страны или города), для которого запрос не удался.
/// Для этапа стран родителя нет, там id равен `None`.
#[derive(Debug, Error)]
#[error("failed to load {stage}: {}", describe(.failures))]
pub struct CatalogError {
    pub stage: CatalogStage,
    pub failures: Vec<(Option<LocationId>, ApiError)>,
}

impl CatalogError {
    pub fn countries(source: ApiError) -> Self {
        Self {
            stage: CatalogStage::Countries,
            failures: vec![(None, source)],
        }
    }
}

fn describe(failures: &[(Option<LocationId>, ApiError)]) -> String {
    failures
        .iter()
        .map(|(parent, err)| match parent {
            Some(id) => format!("#{id}: {err}"),
            None => err.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
