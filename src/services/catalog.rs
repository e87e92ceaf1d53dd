//! catalog.rs
//!
//! Загрузка справочника локаций для каскадных фильтров.
//!
//! Справочник загружается один раз при открытии экрана в три шага:
//! 1.  Список стран.
//! 2.  Для каждой страны параллельно список городов; каждому городу проставляется `country_id`.
//! 3.  Когда готовы все города, для каждого города параллельно список районов
//!     с проставленным `city_id`.
//!
//! Если на этапе не удался хотя бы один запрос, все ошибки этапа собираются в один
//! `CatalogError`, а уже загруженные данные отбрасываются.

use futures::future::join_all;
use std::future::Future;
use tracing::{info, warn};

use crate::{
    api_client::ApiClient,
    error::{ApiError, CatalogError, CatalogStage},
    models::{City, Country, District, LocationCatalog, LocationId, LocationItem},
};

/// Загружает полный справочник стран, городов и районов.
pub async fn load_catalog(api: &ApiClient) -> Result<LocationCatalog, CatalogError> {
    info!("Loading location catalog");

    let countries: Vec<Country> = api
        .countries()
        .await
        .map_err(CatalogError::countries)?
        .into_iter()
        .map(Country::from)
        .collect();

    let cities: Vec<City> = fan_out(
        CatalogStage::Cities,
        countries.iter().map(|c| c.id),
        move |country_id| api.cities(country_id),
    )
    .await?
    .into_iter()
    .flat_map(|(country_id, items)| {
        items
            .into_iter()
            .map(move |item| City::from_item(item, country_id))
    })
    .collect();

    let districts: Vec<District> = fan_out(
        CatalogStage::Districts,
        cities.iter().map(|c| c.id),
        move |city_id| api.districts(city_id),
    )
    .await?
    .into_iter()
    .flat_map(|(city_id, items)| {
        items
            .into_iter()
            .map(move |item| District::from_item(item, city_id))
    })
    .collect();

    info!(
        "Location catalog loaded: {} countries, {} cities, {} districts",
        countries.len(),
        cities.len(),
        districts.len()
    );

    Ok(LocationCatalog {
        countries,
        cities,
        districts,
    })
}

/// Запускает запросы для всех родителей одновременно и ждёт завершения всех.
/// Результаты идут в порядке родителей, независимо от порядка ответов.
async fn fan_out<P, F, Fut>(
    stage: CatalogStage,
    parents: P,
    fetch: F,
) -> Result<Vec<(LocationId, Vec<LocationItem>)>, CatalogError>
where
    P: IntoIterator<Item = LocationId>,
    F: Fn(LocationId) -> Fut,
    Fut: Future<Output = Result<Vec<LocationItem>, ApiError>>,
{
    let requests = parents.into_iter().map(|parent| {
        let request = fetch(parent);
        async move { (parent, request.await) }
    });

    let mut loaded = Vec::new();
    let mut failures = Vec::new();
    for (parent, result) in join_all(requests).await {
        match result {
            Ok(items) => loaded.push((parent, items)),
            Err(e) => {
                warn!("Failed to load {} of #{}: {}", stage, parent, e);
                failures.push((Some(parent), e));
            }
        }
    }

    if failures.is_empty() {
        Ok(loaded)
    } else {
        Err(CatalogError { stage, failures })
    }
}
