use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::models::{City, District, FilterSnapshot, LocationCatalog, LocationId};

/// Панель фильтров: страна → города → районы и дата "с".
///
/// Каскад поддерживается в момент изменения: смена страны сбрасывает города и районы,
/// смена городов сбрасывает районы. Идентификаторы, которых нет среди допустимых для
/// текущего уровня, отбрасываются вместе с повторами. Каждое изменение публикуется
/// новым снимком.
///
/// Справочник можно заменить уже после создания панели: пока он не загружен, списки
/// городов и районов пусты.
pub struct FilterPanel {
    catalog: watch::Sender<Arc<LocationCatalog>>,
    snapshot: watch::Sender<FilterSnapshot>,
}

impl FilterPanel {
    pub fn new(catalog: Arc<LocationCatalog>, initial: FilterSnapshot) -> Self {
        let (catalog, _) = watch::channel(catalog);
        let (snapshot, _) = watch::channel(initial);
        Self { catalog, snapshot }
    }

    pub fn catalog(&self) -> Arc<LocationCatalog> {
        self.catalog.borrow().clone()
    }

    /// Подставляет загруженный справочник. Снимок фильтров не публикуется.
    pub fn set_catalog(&self, catalog: LocationCatalog) {
        debug!(
            "Catalog replaced: {} countries, {} cities, {} districts",
            catalog.countries.len(),
            catalog.cities.len(),
            catalog.districts.len()
        );
        self.catalog.send_replace(Arc::new(catalog));
    }

    pub fn subscribe_catalog(&self) -> watch::Receiver<Arc<LocationCatalog>> {
        self.catalog.subscribe()
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn set_country(&self, country_id: LocationId) -> bool {
        self.change_country(Some(country_id))
    }

    /// Пустой пункт списка стран.
    pub fn clear_country(&self) -> bool {
        self.change_country(None)
    }

    pub fn set_cities(&self, city_ids: Vec<LocationId>) -> bool {
        let catalog = self.catalog();
        self.snapshot.send_if_modified(|snapshot| {
            let allowed = match snapshot.selected_country {
                Some(country_id) => {
                    let permitted: Vec<_> = catalog.cities_of(country_id).map(|c| c.id).collect();
                    retain_permitted(city_ids, &permitted)
                }
                None => Vec::new(),
            };

            if allowed == snapshot.selected_cities {
                return false;
            }
            debug!("Cities filter changed to {:?}", allowed);
            snapshot.selected_cities = allowed;
            snapshot.selected_districts.clear();
            true
        })
    }

    /// Районы ставятся всегда, даже если список не изменился: дальше каскада нет.
    pub fn set_districts(&self, district_ids: Vec<LocationId>) -> bool {
        let catalog = self.catalog();
        self.snapshot.send_modify(|snapshot| {
            let permitted: Vec<_> = catalog
                .districts_of(&snapshot.selected_cities)
                .map(|d| d.id)
                .collect();
            snapshot.selected_districts = retain_permitted(district_ids, &permitted);
        });
        true
    }

    pub fn set_from_date(&self, from_date: Option<NaiveDate>) -> bool {
        self.snapshot.send_modify(|snapshot| snapshot.from_date = from_date);
        true
    }

    /// Города выбранной страны; пусто, если страна не выбрана.
    pub fn filtered_cities(&self) -> Vec<City> {
        match self.snapshot.borrow().selected_country {
            Some(country_id) => self.catalog().cities_of(country_id).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Районы выбранных городов; пусто, если города не выбраны.
    pub fn filtered_districts(&self) -> Vec<District> {
        let catalog = self.catalog();
        let snapshot = self.snapshot.borrow();
        let districts = catalog
            .districts_of(&snapshot.selected_cities)
            .cloned()
            .collect();
        districts
    }

    fn change_country(&self, country_id: Option<LocationId>) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.selected_country == country_id {
                return false;
            }
            debug!("Country filter changed to {:?}", country_id);
            snapshot.selected_country = country_id;
            snapshot.selected_cities.clear();
            snapshot.selected_districts.clear();
            true
        })
    }
}

/// Допустимые идентификаторы в исходном порядке, без повторов.
fn retain_permitted(ids: Vec<LocationId>, permitted: &[LocationId]) -> Vec<LocationId> {
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        if permitted.contains(&id) && !kept.contains(&id) {
            kept.push(id);
        }
    }
    kept
}
