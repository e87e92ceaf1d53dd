use serde::{Deserialize, Serialize};

pub type LocationId = i64;

/// Элемент справочника в том виде, в каком его отдаёт API: `{id, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationItem {
    pub id: LocationId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: LocationId,
    pub name: String,
}

/// Город со ссылкой на страну. `country_id` используется только для фильтрации.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: LocationId,
    pub name: String,
    pub country_id: LocationId,
}

/// Район со ссылкой на город. `city_id` используется только для фильтрации.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub id: LocationId,
    pub name: String,
    pub city_id: LocationId,
}

impl From<LocationItem> for Country {
    fn from(item: LocationItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
        }
    }
}

impl City {
    pub fn from_item(item: LocationItem, country_id: LocationId) -> Self {
        Self {
            id: item.id,
            name: item.name,
            country_id,
        }
    }
}

impl District {
    pub fn from_item(item: LocationItem, city_id: LocationId) -> Self {
        Self {
            id: item.id,
            name: item.name,
            city_id,
        }
    }
}

/// Плоский справочник стран, городов и районов.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCatalog {
    pub countries: Vec<Country>,
    pub cities: Vec<City>,
    pub districts: Vec<District>,
}

impl LocationCatalog {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn cities_of(&self, country_id: LocationId) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(move |c| c.country_id == country_id)
    }

    pub fn districts_of<'a>(
        &'a self,
        city_ids: &'a [LocationId],
    ) -> impl Iterator<Item = &'a District> {
        self.districts
            .iter()
            .filter(move |d| city_ids.contains(&d.city_id))
    }
}
