use chrono::NaiveDate;

use super::{FilterSnapshot, LocationId};

pub const SORT_BY_DATE: &str = "date";

/// Параметры запроса `GET /events/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub sort_by: &'static str,
    pub country_ids: Vec<LocationId>,
    pub city_ids: Vec<LocationId>,
    pub district_ids: Vec<LocationId>,
    pub from_date: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn from_snapshot(snapshot: &FilterSnapshot, page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            sort_by: SORT_BY_DATE,
            country_ids: snapshot.selected_country.into_iter().collect(),
            city_ids: snapshot.selected_cities.clone(),
            district_ids: snapshot.selected_districts.clone(),
            // Сервер трактует FromDate со сдвигом на сутки, поэтому отправляем предыдущий день
            from_date: snapshot.from_date.and_then(|d| d.pred_opt()),
        }
    }

    /// Пары ключ/значение; списки идут повторяющимися ключами (`CityIds=1&CityIds=2`).
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pageNumber", self.page_number.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("SortBy", self.sort_by.to_string()),
        ];
        pairs.extend(self.country_ids.iter().map(|id| ("CountryIds", id.to_string())));
        pairs.extend(self.city_ids.iter().map(|id| ("CityIds", id.to_string())));
        pairs.extend(self.district_ids.iter().map(|id| ("DistrictIds", id.to_string())));
        if let Some(date) = self.from_date {
            pairs.push(("FromDate", date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self.pairs())
    }
}
