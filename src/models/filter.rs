use chrono::NaiveDate;
use serde::Serialize;

use super::LocationId;

/// Текущий выбор пользователя в панели фильтров.
///
/// Инварианты каскада (города принадлежат выбранной стране, районы выбранным городам)
/// поддерживает `FilterPanel` в момент изменения; сам снимок их не проверяет.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub selected_country: Option<LocationId>,
    pub selected_cities: Vec<LocationId>,
    pub selected_districts: Vec<LocationId>,
    pub from_date: Option<NaiveDate>,
}

impl FilterSnapshot {
    /// Снимок по умолчанию при открытии экрана: без локаций, с датой `today`.
    pub fn starting_from(today: NaiveDate) -> Self {
        Self {
            from_date: Some(today),
            ..Self::default()
        }
    }
}
