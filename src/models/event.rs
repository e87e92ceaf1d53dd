use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Событие в том виде, в каком его вернул сервер.
///
/// Клиент не проверяет форму записи: поля читаются по необходимости при отрисовке,
/// отсутствующее поле просто не показывается.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(pub Value);

impl Event {
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.str_field("date")
    }

    pub fn creator_name(&self) -> Option<&str> {
        let creator = self.0.get("creator")?;
        creator
            .get("userName")
            .or_else(|| creator.get("name"))
            .and_then(Value::as_str)
    }

    /// Город и район одной строкой, если сервер их прислал.
    pub fn location_label(&self) -> Option<String> {
        let city = self.nested_str(&["city", "name"]);
        let district = self.nested_str(&["district", "name"]);
        match (city, district) {
            (Some(city), Some(district)) => Some(format!("{city}, {district}")),
            (Some(single), None) | (None, Some(single)) => Some(single.to_string()),
            (None, None) => None,
        }
    }

    pub fn participant_count(&self) -> Option<u64> {
        self.0.get("participantCount").and_then(Value::as_u64)
    }

    pub fn like_count(&self) -> Option<u64> {
        self.0.get("likeCount").and_then(Value::as_u64)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    fn nested_str(&self, path: &[&str]) -> Option<&str> {
        path.iter()
            .try_fold(&self.0, |value, key| value.get(key))
            .and_then(Value::as_str)
    }
}

/// Страница коллекции: `{items: [...], totalCount: N}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_count: u64,
}
