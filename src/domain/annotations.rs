// User annotations - favourite stations, priorities and custom map markers
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriorityLevel {
    #[default]
    None,
    #[serde(rename = "HP")]
    Hp,
    P1,
    P2,
    P3,
}

/// Marker colours offered to clients, as `(value, label)`.
pub const COLOR_OPTIONS: [(&str, &str); 10] = [
    ("#ef4444", "Red"),
    ("#f97316", "Orange"),
    ("#eab308", "Yellow"),
    ("#22c55e", "Green"),
    ("#06b6d4", "Cyan"),
    ("#3b82f6", "Blue"),
    ("#8b5cf6", "Purple"),
    ("#ec4899", "Pink"),
    ("#6b7280", "Gray"),
    ("#000000", "Black"),
];

/// A user-placed marker that is not part of the provider network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStation {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub color: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStationDraft {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub color: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update. `id` and `createdAt` are never patched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomStationPatch {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidCustomStation {
    #[error("custom station name must not be empty")]
    EmptyName,

    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),

    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

fn check_position(lat: f64, lng: f64) -> Result<(), InvalidCustomStation> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(InvalidCustomStation::Latitude(lat));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(InvalidCustomStation::Longitude(lng));
    }
    Ok(())
}

impl CustomStationDraft {
    pub fn validate(&self) -> Result<(), InvalidCustomStation> {
        if self.name.trim().is_empty() {
            return Err(InvalidCustomStation::EmptyName);
        }
        check_position(self.lat, self.lng)
    }

    pub fn into_station(self, id: String, created_at: i64) -> CustomStation {
        CustomStation {
            id,
            name: self.name,
            lat: self.lat,
            lng: self.lng,
            color: self.color,
            label: self.label,
            description: self.description,
            created_at,
        }
    }
}

impl CustomStationPatch {
    pub fn validate(&self) -> Result<(), InvalidCustomStation> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(InvalidCustomStation::EmptyName);
        }
        check_position(self.lat.unwrap_or_default(), self.lng.unwrap_or_default())
    }
}

impl CustomStation {
    pub fn apply(&mut self, patch: CustomStationPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(lat) = patch.lat {
            self.lat = lat;
        }
        if let Some(lng) = patch.lng {
            self.lng = lng;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
    }
}

/// Everything a user has attached to the map, persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserAnnotations {
    pub favorites: Vec<String>,
    /// Stations at [`PriorityLevel::None`] are not stored.
    pub priorities: BTreeMap<String, PriorityLevel>,
    pub custom_stations: Vec<CustomStation>,
}

impl UserAnnotations {
    pub fn is_favorite(&self, station_id: &str) -> bool {
        self.favorites.iter().any(|id| id == station_id)
    }

    /// Returns whether the station is a favourite afterwards.
    pub fn toggle_favorite(&mut self, station_id: &str) -> bool {
        if self.is_favorite(station_id) {
            self.favorites.retain(|id| id != station_id);
            false
        } else {
            self.favorites.push(station_id.to_string());
            true
        }
    }

    pub fn priority(&self, station_id: &str) -> PriorityLevel {
        self.priorities.get(station_id).copied().unwrap_or_default()
    }

    pub fn set_priority(&mut self, station_id: &str, level: PriorityLevel) {
        if level == PriorityLevel::None {
            self.priorities.remove(station_id);
        } else {
            self.priorities.insert(station_id.to_string(), level);
        }
    }

    pub fn custom_station(&self, id: &str) -> Option<&CustomStation> {
        self.custom_stations.iter().find(|s| s.id == id)
    }

    pub fn update_custom_station(
        &mut self,
        id: &str,
        patch: CustomStationPatch,
    ) -> Option<&CustomStation> {
        let station = self.custom_stations.iter_mut().find(|s| s.id == id)?;
        station.apply(patch);
        Some(station)
    }

    pub fn delete_custom_station(&mut self, id: &str) -> bool {
        let before = self.custom_stations.len();
        self.custom_stations.retain(|s| s.id != id);
        self.custom_stations.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, lat: f64, lng: f64) -> CustomStationDraft {
        CustomStationDraft {
            name: name.to_string(),
            lat,
            lng,
            color: COLOR_OPTIONS[0].0.to_string(),
            label: "W".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_toggle_favorite_twice_removes_it() {
        let mut annotations = UserAnnotations::default();
        assert!(annotations.toggle_favorite("BikePoints_1"));
        assert!(annotations.toggle_favorite("BikePoints_2"));
        assert!(annotations.is_favorite("BikePoints_1"));

        assert!(!annotations.toggle_favorite("BikePoints_1"));
        assert_eq!(annotations.favorites, vec!["BikePoints_2".to_string()]);
    }

    #[test]
    fn test_priority_none_is_not_stored() {
        let mut annotations = UserAnnotations::default();
        annotations.set_priority("BikePoints_1", PriorityLevel::Hp);
        assert_eq!(annotations.priority("BikePoints_1"), PriorityLevel::Hp);

        annotations.set_priority("BikePoints_1", PriorityLevel::None);
        assert!(annotations.priorities.is_empty());
        assert_eq!(annotations.priority("BikePoints_1"), PriorityLevel::None);
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(draft("Depot", 51.5, -0.1).validate(), Ok(()));
        assert_eq!(draft("  ", 51.5, -0.1).validate(), Err(InvalidCustomStation::EmptyName));
        assert_eq!(draft("Depot", 91.0, 0.0).validate(), Err(InvalidCustomStation::Latitude(91.0)));
        assert_eq!(
            draft("Depot", 0.0, -181.0).validate(),
            Err(InvalidCustomStation::Longitude(-181.0))
        );
    }

    #[test]
    fn test_update_and_delete_custom_station() {
        let mut annotations = UserAnnotations::default();
        annotations
            .custom_stations
            .push(draft("Depot", 51.5, -0.1).into_station("custom_1_0".to_string(), 1));

        let patch = CustomStationPatch {
            name: Some("North depot".to_string()),
            description: Some("Van parking".to_string()),
            ..Default::default()
        };
        let updated = annotations.update_custom_station("custom_1_0", patch).cloned();
        assert_eq!(updated.as_ref().map(|s| s.name.as_str()), Some("North depot"));
        assert_eq!(updated.as_ref().map(|s| s.lat), Some(51.5));
        assert_eq!(updated.map(|s| s.created_at), Some(1));

        let missing = annotations.update_custom_station("missing", CustomStationPatch::default());
        assert!(missing.is_none());
        assert!(annotations.delete_custom_station("custom_1_0"));
        assert!(!annotations.delete_custom_station("custom_1_0"));
    }

    #[test]
    fn test_serialized_shape() {
        let mut annotations = UserAnnotations::default();
        annotations.set_priority("BikePoints_1", PriorityLevel::Hp);
        annotations
            .custom_stations
            .push(draft("Depot", 51.5, -0.1).into_station("custom_1_0".to_string(), 1));

        let json = serde_json::to_value(&annotations).unwrap();
        assert_eq!(json["priorities"]["BikePoints_1"], "HP");
        assert_eq!(json["customStations"][0]["createdAt"], 1);
        assert!(json["customStations"][0].get("description").is_none());

        let empty: UserAnnotations = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, UserAnnotations::default());
    }
}
