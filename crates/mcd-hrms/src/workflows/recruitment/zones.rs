use serde::Serialize;

use super::validation::ValidationError;

/// Administrative zone and the wards a hire can be posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    pub wards: Vec<String>,
}

impl Zone {
    fn new(name: &str, wards: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            wards: wards.iter().map(|ward| ward.to_string()).collect(),
        }
    }

    /// Headquarters ward, used when a claim does not name one.
    pub fn headquarters(&self) -> Option<&str> {
        self.wards.first().map(String::as_str)
    }

    fn ward(&self, requested: &str) -> Option<&str> {
        self.wards
            .iter()
            .find(|ward| ward.eq_ignore_ascii_case(requested))
            .map(String::as_str)
    }
}

/// Canonical zone and ward a claim resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub zone: String,
    pub ward: String,
}

/// Read-only reference data for the corporation's zones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDirectory {
    zones: Vec<Zone>,
}

impl ZoneDirectory {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// The twelve zones of the unified corporation with a few wards each.
    pub fn standard() -> Self {
        Self::new(vec![
            Zone::new("Central", &["Lajpat Nagar", "Defence Colony", "Jangpura"]),
            Zone::new("City SP", &["Chandni Chowk", "Sadar Bazar", "Kashmere Gate"]),
            Zone::new("Civil Lines", &["Timarpur", "Mukherjee Nagar", "Burari"]),
            Zone::new("Karol Bagh", &["Karol Bagh", "Patel Nagar", "Rajinder Nagar"]),
            Zone::new("Keshav Puram", &["Shalimar Bagh", "Ashok Vihar", "Tri Nagar"]),
            Zone::new("Najafgarh", &["Najafgarh", "Dwarka", "Palam"]),
            Zone::new("Narela", &["Narela", "Bawana", "Alipur"]),
            Zone::new("Rohini", &["Rohini Sector 7", "Begumpur", "Budh Vihar"]),
            Zone::new("Shahdara North", &["Seelampur", "Yamuna Vihar", "Karawal Nagar"]),
            Zone::new("Shahdara South", &["Vishwas Nagar", "Mayur Vihar", "Krishna Nagar"]),
            Zone::new("South", &["Hauz Khas", "Malviya Nagar", "Mehrauli"]),
            Zone::new("West", &["Rajouri Garden", "Janakpuri", "Tilak Nagar"]),
        ])
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn find(&self, name: &str) -> Option<&Zone> {
        let name = name.trim();
        self.zones
            .iter()
            .find(|zone| zone.name.eq_ignore_ascii_case(name))
    }

    /// Resolves the claiming zone and optional ward into canonical spellings.
    pub fn place(&self, zone: &str, ward: Option<&str>) -> Result<Placement, ValidationError> {
        let zone_name = zone.trim();
        if zone_name.is_empty() {
            return Err(ValidationError::MissingZone);
        }

        let zone = self
            .find(zone_name)
            .ok_or_else(|| ValidationError::UnknownZone(zone_name.to_string()))?;

        let ward = match ward.map(str::trim).filter(|ward| !ward.is_empty()) {
            Some(requested) => zone.ward(requested).ok_or_else(|| {
                ValidationError::WardOutsideZone {
                    zone: zone.name.clone(),
                    ward: requested.to_string(),
                }
            })?,
            None => zone
                .headquarters()
                .ok_or_else(|| ValidationError::ZoneWithoutWards(zone.name.clone()))?,
        };

        Ok(Placement {
            zone: zone.name.clone(),
            ward: ward.to_string(),
        })
    }
}

impl Default for ZoneDirectory {
    fn default() -> Self {
        Self::standard()
    }
}
