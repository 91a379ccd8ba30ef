//! Resource fixtures.
//!
//! Builders producing JSON bodies for the embedded Location, Organization
//! and Observation schemas.

use serde_json::{Value, json};

use helios_search_index::ResourceId;

/// A location fixture.
#[derive(Debug, Clone, Default)]
pub struct LocationFixture {
    /// Location name.
    pub name: Option<String>,
    /// Location status code.
    pub status: Option<String>,
    /// Identifiers (system, value pairs).
    pub identifiers: Vec<(String, String)>,
    /// Address lines and city.
    pub address: Option<(Vec<String>, String)>,
    /// Stored id of the parent location.
    pub part_of: Option<ResourceId>,
    /// Stored id of the managing organization.
    pub organization: Option<ResourceId>,
}

impl LocationFixture {
    /// Creates a location with a name and status.
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status: Some(status.into()),
            ..Default::default()
        }
    }

    /// Adds an identifier.
    pub fn with_identifier(mut self, system: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.push((system.into(), value.into()));
        self
    }

    /// Sets the address.
    pub fn with_address(mut self, lines: Vec<&str>, city: impl Into<String>) -> Self {
        self.address = Some((lines.into_iter().map(String::from).collect(), city.into()));
        self
    }

    /// Sets the parent location.
    pub fn part_of(mut self, id: ResourceId) -> Self {
        self.part_of = Some(id);
        self
    }

    /// Sets the managing organization.
    pub fn managed_by(mut self, id: ResourceId) -> Self {
        self.organization = Some(id);
        self
    }

    /// Converts to a JSON body.
    pub fn to_json(&self) -> Value {
        let mut location = json!({"resourceType": "Location"});

        if let Some(name) = &self.name {
            location["name"] = json!(name);
        }
        if let Some(status) = &self.status {
            location["status"] = json!(status);
        }
        if !self.identifiers.is_empty() {
            location["identifier"] = self
                .identifiers
                .iter()
                .map(|(system, value)| json!({"system": system, "value": value}))
                .collect();
        }
        if let Some((lines, city)) = &self.address {
            location["address"] = json!({"line": lines, "city": city});
        }
        if let Some(id) = self.part_of {
            location["partOf"] = json!({"reference": format!("Location/{}", id)});
        }
        if let Some(id) = self.organization {
            location["managingOrganization"] = json!({"reference": format!("Organization/{}", id)});
        }

        location
    }
}

/// Creates an organization body.
pub fn organization(name: &str) -> Value {
    json!({
        "resourceType": "Organization",
        "name": name,
        "active": true
    })
}

/// Creates an observation with a point-in-time effective value.
pub fn observation_at(status: &str, effective: &str) -> Value {
    json!({
        "resourceType": "Observation",
        "status": status,
        "effectiveDateTime": effective
    })
}

/// Creates an observation with an effective period.
pub fn observation_during(start: Option<&str>, end: Option<&str>) -> Value {
    let mut period = json!({});
    if let Some(start) = start {
        period["start"] = json!(start);
    }
    if let Some(end) = end {
        period["end"] = json!(end);
    }
    json!({
        "resourceType": "Observation",
        "status": "final",
        "effectivePeriod": period
    })
}

/// Creates an observation carrying a quantity value.
pub fn observation_quantity(value: f64, unit: &str) -> Value {
    json!({
        "resourceType": "Observation",
        "status": "final",
        "code": {
            "coding": [{"system": "http://loinc.org", "code": "8867-4", "display": "Heart rate"}]
        },
        "valueQuantity": {
            "value": value,
            "unit": unit,
            "system": "http://unitsofmeasure.org",
            "code": unit
        }
    })
}
