//! Registry document definitions.
//!
//! Field names follow the established `tanks_config.json` layout, so files
//! written by earlier releases load unchanged.

use serde::{Deserialize, Serialize};
use tc_calib::ModelKind;

/// Id of the tank that always exists.
pub const DEFAULT_TANK_ID: &str = "default";

fn default_current_tank_id() -> String {
    DEFAULT_TANK_ID.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryDoc {
    #[serde(default = "default_current_tank_id")]
    pub current_tank_id: String,
    /// Tanks keyed by id, in registry order.
    #[serde(with = "tank_map")]
    pub tanks: Vec<(String, TankDef)>,
}

impl RegistryDoc {
    pub fn tank(&self, id: &str) -> Option<&TankDef> {
        self.tanks.iter().find(|(tid, _)| tid == id).map(|(_, t)| t)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TankDef {
    pub name: String,
    #[serde(rename = "D")]
    pub diameter: f64,
    #[serde(rename = "L")]
    pub length: f64,
    #[serde(rename = "R", default)]
    pub radius: f64,
    #[serde(rename = "_training_heights", default)]
    pub heights: Vec<f64>,
    #[serde(rename = "_training_galones", default)]
    pub volumes: Vec<f64>,
    #[serde(rename = "modelo_type", default)]
    pub model_type: Option<ModelKind>,
}

/// JSON object <-> ordered `(id, tank)` pairs.
mod tank_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::TankDef;

    pub fn serialize<S: Serializer>(
        tanks: &[(String, TankDef)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(tanks.len()))?;
        for (id, tank) in tanks {
            map.serialize_entry(id, tank)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, TankDef)>, D::Error> {
        deserializer.deserialize_map(TankMapVisitor)
    }

    struct TankMapVisitor;

    impl<'de> Visitor<'de> for TankMapVisitor {
        type Value = Vec<(String, TankDef)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of tank id to tank definition")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut tanks = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, tank)) = access.next_entry::<String, TankDef>()? {
                tanks.push((id, tank));
            }
            Ok(tanks)
        }
    }
}
