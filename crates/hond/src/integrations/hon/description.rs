//! Static entity descriptions.
//!
//! Each platform keeps a table mapping appliance type codes to the entities
//! an appliance of that type may expose. Descriptions are defined once at
//! load time and never change.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::Display;
use strum::EnumString;

/// Entity descriptions per appliance type code.
pub type Table<D> = BTreeMap<&'static str, Vec<D>>;

/// Host category for entities that are not primary controls or readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Minutes,
    Celsius,
    KilowattHours,
    Liters,
    Percent,
    Kilograms,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Minutes => "min",
            Unit::Celsius => "°C",
            Unit::KilowattHours => "kWh",
            Unit::Liters => "L",
            Unit::Percent => "%",
            Unit::Kilograms => "kg",
        }
    }
}

/// Fields shared by every description, used for merging tables and for docs.
pub trait EntityDescription {
    /// Key path into appliance data or settings; unique within a table entry
    fn key(&self) -> &str;

    fn name(&self) -> &str;

    /// Material Design icon, e.g. "mdi:timer-plus"
    fn icon(&self) -> Option<&str>;

    fn entity_category(&self) -> Option<EntityCategory>;
}

/// Build a table from appliance codes and description lists.
pub(crate) fn table<D>(entries: impl IntoIterator<Item = (&'static str, Vec<D>)>) -> Table<D> {
    entries.into_iter().collect()
}

/// Descriptions for an appliance type, empty when the type has none.
pub fn descriptions_for<'a, D>(table: &'a Table<D>, appliance_type: &str) -> &'a [D] {
    table.get(appliance_type).map(Vec::as_slice).unwrap_or(&[])
}
