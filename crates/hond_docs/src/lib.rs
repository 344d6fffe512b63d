//! Generate the appliance feature tables of the README from the entity
//! description tables compiled into hond.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use hond::integrations::hon::description::EntityCategory;
use hond::integrations::hon::description::EntityDescription;
use hond::integrations::hon::description::Table;
use hond::integrations::hon::switch::SwitchKind;
use hond::integrations::hon::NUMBERS;
use hond::integrations::hon::SENSORS;
use hond::integrations::hon::SWITCHES;
use hond::Platform;
use regex::Captures;
use regex::Regex;
use strum::Display;
use tracing::debug;

/// Heading whose section is regenerated.
pub const SECTION_HEADING: &str = "## Appliance Features";

const SECTION_PATTERN: &str = r"(?s)(## Appliance Features\n).+?([^#]## |\z)";

/// Display names for appliance type codes.
pub const APPLIANCES: &[(&str, &str)] = &[
    ("AC", "Air Conditioner"),
    ("AP", "Air Purifier"),
    ("AS", "Air Scanner"),
    ("DW", "Dish Washer"),
    ("HO", "Hood"),
    ("IH", "Induction Hob"),
    ("MW", "Microwave"),
    ("OV", "Oven"),
    ("REF", "Fridge"),
    ("RVC", "Robot Vacuum Cleaner"),
    ("TD", "Tumble Dryer"),
    ("WC", "Wine Cellar"),
    ("WD", "Washer Dryer"),
    ("WH", "Water Heater"),
    ("WM", "Washing Machine"),
];

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("failed to access {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("no '## Appliance Features' section found")]
    SectionNotFound,

    #[error("invalid section pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Documentation category of an entity.
///
/// Ordering is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Control,
    Config,
    Sensor,
    Diagnostic,
}

impl Category {
    /// Categories that appear in the generated section.
    pub const RENDERED: [Category; 3] = [Category::Control, Category::Config, Category::Sensor];

    fn heading(self) -> &'static str {
        match self {
            Category::Control => "Controls",
            Category::Config => "Configs",
            Category::Sensor => "Sensors",
            Category::Diagnostic => "Diagnostics",
        }
    }

    /// An explicit entity category wins. Otherwise `settings.*` keys and
    /// switches are controls and everything else is a sensor.
    pub fn classify(entity_category: Option<EntityCategory>, key: &str, platform: Platform) -> Self {
        match entity_category {
            Some(EntityCategory::Config) => Category::Config,
            Some(EntityCategory::Diagnostic) => Category::Diagnostic,
            None if key.starts_with("settings") || platform == Platform::Switch => {
                Category::Control
            }
            None => Category::Sensor,
        }
    }
}

/// One row of a feature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Key as shown, e.g. `startProgram.delayTime`
    pub key: String,
    pub name: String,
    pub icon: Option<String>,
    pub platform: Platform,
}

/// Features per appliance code and category.
pub type Features = BTreeMap<String, BTreeMap<Category, Vec<Feature>>>;

pub fn add_feature(features: &mut Features, appliance: &str, category: Category, feature: Feature) {
    features
        .entry(appliance.to_string())
        .or_default()
        .entry(category)
        .or_default()
        .push(feature);
}

fn add_table<D: EntityDescription>(
    features: &mut Features,
    platform: Platform,
    table: &Table<D>,
    shown_key: impl Fn(&D) -> String,
) {
    for (appliance, descriptions) in table {
        for description in descriptions {
            let category =
                Category::classify(description.entity_category(), description.key(), platform);
            let feature = Feature {
                key: shown_key(description),
                name: description.name().to_string(),
                icon: description.icon().map(str::to_string),
                platform,
            };
            add_feature(features, appliance, category, feature);
        }
    }
}

/// Gather every description of every platform.
pub fn collect() -> Features {
    let mut features = Features::new();
    add_table(&mut features, Platform::Number, &NUMBERS, |d| d.key.to_string());
    add_table(&mut features, Platform::Sensor, &SENSORS, |d| d.key.to_string());
    add_table(&mut features, Platform::Switch, &SWITCHES, |d| match &d.kind {
        SwitchKind::Control {
            turn_on_key,
            turn_off_key,
            ..
        } => format!("{}` / `{}", turn_on_key, turn_off_key),
        SwitchKind::Setting => d.key.to_string(),
    });
    features
}

fn appliance_name(code: &str) -> &str {
    APPLIANCES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Render the markdown body of the features section.
pub fn render(features: &Features) -> String {
    let mut text = String::new();
    for (appliance, categories) in features {
        text.push_str(&format!("\n### {}\n", appliance_name(appliance)));
        for category in Category::RENDERED {
            let Some(rows) = categories.get(&category) else {
                continue;
            };
            let mut rows: Vec<&Feature> = rows.iter().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            text.push_str(&format!("#### {}\n", category.heading()));
            text.push_str("| Name | Icon | Entity | Key |\n");
            text.push_str("| --- | --- | --- | --- |\n");
            for row in rows {
                let icon = row
                    .icon
                    .as_deref()
                    .map(|icon| format!("`{}`", icon.trim_start_matches("mdi:")))
                    .unwrap_or_default();
                text.push_str(&format!(
                    "| {} | {} | `{}` | `{}` |\n",
                    row.name, icon, row.platform, row.key
                ));
            }
        }
    }
    text
}

/// Replace the body of the features section, up to the next `## ` heading
/// or the end of the document.
pub fn replace_section(readme: &str, section: &str) -> Result<String, DocsError> {
    let pattern = Regex::new(SECTION_PATTERN)?;
    if !pattern.is_match(readme) {
        return Err(DocsError::SectionNotFound);
    }

    let replaced = pattern.replace(readme, |caps: &Captures| {
        format!("{}{}{}", &caps[1], section, &caps[2])
    });
    Ok(replaced.into_owned())
}

/// Result of [`update_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Updated,
    /// Check mode found differences; nothing was written
    Stale,
}

/// Regenerate the features section of a markdown file in place.
pub fn update_file(path: &Path, check: bool) -> Result<Outcome, DocsError> {
    let readme =
        std::fs::read_to_string(path).map_err(|e| DocsError::Io(path.to_path_buf(), e))?;
    let updated = replace_section(&readme, &render(&collect()))?;

    if updated == readme {
        return Ok(Outcome::Unchanged);
    }
    if check {
        return Ok(Outcome::Stale);
    }

    debug!("Writing {} bytes to {}", updated.len(), path.display());
    std::fs::write(path, updated).map_err(|e| DocsError::Io(path.to_path_buf(), e))?;
    Ok(Outcome::Updated)
}
