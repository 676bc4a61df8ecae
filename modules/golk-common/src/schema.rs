//! The fixed graph schema as data.
//!
//! One table drives three consumers: uniqueness constraints, the bulk CSV
//! import statements, and the schema description handed to the LLM. CSV
//! column names keep the headers of the source files (spaces and all); graph
//! property names use underscores so generated queries never need quoting.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Integer,
    Float,
}

impl PropertyType {
    fn annotation(self) -> &'static str {
        match self {
            PropertyType::String => "",
            PropertyType::Integer => " (Integer type)",
            PropertyType::Float => " (Float type)",
        }
    }
}

/// A graph property and the CSV column it is imported from.
/// `column: None` marks a property maintained at runtime (weather updater).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    pub column: Option<&'static str>,
    pub ty: PropertyType,
}

const fn text(name: &'static str, column: &'static str) -> Property {
    Property { name, column: Some(column), ty: PropertyType::String }
}

const fn int(name: &'static str, column: &'static str) -> Property {
    Property { name, column: Some(column), ty: PropertyType::Integer }
}

const fn float(name: &'static str, column: &'static str) -> Property {
    Property { name, column: Some(column), ty: PropertyType::Float }
}

const fn runtime(name: &'static str, ty: PropertyType) -> Property {
    Property { name, column: None, ty }
}

/// CSV source files, in the order the loader parameterises them (`$file_0`..`$file_9`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFile {
    Country,
    DistrictEthnicity,
    Areas,
    Restaurants,
    Hospitals,
    Places,
    PoliceStations,
    Accommodation,
    Weather,
    CityDistances,
}

impl SourceFile {
    pub const ALL: [SourceFile; 10] = [
        SourceFile::Country,
        SourceFile::DistrictEthnicity,
        SourceFile::Areas,
        SourceFile::Restaurants,
        SourceFile::Hospitals,
        SourceFile::Places,
        SourceFile::PoliceStations,
        SourceFile::Accommodation,
        SourceFile::Weather,
        SourceFile::CityDistances,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            SourceFile::Country => "SriLanka.csv",
            SourceFile::DistrictEthnicity => "DistrictEthnicity.csv",
            SourceFile::Areas => "areas.csv",
            SourceFile::Restaurants => "restaurants.csv",
            SourceFile::Hospitals => "Hospitals.csv",
            SourceFile::Places => "places.csv",
            SourceFile::PoliceStations => "PoliceStations.csv",
            SourceFile::Accommodation => "accomadation.csv",
            SourceFile::Weather => "weather.csv",
            SourceFile::CityDistances => "City_Distances.csv",
        }
    }

    /// Query parameter name carrying this file's name.
    pub fn param(self) -> String {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or_default();
        format!("file_{idx}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeImport {
    pub label: &'static str,
    pub file: SourceFile,
    pub key: Property,
    pub properties: &'static [Property],
    /// Extra guidance for the LLM, e.g. which label answers "hotels".
    pub hint: Option<&'static str>,
}

impl NodeImport {
    pub fn constraint_name(&self) -> String {
        format!("{}_{}_uniq", self.key.name, self.label)
    }

    pub fn key_column(&self) -> &'static str {
        self.key.column.unwrap_or(self.key.name)
    }
}

/// One side of a relationship import: match `label` where `key == row[column]`.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub label: &'static str,
    pub key: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RelationshipImport {
    pub rel_type: &'static str,
    pub file: SourceFile,
    pub source: Endpoint,
    pub target: Endpoint,
    pub properties: &'static [Property],
    pub note: Option<&'static str>,
}

// --- Node table ---

const COUNTRY_PROPS: &[Property] = &[
    int("Suwa_Seriya_Ambulance", "Suwa Seriya Ambulance"),
    int("Police_Emergency_Service", "Police Emergency Service"),
    int("Government_Information_Center", "Government Information Center"),
    int("Bomb_Disposal_Unit", "Bomb Disposal Unit"),
    int("National_Help_Desk", "National Help Desk"),
    int("Sri_Lanka_Tourism_Development_Authority", "Sri Lanka Tourism Development Authority"),
    int("Bandaranaike_International_Airport", "Bandaranaike International Airport"),
    int("Department_of_Immigration", "Department of Immigration"),
    text("SriLankan_Airlines", "SriLankan Airlines"),
    int("Sri_Lanka_Railways", "Sri Lanka Railways"),
    int("Children_Helpline", "Children Helpline"),
    int("Women_Helpline", "Women Helpline"),
    int("Ministry_of_Foreign_Affairs", "Ministry of Foreign Affairs"),
    int("Ministry_of_Health", "Ministry of Health"),
    int("Trilingual_Health_Line", "Trilingual Health Line"),
    int("Ceylon_Electricity_Board", "Ceylon Electricity Board"),
    int(
        "National_Water_Supply_and_Drainage_Board",
        "National Water Supply and Drainage Board",
    ),
    text("Description", "Description"),
    text("Nationality", "Nationality"),
    text("Currency", "Currency"),
    text("National_Sport", "National Sport"),
    text("National_Bird", "National Bird"),
    text("National_Flower", "National Flower"),
    text("National_Tree", "National Tree"),
    text("Official_languages", "Official languages"),
    text("Major_Ethnic", "Major Ethnic"),
];

const DISTRICT_PROPS: &[Property] = &[
    text("Sinhalese", "Sinhalese"),
    text("Sri_Lankan_Tamils", "Sri Lankan Tamils"),
    text("Indian_Tamils", "Indian Tamils"),
    text("Sri_Lankan_Moors", "Sri Lankan Moors"),
    text("Others", "Others"),
    text("Most_Used_Language", "Most Used Language"),
];

const AREA_PROPS: &[Property] = &[
    text("Description", "Description"),
    int("Population", "Population"),
    runtime("last_weather_update", PropertyType::String),
];

const CONTACT_PROPS: &[Property] = &[
    int("Contact_Number", "Contact Number"),
    text("Google_Map_Link", "Google Map Link"),
];

const RESTAURANT_PROPS: &[Property] = &[
    text("Ratings", "ratings"),
    text("Google_map_link", "google_map_link"),
];

const PLACE_PROPS: &[Property] = &[
    text("Activity_Type", "Activity Type"),
    text("Description", "Description"),
];

const ACCOMMODATION_PROPS: &[Property] = &[
    text("Rating", "Rating"),
    text("Type", "Type"),
    text("Description", "Description"),
    text("Nearby_Places", "Nearby Places"),
    text("Booking_Com_Booking_Link", "Booking.com Booking Link"),
];

const WEATHER_PROPS: &[Property] = &[
    text("Season", "Season"),
    text("Description", "Description"),
    runtime("avg_temp", PropertyType::Float),
    runtime("avg_precip", PropertyType::Float),
    runtime("avg_wind", PropertyType::Float),
    runtime("precip_prob", PropertyType::Float),
    runtime("current_temp", PropertyType::Float),
    runtime("max_temp", PropertyType::Float),
    runtime("min_temp", PropertyType::Float),
    runtime("precipitation", PropertyType::Float),
    runtime("precipitation_prob", PropertyType::Float),
    runtime("wind_speed", PropertyType::Float),
    runtime("last_updated", PropertyType::String),
];

/// Node imports in load order.
pub const NODES: &[NodeImport] = &[
    NodeImport {
        label: "Country",
        file: SourceFile::Country,
        key: text("Country", "Country"),
        properties: COUNTRY_PROPS,
        hint: Some("emergency and helpline numbers"),
    },
    NodeImport {
        label: "Province",
        file: SourceFile::DistrictEthnicity,
        key: text("Province", "Province"),
        properties: &[],
        hint: None,
    },
    NodeImport {
        label: "District",
        file: SourceFile::DistrictEthnicity,
        key: text("District", "District"),
        properties: DISTRICT_PROPS,
        hint: None,
    },
    NodeImport {
        label: "Area",
        file: SourceFile::Areas,
        key: text("Areas", "Areas"),
        properties: AREA_PROPS,
        hint: None,
    },
    NodeImport {
        label: "Hospital",
        file: SourceFile::Hospitals,
        key: text("Nearest_Hospital", "Nearest Hospital"),
        properties: CONTACT_PROPS,
        hint: None,
    },
    NodeImport {
        label: "Restaurant",
        file: SourceFile::Restaurants,
        key: text("Restaurant", "restaurant"),
        properties: RESTAURANT_PROPS,
        hint: Some("When user ask about restaurants use this"),
    },
    NodeImport {
        label: "Place",
        file: SourceFile::Places,
        key: text("Place_To_Visit", "Place to Visit"),
        properties: PLACE_PROPS,
        hint: Some("tourist attractions; Activity_Type is Outdoor or Indoor"),
    },
    NodeImport {
        label: "PoliceStation",
        file: SourceFile::PoliceStations,
        key: text("Nearest_Police_Station", "Nearest Police Station"),
        properties: CONTACT_PROPS,
        hint: None,
    },
    NodeImport {
        label: "Accommodation",
        file: SourceFile::Accommodation,
        key: text("Accommodation_Place_Name", "Accommodation Place Name"),
        properties: ACCOMMODATION_PROPS,
        hint: Some("When user ask about hotels/motels use this"),
    },
    NodeImport {
        label: "Weather",
        file: SourceFile::Weather,
        key: text("Month", "Month"),
        properties: WEATHER_PROPS,
        hint: Some("one node per month, e.g. Month: 'January'"),
    },
];

const fn area(column: &'static str) -> Endpoint {
    Endpoint { label: "Area", key: "Areas", column }
}

const HAS_WEATHER_PROPS: &[Property] = &[
    runtime("avg_temp", PropertyType::Float),
    runtime("avg_precip", PropertyType::Float),
    runtime("avg_wind", PropertyType::Float),
    runtime("precip_prob", PropertyType::Float),
    runtime("description", PropertyType::String),
];

/// Relationship imports in load order.
pub const RELATIONSHIPS: &[RelationshipImport] = &[
    RelationshipImport {
        rel_type: "HAS_PROVINCE",
        file: SourceFile::DistrictEthnicity,
        source: Endpoint { label: "Country", key: "Country", column: "Country" },
        target: Endpoint { label: "Province", key: "Province", column: "Province" },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "HAS_DISTRICT",
        file: SourceFile::DistrictEthnicity,
        source: Endpoint { label: "Province", key: "Province", column: "Province" },
        target: Endpoint { label: "District", key: "District", column: "District" },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "LOCATED_IN",
        file: SourceFile::Areas,
        source: area("Areas"),
        target: Endpoint { label: "District", key: "District", column: "District" },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "HAS_DISTANCE",
        file: SourceFile::CityDistances,
        source: area("Location 1"),
        target: area("Location 2"),
        properties: &[float("Distance_in_km", "Distance_in_KM")],
        note: Some("stored once per unordered pair; match it undirected"),
    },
    RelationshipImport {
        rel_type: "HAS_HOSPITAL",
        file: SourceFile::Hospitals,
        source: area("Areas"),
        target: Endpoint { label: "Hospital", key: "Nearest_Hospital", column: "Nearest Hospital" },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "HAS_RESTAURANT",
        file: SourceFile::Restaurants,
        source: area("area"),
        target: Endpoint { label: "Restaurant", key: "Restaurant", column: "restaurant" },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "CONSISTED_WITH",
        file: SourceFile::Places,
        source: area("Area"),
        target: Endpoint { label: "Place", key: "Place_To_Visit", column: "Place to Visit" },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "HAS_POLICE",
        file: SourceFile::PoliceStations,
        source: area("Areas"),
        target: Endpoint {
            label: "PoliceStation",
            key: "Nearest_Police_Station",
            column: "Nearest Police Station",
        },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "HAS_ACCOMMODATION",
        file: SourceFile::Accommodation,
        source: area("Area"),
        target: Endpoint {
            label: "Accommodation",
            key: "Accommodation_Place_Name",
            column: "Accommodation Place Name",
        },
        properties: &[],
        note: None,
    },
    RelationshipImport {
        rel_type: "HAS_WEATHER",
        file: SourceFile::Weather,
        source: area("Area"),
        target: Endpoint { label: "Weather", key: "Month", column: "Month" },
        properties: HAS_WEATHER_PROPS,
        note: Some("per-area monthly climate lives on the relationship"),
    },
];

pub fn node(label: &str) -> Option<&'static NodeImport> {
    NODES.iter().find(|n| n.label == label)
}

/// Render the schema as the LLM-facing description.
pub fn describe() -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Note: never return whole nodes or relationships from a query. \
         Return the properties of the nodes and relationships."
    );

    let mut labels: Vec<&str> = NODES.iter().map(|n| n.label).collect();
    labels.sort_unstable();
    let _ = writeln!(out, "\nNode labels: {}", labels.join(", "));

    let mut types: Vec<&str> = RELATIONSHIPS.iter().map(|r| r.rel_type).collect();
    types.sort_unstable();
    let _ = writeln!(out, "Relationship types: {}", types.join(", "));

    let _ = writeln!(out, "\nNode properties:");
    for node in NODES {
        match node.hint {
            Some(hint) => {
                let _ = writeln!(out, "  {} ({hint}):", node.label);
            }
            None => {
                let _ = writeln!(out, "  {}:", node.label);
            }
        }
        let _ = writeln!(
            out,
            "    {}{} (unique constraint)",
            node.key.name,
            node.key.ty.annotation()
        );
        for prop in node.properties {
            let _ = writeln!(out, "    {}{}", prop.name, prop.ty.annotation());
        }
    }

    let _ = writeln!(out, "\nRelationships:");
    for rel in RELATIONSHIPS {
        let _ = writeln!(
            out,
            "  (:{})-[:{}]->(:{})",
            rel.source.label, rel.rel_type, rel.target.label
        );
        if rel.properties.is_empty() {
            let _ = writeln!(out, "    Properties: None");
        } else {
            let props: Vec<String> = rel
                .properties
                .iter()
                .map(|p| format!("{}{}", p.name, p.ty.annotation()))
                .collect();
            let _ = writeln!(out, "    Properties: {}", props.join(", "));
        }
        if let Some(note) = rel.note {
            let _ = writeln!(out, "    Note: {note}");
        }
    }

    let _ = writeln!(out, "\nUse only relationship properties that are listed above.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_label_is_unique() {
        let labels: HashSet<_> = NODES.iter().map(|n| n.label).collect();
        assert_eq!(labels.len(), NODES.len());
        assert_eq!(NODES.len(), 10);
    }

    #[test]
    fn relationship_endpoints_reference_node_keys() {
        for rel in RELATIONSHIPS {
            for end in [rel.source, rel.target] {
                let target = node(end.label)
                    .unwrap_or_else(|| panic!("{} references unknown {}", rel.rel_type, end.label));
                assert_eq!(target.key.name, end.key, "{} -> {}", rel.rel_type, end.label);
            }
        }
    }

    #[test]
    fn file_params_follow_source_order() {
        assert_eq!(SourceFile::Country.param(), "file_0");
        assert_eq!(SourceFile::Weather.param(), "file_8");
        assert_eq!(SourceFile::CityDistances.param(), "file_9");
    }

    #[test]
    fn constraint_names_embed_key_and_label() {
        let area = node("Area").unwrap();
        assert_eq!(area.constraint_name(), "Areas_Area_uniq");
        assert_eq!(area.key_column(), "Areas");
    }

    #[test]
    fn description_mentions_keys_types_and_hints() {
        let d = describe();
        assert!(d.contains("Accommodation_Place_Name (unique constraint)"));
        assert!(d.contains("Population (Integer type)"));
        assert!(d.contains("Distance_in_km (Float type)"));
        assert!(d.contains("hotels/motels"));
        assert!(d.contains("(:Area)-[:HAS_ACCOMMODATION]->(:Accommodation)"));
        assert!(d.contains("Return the properties"));
    }
}
