use geo::MultiPolygon;

/// A single mapped administrative unit: a U.S. state or Canadian province.
///
/// Geometry is stored in Web Mercator meters, ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Territory {
    pub name: String,
    /// Country the unit belongs to ("United States of America" / "Canada").
    pub admin: String,
    pub geometry: MultiPolygon<f64>,
}

/// A named lake polygon. Decorative only; never assignable to a region.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Postal abbreviations for every U.S. state plus the mapped Canadian
/// provinces. Territories without an entry are drawn unlabeled.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
    ("British Columbia", "BC"),
    ("Alberta", "AB"),
    ("Saskatchewan", "SK"),
    ("Manitoba", "MB"),
    ("Ontario", "ON"),
    ("Québec", "QC"),
    ("Newfoundland and Labrador", "NL"),
];

/// Two-letter code for a territory name, if one is defined.
pub fn abbreviation_for(name: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(full, _)| *full == name)
        .map(|(_, abbr)| *abbr)
}

#[cfg(test)]
mod tests {
    use super::{ABBREVIATIONS, abbreviation_for};

    #[test]
    fn covers_all_states_and_mapped_provinces() {
        // 50 U.S. states + 7 drawn provinces.
        assert_eq!(ABBREVIATIONS.len(), 57);
    }

    #[test]
    fn looks_up_states_and_provinces() {
        assert_eq!(abbreviation_for("California"), Some("CA"));
        assert_eq!(abbreviation_for("Wyoming"), Some("WY"));
        assert_eq!(abbreviation_for("British Columbia"), Some("BC"));
        assert_eq!(abbreviation_for("Québec"), Some("QC"));
    }

    #[test]
    fn unknown_names_are_unlabeled() {
        assert_eq!(abbreviation_for("Lake Superior"), None);
        assert_eq!(abbreviation_for("Yukon"), None);
        assert_eq!(abbreviation_for(""), None);
    }

    #[test]
    fn names_are_unique() {
        for (i, (name, _)) in ABBREVIATIONS.iter().enumerate() {
            assert!(
                !ABBREVIATIONS[i + 1..].iter().any(|(other, _)| other == name),
                "duplicate abbreviation entry for {name}"
            );
        }
    }
}
