//! Geographic key normalization.
//!
//! The AQI dataset names states in full ("Washington") and counties bare
//! ("Spokane"); the birth dataset uses postal abbreviations ("WA") and
//! suffixed county names ("Spokane County"). These helpers bring both sides
//! to the same `(county, abbreviation)` key.

/// Full state name to postal abbreviation: 50 states, DC and 5 insular areas.
pub const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
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
    ("District of Columbia", "DC"),
    ("American Samoa", "AS"),
    ("Guam", "GU"),
    ("Northern Mariana Islands", "MP"),
    ("Puerto Rico", "PR"),
    ("United States Minor Outlying Islands", "UM"),
    ("U.S. Virgin Islands", "VI"),
];

/// Looks up the postal abbreviation for a full state name.
///
/// Returns `None` for names outside the table (e.g. "Country Of Mexico");
/// callers drop such records from join-bound data.
#[must_use]
pub fn state_abbreviation(full_name: &str) -> Option<&'static str> {
    STATE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == full_name)
        .map(|(_, abbr)| *abbr)
}

/// Strips the `County` suffix from a county name: `"Spokane County"` becomes
/// `"Spokane"`.
///
/// Everything from `County` on is removed together with the character
/// directly before it. Names without `County` (parishes, boroughs,
/// independent cities) return `None`; they never produce a join key.
#[must_use]
pub fn strip_county_suffix(name: &str) -> Option<&str> {
    let idx = name.find("County")?;
    let head = &name[..idx];
    let mut chars = head.chars();
    chars.next_back();
    let stripped = chars.as_str();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}
