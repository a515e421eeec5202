//! Static beach registry.
//!
//! The registry is an external collaborator of the freshness core: fetchers
//! use it to compute cache keys and the refresh jobs iterate it.

use serde::Serialize;

/// Geographic coordinates of a beach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// One monitored beach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beach {
    pub id: &'static str,
    pub name: &'static str,
    pub location: Location,
    /// IWLS station id; `None` for lakes and other untided water.
    pub tide_station_id: Option<&'static str>,
}

/// All monitored Vancouver beaches.
pub const BEACHES: &[Beach] = &[
    Beach {
        id: "english-bay",
        name: "English Bay",
        location: Location {
            latitude: 49.2867,
            longitude: -123.1432,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "jericho-beach",
        name: "Jericho Beach",
        location: Location {
            latitude: 49.2727,
            longitude: -123.1978,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "kitsilano-beach",
        name: "Kitsilano Beach",
        location: Location {
            latitude: 49.2732,
            longitude: -123.1536,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "locarno-beach",
        name: "Locarno Beach",
        location: Location {
            latitude: 49.2768,
            longitude: -123.2062,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "second-beach",
        name: "Second Beach",
        location: Location {
            latitude: 49.2904,
            longitude: -123.1464,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "spanish-banks",
        name: "Spanish Banks",
        location: Location {
            latitude: 49.2766,
            longitude: -123.2249,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "sunset-beach",
        name: "Sunset Beach",
        location: Location {
            latitude: 49.2785,
            longitude: -123.1352,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "third-beach",
        name: "Third Beach",
        location: Location {
            latitude: 49.2994,
            longitude: -123.1585,
        },
        tide_station_id: Some("7735"),
    },
    Beach {
        id: "trout-lake",
        name: "Trout Lake",
        location: Location {
            latitude: 49.2554,
            longitude: -123.0643,
        },
        tide_station_id: None,
    },
];

/// Look up a beach by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static Beach> {
    BEACHES.iter().find(|beach| beach.id == id)
}
