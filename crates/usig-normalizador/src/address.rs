use std::{fmt, ops::Range};

use usig_transport::{RawAddress, RawCoordinates, wire};

use crate::search::normalize;

/// Locality suffix the service appends to every address inside the city.
const CITY_SUFFIX: &str = ", CABA";

/// What a normalized address points at, derived from the upstream `tipo` tag.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// A street plus a house number (`calle_altura`).
    StreetNumber,
    /// A corner of two streets (`calle_y_calle`).
    StreetIntersection,
    /// A bare street or anything else the service may return.
    Other,
}

impl AddressKind {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            wire::KIND_STREET_NUMBER => Self::StreetNumber,
            wire::KIND_STREET_INTERSECTION => Self::StreetIntersection,
            _ => Self::Other,
        }
    }
}

/// Geocoded position attached to an address when the request asked for it.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub srid: Option<u32>,
}

impl From<RawCoordinates> for Coordinates {
    fn from(raw: RawCoordinates) -> Self {
        Self {
            x: raw.x,
            y: raw.y,
            srid: raw.srid,
        }
    }
}

/// A normalized address as returned by the service.
///
/// Only the result classifier builds these; fields are read-only from the outside.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    full_text: String,
    street: String,
    house_number: Option<u32>,
    kind: AddressKind,
    cross_street: Option<String>,
    coordinates: Option<Coordinates>,
}

impl Address {
    pub(crate) fn from_raw(raw: RawAddress) -> Self {
        Self {
            full_text: raw.address.trim().to_string(),
            street: raw.street.trim().to_string(),
            house_number: raw.number,
            kind: AddressKind::from_tag(&raw.kind),
            cross_street: raw
                .cross_street
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            coordinates: raw.coordinates.map(Coordinates::from),
        }
    }

    /// Full normalized text, e.g. `"CORRIENTES AV. 1000, CABA"`.
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    #[must_use]
    pub fn street(&self) -> &str {
        &self.street
    }

    #[must_use]
    pub fn house_number(&self) -> Option<u32> {
        self.house_number
    }

    #[must_use]
    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    #[must_use]
    pub fn cross_street(&self) -> Option<&str> {
        self.cross_street.as_deref()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Whether the user may commit this address as-is.
    ///
    /// Street numbers need an actual house number; intersections always qualify.
    /// Anything else is a refinement step and re-seeds the search instead.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        match self.kind {
            AddressKind::StreetNumber => self.house_number.is_some(),
            AddressKind::StreetIntersection => true,
            AddressKind::Other => false,
        }
    }

    /// Search text used to refine a non-selectable address: the street plus a separator.
    #[must_use]
    pub fn refinement_query(&self) -> String {
        format!("{} ", self.street)
    }

    /// Full text without the city suffix, as shown in result lists and search fields.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.full_text
            .strip_suffix(CITY_SUFFIX)
            .unwrap_or(&self.full_text)
    }

    /// Byte range of `query` inside [`display_text`](Self::display_text), for highlighting.
    ///
    /// Matching is case-insensitive on the normalized query. Returns `None` when the query
    /// is blank, not found, or when lowercasing changes the byte layout of the text.
    #[must_use]
    pub fn match_range(&self, query: &str) -> Option<Range<usize>> {
        let needle = normalize(query)?;
        let display = self.display_text();
        let haystack = display.to_lowercase();
        if haystack.len() != display.len() {
            return None;
        }
        haystack
            .find(&needle)
            .map(|start| start..start + needle.len())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}
