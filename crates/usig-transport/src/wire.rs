//! Wire types for the USIG `normalizar` endpoint.
//!
//! Field names follow the upstream service exactly (`direccion`, `nombre_calle`,
//! `altura`, ...). Parsing is deliberately split in two steps: the response body is
//! decoded into a [`RawResponse`] holding arbitrary JSON, and each entry of
//! `direccionesNormalizadas` is decoded into a [`RawAddress`] on its own, so a single
//! malformed entry never poisons the whole response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Result;

/// Top-level key holding the list of normalized addresses.
pub const RESULTS_FIELD: &str = "direccionesNormalizadas";
/// Top-level key the service uses to report a failed normalization.
pub const ERROR_MESSAGE_FIELD: &str = "errorMessage";

/// `tipo` tag for a street plus house number.
pub const KIND_STREET_NUMBER: &str = "calle_altura";
/// `tipo` tag for a street corner.
pub const KIND_STREET_INTERSECTION: &str = "calle_y_calle";

/// Query parameters of a forward normalization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeParams {
    #[serde(rename = "direccion")]
    pub query: String,
    #[serde(rename = "geocodificar")]
    pub geocode: bool,
    pub max: usize,
}

impl NormalizeParams {
    pub fn new(query: impl Into<String>, geocode: bool, max: usize) -> Self {
        Self {
            query: query.into(),
            geocode,
            max,
        }
    }
}

/// Query parameters of a reverse (coordinates to address) request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReverseParams {
    pub lat: f64,
    pub lng: f64,
}

/// Undecoded JSON body returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse(Value);

impl RawResponse {
    /// Decodes a response body. Anything that is not valid JSON is a decode error.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(Self(serde_json::from_slice(body)?))
    }

    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Entries of `direccionesNormalizadas`, or `None` when the field is missing or not a list.
    #[must_use]
    pub fn entries(&self) -> Option<&[Value]> {
        self.0.get(RESULTS_FIELD)?.as_array().map(Vec::as_slice)
    }

    /// The `errorMessage` field, when present and a string.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.0.get(ERROR_MESSAGE_FIELD)?.as_str()
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One entry of `direccionesNormalizadas`, or the body of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAddress {
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "nombre_calle")]
    pub street: String,
    #[serde(rename = "altura", default, deserialize_with = "lenient_u32")]
    pub number: Option<u32>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "nombre_calle_cruce", default)]
    pub cross_street: Option<String>,
    #[serde(rename = "coordenadas", default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Option<RawCoordinates>,
}

impl RawAddress {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}

/// Geocoded position. The service sends `x`/`y` either as numbers or as numeric strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCoordinates {
    pub x: f64,
    pub y: f64,
    pub srid: Option<u32>,
}

// `altura` is an integer, null, or occasionally something else; only integers count.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

fn lenient_coordinates<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<RawCoordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Object(map)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let x = map.get("x").and_then(number_like);
    let y = map.get("y").and_then(number_like);
    let srid = map
        .get("srid")
        .and_then(number_like)
        .map(|srid| srid as u32);
    Ok(x.zip(y).map(|(x, y)| RawCoordinates { x, y, srid }))
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_and_error_message() {
        let raw = RawResponse::from_value(json!({
            "direccionesNormalizadas": [{"direccion": "X"}],
            "errorMessage": "Calle inexistente"
        }));
        assert_eq!(raw.entries().map(<[Value]>::len), Some(1));
        assert_eq!(raw.error_message(), Some("Calle inexistente"));

        let raw = RawResponse::from_value(json!({"direccionesNormalizadas": "nope"}));
        assert!(raw.entries().is_none(), "Non-list results field is treated as missing");
        assert!(raw.error_message().is_none());
    }

    #[test]
    fn test_from_slice_rejects_garbage() {
        let err = RawResponse::from_slice(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_raw_address_full_entry() {
        let entry = json!({
            "direccion": "CORRIENTES AV. 1000, CABA",
            "nombre_calle": "CORRIENTES AV.",
            "altura": 1000,
            "tipo": "calle_altura",
            "coordenadas": {"x": "-58.380866", "y": "-34.603739", "srid": 4326}
        });
        let address = RawAddress::from_value(&entry).unwrap();
        assert_eq!(address.number, Some(1000));
        assert_eq!(address.kind, KIND_STREET_NUMBER);
        assert!(address.cross_street.is_none());

        let coords = address.coordinates.expect("coordinates should parse from strings");
        assert!((coords.x + 58.380_866).abs() < 1e-9);
        assert!((coords.y + 34.603_739).abs() < 1e-9);
        assert_eq!(coords.srid, Some(4326));
    }

    #[test]
    fn test_raw_address_lenient_optional_fields() {
        let entry = json!({
            "direccion": "CORRIENTES AV. y CALLAO AV., CABA",
            "nombre_calle": "CORRIENTES AV.",
            "altura": null,
            "tipo": "calle_y_calle",
            "nombre_calle_cruce": "CALLAO AV.",
            "coordenadas": null
        });
        let address = RawAddress::from_value(&entry).unwrap();
        assert_eq!(address.number, None);
        assert_eq!(address.cross_street.as_deref(), Some("CALLAO AV."));
        assert!(address.coordinates.is_none());

        let entry = json!({
            "direccion": "A", "nombre_calle": "A", "tipo": "calle", "altura": "s/n"
        });
        assert_eq!(RawAddress::from_value(&entry).unwrap().number, None);
    }

    #[test]
    fn test_raw_address_missing_required_field() {
        let entry = json!({"direccion": "A", "tipo": "calle"});
        assert!(RawAddress::from_value(&entry).is_err());
    }

    #[test]
    fn test_normalize_params_wire_names() {
        let params = NormalizeParams::new("corrientes 1000", true, 10);
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({"direccion": "corrientes 1000", "geocodificar": true, "max": 10})
        );
    }
}
