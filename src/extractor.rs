
use crate::geocoder::GeocodeResult;

pub const COUNTY_TYPE: &str = "administrative_area_level_2";
pub const CITY_TYPE: &str = "locality";
pub const POSTAL_CODE_TYPE: &str = "postal_code";
pub const STREET_TYPES: [&str; 2] = ["street_address", "route"];

/// Location fields pulled out of one geocoding result.
/// Every field is `None` when the lookup found nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub county: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zip_code: Option<String>,
    pub street_address: Option<String>,
}

/// Map a geocoding result onto the six output fields.
///
/// Components are scanned once in order and a later match overwrites an
/// earlier one for the same field. A `route` component counts as a street
/// address, so the street field may hold only the street name.
/// Coordinates are copied whenever a result exists.
pub fn extract_fields(result: Option<&GeocodeResult>) -> ExtractedFields {
    let Some(result) = result else {
        return ExtractedFields::default();
    };

    let mut fields = ExtractedFields::default();

    for component in &result.address_components {
        if component.has_type(COUNTY_TYPE) {
            fields.county = Some(component.long_name.clone());
        }
        if component.has_type(CITY_TYPE) {
            fields.city = Some(component.long_name.clone());
        }
        if component.has_type(POSTAL_CODE_TYPE) {
            fields.zip_code = Some(component.long_name.clone());
        }
        if STREET_TYPES.iter().any(|t| component.has_type(t)) {
            fields.street_address = Some(component.long_name.clone());
        }
    }

    fields.latitude = Some(result.geometry.location.lat);
    fields.longitude = Some(result.geometry.location.lng);

    fields
}
