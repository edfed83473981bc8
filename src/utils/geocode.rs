use crate::geo::GeoPoint;

/// Client for a Nominatim-compatible reverse-geocoding service.
///
/// Lookups are strictly best-effort: the address string is cosmetic, so
/// any failure (no configured service, network error, unexpected payload)
/// resolves to `None` and the order keeps coordinates only.
#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl Geocoder {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Turn a map point into a human-readable address, if possible.
    pub async fn reverse(&self, point: GeoPoint) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}",
            base.trim_end_matches('/'),
            point.lat,
            point.lng
        );

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!("reverse geocode request failed: {err}");
                return None;
            }
        };

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("reverse geocode returned invalid JSON: {err}");
                return None;
            }
        };

        body.get("display_name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
