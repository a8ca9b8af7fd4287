//! Nominatim 地理编码客户端
//!
//! 按地址文本查询，取第一个匹配结果。只在创建行程请求前调用，
//! 精度不是本服务的目标。

use async_trait::async_trait;
use serde::Deserialize;

use application::geocoder::{GeocodeError, Geocoder};
use domain::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim 返回经纬度字符串
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let places: Vec<NominatimPlace> = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json")])
            .send()
            .await
            .map_err(|err| GeocodeError::failed(err.to_string()))?
            .error_for_status()
            .map_err(|err| GeocodeError::failed(err.to_string()))?
            .json()
            .await
            .map_err(|err| GeocodeError::failed(err.to_string()))?;

        // 取第一个匹配位置
        let place = places.into_iter().next().ok_or(GeocodeError::NotFound)?;
        let lat = place
            .lat
            .parse()
            .map_err(|_| GeocodeError::failed("non-numeric latitude in response"))?;
        let long = place
            .lon
            .parse()
            .map_err(|_| GeocodeError::failed("non-numeric longitude in response"))?;
        Ok(Coordinate::new(lat, long))
    }
}
