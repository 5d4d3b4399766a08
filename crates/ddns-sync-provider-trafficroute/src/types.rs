//! TrafficRoute OpenAPI wire types

use serde::{Deserialize, Serialize};

/// Envelope shared by every action
#[derive(Debug, Deserialize)]
pub(crate) struct TrafficRouteResponse<T> {
    #[serde(rename = "ResponseMetadata", alias = "Resp", default)]
    pub metadata: ResponseMetadata,
    #[serde(rename = "Result")]
    pub result: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResponseMetadata {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl<T> TrafficRouteResponse<T> {
    /// The vendor error, if the metadata carries a non-empty code
    pub fn api_error(&self) -> Option<&ApiError> {
        self.metadata
            .error
            .as_ref()
            .filter(|e| !e.code.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListZonesResult {
    #[serde(rename = "Zones", default)]
    pub zones: Vec<ZoneInfo>,
    #[serde(rename = "Total", default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZoneInfo {
    #[serde(rename = "ZID")]
    pub zid: u64,
    #[serde(rename = "ZoneName")]
    pub zone_name: String,
    #[serde(rename = "RecordCount", default)]
    pub record_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListRecordsResult {
    #[serde(rename = "TotalCount", default)]
    pub total_count: u64,
    /// Absent means the response is malformed; an empty array means no records
    #[serde(rename = "Records")]
    pub records: Option<Vec<RecordInfo>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordInfo {
    #[serde(rename = "RecordID")]
    pub record_id: String,
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Line", default)]
    pub line: String,
    #[serde(rename = "TTL", default)]
    pub ttl: u32,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateRecordResult {
    #[serde(rename = "Status")]
    pub status: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRecordBody<'a> {
    #[serde(rename = "ZID")]
    pub zid: u64,
    #[serde(rename = "Host")]
    pub host: &'a str,
    #[serde(rename = "Type")]
    pub record_type: &'a str,
    #[serde(rename = "Line")]
    pub line: &'a str,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "Value")]
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRecordBody<'a> {
    #[serde(rename = "RecordID")]
    pub record_id: &'a str,
    #[serde(rename = "Host")]
    pub host: &'a str,
    #[serde(rename = "Type")]
    pub record_type: &'a str,
    #[serde(rename = "Line")]
    pub line: &'a str,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "Value")]
    pub value: &'a str,
}
