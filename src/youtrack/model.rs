use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field selector passed to `GET /api/issues/{id}`.
pub const ISSUE_FIELDS: &str =
    "idReadable,summary,description,customFields(name,value(name,text,presentation,minutes))";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IssueResp {
    pub id_readable: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldResp>,
}

#[derive(Deserialize, Debug)]
pub struct CustomFieldResp {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct WorkItemReq {
    pub date: i64,
    pub duration: DurationReq,
    pub text: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkTypeReq>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct DurationReq {
    pub minutes: i64,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct WorkTypeReq {
    pub name: String,
}
