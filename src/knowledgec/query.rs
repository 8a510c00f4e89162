//! The KnowledgeC row query and the names of the columns it yields.

use crate::plugin::PluginQuery;

pub const ENTRY_CREATION: &str = "entry_creation";
pub const START: &str = "start";
pub const END: &str = "end";
pub const USAGE_IN_SECONDS: &str = "usage_in_seconds";
pub const ACTION: &str = "action";
pub const BUNDLE_ID: &str = "bundle_id";
pub const APP_ACT_CONTENT_DESCRIPTION: &str = "app_act_content_description";
pub const APP_ACT_USER_ACTIVITY_REQUEST: &str = "app_act_user_activity_request";
pub const URI: &str = "uri";
pub const URI_TITLE: &str = "uri_title";

pub const REQUIRED_TABLES: &[&str] = &["ZOBJECT", "ZSTRUCTUREDMETADATA"];

// ZVALUESTRING is selected twice: it carries the bundle id for /app/ streams
// and the page URI for /safari/ streams.
pub const KNOWLEDGEC_ROW_SQL: &str = r#"
SELECT
    ZOBJECT.ZCREATIONDATE AS "entry_creation",
    ZOBJECT.ZSTARTDATE AS "start",
    ZOBJECT.ZENDDATE AS "end",
    (ZOBJECT.ZENDDATE - ZOBJECT.ZSTARTDATE) AS "usage_in_seconds",
    ZOBJECT.ZSTREAMNAME AS "action",
    ZOBJECT.ZVALUESTRING AS "bundle_id",
    ZSTRUCTUREDMETADATA.Z_DKAPPLICATIONACTIVITYMETADATAKEY__CONTENTDESCRIPTION AS "app_act_content_description",
    ZSTRUCTUREDMETADATA.Z_DKAPPLICATIONACTIVITYMETADATAKEY__USERACTIVITYREQUIREDSTRING AS "app_act_user_activity_request",
    ZOBJECT.ZVALUESTRING AS "uri",
    ZSTRUCTUREDMETADATA.Z_DKSAFARIHISTORYMETADATAKEY__TITLE AS "uri_title"
FROM ZOBJECT
LEFT JOIN ZSTRUCTUREDMETADATA ON ZOBJECT.ZSTRUCTUREDMETADATA = ZSTRUCTUREDMETADATA.Z_PK
"#;

pub const QUERIES: &[PluginQuery] = &[PluginQuery {
    name: "knowledgec_row",
    sql: KNOWLEDGEC_ROW_SQL,
}];
