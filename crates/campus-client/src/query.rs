//! Row filters for the backend's REST data endpoint.

use std::fmt;

pub mod tables {
    pub const USER_ROLES: &str = "user_roles";
    pub const PROFILES: &str = "profiles";
    pub const NOTICES: &str = "notices";
    pub const BONAFIDE_REQUESTS: &str = "bonafide_requests";
    pub const FEE_RECEIPTS: &str = "fee_receipts";
    pub const AUDIT_LOGS: &str = "audit_logs";
}

/// A table plus the query string parameters that select rows from it.
///
/// ```ignore
/// let query = TableQuery::from(tables::NOTICES)
///     .contains("target_audience", ["student"])
///     .order_desc("created_at");
/// assert_eq!(query.path(), "notices?target_audience=cs.{student}&order=created_at.desc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns.replace(' ', ""))
    }

    pub fn eq(self, column: &str, value: impl fmt::Display) -> Self {
        self.param(column, format!("eq.{}", value))
    }

    pub fn in_list<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.param(column, format!("in.({})", join(values)))
    }

    /// Array column contains every value.
    pub fn contains<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.param(column, format!("cs.{{{}}}", join(values)))
    }

    pub fn order_desc(self, column: &str) -> Self {
        self.param("order", format!("{}.desc", column))
    }

    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit.to_string())
    }

    /// True when the query narrows rows, so a write cannot touch the whole table.
    pub fn has_filter(&self) -> bool {
        self.params
            .iter()
            .any(|(key, _)| !matches!(key.as_str(), "select" | "order" | "limit"))
    }

    /// `table?k=v&...`, ready to append to the REST base URL.
    pub fn path(&self) -> String {
        if self.params.is_empty() {
            return self.table.to_string();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.table, query)
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }
}

fn join<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: fmt::Display,
{
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_models::{Role, UserId};

    #[test]
    fn test_role_lookup_path() {
        let user_id = UserId::from_u128(1);
        let query = TableQuery::from(tables::USER_ROLES)
            .select("role")
            .eq("user_id", user_id);
        assert_eq!(
            query.path(),
            format!("user_roles?select=role&user_id=eq.{}", user_id)
        );
        assert!(query.has_filter());
    }

    #[test]
    fn test_select_strips_spaces() {
        let query = TableQuery::from(tables::PROFILES).select("user_id, full_name, enrollment_number");
        assert_eq!(
            query.path(),
            "profiles?select=user_id,full_name,enrollment_number"
        );
        assert!(!query.has_filter());
    }

    #[test]
    fn test_in_list_and_contains() {
        let a = UserId::from_u128(1);
        let b = UserId::from_u128(2);
        let query = TableQuery::from(tables::PROFILES).in_list("user_id", [a, b]);
        assert_eq!(query.path(), format!("profiles?user_id=in.({},{})", a, b));

        let query = TableQuery::from(tables::NOTICES).contains("target_audience", [Role::Faculty]);
        assert_eq!(query.path(), "notices?target_audience=cs.{faculty}");
    }

    #[test]
    fn test_audit_listing_path() {
        let query = TableQuery::from(tables::AUDIT_LOGS)
            .select("*")
            .order_desc("created_at")
            .limit(500);
        assert_eq!(
            query.path(),
            "audit_logs?select=*&order=created_at.desc&limit=500"
        );
    }

    #[test]
    fn test_bare_table() {
        assert_eq!(TableQuery::from(tables::NOTICES).path(), "notices");
    }
}
