//! Typed CRUD over the REST data endpoint.

use campus_core::RemoteError;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::http::BackendClient;
use crate::query::TableQuery;

impl BackendClient {
    fn table_url(&self, query: &TableQuery) -> String {
        self.config().rest_url(&query.path())
    }

    #[instrument(skip(self), fields(table = query.table()))]
    pub async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>, RemoteError> {
        let request = self.request(Method::GET, &self.table_url(query));
        self.send_json(request).await
    }

    /// Inserts one row and returns it as stored.
    #[instrument(skip(self, row))]
    pub async fn insert<B, T>(&self, table: &'static str, row: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, &self.config().rest_url(table))
            .header("Prefer", "return=representation")
            .json(row);
        let rows: Vec<T> = self.send_json(request).await?;
        first_row(rows)
    }

    /// Applies `changes` to the rows matched by `query` and returns them.
    #[instrument(skip(self, changes), fields(table = query.table()))]
    pub async fn update<B, T>(&self, query: &TableQuery, changes: &B) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        ensure_filtered(query)?;
        let request = self
            .request(Method::PATCH, &self.table_url(query))
            .header("Prefer", "return=representation")
            .json(changes);
        self.send_json(request).await
    }

    #[instrument(skip(self), fields(table = query.table()))]
    pub async fn delete(&self, query: &TableQuery) -> Result<(), RemoteError> {
        ensure_filtered(query)?;
        let request = self.request(Method::DELETE, &self.table_url(query));
        self.send(request).await.map(|_| ())
    }
}

fn ensure_filtered(query: &TableQuery) -> Result<(), RemoteError> {
    if query.has_filter() {
        Ok(())
    } else {
        Err(RemoteError::Rejected {
            status: 400,
            message: format!("refusing to modify every row of {}", query.table()),
        })
    }
}

fn first_row<T>(rows: Vec<T>) -> Result<T, RemoteError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| RemoteError::Decode("insert returned no rows".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tables;

    #[test]
    fn test_unfiltered_writes_are_refused() {
        let query = TableQuery::from(tables::NOTICES).order_desc("created_at");
        assert!(ensure_filtered(&query).is_err());
        assert!(ensure_filtered(&query.eq("id", 7)).is_ok());
    }

    #[test]
    fn test_first_row() {
        assert_eq!(first_row(vec![1, 2]), Ok(1));
        assert!(matches!(
            first_row::<i32>(vec![]),
            Err(RemoteError::Decode(_))
        ));
    }
}
