//! Query string extractor that rejects with the API error body

use axum::{
    extract::{FromRequestParts, Query as AxumQuery},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::domain::DomainError;

/// Wrapper around `axum::extract::Query` whose rejection is a 422 `{"detail"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AxumQuery::<T>::from_request_parts(parts, state).await {
            Ok(AxumQuery(value)) => Ok(Query(value)),
            Err(rejection) => Err(DomainError::validation(rejection.body_text()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct CustomerParams {
        customer: String,
    }

    async fn extract(uri: &str) -> Result<Query<CustomerParams>, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Query::<CustomerParams>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_present_parameter() {
        let query = extract("/create/m?customer=Acme%20Corp").await.unwrap();
        assert_eq!(query.customer, "Acme Corp");
    }

    #[tokio::test]
    async fn test_empty_parameter_is_accepted() {
        let query = extract("/create/m?customer=").await.unwrap();
        assert_eq!(query.into_inner().customer, "");
    }

    #[tokio::test]
    async fn test_missing_parameter_is_unprocessable() {
        let err = extract("/create/m").await.unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.response.detail.contains("customer"));
    }
}
