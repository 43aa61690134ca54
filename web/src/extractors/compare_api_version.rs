use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use service::config::ApiVersion;

/// Rejects requests whose `x-version` header is missing or names an API
/// version this build no longer exposes. Holds the accepted version string.
pub(crate) struct CompareApiVersion(pub String);

impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(ApiVersion::field_name()).ok_or((
            StatusCode::BAD_REQUEST,
            format!("missing {} header", ApiVersion::field_name()),
        ))?;

        let version = header
            .to_str()
            .map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("invalid {} header", ApiVersion::field_name()),
                )
            })?
            .to_string();

        if ApiVersion::versions().contains(&version.as_str()) {
            Ok(CompareApiVersion(version))
        } else {
            Err((
                StatusCode::NOT_ACCEPTABLE,
                format!("unsupported API version: {version}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CompareApiVersion, (StatusCode, String)> {
        let (mut parts, _) = request.into_parts();
        CompareApiVersion::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn accepts_a_supported_version() {
        let request = Request::builder()
            .uri("/events")
            .header("x-version", ApiVersion::default_version())
            .body(())
            .unwrap();

        let result = extract(request).await.unwrap();
        assert_eq!(result.0, ApiVersion::default_version());
    }

    #[tokio::test]
    async fn rejects_a_missing_version_header() {
        let request = Request::builder().uri("/events").body(()).unwrap();

        let (status, _) = extract(request).await.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_an_unsupported_version() {
        let request = Request::builder()
            .uri("/events")
            .header("x-version", "0.0.1")
            .body(())
            .unwrap();

        let (status, _) = extract(request).await.err().unwrap();
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    }
}
