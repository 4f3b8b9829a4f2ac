use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{config::CorsConfig, error::AppError};

/// Builds the CORS layer. Preflight requests to any path are answered here,
/// before routing.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, AppError> {
  let wildcard = config.allowed_origins.iter().any(|o| o == "*");
  if wildcard && config.allow_credentials {
      return Err(AppError::ConfigError(
          "CORS_ALLOWED_ORIGINS cannot be '*' when credentials are allowed".into(),
      ));
  }

  let allow_origin = if wildcard {
      AllowOrigin::any()
  } else {
      let origins = config
          .allowed_origins
          .iter()
          .map(|origin| {
              HeaderValue::from_str(origin)
                  .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
          })
          .collect::<Result<Vec<_>, _>>()?;
      AllowOrigin::list(origins)
  };

  let methods = config
      .allowed_methods
      .iter()
      .map(|method| {
          Method::from_bytes(method.to_uppercase().as_bytes())
              .map_err(|_| AppError::ConfigError(format!("Invalid CORS method: {}", method)))
      })
      .collect::<Result<Vec<_>, _>>()?;

  let headers = config
      .allowed_headers
      .iter()
      .map(|header| {
          HeaderName::from_bytes(header.as_bytes())
              .map_err(|_| AppError::ConfigError(format!("Invalid CORS header: {}", header)))
      })
      .collect::<Result<Vec<_>, _>>()?;

  Ok(CorsLayer::new()
      .allow_origin(allow_origin)
      .allow_methods(methods)
      .allow_headers(headers)
      .allow_credentials(config.allow_credentials))
}
