use actix_web::{http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{
    auth::jwt::JwtService,
    entities::{submission::Submitter, token::Claims},
    errors::AuthError,
};

fn extract_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn decode_claims(req: &HttpRequest) -> Result<Claims, AuthError> {
    let jwt_service = req.app_data::<web::Data<JwtService>>().ok_or_else(|| {
        tracing::error!("JwtService missing from app data");
        AuthError::MissingJwtService
    })?;

    let token = extract_token(req).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        AuthError::MissingCredentials
    })?;

    Ok(jwt_service.decode_jwt(token)?.claims)
}

/// Extractor for authenticated claims, ensuring the user is authenticated.
/// Returns 401 if the user is not authenticated.
/// Usage: Add `claims: AuthClaims` as a parameter to your handler function.
#[derive(Debug)]
pub struct AuthClaims(pub Claims);

impl AuthClaims {
    pub fn submitter(&self) -> Submitter {
        Submitter::from(&self.0)
    }
}

impl FromRequest for AuthClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(decode_claims(req).map(AuthClaims).map_err(Into::into))
    }
}

/// Extractor for moderators, i.e. holders of the image add permission.
/// Returns 403 if the permission is missing.
/// Returns 401 if the user is not authenticated.
#[derive(Debug)]
pub struct ModeratorClaims(pub Claims);

impl ModeratorClaims {
    pub fn submitter(&self) -> Submitter {
        Submitter::from(&self.0)
    }
}

impl FromRequest for ModeratorClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = decode_claims(req).and_then(|claims| {
            if Submitter::from(&claims).is_trusted() {
                Ok(ModeratorClaims(claims))
            } else {
                Err(AuthError::Forbidden("Image moderation permission required".into()))
            }
        });

        ready(result.map_err(Into::into))
    }
}
