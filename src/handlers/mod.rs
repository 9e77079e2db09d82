// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components and request helpers shared by them

pub mod admin;
pub mod admin_catalog;
pub mod businesses;
pub mod categories;
pub mod health;
pub mod locations;
pub mod submissions;

pub use admin::config as admin_config;
pub use businesses::config as businesses_config;
pub use categories::config as categories_config;
pub use health::config as health_config;
pub use locations::config as locations_config;
pub use submissions::config as submissions_config;

use crate::config::Config;
use crate::services::resolve_locale;
use actix_web::http::header::ACCEPT_LANGUAGE;
use actix_web::HttpRequest;

/// Locale for a public request: `?lang=`, then Accept-Language, then the default
pub(crate) fn request_locale(req: &HttpRequest, lang: Option<&str>, config: &Config) -> String {
    let accept_language = req
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok());
    resolve_locale(lang, accept_language, config)
}

/// Client address used to key submission rate limits
pub(crate) fn client_address(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use actix_web::test::TestRequest;

    #[test]
    fn test_request_locale_prefers_query() {
        let config = test_config();
        let req = TestRequest::default()
            .insert_header((ACCEPT_LANGUAGE, "ar, en;q=0.5"))
            .to_http_request();

        assert_eq!(request_locale(&req, Some("fr"), &config), "fr");
        assert_eq!(request_locale(&req, None, &config), "ar");
        assert_eq!(request_locale(&req, Some("de"), &config), "ar");
    }

    #[test]
    fn test_client_address_from_forwarded_header() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.9"))
            .to_http_request();
        assert_eq!(client_address(&req), "203.0.113.9");
    }
}
