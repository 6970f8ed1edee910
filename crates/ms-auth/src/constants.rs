//! Microsoft Translator OAuth defaults
//!
//! Used whenever the parameter bag omits the corresponding key.

/// Scope requested from the access control service
pub const DEFAULT_SCOPE: &str = "http://api.microsofttranslator.com";

/// OAuth grant type for service-to-service authentication
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";

/// Azure DataMarket access control token endpoint
pub const DEFAULT_ACCESS_TOKEN_URL: &str =
    "https://datamarket.accesscontrol.windows.net/v2/OAuth2-13";

/// Translator V2 HTTP translate endpoint
pub const DEFAULT_TRANSLATOR_URL: &str = "http://api.microsofttranslator.com/V2/Http.svc/Translate";
