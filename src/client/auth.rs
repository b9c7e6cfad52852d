/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-api-key";

pub enum Auth {
    /// Send an API key in the `x-api-key` header
    Apikey(String),
    /// Don't use any authentication
    None,
}

impl Auth {
    /// Pick API key auth when a non-empty key is configured
    pub fn from_apikey(apikey: Option<String>) -> Self {
        match apikey {
            Some(key) if !key.trim().is_empty() => Self::Apikey(key),
            _ => Self::None,
        }
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apikey(_) => write!(f, "Apikey"),
            Self::None => write!(f, "None"),
        }
    }
}
