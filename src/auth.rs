mod token;

pub use token::Token;

/// Bitbucket user plus HTTP access token (or password), sent as HTTP basic auth.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: String,
    key: Token,
}

impl Credentials {
    pub fn new(user: &str, key: Token) -> Self {
        Self {
            user: user.to_owned(),
            key,
        }
    }

    /// `Authorization: Basic base64(user:key)`, no trailing newline.
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.user, Some(self.key.as_str()))
    }
}
