use secrecy::SecretString;
use std::path::PathBuf;

/// Process-wide configuration, resolved once from the CLI/environment.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub api_key: SecretString,
    pub chat_url: String,
    pub code_webhook_url: String,
    pub data_dir: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, api_key: SecretString, data_dir: PathBuf) -> Self {
        Self {
            api_url,
            api_key,
            chat_url: String::new(),
            code_webhook_url: String::new(),
            data_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://koach.example.com".to_string(),
            SecretString::from("anon-key"),
            PathBuf::from(".koach"),
        );

        assert_eq!(args.api_url, "https://koach.example.com");
        assert_eq!(args.api_key.expose_secret(), "anon-key");
        assert_eq!(args.data_dir, PathBuf::from(".koach"));
        assert_eq!(args.chat_url, "");
    }
}
