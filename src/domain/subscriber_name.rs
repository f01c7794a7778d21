#[derive(Debug, Clone, serde::Serialize)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Any name with visible content is accepted. It is escaped where it
    /// ends up inside HTML.
    pub fn parse(name: String) -> Result<SubscriberName, String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(format!("{:?} is not a valid subscriber name", name));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Wraps a name read back from storage without validating it again.
    pub fn from_stored(name: String) -> SubscriberName {
        Self(name)
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
