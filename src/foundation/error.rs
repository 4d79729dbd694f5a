pub type ShotreelResult<T> = Result<T, ShotreelError>;

#[derive(thiserror::Error, Debug)]
pub enum ShotreelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShotreelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ShotreelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ShotreelError::resolution("x")
                .to_string()
                .contains("resolution error:")
        );
        assert!(ShotreelError::probe("x").to_string().contains("probe error:"));
        assert!(
            ShotreelError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            ShotreelError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ShotreelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
