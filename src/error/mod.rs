use crate::config::ConfigPathError;
use crate::geometry::ColorParseError;
use crate::gesture::GestureError;
use crate::palette::PaletteError;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Gesture(#[from] GestureError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("config directory unavailable: {0:?}")]
    ConfigPath(ConfigPathError),
}

impl From<ConfigPathError> for EngineError {
    fn from(err: ConfigPathError) -> Self {
        Self::ConfigPath(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_errors_keep_their_message_when_lifted() {
        let err = EngineError::from(PaletteError::Cancelled);
        assert_eq!(err.to_string(), PaletteError::Cancelled.to_string());

        let result: EngineResult<()> = Err(ConfigPathError::MissingHomeDirectory.into());
        assert!(matches!(result, Err(EngineError::ConfigPath(_))));
    }
}
