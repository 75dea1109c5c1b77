use std::ffi::CString;
use crate::renderer::error::RenderError;

/// Contains configuration options for the renderer: validation, application name, and window size.
/// Only read during `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    pub validation_enabled: bool,
    pub application_name: String,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            validation_enabled: cfg!(debug_assertions),
            application_name: String::from("Origami"),
            window_width: 800,
            window_height: 600,
        }
    }
}

impl ContextConfig {
    pub fn new(
        application_name: impl Into<String>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            window_width,
            window_height,
            ..Default::default()
        }
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(RenderError::InvalidConfig("window dimensions must be non-zero"));
        }
        if self.application_name.is_empty() {
            return Err(RenderError::InvalidConfig("application name must not be empty"));
        }
        if self.application_name.contains('\0') {
            return Err(RenderError::InvalidConfig("application name must not contain NUL"));
        }
        Ok(())
    }

    pub(crate) fn application_name_c(&self) -> Result<CString, RenderError> {
        CString::new(self.application_name.as_str())
            .map_err(|_| RenderError::InvalidConfig("application name must not contain NUL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ContextConfig::default().validate().is_ok());
    }

    #[test]
    fn new_keeps_validation_default() {
        let cfg = ContextConfig::new("T", 320, 240).with_validation(false);
        assert_eq!(cfg.application_name, "T");
        assert_eq!((cfg.window_width, cfg.window_height), (320, 240));
        assert!(!cfg.validation_enabled);
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        let cfg = ContextConfig::new("T", 0, 240);
        assert!(matches!(cfg.validate(), Err(RenderError::InvalidConfig(_))));
        let cfg = ContextConfig::new("T", 320, 0);
        assert!(matches!(cfg.validate(), Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn bad_names_are_rejected() {
        assert!(ContextConfig::new("", 1, 1).validate().is_err());
        assert!(ContextConfig::new("a\0b", 1, 1).validate().is_err());
        assert!(ContextConfig::new("a\0b", 1, 1).application_name_c().is_err());
    }

    #[test]
    fn application_name_converts() {
        let name = ContextConfig::new("Red Window", 1, 1).application_name_c().unwrap();
        assert_eq!(name.to_str().unwrap(), "Red Window");
    }
}
