// Licensed under the Apache-2.0 license

//! Configuration for documentation and descriptor generation.
//!
//! [`DocConfig`] carries the project metadata stamped into the generated
//! Sphinx configuration, index page, and SVD device header. Everything has
//! a usable default; callers chain builder methods for what they set.

/// Project metadata and generation options.
///
/// # Example
///
/// ```
/// use csr_docgen::DocConfig;
///
/// let config = DocConfig::new("Fomu SoC")
///     .with_author("Foosn Industries")
///     .with_vendor("foosn")
///     .with_device_name("fomu")
///     .document_interrupts(true);
/// assert_eq!(config.device_name, "fomu");
/// ```
#[derive(Clone, Debug)]
pub struct DocConfig {
    /// Project name, used in page titles and the Sphinx config.
    pub project_name: String,

    /// Author, stamped into the Sphinx config copyright line.
    pub author: String,

    /// Vendor string for the SVD device header.
    pub vendor: String,

    /// Device name for the SVD device header and descriptor file name.
    pub device_name: String,

    /// Optional device description for the SVD header.
    pub description: Option<String>,

    /// Extra Sphinx extensions appended to the generated `conf.py`.
    pub sphinx_extensions: Vec<String>,

    /// When set, regions with mapped IRQs get event-register annotation
    /// and an interrupt assignment page; generation fails if the SoC
    /// description has no interrupt map.
    pub document_interrupts: bool,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            project_name: "SoC Project".to_string(),
            author: "Anonymous".to_string(),
            vendor: "litex".to_string(),
            device_name: "soc".to_string(),
            description: None,
            sphinx_extensions: Vec::new(),
            document_interrupts: false,
        }
    }
}

impl DocConfig {
    /// Create a config for `project_name` with defaults for the rest.
    pub fn new(project_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            ..Self::default()
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Set the SVD vendor string.
    pub fn with_vendor(mut self, vendor: &str) -> Self {
        self.vendor = vendor.to_string();
        self
    }

    /// Set the SVD device name.
    pub fn with_device_name(mut self, device_name: &str) -> Self {
        self.device_name = device_name.to_string();
        self
    }

    /// Set the SVD device description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Append a Sphinx extension (e.g. `sphinx_rtd_theme`).
    pub fn add_sphinx_extension(mut self, extension: &str) -> Self {
        self.sphinx_extensions.push(extension.to_string());
        self
    }

    /// Enable or disable interrupt documentation.
    pub fn document_interrupts(mut self, enabled: bool) -> Self {
        self.document_interrupts = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocConfig::default();
        assert_eq!(config.project_name, "SoC Project");
        assert_eq!(config.author, "Anonymous");
        assert_eq!(config.vendor, "litex");
        assert_eq!(config.device_name, "soc");
        assert!(!config.document_interrupts);
    }

    #[test]
    fn test_builder_chain() {
        let config = DocConfig::new("Test SoC")
            .with_author("Nobody")
            .with_vendor("acme")
            .with_device_name("widget")
            .with_description("A widget.")
            .add_sphinx_extension("m2r")
            .document_interrupts(true);
        assert_eq!(config.project_name, "Test SoC");
        assert_eq!(config.author, "Nobody");
        assert_eq!(config.vendor, "acme");
        assert_eq!(config.device_name, "widget");
        assert_eq!(config.description.as_deref(), Some("A widget."));
        assert_eq!(config.sphinx_extensions, vec!["m2r".to_string()]);
        assert!(config.document_interrupts);
    }
}
