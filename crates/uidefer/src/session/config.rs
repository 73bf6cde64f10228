use std::ffi::CString;

/// Tunables for the deferred session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferConfig {
    /// Text used when a caller passes no display text.
    pub placeholder_text: CString,
    /// Minimum visible items while the bulk insert runs.
    pub flush_min_visible: u32,
    /// Minimum visible items restored after the bulk insert.
    pub restored_min_visible: u32,
}

impl Default for DeferConfig {
    fn default() -> Self {
        Self {
            placeholder_text: c"NONE".to_owned(),
            flush_min_visible: 1,
            restored_min_visible: 30,
        }
    }
}

impl DeferConfig {
    pub fn builder() -> DeferConfigBuilder {
        DeferConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeferConfigBuilder {
    placeholder_text: Option<CString>,
    flush_min_visible: Option<u32>,
    restored_min_visible: Option<u32>,
}

impl DeferConfigBuilder {
    /// Narrow text, cut at the first NUL if it has one.
    pub fn placeholder_text<S: Into<Vec<u8>>>(mut self, text: S) -> Self {
        let mut bytes = text.into();
        if let Some(nul) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(nul);
        }
        self.placeholder_text = CString::new(bytes).ok();
        self
    }

    pub fn flush_min_visible(mut self, count: u32) -> Self {
        self.flush_min_visible = Some(count);
        self
    }

    pub fn restored_min_visible(mut self, count: u32) -> Self {
        self.restored_min_visible = Some(count);
        self
    }

    pub fn build(self) -> DeferConfig {
        let default = DeferConfig::default();
        DeferConfig {
            placeholder_text: self.placeholder_text.unwrap_or(default.placeholder_text),
            flush_min_visible: self.flush_min_visible.unwrap_or(default.flush_min_visible),
            restored_min_visible: self
                .restored_min_visible
                .unwrap_or(default.restored_min_visible),
        }
    }
}
