//! Emission configuration: the names and memory limits of the rendered
//! module.

// ── EmitConfig ─────────────────────────────────────────────────────

/// Names and limits used when emitting and rendering a program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitConfig {
    /// Module the narration sink is imported from. Default: `"main"`.
    pub narrator_module: String,
    /// Field name of the imported narration function. Default: `"log"`.
    pub narrator_field: String,
    /// Export name of the entry function. Default: `"add"`.
    pub entry_point: String,
    /// Export name of the linear memory, so the host can read narrated
    /// strings back. Default: `"memory"`.
    pub memory_export: String,
    /// Minimum initial page count. Raised automatically when the image
    /// needs more. Default: 1.
    pub initial_pages: u32,
    /// Declared maximum page count. Default: 256.
    pub max_pages: u32,
}

impl EmitConfig {
    /// Size of one linear-memory page in bytes.
    pub const PAGE_SIZE: u32 = 65_536;

    /// Page count needed to hold `image_len` bytes, never below
    /// [`initial_pages`](Self::initial_pages).
    pub fn pages_for(&self, image_len: u32) -> u32 {
        image_len.div_ceil(Self::PAGE_SIZE).max(self.initial_pages)
    }
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            narrator_module: "main".to_string(),
            narrator_field: "log".to_string(),
            entry_point: "add".to_string(),
            memory_export: "memory".to_string(),
            initial_pages: 1,
            max_pages: 256,
        }
    }
}
