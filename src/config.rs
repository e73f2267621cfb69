/// Config for a container
/// ## Fields
/// - `cache_absent`:
///   If `true`, a scoped resolution that finds no registered builder caches the missing result,
///   so later resolutions of the same key in that scope keep returning nothing even after a builder is registered.
///
///   If `false`, missing results are returned but not cached, and the next resolution tries to build again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub cache_absent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { cache_absent: true }
    }
}
