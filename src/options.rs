/// Build configuration consulted by lowering.
///
/// Debug builds poison uninitialized locals and verify the produced module;
/// release builds skip both for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    Debug,
    Release,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub build_kind: BuildKind,
    pub strip_debug_info: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            build_kind: BuildKind::Debug,
            strip_debug_info: false,
        }
    }
}

impl BuildOptions {
    pub fn is_release(&self) -> bool {
        self.build_kind == BuildKind::Release
    }
}
