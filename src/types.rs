/// Which top-level plan an invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Develop,
    Build,
}

impl BuildMode {
    /// Name of the `[plan]` entry backing this mode.
    pub fn plan_name(self) -> &'static str {
        match self {
            BuildMode::Develop => "develop",
            BuildMode::Build => "build",
        }
    }
}
