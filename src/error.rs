use crate::program::ShaderStage;

pub type RenderResult<T> = Result<T, RenderError>;

/// Everything that can stop the scene from reaching (or staying in) the
/// rendering loop. None of these are retried.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("{kind} context unavailable")]
    ContextUnavailable { kind: &'static str },

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("failed to create {0}")]
    ResourceCreation(&'static str),

    #[error("render resources have been released")]
    ResourcesReleased,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("host error: {0}")]
    Host(String),
}

impl RenderError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Failures that happen before the loop starts.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::ContextUnavailable { .. }
                | Self::ShaderCompile { .. }
                | Self::ProgramLink { .. }
                | Self::ResourceCreation(_)
        )
    }
}
