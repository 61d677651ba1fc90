use crate::stage::StageKind;

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("cannot create GL object: {0}")]
    Backend(String),

    #[error("failed to compile {stage}: {log}")]
    StageCompile { stage: StageKind, log: String },

    #[error("failed to link program: {log}")]
    Link { log: String },

    #[error("{stage} has no section named `{name}`")]
    UnknownSection { stage: StageKind, name: String },

    #[error("no shader stage was loaded")]
    NoStages,

    #[error("cannot read shader source {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ShaderError>;
