use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} is not set")]
    MissingSetting(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Job did not start: {0}")]
    Rejected(#[from] aj_core::RunRejected),

    #[error("Job {0} failed")]
    JobFailed(String),

    #[error("No {model_type} with id {model_id} in the registry")]
    UnknownModel { model_type: aj_core::ModelType, model_id: String },
}
