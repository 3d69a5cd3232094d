pub mod models;
pub mod survey;

pub use survey::CameraAngleSurvey;
