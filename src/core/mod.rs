pub mod angle;
pub mod survey;
