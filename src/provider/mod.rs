pub mod dynect;
pub mod types;
