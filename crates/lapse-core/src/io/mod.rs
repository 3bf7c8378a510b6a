pub mod image_io;
pub mod metadata;
pub mod project_file;
