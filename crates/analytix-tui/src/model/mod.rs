pub mod analysis;
pub mod form;
pub mod landing;
