//! Cloudinary outbound adapter for the `MediaStore` port.

mod cloudinary;
mod dto;

pub use cloudinary::{CloudinaryCredentials, CloudinaryMediaStore};
