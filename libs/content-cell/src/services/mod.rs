pub mod blog;
pub mod gallery;

pub use blog::{apply_blog_filters, slugify, BlogService};
pub use gallery::{apply_gallery_filters, GalleryService};
