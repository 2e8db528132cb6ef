//! Package structure: the ZIP archive, container pointer, descriptor and
//! navigation documents.

mod archive;
mod container;
mod descriptor;
mod nav;
pub(crate) mod xml;

pub use archive::Archive;
pub use container::{CONTAINER_PATH, parse_container, parse_container_xml};
pub use descriptor::{Descriptor, parse_descriptor, resolve_descriptor};
pub use nav::{load_toc, parse_nav_document, parse_ncx, rebase_nav_points};
