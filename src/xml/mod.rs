//! THYME-ML (Anafora) XML support.

mod reader;
mod schema;
mod writer;

pub use reader::{parse_document, Element};
pub use schema::{load_annotations, Disambiguation, LoadedAnnotations};
pub use writer::write_annotations;
