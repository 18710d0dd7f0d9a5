//! Project persistence: the document format and its codec

pub mod codec;
pub mod document;

pub use codec::{decode, encode, encode_to_string, load_into, DecodedProject};
pub use document::{GraphRecord, NodeRecord, ProjectDocument, ProjectMetadata, PRODUCER_NAME};
