pub mod document_side_adapter;
pub mod face_presence_adapter;
pub mod mrz_parser;
