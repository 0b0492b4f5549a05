use serde::Deserialize;

/// Body of POST /listings/{id}/photos - a batch of files carried as
/// base64 inside JSON, in the order the user picked them.
#[derive(Debug, Deserialize)]
pub struct UploadPhotosPayload {
    pub files: Vec<UploadFileEntry>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFileEntry {
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

/// A decoded upload, ready for the pipeline.
#[derive(Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Body of PUT /listings/{id}/photos/order - one drag gesture.
#[derive(Debug, Deserialize)]
pub struct ReorderPayload {
    pub source_index: usize,
    pub target_index: usize,
}
