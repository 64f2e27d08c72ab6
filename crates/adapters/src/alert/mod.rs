pub mod file_tailer;
pub mod json_decoder;
