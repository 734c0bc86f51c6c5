pub mod ask;
pub mod openai;
