//! Data Transfer Objects (DTOs).

mod question_dto;

pub use question_dto::*;
