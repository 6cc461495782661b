pub mod dto;
mod mappers;
pub mod operations;
