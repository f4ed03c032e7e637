pub mod question;

pub use question::{AnswerSource, BankRecord, QueryData, QueryRequest};
