pub mod audit;
pub mod cache;
pub mod storage;
