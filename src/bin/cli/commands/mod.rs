pub mod capture;
pub mod due;
pub mod init;
pub mod remove;
pub mod review;
pub mod stats;
pub mod words;
