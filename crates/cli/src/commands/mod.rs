pub mod compare;
pub mod configure;
pub mod detail;
pub mod history;
pub mod protocols;
