pub mod comment;
pub mod export;
pub mod init;
pub mod list;
pub mod manage;
pub mod notifications;
pub mod report;
pub mod seed;
pub mod show;
pub mod upvote;
