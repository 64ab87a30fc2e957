pub mod admin;
pub mod account;
pub mod governance;
pub mod lessons;
pub mod mentorship;
pub mod messages;
pub mod modules;
pub mod progress;
pub mod quizzes;
