pub mod admin;
pub mod dashboard;
pub mod login;
pub mod profile;
pub mod timetables;
pub mod users;
