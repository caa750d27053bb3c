pub mod compose;
pub mod run;
pub mod stage;
