pub mod event;
pub mod maze;
pub mod session;
pub mod step;
