pub mod cell;
pub mod cipher;
pub mod entity;
pub mod gating;
pub mod grid;
pub mod physics;
pub mod puzzle;
pub mod timer;
pub mod trigger;
