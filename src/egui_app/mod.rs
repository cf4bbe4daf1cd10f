//! Desktop shell: observable UI state, the controller that mutates it, and the
//! egui renderer that draws it.

pub mod controller;
pub mod state;
pub mod ui;
mod view_model;
