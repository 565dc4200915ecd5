mod app;
mod dom;
mod gallery;
mod logger;
mod net;
mod palette;
mod render;
mod state;

pub use app::run;
