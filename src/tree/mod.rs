pub mod builder;
pub mod model;
pub mod selection;
pub mod state;
pub mod visibility;
